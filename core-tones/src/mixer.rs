//! # Tone Mixer
//!
//! Sums every live voice through a master gain stage. The mixer is shared
//! between the control side (engine) and the realtime audio callback; all
//! state sits behind one `parking_lot::Mutex` held only for the duration of a
//! render block or a control update.
//!
//! Voices are keyed by `(id, generation)`. A tone that is disabled and
//! re-enabled before its teardown fires gets a new generation, so the stale
//! teardown cannot release the new voice.

use bridge_traits::AudioRenderer;
use parking_lot::Mutex;

use crate::catalog::ToneDefinition;
use crate::oscillator::{GainParam, Oscillator};

/// Lifecycle of a voice inside the mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Active,
    /// Ramping to silence, waiting for its teardown.
    FadingOut,
}

#[derive(Debug)]
struct Voice {
    id: String,
    generation: u64,
    oscillator: Oscillator,
    gain: GainParam,
    state: VoiceState,
}

#[derive(Debug)]
struct MixerState {
    voices: Vec<Voice>,
    master: GainParam,
}

/// Oscillator bank with per-voice and master gain.
#[derive(Debug)]
pub struct ToneMixer {
    sample_rate: u32,
    state: Mutex<MixerState>,
}

impl ToneMixer {
    pub fn new(sample_rate: u32, master_volume: f32) -> Self {
        Self {
            sample_rate,
            state: Mutex::new(MixerState {
                voices: Vec::new(),
                master: GainParam::new(master_volume),
            }),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Start a silent voice and ramp it to `target`.
    pub fn start_voice(
        &self,
        tone: &ToneDefinition,
        generation: u64,
        target: f32,
        time_constant_secs: f32,
    ) {
        let mut gain = GainParam::new(0.0);
        gain.set_target(target, time_constant_secs, self.sample_rate);

        let voice = Voice {
            id: tone.id.clone(),
            generation,
            oscillator: Oscillator::new(tone.waveform, tone.frequency_hz, self.sample_rate),
            gain,
            state: VoiceState::Active,
        };

        self.state.lock().voices.push(voice);
    }

    /// Ramp an active voice to a new level. Returns false if no such voice.
    pub fn ramp_voice(&self, id: &str, generation: u64, target: f32, time_constant_secs: f32) -> bool {
        let mut state = self.state.lock();
        match find_voice(&mut state.voices, id, generation) {
            Some(voice) => {
                voice.gain.set_target(target, time_constant_secs, self.sample_rate);
                true
            }
            None => false,
        }
    }

    /// Ramp a voice to silence and mark it for teardown.
    pub fn fade_out_voice(&self, id: &str, generation: u64, time_constant_secs: f32) -> bool {
        let mut state = self.state.lock();
        match find_voice(&mut state.voices, id, generation) {
            Some(voice) => {
                voice.gain.set_target(0.0, time_constant_secs, self.sample_rate);
                voice.state = VoiceState::FadingOut;
                true
            }
            None => false,
        }
    }

    /// Drop the voice with exactly this id and generation.
    pub fn release_voice(&self, id: &str, generation: u64) -> bool {
        let mut state = self.state.lock();
        let before = state.voices.len();
        state
            .voices
            .retain(|voice| !(voice.id == id && voice.generation == generation));
        state.voices.len() != before
    }

    pub fn set_master(&self, target: f32, time_constant_secs: f32) {
        self.state
            .lock()
            .master
            .set_target(target, time_constant_secs, self.sample_rate);
    }

    /// Current gain of a voice, if it is still allocated.
    pub fn voice_gain(&self, id: &str, generation: u64) -> Option<f32> {
        let mut state = self.state.lock();
        find_voice(&mut state.voices, id, generation).map(|voice| voice.gain.value())
    }

    pub fn voice_state(&self, id: &str, generation: u64) -> Option<VoiceState> {
        let mut state = self.state.lock();
        find_voice(&mut state.voices, id, generation).map(|voice| voice.state)
    }

    pub fn master_gain(&self) -> f32 {
        self.state.lock().master.value()
    }

    /// Number of allocated voices, fading ones included.
    pub fn voice_count(&self) -> usize {
        self.state.lock().voices.len()
    }
}

fn find_voice<'a>(voices: &'a mut [Voice], id: &str, generation: u64) -> Option<&'a mut Voice> {
    voices
        .iter_mut()
        .find(|voice| voice.id == id && voice.generation == generation)
}

impl AudioRenderer for ToneMixer {
    fn render(&self, buffer: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let mut state = self.state.lock();
        let MixerState { voices, master } = &mut *state;

        for frame in buffer.chunks_mut(channels) {
            let mut sum = 0.0f32;
            for voice in voices.iter_mut() {
                sum += voice.oscillator.next_sample() * voice.gain.next_value();
            }
            let sample = sum * master.next_value();
            frame.fill(sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Waveform;

    fn square_tone(id: &str) -> ToneDefinition {
        ToneDefinition::new(id, 1.0, id, "", Waveform::Square)
    }

    #[test]
    fn test_silent_without_voices() {
        let mixer = ToneMixer::new(1000, 0.5);
        let mut buffer = vec![1.0; 16];
        mixer.render(&mut buffer, 2);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_voice_fades_in_to_target() {
        let mixer = ToneMixer::new(1000, 1.0);
        mixer.start_voice(&square_tone("a"), 1, 0.5, 0.5);

        // Five time constants at 1 kHz
        let mut buffer = vec![0.0; 2500];
        mixer.render(&mut buffer, 1);

        let gain = mixer.voice_gain("a", 1).unwrap();
        assert!((gain - 0.5).abs() < 0.005);
    }

    #[test]
    fn test_frames_are_copied_to_every_channel() {
        let mixer = ToneMixer::new(100, 1.0);
        mixer.start_voice(&square_tone("a"), 1, 1.0, 0.0);

        let mut buffer = vec![0.0; 8];
        mixer.render(&mut buffer, 2);
        for frame in buffer.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert_eq!(buffer[0], 1.0);
    }

    #[test]
    fn test_release_matches_generation() {
        let mixer = ToneMixer::new(1000, 1.0);
        mixer.start_voice(&square_tone("a"), 1, 0.5, 0.5);
        mixer.fade_out_voice("a", 1, 0.5);
        mixer.start_voice(&square_tone("a"), 2, 0.5, 0.5);

        assert_eq!(mixer.voice_state("a", 1), Some(VoiceState::FadingOut));
        assert!(!mixer.release_voice("a", 3));
        assert!(mixer.release_voice("a", 1));
        assert_eq!(mixer.voice_count(), 1);
        assert_eq!(mixer.voice_state("a", 2), Some(VoiceState::Active));
    }

    #[test]
    fn test_master_gain_scales_output() {
        let mixer = ToneMixer::new(100, 0.25);
        mixer.start_voice(&square_tone("a"), 1, 1.0, 0.0);

        let mut buffer = vec![0.0; 1];
        mixer.render(&mut buffer, 1);
        assert_eq!(buffer[0], 0.25);

        mixer.set_master(1.0, 0.0);
        mixer.render(&mut buffer, 1);
        assert_eq!(buffer[0], 1.0);
    }
}
