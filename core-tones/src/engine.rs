//! # Tone Engine
//!
//! Control surface for the tone generator. Each enabled tone owns one voice
//! in the [`ToneMixer`]; enabling fades it in, disabling fades it out and
//! releases the voice after the configured teardown delay.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{AudioOutput, AudioRenderer};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{ToneCatalog, ToneDefinition};
use crate::config::{ToneConfig, MAX_TONE_VOLUME};
use crate::error::{Result, ToneError};
use crate::mixer::ToneMixer;

/// Snapshot of an enabled tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTone {
    pub id: String,
    #[serde(rename = "volume")]
    pub target_volume: f32,
}

#[derive(Debug, Clone, Copy)]
struct ActiveVoice {
    generation: u64,
    volume: f32,
}

#[derive(Debug)]
struct EngineState {
    active: HashMap<String, ActiveVoice>,
    next_generation: u64,
    master_volume: f32,
}

/// Multi-tone generator with independent fades and a master stage.
pub struct ToneEngine {
    catalog: ToneCatalog,
    output: Arc<dyn AudioOutput>,
    mixer: Arc<ToneMixer>,
    config: ToneConfig,
    state: Mutex<EngineState>,
}

impl ToneEngine {
    /// Create an engine rendering into `output`.
    ///
    /// The output is not started until the first tone is enabled.
    pub fn new(catalog: ToneCatalog, output: Arc<dyn AudioOutput>, config: ToneConfig) -> Self {
        let master_volume = clamp_volume(config.master_volume, 1.0);
        let mixer = Arc::new(ToneMixer::new(output.sample_rate(), master_volume));

        Self {
            catalog,
            output,
            mixer,
            config,
            state: Mutex::new(EngineState {
                active: HashMap::new(),
                next_generation: 1,
                master_volume,
            }),
        }
    }

    /// Enable a tone, fading it in to the default volume.
    ///
    /// Returns `Ok(false)` when the tone was already enabled.
    ///
    /// # Errors
    ///
    /// - [`ToneError::UnknownTone`] if the id is not in the catalog
    /// - [`ToneError::Output`] if the audio output cannot be started
    pub fn enable(&self, id: &str) -> Result<bool> {
        if self.is_active(id) {
            return Ok(false);
        }

        let tone = self
            .catalog
            .get(id)
            .ok_or_else(|| ToneError::UnknownTone(id.to_string()))?;

        // The state lock is not held while the output starts.
        self.ensure_output_running()?;

        let mut state = self.state.lock();
        if state.active.contains_key(id) {
            return Ok(false);
        }

        let generation = state.next_generation;
        state.next_generation += 1;

        let volume = clamp_volume(self.config.default_volume, MAX_TONE_VOLUME);
        self.mixer
            .start_voice(tone, generation, volume, self.config.fade_in_secs);
        state
            .active
            .insert(id.to_string(), ActiveVoice { generation, volume });

        info!(tone = %id, frequency_hz = tone.frequency_hz, generation, "Tone enabled");
        Ok(true)
    }

    /// Disable a tone, fading it out. Returns false when it was not enabled.
    pub fn disable(&self, id: &str) -> bool {
        let removed = self.state.lock().active.remove(id);
        let Some(voice) = removed else {
            return false;
        };

        self.mixer
            .fade_out_voice(id, voice.generation, self.config.fade_out_secs);
        self.schedule_teardown(id.to_string(), voice.generation, self.config.teardown_delay);

        info!(tone = %id, generation = voice.generation, "Tone disabled");
        true
    }

    /// Change a tone's volume, clamped to `[0, 0.5]`.
    ///
    /// Returns the applied volume, or `None` when the tone is not enabled.
    pub fn set_volume(&self, id: &str, volume: f32) -> Option<f32> {
        let volume = clamp_volume(volume, MAX_TONE_VOLUME);
        let mut state = self.state.lock();
        let voice = state.active.get_mut(id)?;

        voice.volume = volume;
        self.mixer
            .ramp_voice(id, voice.generation, volume, self.config.volume_ramp_secs);

        debug!(tone = %id, volume, "Tone volume changed");
        Some(volume)
    }

    /// Change the master volume, clamped to `[0, 1]`. Returns the applied value.
    pub fn set_master_volume(&self, volume: f32) -> f32 {
        let volume = clamp_volume(volume, 1.0);
        self.state.lock().master_volume = volume;
        self.mixer.set_master(volume, self.config.volume_ramp_secs);

        debug!(volume, "Tone master volume changed");
        volume
    }

    pub fn master_volume(&self) -> f32 {
        self.state.lock().master_volume
    }

    /// Enabled tones in catalog order.
    pub fn list_active(&self) -> Vec<ActiveTone> {
        let state = self.state.lock();
        let mut active: Vec<ActiveTone> = state
            .active
            .iter()
            .map(|(id, voice)| ActiveTone {
                id: id.clone(),
                target_volume: voice.volume,
            })
            .collect();

        active.sort_by_key(|tone| self.catalog.position(&tone.id).unwrap_or(usize::MAX));
        active
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.state.lock().active.contains_key(id)
    }

    /// Disable every tone. Returns the ids that were stopped.
    pub fn stop_all(&self) -> Vec<String> {
        let drained: Vec<(String, ActiveVoice)> = self.state.lock().active.drain().collect();

        let mut stopped = Vec::with_capacity(drained.len());
        for (id, voice) in drained {
            self.mixer
                .fade_out_voice(&id, voice.generation, self.config.stop_all_fade_secs);
            self.schedule_teardown(
                id.clone(),
                voice.generation,
                self.config.stop_all_teardown_delay,
            );
            stopped.push(id);
        }

        if !stopped.is_empty() {
            info!(count = stopped.len(), "All tones stopped");
        }
        stopped
    }

    pub fn catalog(&self) -> &[ToneDefinition] {
        self.catalog.tones()
    }

    /// The mixer rendered by the audio output.
    pub fn mixer(&self) -> &Arc<ToneMixer> {
        &self.mixer
    }

    fn ensure_output_running(&self) -> Result<()> {
        if self.output.is_running() {
            self.output.resume()?;
        } else {
            let renderer: Arc<dyn AudioRenderer> = self.mixer.clone();
            self.output.start(renderer)?;
            debug!(sample_rate = self.mixer.sample_rate(), "Tone output started");
        }
        Ok(())
    }

    fn schedule_teardown(&self, id: String, generation: u64, delay: Duration) {
        let mixer = Arc::clone(&self.mixer);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if mixer.release_voice(&id, generation) {
                        debug!(tone = %id, generation, "Tone voice released");
                    }
                });
            }
            Err(_) => {
                warn!(tone = %id, "No async runtime for tone teardown, releasing voice immediately");
                mixer.release_voice(&id, generation);
            }
        }
    }
}

impl std::fmt::Debug for ToneEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToneEngine")
            .field("catalog_size", &self.catalog.len())
            .field("active", &self.list_active())
            .field("master_volume", &self.master_volume())
            .finish()
    }
}

fn clamp_volume(volume: f32, max: f32) -> f32 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, max)
}
