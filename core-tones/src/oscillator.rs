//! Sample generators: a phase-accumulating oscillator and an exponential gain ramp.

use crate::catalog::Waveform;
use std::f64::consts::TAU;

/// Continuous periodic signal at a fixed frequency.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    /// Position within the current cycle, in [0, 1)
    phase: f64,
    increment: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency_hz: f32, sample_rate: u32) -> Self {
        let increment = if sample_rate == 0 {
            0.0
        } else {
            f64::from(frequency_hz) / f64::from(sample_rate)
        };

        Self {
            waveform,
            phase: 0.0,
            increment,
        }
    }

    /// Produce the next sample in [-1, 1].
    pub fn next_sample(&mut self) -> f32 {
        let p = self.phase;
        let value = match self.waveform {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * p - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
        };

        self.phase = (self.phase + self.increment).fract();
        value as f32
    }
}

/// Gain that approaches its target exponentially, one step per sample.
///
/// Mirrors `setTargetAtTime`: `g(t) = target + (g0 - target) * e^(-t/τ)`.
#[derive(Debug, Clone)]
pub struct GainParam {
    value: f32,
    target: f32,
    /// Per-sample decay factor e^(-1/(τ·sr))
    coefficient: f32,
}

impl GainParam {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            target: value,
            coefficient: 0.0,
        }
    }

    /// Start approaching `target` with time constant `time_constant_secs`.
    ///
    /// A zero time constant jumps immediately.
    pub fn set_target(&mut self, target: f32, time_constant_secs: f32, sample_rate: u32) {
        self.target = target;
        if time_constant_secs <= 0.0 || sample_rate == 0 {
            self.value = target;
            self.coefficient = 0.0;
        } else {
            self.coefficient = (-1.0 / (time_constant_secs * sample_rate as f32)).exp();
        }
    }

    /// Advance one sample and return the gain for it.
    pub fn next_value(&mut self) -> f32 {
        let current = self.value;
        self.value = self.target + (self.value - self.target) * self.coefficient;
        current
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_starts_at_zero_and_peaks_at_quarter_cycle() {
        // 1 Hz at 4 Hz sample rate: one quarter cycle per sample
        let mut osc = Oscillator::new(Waveform::Sine, 1.0, 4);
        assert!(osc.next_sample().abs() < 1e-6);
        assert!((osc.next_sample() - 1.0).abs() < 1e-6);
        assert!(osc.next_sample().abs() < 1e-6);
        assert!((osc.next_sample() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_square_and_sawtooth_shapes() {
        let mut square = Oscillator::new(Waveform::Square, 1.0, 4);
        let samples: Vec<f32> = (0..4).map(|_| square.next_sample()).collect();
        assert_eq!(samples, vec![1.0, 1.0, -1.0, -1.0]);

        let mut saw = Oscillator::new(Waveform::Sawtooth, 1.0, 4);
        let samples: Vec<f32> = (0..4).map(|_| saw.next_sample()).collect();
        assert_eq!(samples, vec![-1.0, -0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_triangle_range() {
        let mut tri = Oscillator::new(Waveform::Triangle, 3.0, 100);
        for _ in 0..200 {
            let s = tri.next_sample();
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_gain_follows_exponential_curve() {
        let sample_rate = 1000;
        let mut gain = GainParam::new(0.0);
        gain.set_target(0.5, 0.5, sample_rate);

        // After one time constant the gap has shrunk to e^-1
        for _ in 0..500 {
            gain.next_value();
        }
        let expected = 0.5 * (1.0 - (-1.0f32).exp());
        assert!((gain.value() - expected).abs() < 1e-3);

        // After five time constants it is within 1% of target
        for _ in 0..2000 {
            gain.next_value();
        }
        assert!((gain.value() - 0.5).abs() < 0.005);
    }

    #[test]
    fn test_zero_time_constant_jumps() {
        let mut gain = GainParam::new(0.2);
        gain.set_target(0.8, 0.0, 48_000);
        assert_eq!(gain.next_value(), 0.8);
        assert_eq!(gain.target(), 0.8);
    }
}
