//! # Tone Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for a single tone's volume.
pub const MAX_TONE_VOLUME: f32 = 0.5;

/// Fade and level settings for the tone engine.
///
/// Time constants are in seconds and follow `g(t) = target + (g0 - target) * e^(-t/τ)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToneConfig {
    /// Volume a tone fades in to when enabled.
    ///
    /// Default: 0.5.
    #[serde(default = "default_tone_volume")]
    pub default_volume: f32,

    /// Time constant of the fade-in.
    ///
    /// Default: 0.5 s.
    #[serde(default = "default_fade_in_secs")]
    pub fade_in_secs: f32,

    /// Time constant of the fade-out on disable.
    ///
    /// Default: 0.5 s.
    #[serde(default = "default_fade_out_secs")]
    pub fade_out_secs: f32,

    /// Time constant of volume changes.
    ///
    /// Default: 0.1 s.
    #[serde(default = "default_volume_ramp_secs")]
    pub volume_ramp_secs: f32,

    /// Delay between the start of a fade-out and releasing the voice.
    ///
    /// Default: 600 ms.
    #[serde(default = "default_teardown_delay")]
    pub teardown_delay: Duration,

    /// Time constant of the fade-out when stopping everything.
    ///
    /// Default: 0.1 s.
    #[serde(default = "default_stop_all_fade_secs")]
    pub stop_all_fade_secs: f32,

    /// Teardown delay when stopping everything.
    ///
    /// Default: 200 ms.
    #[serde(default = "default_stop_all_teardown_delay")]
    pub stop_all_teardown_delay: Duration,

    /// Initial master volume.
    ///
    /// Default: 0.5.
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            default_volume: default_tone_volume(),
            fade_in_secs: default_fade_in_secs(),
            fade_out_secs: default_fade_out_secs(),
            volume_ramp_secs: default_volume_ramp_secs(),
            teardown_delay: default_teardown_delay(),
            stop_all_fade_secs: default_stop_all_fade_secs(),
            stop_all_teardown_delay: default_stop_all_teardown_delay(),
            master_volume: default_master_volume(),
        }
    }
}

impl ToneConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=MAX_TONE_VOLUME).contains(&self.default_volume) {
            return Err(format!(
                "default_volume must be between 0.0 and {}",
                MAX_TONE_VOLUME
            ));
        }

        if !(0.0..=1.0).contains(&self.master_volume) {
            return Err("master_volume must be between 0.0 and 1.0".to_string());
        }

        for (name, value) in [
            ("fade_in_secs", self.fade_in_secs),
            ("fade_out_secs", self.fade_out_secs),
            ("volume_ramp_secs", self.volume_ramp_secs),
            ("stop_all_fade_secs", self.stop_all_fade_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number", name));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_tone_volume() -> f32 {
    0.5
}

fn default_fade_in_secs() -> f32 {
    0.5
}

fn default_fade_out_secs() -> f32 {
    0.5
}

fn default_volume_ramp_secs() -> f32 {
    0.1
}

fn default_teardown_delay() -> Duration {
    Duration::from_millis(600)
}

fn default_stop_all_fade_secs() -> f32 {
    0.1
}

fn default_stop_all_teardown_delay() -> Duration {
    Duration::from_millis(200)
}

fn default_master_volume() -> f32 {
    0.5
}
