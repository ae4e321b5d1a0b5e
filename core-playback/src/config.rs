//! # Player Configuration
//!
//! Configuration types for the stream player.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stream player configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Interval between metadata requests while a stream is playing.
    ///
    /// The first request is sent as soon as playback starts.
    ///
    /// Default: 15 seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Output volume applied to every new source, in `[0.0, 1.0]`.
    ///
    /// Default: 1.0.
    #[serde(default = "default_volume")]
    pub initial_volume: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            initial_volume: default_volume(),
        }
    }
}

impl PlayerConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_initial_volume(mut self, volume: f32) -> Self {
        self.initial_volume = volume;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval.is_zero() {
            return Err("poll_interval must be > 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err("initial_volume must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_poll_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_volume() -> f32 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.initial_volume, 1.0);
    }

    #[test]
    fn test_config_validation() {
        let config = PlayerConfig::default().with_poll_interval(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = PlayerConfig::default().with_initial_volume(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: PlayerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PlayerConfig::default());
    }
}
