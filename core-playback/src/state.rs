//! Playback state machine states.

use serde::{Deserialize, Serialize};

/// Current state of the stream player.
///
/// ```text
/// Idle ─load─> Loading ─ready─> Playing ─pause─> Paused ─play─> Playing
///                                  │  ^
///                            stall │  │ ready
///                                  v  │
///                               Buffering
///
/// any ─stream error─> Errored ─load─> Loading
/// any ─stop─> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing is playing. A station may still be current after `stop`.
    #[default]
    Idle,
    /// A source was set and output was requested.
    Loading,
    /// Audio is flowing.
    Playing,
    /// Output paused by the user or the platform.
    Paused,
    /// Stalled waiting for data.
    Buffering,
    /// The stream failed. The next `load` recovers.
    Errored,
}

impl PlaybackState {
    /// Whether output is running or about to run.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Loading | Self::Playing | Self::Buffering)
    }

    /// Whether a platform pause should move the player to `Paused`.
    pub(crate) fn can_pause(&self) -> bool {
        matches!(self, Self::Playing | Self::Buffering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        assert!(PlaybackState::Loading.is_active());
        assert!(PlaybackState::Playing.is_active());
        assert!(PlaybackState::Buffering.is_active());
        assert!(!PlaybackState::Paused.is_active());
        assert!(!PlaybackState::Errored.is_active());
        assert!(!PlaybackState::Idle.is_active());
    }

    #[test]
    fn test_loading_ignores_platform_pause() {
        assert!(!PlaybackState::Loading.can_pause());
        assert!(PlaybackState::Playing.can_pause());
    }
}
