//! # Playback Error Types
//!
//! Error types for stream playback operations.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// The platform refused to start output for the current source.
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// Attempted operation when no station is loaded.
    #[error("No station loaded")]
    NoStationLoaded,

    /// The station descriptor cannot be played.
    #[error("Invalid station: {0}")]
    InvalidStation(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Player configuration failed validation.
    #[error("Invalid player configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Platform Errors
    // ========================================================================
    /// Error reported by the platform media element.
    #[error("Media element error: {0}")]
    Bridge(#[from] BridgeError),

    /// The player was created outside a tokio runtime.
    #[error("No async runtime available")]
    RuntimeUnavailable,
}

impl PlaybackError {
    /// Returns `true` if loading the station again may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlaybackError::PlaybackFailed(_) | PlaybackError::Bridge(_))
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
