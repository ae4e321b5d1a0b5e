//! # Tone Error Types

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur while controlling tones.
#[derive(Error, Debug)]
pub enum ToneError {
    /// No tone with this id exists in the catalog.
    #[error("Unknown tone: {0}")]
    UnknownTone(String),

    /// The audio output could not be started or resumed.
    #[error("Audio output error: {0}")]
    Output(#[from] BridgeError),
}

/// Result type for tone operations.
pub type Result<T> = std::result::Result<T, ToneError>;
