use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    /// The settings store rejected a read or write.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// A stored value could not be decoded.
    #[error("Corrupt data under '{key}': {message}")]
    CorruptData { key: String, message: String },
}

impl From<BridgeError> for LibraryError {
    fn from(err: BridgeError) -> Self {
        LibraryError::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
