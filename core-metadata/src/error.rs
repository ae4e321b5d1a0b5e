use thiserror::Error;

/// Failures inside the metadata, artwork and podcast lookups.
///
/// Resolvers recover from all of these by trying the next candidate; they
/// surface to callers only through the lower-level fetch helpers.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Relay '{relay}' failed: {message}")]
    Relay { relay: String, message: String },

    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

impl MetadataError {
    pub(crate) fn relay(relay: &str, source: impl std::fmt::Display) -> Self {
        Self::Relay {
            relay: relay.to_string(),
            message: source.to_string(),
        }
    }
}

impl From<serde_json::Error> for MetadataError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
