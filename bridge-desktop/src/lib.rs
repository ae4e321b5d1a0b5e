//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! - [`ReqwestHttpClient`]: `HttpClient` using `reqwest`
//! - [`SqliteSettingsStore`]: `SettingsStore` as an SQLite key-value table
//! - [`NetworkMediaElement`]: `MediaElement` decoding network streams with
//!   `symphonia` and playing them through `cpal`
//! - [`CpalToneOutput`]: `AudioOutput` on the default `cpal` device
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{CpalToneOutput, NetworkMediaElement, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let store = SqliteSettingsStore::new("/tmp/focus-radio/settings.db".into()).await?;
//!     let element = NetworkMediaElement::new();
//!     let tones = CpalToneOutput::new()?;
//!     // Hand these to the core configuration
//!     Ok(())
//! }
//! ```

mod http;
mod media_element;
mod sample_queue;
mod settings;
mod tone_output;

pub use http::ReqwestHttpClient;
pub use media_element::NetworkMediaElement;
pub use settings::SqliteSettingsStore;
pub use tone_output::CpalToneOutput;
