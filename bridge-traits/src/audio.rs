//! Audio Platform Abstractions
//!
//! Two audio capabilities are required from the host:
//!
//! - [`MediaElement`]: plays one network audio URL at a time and reports its
//!   lifecycle as [`MediaEvent`]s (an `<audio>` element on the web, a
//!   decoder plus output stream on desktop).
//! - [`AudioOutput`]: a continuously running output stage that pulls samples
//!   from an [`AudioRenderer`]. The tone generator renders into it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::Result;

/// Lifecycle events reported by a [`MediaElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// Audio is flowing to the output.
    Playing,
    /// Output was paused, explicitly or by the platform.
    Paused,
    /// Playback stalled waiting for more data.
    Waiting,
    /// The source failed (network, codec, device).
    Error(String),
}

/// Platform media element for a single network audio source.
///
/// Implementations must emit events for the source most recently passed to
/// [`set_source`](MediaElement::set_source) only.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::audio::{MediaElement, MediaEvent};
///
/// async fn start(element: &dyn MediaElement, url: &str) {
///     let mut events = element.subscribe();
///     element.set_source(url);
///     if element.play().await.is_ok() {
///         while let Ok(event) = events.recv().await {
///             if event == MediaEvent::Playing {
///                 break;
///             }
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Replace the current source. Any running playback is dropped.
    fn set_source(&self, url: &str);

    /// Start output for the current source.
    ///
    /// # Errors
    ///
    /// Returns an error when the platform rejects playback (unreachable
    /// stream, autoplay policy, missing source).
    async fn play(&self) -> Result<()>;

    /// Pause output, keeping the source.
    fn pause(&self);

    /// Pause output and reset the position to the start.
    fn stop(&self);

    /// Set output volume in `[0.0, 1.0]`.
    fn set_volume(&self, volume: f32);

    /// Whether the element is currently paused (or never started).
    fn is_paused(&self) -> bool;

    /// Subscribe to lifecycle events.
    fn subscribe(&self) -> broadcast::Receiver<MediaEvent>;
}

/// Pull-based sample source for an [`AudioOutput`].
///
/// `render` is called from the realtime audio callback and must not block
/// for long.
pub trait AudioRenderer: Send + Sync {
    /// Fill `buffer` with interleaved samples, `channels` samples per frame.
    fn render(&self, buffer: &mut [f32], channels: usize);
}

/// Continuously running output stage.
pub trait AudioOutput: Send + Sync {
    /// Sample rate of the output device in Hz.
    fn sample_rate(&self) -> u32;

    /// Start the output, pulling samples from `renderer`.
    ///
    /// Calling `start` on a running output replaces the renderer.
    fn start(&self, renderer: Arc<dyn AudioRenderer>) -> Result<()>;

    /// Resume a suspended output. No-op when already running.
    fn resume(&self) -> Result<()>;

    /// Whether the output has been started.
    fn is_running(&self) -> bool;
}
