//! # Event Bus System
//!
//! Provides an event-driven architecture for the focus radio core using
//! `tokio::sync::broadcast`. Modules communicate through typed events instead
//! of holding references to each other.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for different domains
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ StreamPlayer ├──────────────>│           │     subscribe    ┌──────────────┐
//! └──────────────┘               │ EventBus  ├─────────────────>│ Orchestrator │
//!                                │ (broadcast│                  └──────────────┘
//! ┌──────────────┐     emit      │  channel) │     subscribe    ┌──────────────┐
//! │ Orchestrator ├──────────────>│           ├─────────────────>│   Host UI    │
//! └──────────────┘               └───────────┘                  └──────────────┘
//! ```
//!
//! The player publishes lifecycle events and periodic metadata requests. The
//! orchestrator answers those requests and publishes resolved metadata, tone
//! and library changes for the host.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlayerEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Player(PlayerEvent::Playing {
//!         station_url: "https://stream.laut.fm/lofi".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "Stream playing");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Subscribers should handle `Lagged` gracefully and treat `Closed` as a signal to exit.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Stream player lifecycle and metadata events
    Player(PlayerEvent),
    /// Tone generator events
    Tones(ToneEvent),
    /// Favorites, custom podcasts and preference changes
    Library(LibraryEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Player(e) => e.description(),
            CoreEvent::Tones(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Player(PlayerEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Player(PlayerEvent::Buffering { .. }) => EventSeverity::Warning,
            CoreEvent::Player(PlayerEvent::StationChanged { .. }) => EventSeverity::Info,
            CoreEvent::Player(PlayerEvent::Metadata { .. }) => EventSeverity::Info,
            CoreEvent::Player(PlayerEvent::RequestMetadata { .. }) => EventSeverity::Debug,
            CoreEvent::Player(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Player Events
// ============================================================================

/// Search links for the current track on streaming services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MusicServiceLinks {
    pub spotify: String,
    pub youtube_music: String,
    pub soundcloud: String,
}

/// Events related to stream playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlayerEvent {
    /// A new station became current.
    StationChanged {
        station_url: String,
        name: String,
        image: Option<String>,
    },
    /// The stream is being opened.
    Loading { station_url: String },
    /// Audio is flowing.
    Playing { station_url: String },
    /// Output paused.
    Paused { station_url: String },
    /// Playback stalled waiting for data.
    Buffering { station_url: String },
    /// Playback was stopped and reset.
    Stopped,
    /// The stream failed. The player stays usable.
    Error {
        station_url: Option<String>,
        /// Human-readable reason ("Stream Offline", "Stream Fehler")
        message: String,
    },
    /// Periodic request to resolve now-playing metadata.
    ///
    /// `token` is the load generation at the time of the request; answers
    /// for a stale token must be discarded.
    RequestMetadata { station_url: String, token: u64 },
    /// Resolved now-playing information.
    Metadata {
        station_url: String,
        artist: String,
        title: String,
        cover_url: Option<String>,
        links: MusicServiceLinks,
    },
}

impl PlayerEvent {
    fn description(&self) -> &str {
        match self {
            PlayerEvent::StationChanged { .. } => "Station changed",
            PlayerEvent::Loading { .. } => "Stream loading",
            PlayerEvent::Playing { .. } => "Stream playing",
            PlayerEvent::Paused { .. } => "Stream paused",
            PlayerEvent::Buffering { .. } => "Stream buffering",
            PlayerEvent::Stopped => "Playback stopped",
            PlayerEvent::Error { .. } => "Stream error",
            PlayerEvent::RequestMetadata { .. } => "Metadata requested",
            PlayerEvent::Metadata { .. } => "Now playing updated",
        }
    }
}

// ============================================================================
// Tone Events
// ============================================================================

/// Events related to the tone generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum ToneEvent {
    /// A tone started fading in.
    Enabled { tone_id: String, volume: f32 },
    /// A tone started fading out.
    Disabled { tone_id: String },
    /// A tone's target volume changed.
    VolumeChanged { tone_id: String, volume: f32 },
    /// The master volume changed.
    MasterVolumeChanged { volume: f32 },
}

impl ToneEvent {
    fn description(&self) -> &str {
        match self {
            ToneEvent::Enabled { .. } => "Tone enabled",
            ToneEvent::Disabled { .. } => "Tone disabled",
            ToneEvent::VolumeChanged { .. } => "Tone volume changed",
            ToneEvent::MasterVolumeChanged { .. } => "Tone master volume changed",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events related to persisted user data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    FavoriteAdded { station_url: String },
    FavoriteRemoved { station_url: String },
    PodcastAdded { podcast_url: String },
    PodcastRemoved { podcast_url: String },
    ThemeChanged { dark_mode: bool },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::FavoriteAdded { .. } => "Favorite added",
            LibraryEvent::FavoriteRemoved { .. } => "Favorite removed",
            LibraryEvent::PodcastAdded { .. } => "Custom podcast added",
            LibraryEvent::PodcastRemoved { .. } => "Custom podcast removed",
            LibraryEvent::ThemeChanged { .. } => "Theme changed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let tone_stream = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Tones(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(url: &str) -> CoreEvent {
        CoreEvent::Player(PlayerEvent::Playing {
            station_url: url.to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(CoreEvent::Player(PlayerEvent::Stopped)).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Player(PlayerEvent::RequestMetadata {
            station_url: "https://stream.laut.fm/lofi".to_string(),
            token: 3,
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream =
            EventStream::new(bus.subscribe()).filter(|event| matches!(event, CoreEvent::Tones(_)));

        bus.emit(playing("https://a")).ok();
        let tone_event = CoreEvent::Tones(ToneEvent::Enabled {
            tone_id: "528".to_string(),
            volume: 0.5,
        });
        bus.emit(tone_event.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), tone_event);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(playing(&format!("https://station/{}", i))).ok();
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let error_event = CoreEvent::Player(PlayerEvent::Error {
            station_url: None,
            message: "Stream Offline".to_string(),
        });
        assert_eq!(error_event.severity(), EventSeverity::Error);
        assert_eq!(playing("https://a").severity(), EventSeverity::Info);

        let request = CoreEvent::Player(PlayerEvent::RequestMetadata {
            station_url: "https://a".to_string(),
            token: 1,
        });
        assert_eq!(request.severity(), EventSeverity::Debug);

        let theme = CoreEvent::Library(LibraryEvent::ThemeChanged { dark_mode: true });
        assert_eq!(theme.severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_description() {
        let event = CoreEvent::Tones(ToneEvent::Disabled {
            tone_id: "schumann".to_string(),
        });
        assert_eq!(event.description(), "Tone disabled");
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = CoreEvent::Player(PlayerEvent::Metadata {
            station_url: "https://stream.laut.fm/lofi".to_string(),
            artist: "Nujabes".to_string(),
            title: "Aruarian Dance".to_string(),
            cover_url: None,
            links: MusicServiceLinks::default(),
        });

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Player");
        assert_eq!(json["payload"]["event"], "Metadata");
        assert_eq!(json["payload"]["artist"], "Nujabes");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
