//! # Playback Module
//!
//! Plays one internet radio stream (or podcast episode) at a time through the
//! host's [`MediaElement`](bridge_traits::MediaElement).
//!
//! ## Overview
//!
//! This module handles:
//! - The playback state machine (`Idle`, `Loading`, `Playing`, `Paused`, `Buffering`, `Errored`)
//! - Translating platform media events into [`PlayerEvent`](core_runtime::events::PlayerEvent)s
//! - Periodic metadata requests while a stream is playing
//! - Load tokens for detecting stale asynchronous results
//! - Volume retained across station changes

pub mod config;
pub mod error;
pub mod player;
pub mod state;

pub use config::PlayerConfig;
pub use error::{PlaybackError, Result};
pub use player::{StreamPlayer, STREAM_ERROR_MESSAGE, STREAM_OFFLINE_MESSAGE};
pub use state::PlaybackState;
