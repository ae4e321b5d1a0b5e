//! # Now-Playing Metadata
//!
//! Answers "what is on air right now" for internet radio stations and
//! everything derived from it.
//!
//! ## Overview
//!
//! This module handles:
//! - Current track lookup through an ordered provider chain ([`MetadataResolver`])
//! - Album artwork search with an in-memory cache ([`CoverArtResolver`])
//! - Podcast feed and page resolution to a playable audio URL ([`PodcastUrlResolver`])
//! - Search links for music streaming services ([`music_service_links`])
//!
//! All network access goes through the `HttpClient` bridge. Lookups are
//! best-effort: failures are logged and surface as "no data" rather than
//! errors.

pub mod artwork;
pub mod error;
pub mod fetch;
pub mod links;
pub mod podcast;
pub mod providers;
pub mod resolver;
pub mod song;

pub use artwork::CoverArtResolver;
pub use error::{MetadataError, Result};
pub use fetch::{relay_url, HttpFetcher};
pub use links::music_service_links;
pub use podcast::{is_direct_audio, PodcastUrlResolver};
pub use providers::{IcyProvider, LautFmProvider, NowPlayingProvider, RegiocastProvider};
pub use resolver::MetadataResolver;
pub use song::{is_blacklisted, parse_song, TrackMetadata, BLACKLIST};
