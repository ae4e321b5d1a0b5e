//! # Library Module
//!
//! Station and podcast catalogs plus everything the player remembers between
//! sessions.
//!
//! ## Overview
//!
//! This module manages:
//! - The injected station catalog with genre/search filtering and wrap-around navigation
//! - Built-in and user-added podcasts
//! - Favorites, each carrying a snapshot of the tones that were active
//! - User preferences (theme, radio volume, tone master volume)
//!
//! Persistence goes through the host's [`bridge_traits::SettingsStore`]; values
//! are stored as JSON strings under stable keys.

pub mod catalog;
pub mod error;
pub mod models;
pub mod repositories;

pub use catalog::{
    default_podcasts, PodcastCatalog, StationCatalog, StationFilter, ALL_GENRES, MAX_NAME_WORDS,
};
pub use error::{LibraryError, Result};
pub use models::{FavoriteStation, Podcast, Station, CUSTOM_PODCAST_GENRE, PODCAST_GENRE};
pub use repositories::{
    CustomPodcastRepository, FavoritesRepository, PreferencesRepository,
    SettingsCustomPodcastRepository, SettingsFavoritesRepository,
};
