//! # Repository Pattern Implementation
//!
//! Repositories persist user data through the host [`SettingsStore`](bridge_traits::SettingsStore).
//! Structured values are stored as JSON strings.
//!
//! ## Available Repositories
//!
//! - `FavoritesRepository` - Favorite stations with their tone snapshot
//! - `CustomPodcastRepository` - Podcasts added by the user
//! - `PreferencesRepository` - Theme flag and persisted volumes

pub mod favorites;
pub mod podcasts;
pub mod preferences;

pub use favorites::{FavoritesRepository, SettingsFavoritesRepository, FAVORITES_KEY_PREFIX};
pub use podcasts::{CustomPodcastRepository, SettingsCustomPodcastRepository, CUSTOM_PODCASTS_KEY};
pub use preferences::PreferencesRepository;
