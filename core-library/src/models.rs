//! Domain models for stations, podcasts and favorites
//!
//! Stations and podcasts are immutable descriptors identified by their URL.
//! The serialized shape matches what the player has always stored, so
//! favorites saved by earlier versions keep loading.

use core_tones::ActiveTone;
use serde::{Deserialize, Serialize};

// =============================================================================
// Station
// =============================================================================

/// Internet radio station descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Stream URL, also the station's identity
    pub url: String,
    /// Display name
    pub name: String,
    /// One or more comma-separated genres
    #[serde(default)]
    pub genre: String,
    /// Logo URL
    #[serde(default)]
    pub image: Option<String>,
}

impl Station {
    pub fn new(url: impl Into<String>, name: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            genre: genre.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Logo URL, treating an empty string as absent
    pub fn artwork(&self) -> Option<&str> {
        self.image.as_deref().filter(|image| !image.trim().is_empty())
    }

    /// Individual genres, trimmed, empty entries dropped
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre
            .split(',')
            .map(str::trim)
            .filter(|genre| !genre.is_empty())
    }

    /// Number of whitespace-separated words in the name
    pub fn name_word_count(&self) -> usize {
        self.name.split_whitespace().count()
    }

    /// Validate station data
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("Station URL cannot be empty".to_string());
        }

        if self.name.trim().is_empty() {
            return Err("Station name cannot be empty".to_string());
        }

        Ok(())
    }
}

// =============================================================================
// Podcast
// =============================================================================

/// Genre assigned to podcasts added by the user
pub const CUSTOM_PODCAST_GENRE: &str = "Benutzerdefiniert";

/// Genre of the descriptor handed to the player for podcast episodes
pub const PODCAST_GENRE: &str = "Podcast";

/// Podcast feed or page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Podcast {
    pub name: String,
    /// Feed, page or direct audio URL
    pub url: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Podcast {
    pub fn new(name: impl Into<String>, url: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            genre: genre.into(),
            image: None,
        }
    }

    /// Descriptor for playing `audio_url` (the resolved episode) in the stream player
    pub fn to_station(&self, audio_url: impl Into<String>) -> Station {
        Station {
            url: audio_url.into(),
            name: self.name.clone(),
            genre: PODCAST_GENRE.to_string(),
            image: self.image.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Podcast name cannot be empty".to_string());
        }

        if self.url.trim().is_empty() {
            return Err("Podcast URL cannot be empty".to_string());
        }

        Ok(())
    }
}

// =============================================================================
// Favorite
// =============================================================================

/// A saved station together with the tones that were playing when it was saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteStation {
    #[serde(flatten)]
    pub station: Station,
    #[serde(default)]
    pub frequencies: Vec<ActiveTone>,
}

impl FavoriteStation {
    pub fn new(station: Station, frequencies: Vec<ActiveTone>) -> Self {
        Self {
            station,
            frequencies,
        }
    }

    pub fn url(&self) -> &str {
        &self.station.url
    }

    pub fn has_frequencies(&self) -> bool {
        !self.frequencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_genres_split_and_trim() {
        let station = Station::new("https://a", "Chill Radio", "Lounge, Chillout,, Jazz ");
        let genres: Vec<&str> = station.genres().collect();
        assert_eq!(genres, vec!["Lounge", "Chillout", "Jazz"]);
    }

    #[test]
    fn test_empty_image_is_not_artwork() {
        let station = Station::new("https://a", "A", "Pop").with_image("");
        assert_eq!(station.artwork(), None);

        let station = Station::new("https://a", "A", "Pop").with_image("https://img/a.png");
        assert_eq!(station.artwork(), Some("https://img/a.png"));
    }

    #[test]
    fn test_station_validation() {
        assert!(Station::new("", "A", "Pop").validate().is_err());
        assert!(Station::new("https://a", "  ", "Pop").validate().is_err());
        assert!(Station::new("https://a", "A", "").validate().is_ok());
    }

    #[test]
    fn test_podcast_to_station() {
        let podcast = Podcast::new("7Mind Podcast", "https://7mind.podigee.io/feed/mp3", "Meditation");
        let station = podcast.to_station("https://cdn/episode.mp3");
        assert_eq!(station.url, "https://cdn/episode.mp3");
        assert_eq!(station.name, "7Mind Podcast");
        assert_eq!(station.genre, PODCAST_GENRE);
    }

    #[test]
    fn test_favorite_serialized_flat() {
        let favorite = FavoriteStation::new(
            Station::new("https://a", "A", "Pop"),
            vec![ActiveTone {
                id: "528".to_string(),
                target_volume: 0.3,
            }],
        );

        let json = serde_json::to_value(&favorite).unwrap();
        assert_eq!(json["url"], "https://a");
        assert_eq!(json["frequencies"][0]["id"], "528");

        // Entries saved without tones still load
        let legacy: FavoriteStation =
            serde_json::from_str(r#"{"url":"https://b","name":"B","genre":"Rock","image":""}"#)
                .unwrap();
        assert!(!legacy.has_frequencies());
        assert_eq!(legacy.station.artwork(), None);
    }
}
