//! # Station and Podcast Catalogs
//!
//! The station catalog is injected by the host and never changes at runtime.
//! Browsing works on a filtered view: stations whose names are longer than
//! [`MAX_NAME_WORDS`] words are hidden, then the genre and search filters
//! apply. Next/previous navigation wraps around inside that view.
//!
//! The podcast catalog combines the built-in list with podcasts the user
//! added, which live in a [`CustomPodcastRepository`].

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Podcast, Station, CUSTOM_PODCAST_GENRE};
use crate::repositories::CustomPodcastRepository;

/// Genre filter value that matches every station.
pub const ALL_GENRES: &str = "Alle";

/// Stations with longer names are hidden from browsing.
pub const MAX_NAME_WORDS: usize = 5;

/// Genre and search filter for browsing stations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationFilter {
    pub genre: String,
    pub search: String,
}

impl Default for StationFilter {
    fn default() -> Self {
        Self {
            genre: ALL_GENRES.to_string(),
            search: String::new(),
        }
    }
}

impl StationFilter {
    pub fn genre(genre: impl Into<String>) -> Self {
        Self {
            genre: genre.into(),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    fn matches(&self, station: &Station) -> bool {
        if station.name_word_count() > MAX_NAME_WORDS {
            return false;
        }

        let genre = self.genre.trim();
        let matches_genre = genre.is_empty()
            || genre == ALL_GENRES
            || station
                .genre
                .to_lowercase()
                .contains(&genre.to_lowercase());

        let matches_search = station
            .name
            .to_lowercase()
            .contains(&self.search.trim().to_lowercase());

        matches_genre && matches_search
    }
}

/// Immutable list of radio stations
#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    stations: Vec<Station>,
}

impl StationCatalog {
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn get(&self, url: &str) -> Option<&Station> {
        self.stations.iter().find(|station| station.url == url)
    }

    pub fn filter(&self, filter: &StationFilter) -> Vec<&Station> {
        self.stations
            .iter()
            .filter(|station| filter.matches(station))
            .collect()
    }

    /// "Alle" followed by every distinct genre in first-seen order.
    pub fn genres(&self) -> Vec<String> {
        let mut genres = vec![ALL_GENRES.to_string()];
        for genre in self.stations.iter().flat_map(Station::genres) {
            if !genres.iter().any(|known| known == genre) {
                genres.push(genre.to_string());
            }
        }
        genres
    }

    /// Station after `current_url` in the filtered view, wrapping to the first.
    ///
    /// An unknown or absent current station yields the first station.
    pub fn next_after(&self, current_url: Option<&str>, filter: &StationFilter) -> Option<&Station> {
        let view = self.filter(filter);
        if view.is_empty() {
            return None;
        }

        let next = match position_in(&view, current_url) {
            Some(index) => (index + 1) % view.len(),
            None => 0,
        };
        Some(view[next])
    }

    /// Station before `current_url` in the filtered view, wrapping to the last.
    ///
    /// An unknown or absent current station yields the last station.
    pub fn previous_before(
        &self,
        current_url: Option<&str>,
        filter: &StationFilter,
    ) -> Option<&Station> {
        let view = self.filter(filter);
        if view.is_empty() {
            return None;
        }

        let previous = match position_in(&view, current_url) {
            Some(index) => (index + view.len() - 1) % view.len(),
            None => view.len() - 1,
        };
        Some(view[previous])
    }
}

fn position_in(view: &[&Station], url: Option<&str>) -> Option<usize> {
    let url = url?;
    view.iter().position(|station| station.url == url)
}

/// The podcasts that ship with the player.
pub fn default_podcasts() -> Vec<Podcast> {
    vec![
        Podcast::new("Meditation für jeden Tag", "https://paulinathurm.libsyn.com/rss", "Meditation"),
        Podcast::new(
            "Koala Mind - Meditation",
            "https://feeds.acast.com/public/shows/koala-mind-meditation-achtsamkeit",
            "Achtsamkeit",
        ),
        Podcast::new(
            "Bleib entspannt! Meditation",
            "https://bleib-entspannt.podigee.io/feed/mp3",
            "Entspannung",
        ),
        Podcast::new(
            "Hypnose & Entspannung",
            "https://hypnose-entspannung.podigee.io/feed/mp3",
            "Hypnose",
        ),
        Podcast::new("LOSLEBEN - Hypnose", "https://me-time.podigee.io/feed/mp3", "Hypnose"),
        Podcast::new(
            "Einschlafen mit Meditation",
            "https://einschlafen-mit-meditation.podigee.io/feed/mp3",
            "Schlaf",
        ),
        Podcast::new(
            "Mindful Minutes",
            "https://7v9p9z.podcaster.de/mindfulminutes.rss",
            "Achtsamkeit",
        ),
        Podcast::new("7Mind Podcast", "https://7mind.podigee.io/feed/mp3", "Meditation"),
    ]
}

/// Built-in podcasts plus the user's own
pub struct PodcastCatalog {
    defaults: Vec<Podcast>,
    custom: Arc<dyn CustomPodcastRepository>,
}

impl PodcastCatalog {
    pub fn new(defaults: Vec<Podcast>, custom: Arc<dyn CustomPodcastRepository>) -> Self {
        Self { defaults, custom }
    }

    /// Catalog with the built-in podcast list.
    pub fn with_defaults(custom: Arc<dyn CustomPodcastRepository>) -> Self {
        Self::new(default_podcasts(), custom)
    }

    pub fn defaults(&self) -> &[Podcast] {
        &self.defaults
    }

    /// Built-in podcasts followed by custom ones
    pub async fn all(&self) -> Result<Vec<Podcast>> {
        let mut all = self.defaults.clone();
        all.extend(self.custom.list().await?);
        Ok(all)
    }

    pub async fn custom(&self) -> Result<Vec<Podcast>> {
        self.custom.list().await
    }

    pub async fn is_custom(&self, url: &str) -> Result<bool> {
        self.custom.contains(url).await
    }

    /// Add a user podcast. Name and URL are trimmed.
    pub async fn add_custom(&self, name: &str, url: &str) -> Result<Vec<Podcast>> {
        let podcast = Podcast::new(name.trim(), url.trim(), CUSTOM_PODCAST_GENRE);
        self.custom.add(podcast).await
    }

    pub async fn remove_custom(&self, url: &str) -> Result<Vec<Podcast>> {
        self.custom.remove(url).await
    }
}
