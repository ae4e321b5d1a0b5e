//! Custom podcast repository

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::SettingsStore;

use crate::error::{LibraryError, Result};
use crate::models::Podcast;

/// Settings key holding the JSON array of custom podcasts.
pub const CUSTOM_PODCASTS_KEY: &str = "customPodcasts";

/// Podcasts added by the user
#[async_trait]
pub trait CustomPodcastRepository: Send + Sync {
    /// All custom podcasts in insertion order
    async fn list(&self) -> Result<Vec<Podcast>>;

    /// Append a podcast. An existing entry with the same URL is replaced in place.
    async fn add(&self, podcast: Podcast) -> Result<Vec<Podcast>>;

    /// Remove the podcast with this URL, returning the remaining list.
    async fn remove(&self, url: &str) -> Result<Vec<Podcast>>;

    async fn contains(&self, url: &str) -> Result<bool>;
}

/// Custom podcasts stored as a single JSON array
pub struct SettingsCustomPodcastRepository {
    store: Arc<dyn SettingsStore>,
}

impl SettingsCustomPodcastRepository {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    async fn save(&self, podcasts: &[Podcast]) -> Result<()> {
        let json = serde_json::to_string(podcasts).map_err(|e| LibraryError::InvalidInput {
            field: "podcasts".to_string(),
            message: e.to_string(),
        })?;
        self.store.set_string(CUSTOM_PODCASTS_KEY, &json).await?;
        Ok(())
    }
}

#[async_trait]
impl CustomPodcastRepository for SettingsCustomPodcastRepository {
    async fn list(&self) -> Result<Vec<Podcast>> {
        match self.store.get_string(CUSTOM_PODCASTS_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| LibraryError::CorruptData {
                key: CUSTOM_PODCASTS_KEY.to_string(),
                message: e.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn add(&self, podcast: Podcast) -> Result<Vec<Podcast>> {
        podcast
            .validate()
            .map_err(|message| LibraryError::InvalidInput {
                field: "podcast".to_string(),
                message,
            })?;

        let mut podcasts = self.list().await?;
        match podcasts.iter_mut().find(|existing| existing.url == podcast.url) {
            Some(existing) => *existing = podcast,
            None => podcasts.push(podcast),
        }

        self.save(&podcasts).await?;
        Ok(podcasts)
    }

    async fn remove(&self, url: &str) -> Result<Vec<Podcast>> {
        let mut podcasts = self.list().await?;
        let before = podcasts.len();
        podcasts.retain(|podcast| podcast.url != url);

        if podcasts.len() != before {
            self.save(&podcasts).await?;
        }
        Ok(podcasts)
    }

    async fn contains(&self, url: &str) -> Result<bool> {
        Ok(self.list().await?.iter().any(|podcast| podcast.url == url))
    }
}
