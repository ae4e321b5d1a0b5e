//! Favorites repository trait and implementation

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::SettingsStore;
use tracing::warn;

use crate::error::{LibraryError, Result};
use crate::models::FavoriteStation;

/// Key prefix of favorite entries; the station URL follows it.
pub const FAVORITES_KEY_PREFIX: &str = "favorites:";

/// Favorites repository interface
#[async_trait]
pub trait FavoritesRepository: Send + Sync {
    /// Insert or replace the favorite with the same URL
    async fn add(&self, favorite: &FavoriteStation) -> Result<()>;

    /// Remove a favorite
    ///
    /// # Returns
    /// - `Ok(true)` if the favorite was removed
    /// - `Ok(false)` if it did not exist
    async fn remove(&self, url: &str) -> Result<bool>;

    /// Find a favorite by station URL
    async fn get(&self, url: &str) -> Result<Option<FavoriteStation>>;

    /// All favorites ordered by URL
    async fn list(&self) -> Result<Vec<FavoriteStation>>;

    async fn is_favorite(&self, url: &str) -> Result<bool>;
}

/// Favorites stored as one JSON value per station
pub struct SettingsFavoritesRepository {
    store: Arc<dyn SettingsStore>,
}

impl SettingsFavoritesRepository {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    fn key(url: &str) -> String {
        format!("{}{}", FAVORITES_KEY_PREFIX, url)
    }

    fn decode(key: &str, raw: &str) -> Result<FavoriteStation> {
        serde_json::from_str(raw).map_err(|e| LibraryError::CorruptData {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl FavoritesRepository for SettingsFavoritesRepository {
    async fn add(&self, favorite: &FavoriteStation) -> Result<()> {
        favorite
            .station
            .validate()
            .map_err(|message| LibraryError::InvalidInput {
                field: "station".to_string(),
                message,
            })?;

        let json = serde_json::to_string(favorite).map_err(|e| LibraryError::InvalidInput {
            field: "favorite".to_string(),
            message: e.to_string(),
        })?;

        self.store.set_string(&Self::key(favorite.url()), &json).await?;
        Ok(())
    }

    async fn remove(&self, url: &str) -> Result<bool> {
        let key = Self::key(url);
        if !self.store.has_key(&key).await? {
            return Ok(false);
        }

        self.store.delete(&key).await?;
        Ok(true)
    }

    async fn get(&self, url: &str) -> Result<Option<FavoriteStation>> {
        let key = Self::key(url);
        match self.store.get_string(&key).await? {
            Some(raw) => Ok(Some(Self::decode(&key, &raw)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<FavoriteStation>> {
        let mut keys: Vec<String> = self
            .store
            .list_keys()
            .await?
            .into_iter()
            .filter(|key| key.starts_with(FAVORITES_KEY_PREFIX))
            .collect();
        keys.sort();

        let mut favorites = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(raw) = self.store.get_string(&key).await? else {
                continue;
            };

            // One unreadable entry must not hide the others
            match Self::decode(&key, &raw) {
                Ok(favorite) => favorites.push(favorite),
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable favorite"),
            }
        }

        Ok(favorites)
    }

    async fn is_favorite(&self, url: &str) -> Result<bool> {
        Ok(self.store.has_key(&Self::key(url)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Station;
    use bridge_desktop::SqliteSettingsStore;
    use bridge_traits::BridgeError;
    use core_tones::ActiveTone;
    use mockall::mock;

    mock! {
        Store {}

        #[async_trait]
        impl SettingsStore for Store {
            async fn set_string(&self, key: &str, value: &str) -> bridge_traits::error::Result<()>;
            async fn get_string(&self, key: &str) -> bridge_traits::error::Result<Option<String>>;
            async fn set_bool(&self, key: &str, value: bool) -> bridge_traits::error::Result<()>;
            async fn get_bool(&self, key: &str) -> bridge_traits::error::Result<Option<bool>>;
            async fn set_f64(&self, key: &str, value: f64) -> bridge_traits::error::Result<()>;
            async fn get_f64(&self, key: &str) -> bridge_traits::error::Result<Option<f64>>;
            async fn delete(&self, key: &str) -> bridge_traits::error::Result<()>;
            async fn has_key(&self, key: &str) -> bridge_traits::error::Result<bool>;
            async fn list_keys(&self) -> bridge_traits::error::Result<Vec<String>>;
            async fn clear_all(&self) -> bridge_traits::error::Result<()>;
        }
    }

    async fn setup_repo() -> SettingsFavoritesRepository {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        SettingsFavoritesRepository::new(Arc::new(store))
    }

    fn favorite(url: &str, name: &str) -> FavoriteStation {
        FavoriteStation::new(
            Station::new(url, name, "Chillout"),
            vec![ActiveTone {
                id: "528".to_string(),
                target_volume: 0.25,
            }],
        )
    }

    #[tokio::test]
    async fn test_add_get_remove() {
        let repo = setup_repo().await;
        let fav = favorite("https://stream.laut.fm/lofi", "Lofi");

        repo.add(&fav).await.unwrap();
        assert!(repo.is_favorite(&fav.station.url).await.unwrap());
        assert_eq!(repo.get(&fav.station.url).await.unwrap(), Some(fav.clone()));

        assert!(repo.remove(&fav.station.url).await.unwrap());
        assert!(!repo.remove(&fav.station.url).await.unwrap());
        assert!(repo.get(&fav.station.url).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_replaces_same_url() {
        let repo = setup_repo().await;
        repo.add(&favorite("https://a", "Old")).await.unwrap();
        repo.add(&favorite("https://a", "New")).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].station.name, "New");
    }

    #[tokio::test]
    async fn test_list_ignores_other_keys_and_corrupt_entries() {
        let store = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());
        let repo = SettingsFavoritesRepository::new(store.clone());

        repo.add(&favorite("https://b", "B")).await.unwrap();
        repo.add(&favorite("https://a", "A")).await.unwrap();
        store.set_bool("darkMode", true).await.unwrap();
        store.set_string("favorites:https://broken", "{not json").await.unwrap();

        let urls: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.station.url)
            .collect();
        assert_eq!(urls, vec!["https://a".to_string(), "https://b".to_string()]);

        assert!(matches!(
            repo.get("https://broken").await,
            Err(LibraryError::CorruptData { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejects_station_without_url() {
        let repo = setup_repo().await;
        let result = repo.add(&favorite("", "Nameless")).await;
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_persistence_error() {
        let mut store = MockStore::new();
        store
            .expect_set_string()
            .returning(|_, _| Err(BridgeError::StorageError("disk full".to_string())));

        let repo = SettingsFavoritesRepository::new(Arc::new(store));
        let result = repo.add(&favorite("https://a", "A")).await;

        match result {
            Err(LibraryError::Persistence(message)) => assert!(message.contains("disk full")),
            other => panic!("expected persistence error, got {:?}", other),
        }
    }
}
