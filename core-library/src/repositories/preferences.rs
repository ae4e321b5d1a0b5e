//! User preferences: theme flag and persisted volumes

use std::sync::Arc;

use bridge_traits::SettingsStore;

use crate::error::Result;

const DARK_MODE_KEY: &str = "darkMode";
const RADIO_VOLUME_KEY: &str = "radioVolume";
const TONE_MASTER_VOLUME_KEY: &str = "toneMasterVolume";

/// Typed access to the preference keys.
pub struct PreferencesRepository {
    store: Arc<dyn SettingsStore>,
}

impl PreferencesRepository {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Whether the dark theme is active. Defaults to false.
    pub async fn dark_mode(&self) -> Result<bool> {
        Ok(self.store.get_bool(DARK_MODE_KEY).await?.unwrap_or(false))
    }

    pub async fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.store.set_bool(DARK_MODE_KEY, enabled).await?;
        Ok(())
    }

    /// Flip the theme flag and return the new value.
    pub async fn toggle_dark_mode(&self) -> Result<bool> {
        let enabled = !self.dark_mode().await?;
        self.set_dark_mode(enabled).await?;
        Ok(enabled)
    }

    /// Last radio volume, if one was saved.
    pub async fn radio_volume(&self) -> Result<Option<f32>> {
        Ok(self
            .store
            .get_f64(RADIO_VOLUME_KEY)
            .await?
            .map(|v| (v as f32).clamp(0.0, 1.0)))
    }

    pub async fn set_radio_volume(&self, volume: f32) -> Result<()> {
        self.store
            .set_f64(RADIO_VOLUME_KEY, f64::from(volume))
            .await?;
        Ok(())
    }

    /// Last tone master volume, if one was saved.
    pub async fn tone_master_volume(&self) -> Result<Option<f32>> {
        Ok(self
            .store
            .get_f64(TONE_MASTER_VOLUME_KEY)
            .await?
            .map(|v| (v as f32).clamp(0.0, 1.0)))
    }

    pub async fn set_tone_master_volume(&self, volume: f32) -> Result<()> {
        self.store
            .set_f64(TONE_MASTER_VOLUME_KEY, f64::from(volume))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::SqliteSettingsStore;

    async fn setup() -> PreferencesRepository {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        PreferencesRepository::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_dark_mode_toggle() {
        let prefs = setup().await;
        assert!(!prefs.dark_mode().await.unwrap());
        assert!(prefs.toggle_dark_mode().await.unwrap());
        assert!(prefs.dark_mode().await.unwrap());
        assert!(!prefs.toggle_dark_mode().await.unwrap());
    }

    #[tokio::test]
    async fn test_volumes_round_trip() {
        let prefs = setup().await;
        assert_eq!(prefs.radio_volume().await.unwrap(), None);

        prefs.set_radio_volume(0.75).await.unwrap();
        prefs.set_tone_master_volume(0.25).await.unwrap();

        assert_eq!(prefs.radio_volume().await.unwrap(), Some(0.75));
        assert_eq!(prefs.tone_master_volume().await.unwrap(), Some(0.25));
    }
}
