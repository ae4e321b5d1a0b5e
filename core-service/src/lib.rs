//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, settings,
//! media element, tone output) into the shared Rust core and exposes the
//! operations a focus radio UI needs: stations and podcasts, playback, tones,
//! favorites and preferences. Desktop apps typically enable the
//! `desktop-shims` feature (which depends on `bridge-desktop`) and call
//! [`bootstrap_desktop`].

pub mod error;
pub mod orchestrator;

pub use error::{CoreError, Result};
pub use orchestrator::{Lookups, PlaybackOrchestrator};

use std::sync::Arc;

use bridge_traits::{AudioOutput, MediaElement};
use core_library::{
    default_podcasts, Podcast, PodcastCatalog, PreferencesRepository, SettingsCustomPodcastRepository,
    SettingsFavoritesRepository, Station, StationCatalog, StationFilter,
};
use core_playback::{PlayerConfig, StreamPlayer};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, Receiver};
use core_tones::{ToneCatalog, ToneConfig, ToneEngine};
use tracing::{info, warn};

#[cfg(feature = "desktop-shims")]
use std::path::PathBuf;

const EVENT_BUFFER_SIZE: usize = 256;

/// Everything the core needs from the host.
pub struct CoreDependencies {
    pub config: CoreConfig,
    pub media_element: Arc<dyn MediaElement>,
    pub tone_output: Arc<dyn AudioOutput>,
    pub stations: Vec<Station>,
    pub podcasts: Vec<Podcast>,
    pub player_config: PlayerConfig,
    pub tone_config: ToneConfig,
}

impl CoreDependencies {
    /// Construct a dependency bundle with an empty station list and the
    /// built-in podcasts.
    pub fn new(
        config: CoreConfig,
        media_element: Arc<dyn MediaElement>,
        tone_output: Arc<dyn AudioOutput>,
    ) -> Self {
        Self {
            config,
            media_element,
            tone_output,
            stations: Vec::new(),
            podcasts: default_podcasts(),
            player_config: PlayerConfig::default(),
            tone_config: ToneConfig::default(),
        }
    }

    pub fn with_stations(mut self, stations: Vec<Station>) -> Self {
        self.stations = stations;
        self
    }

    /// Replace the built-in podcasts. Custom podcasts are still appended.
    pub fn with_podcasts(mut self, podcasts: Vec<Podcast>) -> Self {
        self.podcasts = podcasts;
        self
    }

    pub fn with_player_config(mut self, config: PlayerConfig) -> Self {
        self.player_config = config;
        self
    }

    pub fn with_tone_config(mut self, config: ToneConfig) -> Self {
        self.tone_config = config;
        self
    }
}

/// Primary façade exposed to host applications.
pub struct CoreService {
    playback: PlaybackOrchestrator,
    stations: StationCatalog,
    podcasts: PodcastCatalog,
    preferences: PreferencesRepository,
}

impl CoreService {
    /// Build the core from `deps` and restore the saved volumes.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(deps: CoreDependencies) -> Result<Self> {
        deps.tone_config
            .validate()
            .map_err(CoreError::InitializationFailed)?;

        let config = deps.config;
        let store = Arc::clone(&config.settings_store);
        let events = EventBus::new(EVENT_BUFFER_SIZE);

        let player = Arc::new(StreamPlayer::new(
            deps.media_element,
            events.clone(),
            deps.player_config,
        )?);
        let tones = Arc::new(ToneEngine::new(
            ToneCatalog::default(),
            deps.tone_output,
            deps.tone_config,
        ));
        let lookups = Lookups::from_config(
            Arc::clone(&config.http_client),
            &config.metadata_api_config,
            &config.features,
        );

        let playback = PlaybackOrchestrator::new(
            player,
            tones,
            lookups,
            Arc::new(SettingsFavoritesRepository::new(Arc::clone(&store))),
            events,
            &config.features,
        )?;

        let service = Self {
            playback,
            stations: StationCatalog::new(deps.stations),
            podcasts: PodcastCatalog::new(
                deps.podcasts,
                Arc::new(SettingsCustomPodcastRepository::new(Arc::clone(&store))),
            ),
            preferences: PreferencesRepository::new(store),
        };

        service.restore_preferences().await;
        info!(
            stations = service.stations.stations().len(),
            "Core service started"
        );
        Ok(service)
    }

    async fn restore_preferences(&self) {
        match self.preferences.radio_volume().await {
            Ok(Some(volume)) => {
                self.playback.set_volume(volume);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not restore radio volume"),
        }

        match self.preferences.tone_master_volume().await {
            Ok(Some(volume)) => {
                self.playback.tones().set_master_volume(volume);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not restore tone master volume"),
        }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.playback.events().subscribe()
    }

    /// Playback, tones and favorites.
    pub fn playback(&self) -> &PlaybackOrchestrator {
        &self.playback
    }

    // ========================================================================
    // Stations
    // ========================================================================

    pub fn stations(&self, filter: &StationFilter) -> Vec<Station> {
        self.stations.filter(filter).into_iter().cloned().collect()
    }

    pub fn genres(&self) -> Vec<String> {
        self.stations.genres()
    }

    /// Play the station after the current one in the filtered list, wrapping.
    ///
    /// Returns the station that was started, or `None` for an empty list.
    pub async fn next_station(&self, filter: &StationFilter) -> Result<Option<Station>> {
        let current = self.playback.current_station();
        let next = self
            .stations
            .next_after(current.as_ref().map(|s| s.url.as_str()), filter)
            .cloned();
        self.start_station(next).await
    }

    /// Play the station before the current one in the filtered list, wrapping.
    pub async fn previous_station(&self, filter: &StationFilter) -> Result<Option<Station>> {
        let current = self.playback.current_station();
        let previous = self
            .stations
            .previous_before(current.as_ref().map(|s| s.url.as_str()), filter)
            .cloned();
        self.start_station(previous).await
    }

    async fn start_station(&self, station: Option<Station>) -> Result<Option<Station>> {
        let Some(station) = station else {
            return Ok(None);
        };
        self.playback.play_station(station.clone()).await?;
        Ok(Some(station))
    }

    // ========================================================================
    // Podcasts
    // ========================================================================

    /// Built-in podcasts followed by the user's own.
    pub async fn podcasts(&self) -> Result<Vec<Podcast>> {
        Ok(self.podcasts.all().await?)
    }

    pub async fn is_custom_podcast(&self, url: &str) -> Result<bool> {
        Ok(self.podcasts.is_custom(url).await?)
    }

    /// Save a user podcast and return the custom list.
    pub async fn add_custom_podcast(&self, name: &str, url: &str) -> Result<Vec<Podcast>> {
        let custom = self.podcasts.add_custom(name, url).await?;
        self.emit(LibraryEvent::PodcastAdded {
            podcast_url: url.trim().to_string(),
        });
        Ok(custom)
    }

    /// Remove a user podcast and return the custom list.
    pub async fn remove_custom_podcast(&self, url: &str) -> Result<Vec<Podcast>> {
        let custom = self.podcasts.remove_custom(url).await?;
        self.emit(LibraryEvent::PodcastRemoved {
            podcast_url: url.to_string(),
        });
        Ok(custom)
    }

    pub async fn play_podcast(&self, podcast: &Podcast) -> Result<()> {
        self.playback.play_podcast(podcast).await
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    /// Set and persist the stream volume.
    pub async fn set_volume(&self, volume: f32) -> Result<f32> {
        let volume = self.playback.set_volume(volume);
        self.preferences.set_radio_volume(volume).await?;
        Ok(volume)
    }

    /// Set and persist the tone master volume.
    pub async fn set_tone_master_volume(&self, volume: f32) -> Result<f32> {
        let volume = self.playback.set_tone_master_volume(volume);
        self.preferences.set_tone_master_volume(volume).await?;
        Ok(volume)
    }

    pub async fn dark_mode(&self) -> Result<bool> {
        Ok(self.preferences.dark_mode().await?)
    }

    pub async fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.preferences.set_dark_mode(enabled).await?;
        self.emit(LibraryEvent::ThemeChanged { dark_mode: enabled });
        Ok(())
    }

    /// Flip the theme and return the new value.
    pub async fn toggle_dark_mode(&self) -> Result<bool> {
        let enabled = self.preferences.toggle_dark_mode().await?;
        self.emit(LibraryEvent::ThemeChanged { dark_mode: enabled });
        Ok(enabled)
    }

    fn emit(&self, event: LibraryEvent) {
        self.playback.events().emit(CoreEvent::Library(event)).ok();
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Opens (or creates) the SQLite settings database at `settings_path` and
/// uses reqwest for HTTP, a network media element for streams and the
/// default cpal device for tones.
///
/// ```ignore
/// let core = core_service::bootstrap_desktop("/tmp/focus-radio/settings.db", stations).await?;
/// core.playback().enable_tone("528")?;
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(
    settings_path: impl Into<PathBuf>,
    stations: Vec<Station>,
) -> Result<CoreService> {
    use bridge_desktop::{CpalToneOutput, NetworkMediaElement, SqliteSettingsStore};

    let settings_path = settings_path.into();
    let store = SqliteSettingsStore::new(settings_path.clone()).await?;
    let config = CoreConfig::builder()
        .settings_path(settings_path)
        .settings_store(Arc::new(store))
        .build()?;

    let media_element = Arc::new(NetworkMediaElement::new());
    let tone_output = Arc::new(CpalToneOutput::new()?);

    CoreService::start(CoreDependencies::new(config, media_element, tone_output).with_stations(stations))
        .await
}
