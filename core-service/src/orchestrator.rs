//! # Playback Orchestrator
//!
//! Ties the stream player, the tone engine, the metadata lookups and the
//! favorites store together.
//!
//! A listener task consumes [`PlayerEvent::RequestMetadata`] from the event
//! bus. For each request it resolves the current track, looks up cover art
//! (falling back to the station logo) and publishes
//! [`PlayerEvent::Metadata`]. Each lookup runs as its own task; a request for
//! a newer load aborts the previous one, and a poll that arrives while a
//! lookup for the same load is still running is skipped. The player's load
//! token is also checked after every lookup, so a request that was overtaken
//! by a new `load` or `stop` never publishes anything.

use std::sync::Arc;

use bridge_traits::HttpClient;
use core_library::{FavoriteStation, FavoritesRepository, Podcast, Station};
use core_metadata::{
    music_service_links, CoverArtResolver, MetadataResolver, PodcastUrlResolver, TrackMetadata,
};
use core_playback::{PlaybackError, PlaybackState, StreamPlayer};
use core_runtime::config::{FeatureFlags, MetadataApiConfig};
use core_runtime::events::{
    CoreEvent, EventBus, EventStream, LibraryEvent, PlayerEvent, Receiver, RecvError, ToneEvent,
};
use core_runtime::logging::strip_query;
use core_tones::{ActiveTone, ToneEngine};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};

/// Network lookups used while playing
pub struct Lookups {
    pub metadata: MetadataResolver,
    pub cover_art: CoverArtResolver,
    pub podcasts: PodcastUrlResolver,
}

impl Lookups {
    pub fn from_config(
        http_client: Arc<dyn HttpClient>,
        config: &MetadataApiConfig,
        features: &FeatureFlags,
    ) -> Self {
        Self {
            metadata: MetadataResolver::with_default_providers(
                Arc::clone(&http_client),
                config,
                features,
            ),
            cover_art: CoverArtResolver::from_config(Arc::clone(&http_client), config),
            podcasts: PodcastUrlResolver::from_config(http_client, config),
        }
    }
}

struct Shared {
    player: Arc<StreamPlayer>,
    tones: Arc<ToneEngine>,
    lookups: Lookups,
    favorites: Arc<dyn FavoritesRepository>,
    events: EventBus,
    cover_art_enabled: bool,
}

impl Shared {
    fn emit(&self, event: CoreEvent) {
        self.events.emit(event).ok();
    }

    /// Resolve and publish now-playing metadata for one request.
    ///
    /// Returns the published event, or `None` when the request was stale or
    /// produced nothing worth showing.
    async fn refresh_metadata(&self, station_url: &str, token: u64) -> Option<PlayerEvent> {
        let station = match self.player.current_station() {
            Some(station) if station.url == station_url && self.player.is_current(token) => station,
            _ => {
                debug!(url = %station_url, token, "Ignoring metadata request for a previous load");
                return None;
            }
        };

        let track = self.lookups.metadata.resolve(&station).await;
        if !self.player.is_current(token) {
            debug!(url = %station_url, token, "Discarding metadata for a previous load");
            return None;
        }

        let track = track.filter(|track| !track.is_empty())?;
        let cover_url = self.cover_for(&station, &track).await;
        if !self.player.is_current(token) {
            debug!(url = %station_url, token, "Discarding cover art for a previous load");
            return None;
        }

        info!(station = %station.name, artist = %track.artist, title = %track.title, "Now playing");
        let event = PlayerEvent::Metadata {
            station_url: station.url.clone(),
            links: music_service_links(&track.artist, &track.title),
            artist: track.artist,
            title: track.title,
            cover_url,
        };
        self.emit(CoreEvent::Player(event.clone()));
        Some(event)
    }

    async fn cover_for(&self, station: &Station, track: &TrackMetadata) -> Option<String> {
        let cover = if self.cover_art_enabled {
            self.lookups
                .cover_art
                .resolve(&track.artist, &track.title)
                .await
        } else {
            None
        };
        cover.or_else(|| station.artwork().map(str::to_string))
    }

    fn restore_tone(&self, tone: &ActiveTone) {
        match self.tones.enable(&tone.id) {
            Ok(newly_enabled) => {
                let Some(volume) = self.tones.set_volume(&tone.id, tone.target_volume) else {
                    return;
                };
                let tone_id = tone.id.clone();
                self.emit(CoreEvent::Tones(if newly_enabled {
                    ToneEvent::Enabled { tone_id, volume }
                } else {
                    ToneEvent::VolumeChanged { tone_id, volume }
                }));
            }
            Err(e) => warn!(tone = %tone.id, error = %e, "Skipping tone stored with favorite"),
        }
    }
}

/// Playback, tones, favorites and the metadata pipeline behind one handle.
pub struct PlaybackOrchestrator {
    shared: Arc<Shared>,
    listener: JoinHandle<()>,
}

impl PlaybackOrchestrator {
    /// Wire the parts together and start the metadata listener.
    ///
    /// `events` must be the bus the player publishes on.
    pub fn new(
        player: Arc<StreamPlayer>,
        tones: Arc<ToneEngine>,
        lookups: Lookups,
        favorites: Arc<dyn FavoritesRepository>,
        events: EventBus,
        features: &FeatureFlags,
    ) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| {
            CoreError::InitializationFailed("a tokio runtime is required".to_string())
        })?;

        let receiver = events.subscribe();
        let shared = Arc::new(Shared {
            player,
            tones,
            lookups,
            favorites,
            events,
            cover_art_enabled: features.enable_cover_art,
        });

        let listener = handle.spawn(run_metadata_listener(Arc::clone(&shared), receiver));
        Ok(Self { shared, listener })
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    pub fn player(&self) -> &Arc<StreamPlayer> {
        &self.shared.player
    }

    pub fn tones(&self) -> &Arc<ToneEngine> {
        &self.shared.tones
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Make `station` current and start it.
    pub async fn play_station(&self, station: Station) -> Result<()> {
        self.shared.player.load(station).await?;
        Ok(())
    }

    /// Resolve the episode audio behind `podcast` and play it.
    pub async fn play_podcast(&self, podcast: &Podcast) -> Result<()> {
        let audio_url = self.shared.lookups.podcasts.resolve(&podcast.url).await;
        info!(podcast = %podcast.name, url = %strip_query(&audio_url), "Playing podcast");
        self.play_station(podcast.to_station(audio_url)).await
    }

    pub async fn play(&self) -> Result<()> {
        self.shared.player.play().await?;
        Ok(())
    }

    pub fn pause(&self) {
        self.shared.player.pause();
    }

    pub async fn toggle_playback(&self) -> Result<()> {
        self.shared.player.toggle().await?;
        Ok(())
    }

    /// Stop the stream and fade out every tone.
    pub fn stop(&self) {
        self.shared.player.stop();
        for tone_id in self.shared.tones.stop_all() {
            self.shared
                .emit(CoreEvent::Tones(ToneEvent::Disabled { tone_id }));
        }
    }

    /// Set the stream volume. Returns the applied (clamped) value.
    pub fn set_volume(&self, volume: f32) -> f32 {
        self.shared.player.set_volume(volume)
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.shared.player.state()
    }

    pub fn current_station(&self) -> Option<Station> {
        self.shared.player.current_station()
    }

    /// Resolve metadata for the current load right away.
    ///
    /// The listener does the same for every `RequestMetadata` event.
    pub async fn refresh_metadata(&self) -> Option<PlayerEvent> {
        let station = self.shared.player.current_station()?;
        let token = self.shared.player.load_token();
        self.shared.refresh_metadata(&station.url, token).await
    }

    // ========================================================================
    // Tones
    // ========================================================================

    /// Fade a tone in. Returns `false` when it was already playing.
    pub fn enable_tone(&self, id: &str) -> Result<bool> {
        let enabled = self.shared.tones.enable(id)?;
        if enabled {
            let volume = self
                .shared
                .tones
                .list_active()
                .into_iter()
                .find(|tone| tone.id == id)
                .map(|tone| tone.target_volume)
                .unwrap_or_default();
            self.shared.emit(CoreEvent::Tones(ToneEvent::Enabled {
                tone_id: id.to_string(),
                volume,
            }));
        }
        Ok(enabled)
    }

    /// Fade a tone out. Returns `false` when it was not playing.
    pub fn disable_tone(&self, id: &str) -> bool {
        let disabled = self.shared.tones.disable(id);
        if disabled {
            self.shared.emit(CoreEvent::Tones(ToneEvent::Disabled {
                tone_id: id.to_string(),
            }));
        }
        disabled
    }

    /// Enable a silent tone or disable a playing one. Returns whether it now plays.
    pub fn toggle_tone(&self, id: &str) -> Result<bool> {
        if self.shared.tones.is_active(id) {
            self.disable_tone(id);
            Ok(false)
        } else {
            self.enable_tone(id)
        }
    }

    /// Retarget a playing tone. `None` when the tone is not enabled.
    pub fn set_tone_volume(&self, id: &str, volume: f32) -> Option<f32> {
        let volume = self.shared.tones.set_volume(id, volume)?;
        self.shared.emit(CoreEvent::Tones(ToneEvent::VolumeChanged {
            tone_id: id.to_string(),
            volume,
        }));
        Some(volume)
    }

    pub fn set_tone_master_volume(&self, volume: f32) -> f32 {
        let volume = self.shared.tones.set_master_volume(volume);
        self.shared
            .emit(CoreEvent::Tones(ToneEvent::MasterVolumeChanged { volume }));
        volume
    }

    pub fn active_tones(&self) -> Vec<ActiveTone> {
        self.shared.tones.list_active()
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    pub async fn favorites(&self) -> Result<Vec<FavoriteStation>> {
        Ok(self.shared.favorites.list().await?)
    }

    pub async fn is_favorite(&self, url: &str) -> Result<bool> {
        Ok(self.shared.favorites.is_favorite(url).await?)
    }

    /// Add or remove `station` from the favorites.
    ///
    /// Adding stores a snapshot of the tones playing right now. Returns
    /// whether the station is a favorite afterwards. A storage failure leaves
    /// the favorites untouched.
    pub async fn toggle_favorite(&self, station: &Station) -> Result<bool> {
        let favorites = &self.shared.favorites;

        if favorites.is_favorite(&station.url).await? {
            favorites.remove(&station.url).await?;
            info!(url = %station.url, "Favorite removed");
            self.shared.emit(CoreEvent::Library(LibraryEvent::FavoriteRemoved {
                station_url: station.url.clone(),
            }));
            return Ok(false);
        }

        let favorite = FavoriteStation::new(station.clone(), self.shared.tones.list_active());
        favorites.add(&favorite).await?;
        info!(url = %station.url, tones = favorite.frequencies.len(), "Favorite added");
        self.shared.emit(CoreEvent::Library(LibraryEvent::FavoriteAdded {
            station_url: station.url.clone(),
        }));
        Ok(true)
    }

    /// Toggle the station that is currently loaded.
    pub async fn toggle_current_favorite(&self) -> Result<bool> {
        let station = self
            .shared
            .player
            .current_station()
            .ok_or(PlaybackError::NoStationLoaded)?;
        self.toggle_favorite(&station).await
    }

    /// Play a favorite and bring back the tones saved with it.
    ///
    /// Tones are restored even when the stream refuses to start; the
    /// playback error is returned afterwards.
    pub async fn apply_favorite(&self, favorite: &FavoriteStation) -> Result<()> {
        let loaded = self.shared.player.load(favorite.station.clone()).await;

        for tone in &favorite.frequencies {
            self.shared.restore_tone(tone);
        }

        loaded?;
        Ok(())
    }
}

impl Drop for PlaybackOrchestrator {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// The lookup currently running for one load token.
struct InFlight {
    token: u64,
    task: JoinHandle<()>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_metadata_listener(shared: Arc<Shared>, receiver: Receiver<CoreEvent>) {
    let mut requests = EventStream::new(receiver).filter(|event| {
        matches!(event, CoreEvent::Player(PlayerEvent::RequestMetadata { .. }))
    });
    let mut in_flight: Option<InFlight> = None;

    loop {
        match requests.recv().await {
            Ok(CoreEvent::Player(PlayerEvent::RequestMetadata { station_url, token })) => {
                if let Some(running) = &in_flight {
                    if running.token == token && !running.task.is_finished() {
                        debug!(url = %station_url, token, "Metadata lookup already running");
                        continue;
                    }
                }

                let shared = Arc::clone(&shared);
                // Replacing the previous lookup aborts it.
                in_flight = Some(InFlight {
                    token,
                    task: tokio::spawn(async move {
                        shared.refresh_metadata(&station_url, token).await;
                    }),
                });
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Metadata listener fell behind the event bus");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
