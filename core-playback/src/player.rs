//! # Stream Player
//!
//! Drives a platform [`MediaElement`] through the playback state machine and
//! publishes [`PlayerEvent`]s on the core event bus.
//!
//! Platform lifecycle events are consumed by a pump task. While the stream is
//! playing a poller task emits [`PlayerEvent::RequestMetadata`] immediately
//! and then every `poll_interval`; it is aborted as soon as the player leaves
//! `Playing`.
//!
//! Every `load` and `stop` bumps the load token. Anything that resolves
//! asynchronously for a station (metadata, a failed `play`) carries the token
//! it started with and is dropped when the token no longer matches.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{MediaElement, MediaEvent};
use core_library::Station;
use core_runtime::events::{CoreEvent, EventBus, PlayerEvent, RecvError};
use core_runtime::logging::strip_query;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::PlayerConfig;
use crate::error::{PlaybackError, Result};
use crate::state::PlaybackState;

/// Error message emitted when the platform refuses to start a stream.
pub const STREAM_OFFLINE_MESSAGE: &str = "Stream Offline";

/// Error message emitted when the media element reports a failure.
pub const STREAM_ERROR_MESSAGE: &str = "Stream Fehler";

struct PlayerInner {
    state: PlaybackState,
    station: Option<Station>,
    token: u64,
    volume: f32,
    poller: Option<JoinHandle<()>>,
}

struct Shared {
    element: Arc<dyn MediaElement>,
    events: EventBus,
    poll_interval: Duration,
    inner: Mutex<PlayerInner>,
}

/// Single-station network stream player.
pub struct StreamPlayer {
    shared: Arc<Shared>,
    pump: JoinHandle<()>,
}

impl StreamPlayer {
    /// Create a player for `element`, publishing on `events`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::InvalidConfig`] if `config` fails validation
    /// - [`PlaybackError::RuntimeUnavailable`] outside a tokio runtime
    pub fn new(
        element: Arc<dyn MediaElement>,
        events: EventBus,
        config: PlayerConfig,
    ) -> Result<Self> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;
        let handle = Handle::try_current().map_err(|_| PlaybackError::RuntimeUnavailable)?;

        let receiver = element.subscribe();
        let shared = Arc::new(Shared {
            element,
            events,
            poll_interval: config.poll_interval,
            inner: Mutex::new(PlayerInner {
                state: PlaybackState::Idle,
                station: None,
                token: 0,
                volume: clamp_volume(config.initial_volume),
                poller: None,
            }),
        });

        let pump = handle.spawn(run_event_pump(Arc::clone(&shared), receiver));
        Ok(Self { shared, pump })
    }

    /// Make `station` current and start playing it.
    ///
    /// The previous stream is paused, the retained volume is applied to the
    /// new source, and `StationChanged` followed by `Loading` is emitted
    /// before output is requested.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::InvalidStation`] for an empty URL (nothing changes)
    /// - [`PlaybackError::PlaybackFailed`] if the platform refuses to play
    pub async fn load(&self, station: Station) -> Result<()> {
        if station.url.trim().is_empty() {
            return Err(PlaybackError::InvalidStation(
                "station URL cannot be empty".to_string(),
            ));
        }

        {
            let mut inner = self.shared.inner.lock();
            Shared::stop_polling(&mut inner);
            inner.token += 1;

            self.shared.element.pause();
            self.shared.element.set_source(&station.url);
            self.shared.element.set_volume(inner.volume);

            inner.state = PlaybackState::Loading;
            info!(station = %station.name, url = %strip_query(&station.url), token = inner.token, "Loading station");

            self.shared.emit(PlayerEvent::StationChanged {
                station_url: station.url.clone(),
                name: station.name.clone(),
                image: station.artwork().map(str::to_string),
            });
            self.shared.emit(PlayerEvent::Loading {
                station_url: station.url.clone(),
            });
            inner.station = Some(station);
        }

        self.play().await
    }

    /// Ask the platform to start output for the current station.
    ///
    /// On rejection the player moves to `Errored` and emits an error event,
    /// unless a newer `load`/`stop` superseded this request.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::NoStationLoaded`] without a current station
    /// - [`PlaybackError::PlaybackFailed`] if the platform refuses to play
    pub async fn play(&self) -> Result<()> {
        let (station_url, token) = {
            let mut inner = self.shared.inner.lock();
            let station_url = inner
                .station
                .as_ref()
                .map(|station| station.url.clone())
                .ok_or(PlaybackError::NoStationLoaded)?;

            if matches!(inner.state, PlaybackState::Idle | PlaybackState::Errored) {
                inner.state = PlaybackState::Loading;
                self.shared.emit(PlayerEvent::Loading {
                    station_url: station_url.clone(),
                });
            }
            (station_url, inner.token)
        };

        match self.shared.element.play().await {
            Ok(()) => Ok(()),
            Err(err) => {
                let mut inner = self.shared.inner.lock();
                if inner.token == token {
                    Shared::stop_polling(&mut inner);
                    inner.state = PlaybackState::Errored;
                    warn!(url = %strip_query(&station_url), error = %err, "Playback failed");
                    self.shared.emit(PlayerEvent::Error {
                        station_url: Some(station_url),
                        message: STREAM_OFFLINE_MESSAGE.to_string(),
                    });
                } else {
                    debug!(url = %station_url, token, "Ignoring playback failure of a superseded load");
                }
                Err(PlaybackError::PlaybackFailed(err.to_string()))
            }
        }
    }

    /// Pause output. The station stays current.
    pub fn pause(&self) {
        let mut inner = self.shared.inner.lock();
        self.shared.element.pause();
        Shared::stop_polling(&mut inner);

        if inner.state.is_active() {
            inner.state = PlaybackState::Paused;
            if let Some(station) = &inner.station {
                info!(url = %strip_query(&station.url), "Stream paused");
                self.shared.emit(PlayerEvent::Paused {
                    station_url: station.url.clone(),
                });
            }
        }
    }

    /// Pause when output is active, otherwise play.
    pub async fn toggle(&self) -> Result<()> {
        if self.state().is_active() {
            self.pause();
            Ok(())
        } else {
            self.play().await
        }
    }

    /// Stop playback and rewind. Forces `Idle` whatever the current state.
    ///
    /// The station stays current so a later `play` restarts it.
    pub fn stop(&self) {
        let mut inner = self.shared.inner.lock();
        Shared::stop_polling(&mut inner);
        inner.token += 1;
        self.shared.element.stop();
        inner.state = PlaybackState::Idle;

        info!(token = inner.token, "Playback stopped");
        self.shared.emit(PlayerEvent::Stopped);
    }

    /// Set the output volume, clamped to `[0.0, 1.0]`.
    ///
    /// The value is retained and applied to every station loaded later.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let volume = clamp_volume(volume);
        let mut inner = self.shared.inner.lock();
        inner.volume = volume;
        self.shared.element.set_volume(volume);
        debug!(volume, "Player volume set");
        volume
    }

    pub fn volume(&self) -> f32 {
        self.shared.inner.lock().volume
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.inner.lock().state
    }

    pub fn current_station(&self) -> Option<Station> {
        self.shared.inner.lock().station.clone()
    }

    /// Generation of the current load.
    pub fn load_token(&self) -> u64 {
        self.shared.inner.lock().token
    }

    /// Whether `token` still identifies the current load.
    pub fn is_current(&self, token: u64) -> bool {
        self.load_token() == token
    }
}

impl Drop for StreamPlayer {
    fn drop(&mut self) {
        self.pump.abort();
        Shared::stop_polling(&mut self.shared.inner.lock());
    }
}

impl Shared {
    fn emit(&self, event: PlayerEvent) {
        // No subscribers is not an error for the player.
        self.events.emit(CoreEvent::Player(event)).ok();
    }

    fn handle_media_event(&self, event: MediaEvent) {
        let mut inner = self.inner.lock();
        let Some(station_url) = inner.station.as_ref().map(|station| station.url.clone()) else {
            debug!(?event, "Ignoring media event without a station");
            return;
        };

        match event {
            MediaEvent::Playing => {
                // Late events from a stopped stream
                if inner.state == PlaybackState::Idle {
                    debug!(url = %station_url, "Ignoring playing event after stop");
                    return;
                }
                if inner.state != PlaybackState::Playing {
                    inner.state = PlaybackState::Playing;
                    info!(url = %strip_query(&station_url), "Stream playing");
                    self.emit(PlayerEvent::Playing {
                        station_url: station_url.clone(),
                    });
                }
                self.start_polling(&mut inner, station_url);
            }
            MediaEvent::Paused => {
                Self::stop_polling(&mut inner);
                if inner.state.can_pause() {
                    inner.state = PlaybackState::Paused;
                    info!(url = %strip_query(&station_url), "Stream paused by platform");
                    self.emit(PlayerEvent::Paused { station_url });
                }
            }
            MediaEvent::Waiting => {
                if matches!(inner.state, PlaybackState::Playing | PlaybackState::Loading) {
                    Self::stop_polling(&mut inner);
                    inner.state = PlaybackState::Buffering;
                    debug!(url = %station_url, "Stream buffering");
                    self.emit(PlayerEvent::Buffering { station_url });
                }
            }
            MediaEvent::Error(reason) => {
                if matches!(inner.state, PlaybackState::Idle | PlaybackState::Errored) {
                    debug!(url = %station_url, %reason, "Ignoring media error");
                    return;
                }
                Self::stop_polling(&mut inner);
                inner.state = PlaybackState::Errored;
                warn!(url = %strip_query(&station_url), %reason, "Stream error");
                self.emit(PlayerEvent::Error {
                    station_url: Some(station_url),
                    message: STREAM_ERROR_MESSAGE.to_string(),
                });
            }
        }
    }

    fn start_polling(&self, inner: &mut PlayerInner, station_url: String) {
        if inner.poller.is_some() {
            return;
        }

        let events = self.events.clone();
        let interval = self.poll_interval;
        let token = inner.token;

        inner.poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!(url = %station_url, token, "Requesting metadata");
                events
                    .emit(CoreEvent::Player(PlayerEvent::RequestMetadata {
                        station_url: station_url.clone(),
                        token,
                    }))
                    .ok();
            }
        }));
    }

    fn stop_polling(inner: &mut PlayerInner) {
        if let Some(poller) = inner.poller.take() {
            poller.abort();
        }
    }
}

async fn run_event_pump(shared: Arc<Shared>, mut receiver: broadcast::Receiver<MediaEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => shared.handle_media_event(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Media event pump lagged");
            }
            Err(RecvError::Closed) => {
                debug!("Media element closed its event channel");
                break;
            }
        }
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use mockall::{mock, Sequence};

    mock! {
        Element {}

        #[async_trait]
        impl MediaElement for Element {
            fn set_source(&self, url: &str);
            async fn play(&self) -> BridgeResult<()>;
            fn pause(&self);
            fn stop(&self);
            fn set_volume(&self, volume: f32);
            fn is_paused(&self) -> bool;
            fn subscribe(&self) -> broadcast::Receiver<MediaEvent>;
        }
    }

    #[tokio::test]
    async fn test_load_drives_element_in_order() {
        let (sender, _) = broadcast::channel(8);
        let mut element = MockElement::new();
        let mut seq = Sequence::new();

        element
            .expect_subscribe()
            .returning(move || sender.subscribe());
        element
            .expect_pause()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        element
            .expect_set_source()
            .withf(|url| url == "https://stream.example/live")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        element
            .expect_set_volume()
            .withf(|volume| (*volume - 1.0).abs() < f32::EPSILON)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        element
            .expect_play()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let player =
            StreamPlayer::new(Arc::new(element), EventBus::new(16), PlayerConfig::default())
                .unwrap();
        player
            .load(Station::new("https://stream.example/live", "Live", "Pop"))
            .await
            .unwrap();

        assert_eq!(player.state(), PlaybackState::Loading);
        assert_eq!(player.load_token(), 1);
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected_without_side_effects() {
        let (sender, _) = broadcast::channel(8);
        let mut element = MockElement::new();
        element
            .expect_subscribe()
            .returning(move || sender.subscribe());

        let player =
            StreamPlayer::new(Arc::new(element), EventBus::new(16), PlayerConfig::default())
                .unwrap();
        let result = player.load(Station::new(" ", "Nothing", "")).await;

        assert!(matches!(result, Err(PlaybackError::InvalidStation(_))));
        assert_eq!(player.load_token(), 0);
        assert!(player.current_station().is_none());
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let (sender, _) = broadcast::channel(8);
        let mut element = MockElement::new();
        element
            .expect_subscribe()
            .returning(move || sender.subscribe());

        let result =
            StreamPlayer::new(Arc::new(element), EventBus::new(16), PlayerConfig::default());
        assert!(matches!(result, Err(PlaybackError::RuntimeUnavailable)));
    }

    #[test]
    fn test_clamp_volume() {
        assert_eq!(clamp_volume(1.5), 1.0);
        assert_eq!(clamp_volume(-0.2), 0.0);
        assert_eq!(clamp_volume(f32::NAN), 0.0);
        assert_eq!(clamp_volume(0.4), 0.4);
    }
}
