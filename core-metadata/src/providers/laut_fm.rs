//! laut.fm Provider
//!
//! laut.fm streams are addressed as `https://stream.laut.fm/{station}` (or a
//! `{name}.stream.laut.fm` host). The public API answers
//! `GET {api}/station/{station}/current_song` with
//! `{"title": "...", "artist": {"name": "..."}}`.

use async_trait::async_trait;
use core_library::Station;
use serde::Deserialize;
use tracing::debug;

use super::NowPlayingProvider;
use crate::error::{MetadataError, Result};
use crate::fetch::HttpFetcher;
use crate::song::TrackMetadata;

const PROVIDER: &str = "laut.fm";

#[derive(Debug, Deserialize)]
struct LautFmArtist {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LautFmSong {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artist: Option<LautFmArtist>,
}

pub struct LautFmProvider {
    fetcher: HttpFetcher,
    api_base: String,
}

impl LautFmProvider {
    pub fn new(fetcher: HttpFetcher, api_base: impl Into<String>) -> Self {
        Self {
            fetcher,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Station name: last path segment without query
    fn station_name(url: &str) -> Option<&str> {
        let segment = url.rsplit('/').next()?;
        let name = segment.split('?').next().unwrap_or(segment);
        (!name.is_empty()).then_some(name)
    }

    async fn current_song(&self, url: &str) -> Result<LautFmSong> {
        let name = Self::station_name(url).ok_or_else(|| MetadataError::Provider {
            provider: PROVIDER.to_string(),
            message: format!("no station name in {}", url),
        })?;

        let api_url = format!("{}/station/{}/current_song", self.api_base, name);
        self.fetcher.get_json(&api_url).await
    }
}

#[async_trait]
impl NowPlayingProvider for LautFmProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn matches(&self, station: &Station) -> bool {
        station.url.contains("laut.fm")
    }

    async fn try_resolve(&self, station: &Station) -> Option<TrackMetadata> {
        let song = match self.current_song(&station.url).await {
            Ok(song) => song,
            Err(e) => {
                debug!(station = %station.name, error = %e, "laut.fm lookup failed");
                return None;
            }
        };

        let title = song.title.filter(|title| !title.is_empty())?;
        let artist = song.artist.and_then(|artist| artist.name).unwrap_or_default();
        debug!(station = %station.name, %artist, %title, "laut.fm track found");

        Some(TrackMetadata::new(artist, title))
    }
}
