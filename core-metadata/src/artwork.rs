//! Cover Art Lookup
//!
//! Finds album artwork for the current track through the iTunes Search API:
//!
//! ```text
//! GET https://itunes.apple.com/search?term={artist title}&media=music&limit=1
//! ```
//!
//! The first result's `artworkUrl100` is rewritten to the configured edge
//! length (`100x100bb` → `600x600bb` by default). Answers, including "no
//! match", are kept in an LRU cache keyed by the lowercase query so a track
//! polled every few seconds is looked up once. Network failures are not
//! cached.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::artwork::CoverArtResolver;
//!
//! let resolver = CoverArtResolver::from_config(http_client, &config.metadata_api_config);
//! if let Some(cover) = resolver.resolve("Nils Frahm", "Says").await {
//!     println!("{}", cover);
//! }
//! ```

use std::num::NonZeroUsize;
use std::sync::Arc;

use bridge_traits::HttpClient;
use core_runtime::config::MetadataApiConfig;
use lru::LruCache;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::fetch::HttpFetcher;

const THUMBNAIL_MARKER: &str = "100x100bb";

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "artworkUrl100", default)]
    artwork_url_100: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Artist/title to artwork URL, cached
pub struct CoverArtResolver {
    fetcher: HttpFetcher,
    search_url: String,
    artwork_size: u32,
    cache: Mutex<LruCache<String, Option<String>>>,
}

impl CoverArtResolver {
    pub fn new(
        fetcher: HttpFetcher,
        search_url: impl Into<String>,
        artwork_size: u32,
        cache_capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            fetcher,
            search_url: search_url.into(),
            artwork_size,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &MetadataApiConfig) -> Self {
        Self::new(
            HttpFetcher::from_config(http_client, config),
            config.itunes_search_url.clone(),
            config.artwork_size,
            config.artwork_cache_capacity,
        )
    }

    /// Artwork URL for the track, or `None` when nothing was found.
    ///
    /// Returns `None` without a request when artist and title are both empty.
    pub async fn resolve(&self, artist: &str, title: &str) -> Option<String> {
        if artist.trim().is_empty() && title.trim().is_empty() {
            return None;
        }

        let query = format!("{} {}", artist, title);
        let key = query.to_lowercase();

        if let Some(cached) = self.cache.lock().await.get(&key) {
            debug!(query = %query, hit = cached.is_some(), "Cover art cache hit");
            return cached.clone();
        }

        let url = format!(
            "{}?term={}&media=music&limit=1",
            self.search_url,
            urlencoding::encode(&query)
        );

        let artwork = match self.fetcher.get_json::<SearchResponse>(&url).await {
            Ok(response) => response
                .results
                .into_iter()
                .next()
                .and_then(|result| result.artwork_url_100)
                .map(|thumbnail| self.upscale(&thumbnail)),
            Err(e) => {
                debug!(query = %query, error = %e, "Cover art lookup failed");
                return None;
            }
        };

        debug!(query = %query, found = artwork.is_some(), "Cover art lookup finished");
        self.cache.lock().await.put(key, artwork.clone());
        artwork
    }

    /// Number of cached lookups
    pub async fn cached_entries(&self) -> usize {
        self.cache.lock().await.len()
    }

    fn upscale(&self, thumbnail: &str) -> String {
        thumbnail.replace(
            THUMBNAIL_MARKER,
            &format!("{0}x{0}bb", self.artwork_size),
        )
    }
}
