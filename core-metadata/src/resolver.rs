//! # Metadata Resolver
//!
//! Runs the now-playing providers for a station strictly in order and
//! returns the first usable answer. Providers are sequential: a later
//! provider is only asked when every earlier matching provider came back
//! empty.

use std::sync::Arc;

use bridge_traits::HttpClient;
use core_library::Station;
use core_runtime::config::{FeatureFlags, MetadataApiConfig};
use tracing::{debug, instrument};

use crate::fetch::HttpFetcher;
use crate::providers::{IcyProvider, LautFmProvider, NowPlayingProvider, RegiocastProvider};
use crate::song::TrackMetadata;

/// Ordered chain of [`NowPlayingProvider`]s
pub struct MetadataResolver {
    providers: Vec<Box<dyn NowPlayingProvider>>,
}

impl MetadataResolver {
    pub fn new(providers: Vec<Box<dyn NowPlayingProvider>>) -> Self {
        Self { providers }
    }

    /// laut.fm, then Regiocast, then the generic ICY probe.
    pub fn with_default_providers(
        http_client: Arc<dyn HttpClient>,
        config: &MetadataApiConfig,
        features: &FeatureFlags,
    ) -> Self {
        let fetcher = HttpFetcher::from_config(http_client, config);

        let mut icy = IcyProvider::new(fetcher.clone(), config.metadata_relay.clone());
        if features.enable_directory_lookup {
            icy = icy.with_directory_lookup(config.radio_browser_api_base.clone());
        }

        Self::new(vec![
            Box::new(LautFmProvider::new(fetcher.clone(), config.laut_fm_api_base.clone())),
            Box::new(RegiocastProvider::new(fetcher, config.metadata_relay.clone())),
            Box::new(icy),
        ])
    }

    /// Provider names in probing order
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    /// Best-effort current track for `station`.
    #[instrument(skip(self, station), fields(station = %station.name))]
    pub async fn resolve(&self, station: &Station) -> Option<TrackMetadata> {
        for provider in &self.providers {
            if !provider.matches(station) {
                continue;
            }

            match provider.try_resolve(station).await {
                Some(track) => {
                    debug!(provider = provider.name(), artist = %track.artist, title = %track.title, "Metadata resolved");
                    return Some(track);
                }
                None => debug!(provider = provider.name(), "No metadata from provider"),
            }
        }

        debug!("No provider produced metadata");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Scripted {
        name: &'static str,
        pattern: &'static str,
        answer: Option<TrackMetadata>,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl NowPlayingProvider for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn matches(&self, station: &Station) -> bool {
            station.url.contains(self.pattern)
        }

        async fn try_resolve(&self, _station: &Station) -> Option<TrackMetadata> {
            self.calls.lock().push(self.name);
            self.answer.clone()
        }
    }

    fn resolver(first: Option<TrackMetadata>, calls: &Arc<Mutex<Vec<&'static str>>>) -> MetadataResolver {
        MetadataResolver::new(vec![
            Box::new(Scripted {
                name: "laut",
                pattern: "laut.fm",
                answer: first,
                calls: calls.clone(),
            }),
            Box::new(Scripted {
                name: "generic",
                pattern: "",
                answer: Some(TrackMetadata::new("", "Fallback")),
                calls: calls.clone(),
            }),
        ])
    }

    #[tokio::test]
    async fn test_first_usable_result_short_circuits() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let resolver = resolver(Some(TrackMetadata::new("A", "B")), &calls);

        let track = resolver
            .resolve(&Station::new("https://stream.laut.fm/x", "X", ""))
            .await;

        assert_eq!(track, Some(TrackMetadata::new("A", "B")));
        assert_eq!(*calls.lock(), vec!["laut"]);
    }

    #[tokio::test]
    async fn test_falls_through_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let resolver = resolver(None, &calls);

        let track = resolver
            .resolve(&Station::new("https://stream.laut.fm/x", "X", ""))
            .await;

        assert_eq!(track, Some(TrackMetadata::new("", "Fallback")));
        assert_eq!(*calls.lock(), vec!["laut", "generic"]);
    }

    #[tokio::test]
    async fn test_non_matching_providers_are_skipped() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let resolver = resolver(None, &calls);

        resolver
            .resolve(&Station::new("https://icecast.example/live", "Y", ""))
            .await;

        assert_eq!(*calls.lock(), vec!["generic"]);
    }
}
