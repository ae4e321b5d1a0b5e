//! Generic Shoutcast/Icecast Provider
//!
//! Last resort for any stream. Probes the status pages most Shoutcast and
//! Icecast servers expose next to the stream mount, always through the
//! metadata relay:
//! - `/7.html` - Shoutcast v1 comma list, song title in field 6
//! - `/stats` - Shoutcast v2 JSON with `songtitle`
//! - `/status-json.xsl` - Icecast JSON with `icestats.source[].title`
//!
//! When directory lookups are enabled the station is first looked up on
//! radio-browser by stream URL. The answer is only logged.

use async_trait::async_trait;
use core_library::Station;
use core_runtime::config::RelayConfig;
use serde_json::Value;
use tracing::debug;

use super::{icestats_source, seven_html_title, stream_base, text_field, NowPlayingProvider};
use crate::fetch::HttpFetcher;
use crate::song::{parse_song, TrackMetadata};

const PROVIDER: &str = "icy";

/// Status pages relative to the stream base, in probing order
pub const STATUS_ENDPOINTS: [&str; 3] = ["/7.html", "/stats", "/status-json.xsl"];

pub struct IcyProvider {
    fetcher: HttpFetcher,
    relay: RelayConfig,
    directory_base: Option<String>,
}

impl IcyProvider {
    pub fn new(fetcher: HttpFetcher, relay: RelayConfig) -> Self {
        Self {
            fetcher,
            relay,
            directory_base: None,
        }
    }

    /// Look stations up on a radio-browser mirror before probing.
    pub fn with_directory_lookup(mut self, radio_browser_base: impl Into<String>) -> Self {
        self.directory_base = Some(radio_browser_base.into().trim_end_matches('/').to_string());
        self
    }

    async fn probe_directory(&self, station: &Station) {
        let Some(base) = &self.directory_base else {
            return;
        };

        let url = format!(
            "{}/json/stations/byurl?url={}",
            base,
            urlencoding::encode(&station.url)
        );
        match self.fetcher.get_json::<Vec<Value>>(&url).await {
            Ok(entries) => {
                debug!(station = %station.name, entries = entries.len(), "Directory lookup finished")
            }
            Err(e) => debug!(station = %station.name, error = %e, "Directory lookup failed"),
        }
    }
}

#[async_trait]
impl NowPlayingProvider for IcyProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn matches(&self, _station: &Station) -> bool {
        true
    }

    async fn try_resolve(&self, station: &Station) -> Option<TrackMetadata> {
        self.probe_directory(station).await;

        let base = stream_base(&station.url).trim_end_matches('/');
        for endpoint in STATUS_ENDPOINTS {
            let page_url = format!("{}{}", base, endpoint);
            let contents = match self.fetcher.via_relay(&self.relay, &page_url).await {
                Ok(contents) => contents,
                Err(e) => {
                    debug!(url = %page_url, error = %e, "ICY status page unavailable");
                    continue;
                }
            };

            if let Some(title) = endpoint_title(endpoint, &contents) {
                debug!(url = %page_url, %title, "ICY title found");
                return parse_song(&title);
            }
        }

        None
    }
}

fn endpoint_title(endpoint: &str, contents: &str) -> Option<String> {
    if endpoint == "/7.html" {
        return seven_html_title(contents);
    }

    let json: Value = serde_json::from_str(contents).ok()?;
    if let Some(title) = text_field(&json, "songtitle") {
        return Some(title.to_string());
    }
    icestats_source(&json)
        .and_then(|source| text_field(source, "title"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_title() {
        assert_eq!(
            endpoint_title("/stats", r#"{"songtitle":"Moby - Porcelain"}"#).as_deref(),
            Some("Moby - Porcelain")
        );
        assert_eq!(
            endpoint_title(
                "/status-json.xsl",
                r#"{"icestats":{"source":{"title":"Enya - Caribbean Blue"}}}"#
            )
            .as_deref(),
            Some("Enya - Caribbean Blue")
        );
        assert_eq!(endpoint_title("/stats", "<html>oops</html>"), None);
        assert_eq!(endpoint_title("/7.html", "<body>1,2</body>"), None);
    }
}
