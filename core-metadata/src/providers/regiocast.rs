//! Regiocast / StreamABC Provider
//!
//! Radio PSR and other Regiocast stations stream from `streams.radiopsr.de`
//! or `*.streamabc.net`. Neither documents a metadata endpoint; the hosts
//! answer on a handful of Icecast-style status pages, some only through a
//! relay. Candidates are probed strictly in order:
//!
//! `streams.radiopsr.de/{mount}/...`:
//! 1. `https://streams.radiopsr.de{mount}/status.json` via relay, then direct
//! 2. `{base without /mediaplayer}/status-json.xsl` via relay
//! 3. `{base}/status-json.xsl` via relay
//! 4. `{base without /mediaplayer}/status-json.xsl` direct
//!
//! `*.streamabc.net/regc-{id}...`:
//! 1. `{base}/status` via relay, then direct
//! 2. `{base}/7.html` via relay
//! 3. `https://streams.radiopsr.de/{id}/mp3-192/status.json` via relay, then direct
//!
//! The first status page that carries a title decides the result: the title
//! goes through [`parse_song`] and the probing ends, even when the title turns
//! out to be an ad break.

use async_trait::async_trait;
use core_library::Station;
use core_runtime::config::RelayConfig;
use serde_json::Value;
use tracing::debug;

use super::{icestats_source, seven_html_title, stream_base, text_field, NowPlayingProvider};
use crate::error::Result;
use crate::fetch::HttpFetcher;
use crate::song::{parse_song, TrackMetadata};

const PROVIDER: &str = "regiocast";
const RADIOPSR_HOST: &str = "streams.radiopsr.de";
const RADIOPSR_ROOT: &str = "https://streams.radiopsr.de";
const STREAMABC_HOST: &str = "streamabc.net";

/// One status page to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub url: String,
    pub via_relay: bool,
}

impl Candidate {
    fn relayed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            via_relay: true,
        }
    }

    fn direct(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            via_relay: false,
        }
    }
}

pub struct RegiocastProvider {
    fetcher: HttpFetcher,
    relay: RelayConfig,
}

impl RegiocastProvider {
    pub fn new(fetcher: HttpFetcher, relay: RelayConfig) -> Self {
        Self { fetcher, relay }
    }

    async fn fetch(&self, candidate: &Candidate) -> Result<String> {
        if candidate.via_relay {
            self.fetcher.via_relay(&self.relay, &candidate.url).await
        } else {
            self.fetcher.get_text(&candidate.url).await
        }
    }
}

#[async_trait]
impl NowPlayingProvider for RegiocastProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn matches(&self, station: &Station) -> bool {
        let url = &station.url;
        url.contains("radiopsr.de") || url.contains(STREAMABC_HOST) || url.contains("psr.")
    }

    async fn try_resolve(&self, station: &Station) -> Option<TrackMetadata> {
        let candidates = candidates(&station.url);
        debug!(station = %station.name, count = candidates.len(), "Probing Regiocast status pages");

        for candidate in &candidates {
            let contents = match self.fetch(candidate).await {
                Ok(contents) => contents,
                Err(e) => {
                    debug!(url = %candidate.url, relay = candidate.via_relay, error = %e, "Status page unavailable");
                    continue;
                }
            };

            if let Some(title) = status_title(&contents, &candidate.url) {
                debug!(url = %candidate.url, %title, "Status page title found");
                return parse_song(&title);
            }
        }

        None
    }
}

/// Status pages for a Regiocast stream URL, in probing order.
pub(crate) fn candidates(stream_url: &str) -> Vec<Candidate> {
    let base = stream_base(stream_url);
    let mut candidates = Vec::new();

    if base.contains(RADIOPSR_HOST) {
        let mut root = base.to_string();
        if let Some(mount) = radiopsr_mount(base) {
            root = RADIOPSR_ROOT.to_string();
            let status = format!("{}{}/status.json", RADIOPSR_ROOT, mount);
            candidates.push(Candidate::relayed(status.clone()));
            candidates.push(Candidate::direct(status));
        }

        let without_player = root.replace("/mediaplayer", "");
        candidates.push(Candidate::relayed(format!("{}/status-json.xsl", without_player)));
        candidates.push(Candidate::relayed(format!("{}/status-json.xsl", root)));
        candidates.push(Candidate::direct(format!("{}/status-json.xsl", without_player)));
    }

    if base.contains(STREAMABC_HOST) {
        candidates.push(Candidate::relayed(format!("{}/status", base)));
        candidates.push(Candidate::direct(format!("{}/status", base)));
        candidates.push(Candidate::relayed(format!("{}/7.html", base)));

        if let Some(id) = regiocast_stream_id(base) {
            let status = format!("{}/{}/mp3-192/status.json", RADIOPSR_ROOT, id);
            candidates.push(Candidate::relayed(status.clone()));
            candidates.push(Candidate::direct(status));
        }
    }

    // With a mount both relayed status-json.xsl candidates are the host root
    let mut unique: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    unique
}

/// `/{seg1}/{seg2}` following the radiopsr host, if both segments exist.
fn radiopsr_mount(base: &str) -> Option<String> {
    let parts: Vec<&str> = base.split('/').collect();
    let host = parts.iter().position(|part| *part == RADIOPSR_HOST)?;
    let first = parts.get(host + 1).filter(|part| !part.is_empty())?;
    let second = parts.get(host + 2).filter(|part| !part.is_empty())?;
    Some(format!("/{}/{}", first, second))
}

/// The `[a-z0-9-]+` run after `regc-`, ignoring case.
fn regiocast_stream_id(base: &str) -> Option<&str> {
    let start = base.to_ascii_lowercase().find("regc-")? + "regc-".len();
    let rest = &base[start..];
    let len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(rest.len());
    (len > 0).then(|| &rest[..len])
}

/// Song title from a status page body.
///
/// JSON bodies may carry a flat `title` or an Icecast `icestats.source`
/// with `title`/`songtitle`. Anything served as `/7.html`, or any HTML body,
/// is read as a Shoutcast comma list.
pub(crate) fn status_title(contents: &str, page_url: &str) -> Option<String> {
    if let Ok(json) = serde_json::from_str::<Value>(contents) {
        if let Some(title) = text_field(&json, "title") {
            return Some(title.to_string());
        }
        if let Some(source) = icestats_source(&json) {
            if let Some(title) = text_field(source, "title").or_else(|| text_field(source, "songtitle")) {
                return Some(title.to_string());
            }
        }
    }

    if page_url.contains("/7.html") || contents.contains("<body>") {
        return seven_html_title(contents);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(candidates: &[Candidate]) -> Vec<(String, bool)> {
        candidates
            .iter()
            .map(|c| (c.url.clone(), c.via_relay))
            .collect()
    }

    #[test]
    fn test_radiopsr_candidates() {
        let candidates = candidates("https://streams.radiopsr.de/psr-live/mp3-192/mediaplayer?ref=web");
        assert_eq!(
            urls(&candidates),
            vec![
                ("https://streams.radiopsr.de/psr-live/mp3-192/status.json".to_string(), true),
                ("https://streams.radiopsr.de/psr-live/mp3-192/status.json".to_string(), false),
                ("https://streams.radiopsr.de/status-json.xsl".to_string(), true),
                ("https://streams.radiopsr.de/status-json.xsl".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_streamabc_candidates() {
        let candidates = candidates("https://regiocast.streamabc.net/regc-psrlive-mp3-192-9876;stream");
        assert_eq!(
            urls(&candidates),
            vec![
                ("https://regiocast.streamabc.net/regc-psrlive-mp3-192-9876/status".to_string(), true),
                ("https://regiocast.streamabc.net/regc-psrlive-mp3-192-9876/status".to_string(), false),
                ("https://regiocast.streamabc.net/regc-psrlive-mp3-192-9876/7.html".to_string(), true),
                ("https://streams.radiopsr.de/psrlive-mp3-192-9876/mp3-192/status.json".to_string(), true),
                ("https://streams.radiopsr.de/psrlive-mp3-192-9876/mp3-192/status.json".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_psr_fragment_without_known_host_has_no_candidates() {
        assert!(candidates("https://psr.example.com/live").is_empty());
    }

    #[test]
    fn test_status_title_formats() {
        assert_eq!(
            status_title(r#"{"title":"Anna - Song"}"#, "https://x/status.json").as_deref(),
            Some("Anna - Song")
        );
        assert_eq!(
            status_title(
                r#"{"icestats":{"source":[{"songtitle":"B - C"}]}}"#,
                "https://x/status-json.xsl"
            )
            .as_deref(),
            Some("B - C")
        );
        assert_eq!(
            status_title("<body>1,1,1,1,1,128,D - E</body>", "https://x/7.html").as_deref(),
            Some("D - E")
        );
        assert_eq!(status_title("not json", "https://x/status"), None);
    }
}
