//! # Podcast URL Resolution
//!
//! Podcast entries point either at an audio file, an RSS feed or an episode
//! web page. [`PodcastUrlResolver::resolve`] turns any of those into
//! something the stream player can open:
//!
//! 1. URLs ending in a known audio extension are returned as-is.
//! 2. Otherwise the document is fetched through each podcast relay in turn.
//!    Feeds yield their first audio `<enclosure>`. HTML pages yield an
//!    `<audio>` source, an `og:audio` style meta tag or the first audio link
//!    found in the markup.
//! 3. When no relay produced an audio URL the input is returned unchanged.

use std::sync::Arc;

use bridge_traits::HttpClient;
use core_runtime::config::{MetadataApiConfig, RelayConfig};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::fetch::HttpFetcher;

const DIRECT_AUDIO_PATTERN: &str = r"(?i)\.(mp3|aac|ogg|wav|m4a|flac)(\?|$)";
const FEED_AUDIO_PATTERN: &str = r#"(?i)https?://[^"'>\s]+\.(mp3|aac|m4a|ogg)"#;
const PAGE_AUDIO_PATTERN: &str = r#"(?i)https?://[^"'>\s]+\.(mp3|aac|m4a|ogg)(\?[^"'>\s]*)?"#;

/// Ad and tracking hosts whose audio links are never the episode
const AD_HOSTS: [&str; 2] = ["adswizz", "doubleclick"];

/// Meta tags carrying a playable stream, in preference order
const AUDIO_META_KEYS: [&str; 4] = [
    "og:audio",
    "og:audio:url",
    "og:audio:secure_url",
    "twitter:player:stream",
];

pub struct PodcastUrlResolver {
    fetcher: HttpFetcher,
    relays: Vec<RelayConfig>,
}

impl PodcastUrlResolver {
    pub fn new(fetcher: HttpFetcher, relays: Vec<RelayConfig>) -> Self {
        Self { fetcher, relays }
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &MetadataApiConfig) -> Self {
        Self::new(
            HttpFetcher::from_config(http_client, config),
            config.podcast_relays.clone(),
        )
    }

    /// Playable audio URL for a podcast entry. Never fails; falls back to `url`.
    #[instrument(skip(self))]
    pub async fn resolve(&self, url: &str) -> String {
        if is_direct_audio(url) {
            debug!("Podcast URL is already an audio file");
            return url.to_string();
        }

        for relay in &self.relays {
            let contents = match self.fetcher.via_relay(relay, url).await {
                Ok(contents) => contents,
                Err(e) => {
                    debug!(relay = %relay.name, error = %e, "Relay could not fetch podcast document");
                    continue;
                }
            };

            match extract_audio_url(&contents, url) {
                Some(audio) => {
                    info!(relay = %relay.name, audio = %audio, "Resolved podcast audio URL");
                    return audio;
                }
                None => debug!(relay = %relay.name, "No audio URL in podcast document"),
            }
        }

        warn!("Podcast audio URL not found, using original URL");
        url.to_string()
    }
}

/// True when the URL path ends in an audio file extension.
pub fn is_direct_audio(url: &str) -> bool {
    Regex::new(DIRECT_AUDIO_PATTERN)
        .map(|re| re.is_match(url))
        .unwrap_or(false)
}

/// Audio URL from a feed or web page body.
pub(crate) fn extract_audio_url(contents: &str, page_url: &str) -> Option<String> {
    let is_html = contents.to_ascii_lowercase().contains("<html");

    if contents.trim_start().starts_with('<') {
        if let Some(enclosure) = feed_enclosure(contents) {
            return Some(enclosure);
        }
        // HTML pages get the ad-filtered scan below
        if !is_html {
            if let Some(link) = first_audio_link(FEED_AUDIO_PATTERN, contents) {
                return Some(link);
            }
        }
    } else if !is_html {
        return first_audio_link(FEED_AUDIO_PATTERN, contents);
    }

    if is_html {
        return page_audio(contents, page_url);
    }
    None
}

fn feed_enclosure(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"enclosure" => {
                if let Some(url) = audio_enclosure_url(&e) {
                    return Some(url);
                }
            }
            Ok(Event::Eof) => return None,
            Err(e) => {
                debug!(error = %e, "Podcast document is not well-formed XML");
                return None;
            }
            Ok(_) => {}
        }
    }
}

fn audio_enclosure_url(element: &BytesStart) -> Option<String> {
    let mut kind = None;
    let mut url = None;

    for attr in element.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.local_name().as_ref() {
            b"type" => kind = Some(value.into_owned()),
            b"url" => url = Some(value.into_owned()),
            _ => {}
        }
    }

    if kind?.starts_with("audio") {
        url.filter(|url| !url.is_empty())
    } else {
        None
    }
}

fn page_audio(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for selector in ["audio source[src]", "audio[src]"] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        if let Some(src) = document
            .select(&selector)
            .filter_map(|element| element.value().attr("src"))
            .find(|src| !src.trim().is_empty())
        {
            return Some(absolute_url(page_url, src.trim()));
        }
    }

    if let Ok(meta) = Selector::parse("meta[content]") {
        for key in AUDIO_META_KEYS {
            let content = document.select(&meta).find_map(|element| {
                let tag = element.value();
                let name = tag.attr("property").or_else(|| tag.attr("name"))?;
                if name.eq_ignore_ascii_case(key) {
                    tag.attr("content").filter(|content| !content.trim().is_empty())
                } else {
                    None
                }
            });
            if let Some(content) = content {
                return Some(absolute_url(page_url, content.trim()));
            }
        }
    }

    let re = Regex::new(PAGE_AUDIO_PATTERN).ok()?;
    let link = re
        .find_iter(html)
        .map(|m| m.as_str())
        .find(|link| {
            let lower = link.to_ascii_lowercase();
            !AD_HOSTS.iter().any(|host| lower.contains(host))
        })
        .map(str::to_string);
    link
}

fn first_audio_link(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}

fn absolute_url(page_url: &str, src: &str) -> String {
    Url::parse(page_url)
        .and_then(|base| base.join(src))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| src.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_audio_detection() {
        assert!(is_direct_audio("https://cdn.example/ep1.mp3"));
        assert!(is_direct_audio("https://cdn.example/ep1.M4A?token=abc"));
        assert!(is_direct_audio("https://cdn.example/ep1.flac"));
        assert!(!is_direct_audio("https://feeds.example/podcast.xml"));
        assert!(!is_direct_audio("https://example.com/mp3s/page"));
    }

    #[test]
    fn test_feed_enclosure_skips_non_audio() {
        let feed = r#"<?xml version="1.0"?>
            <rss><channel><item>
              <enclosure url="https://cdn.example/cover.jpg" type="image/jpeg"/>
              <enclosure url="https://cdn.example/ep1.mp3?src=rss&amp;x=1" type="audio/mpeg" length="1"/>
            </item></channel></rss>"#;

        assert_eq!(
            extract_audio_url(feed, "https://feeds.example/rss").as_deref(),
            Some("https://cdn.example/ep1.mp3?src=rss&x=1")
        );
    }

    #[test]
    fn test_feed_without_enclosure_falls_back_to_regex() {
        let feed = r#"<rss><channel><item><link>https://cdn.example/ep2.ogg</link></item></channel></rss>"#;
        assert_eq!(
            extract_audio_url(feed, "https://feeds.example/rss").as_deref(),
            Some("https://cdn.example/ep2.ogg")
        );
    }

    #[test]
    fn test_html_audio_source_is_made_absolute() {
        let page = r#"<!DOCTYPE html><html><body>
            <audio controls><source src="/media/ep3.mp3" type="audio/mpeg"></audio>
            </body></html>"#;
        assert_eq!(
            extract_audio_url(page, "https://podcast.example/episodes/3").as_deref(),
            Some("https://podcast.example/media/ep3.mp3")
        );
    }

    #[test]
    fn test_html_meta_tag() {
        let page = r#"<html><head>
            <meta property="og:title" content="Episode 4">
            <meta property="og:audio" content="https://cdn.example/ep4.m4a">
            </head><body></body></html>"#;
        assert_eq!(
            extract_audio_url(page, "https://podcast.example/4").as_deref(),
            Some("https://cdn.example/ep4.m4a")
        );
    }

    #[test]
    fn test_html_regex_skips_ad_links() {
        let page = r#"<html><body>
            <a href="https://delivery.adswizz.com/spot.mp3">ad</a>
            <a href="https://cdn.example/ep5.mp3?dl=1">download</a>
            </body></html>"#;
        assert_eq!(
            extract_audio_url(page, "https://podcast.example/5").as_deref(),
            Some("https://cdn.example/ep5.mp3?dl=1")
        );
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(extract_audio_url("plain text", "https://x"), None);
        assert_eq!(
            extract_audio_url("<html><body>No audio</body></html>", "https://x"),
            None
        );
    }
}
