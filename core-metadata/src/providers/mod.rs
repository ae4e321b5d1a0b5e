//! Now-Playing Providers
//!
//! Each provider knows how to ask one family of streaming hosts what is
//! currently on air:
//! - [`LautFmProvider`] - laut.fm JSON API
//! - [`RegiocastProvider`] - Regiocast/StreamABC status pages (Radio PSR and friends)
//! - [`IcyProvider`] - generic Shoutcast/Icecast status pages, for any stream
//!
//! Providers never fail loudly. Every request is fenced and a provider that
//! finds nothing returns `None` so the resolver can try the next one.

use async_trait::async_trait;
use core_library::Station;
use serde_json::Value;

use crate::song::TrackMetadata;

pub mod icy;
pub mod laut_fm;
pub mod regiocast;

pub use icy::IcyProvider;
pub use laut_fm::LautFmProvider;
pub use regiocast::RegiocastProvider;

/// Strategy for resolving the current track of a station
#[async_trait]
pub trait NowPlayingProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether this provider handles the station's stream URL
    fn matches(&self, station: &Station) -> bool;

    /// Best-effort lookup. `None` covers both "nothing on air" and failures.
    async fn try_resolve(&self, station: &Station) -> Option<TrackMetadata>;
}

/// Stream URL without ICY metadata suffix (`;`) and query string.
pub(crate) fn stream_base(url: &str) -> &str {
    let url = url.split(';').next().unwrap_or(url);
    url.split('?').next().unwrap_or(url)
}

/// Field 6 of a Shoutcast `/7.html` page.
///
/// The body holds `listeners,status,peak,max,unique,bitrate,songtitle`; the
/// song title itself may contain commas, which are dropped with the split.
pub(crate) fn seven_html_title(contents: &str) -> Option<String> {
    let lower = contents.to_ascii_lowercase();
    let start = lower.find("<body>")? + "<body>".len();
    let end = lower.rfind("</body>")?;
    if end < start {
        return None;
    }

    let fields: Vec<&str> = contents[start..end].split(',').collect();
    if fields.len() >= 7 {
        Some(fields[6].to_string())
    } else {
        None
    }
}

/// First Icecast source, whether `icestats.source` is an object or an array.
pub(crate) fn icestats_source(json: &Value) -> Option<&Value> {
    match json.get("icestats")?.get("source")? {
        Value::Array(sources) => sources.first(),
        source => Some(source),
    }
}

/// A string field with content.
pub(crate) fn text_field<'a>(json: &'a Value, key: &str) -> Option<&'a str> {
    json.get(key)?
        .as_str()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stream_base_strips_suffixes() {
        assert_eq!(stream_base("http://host:8000/;stream.mp3"), "http://host:8000/");
        assert_eq!(stream_base("https://host/live?token=1"), "https://host/live");
        assert_eq!(stream_base("https://host/live"), "https://host/live");
    }

    #[test]
    fn test_seven_html_title() {
        let page = "<html><body>12,1,40,500,10,128,Air - La Femme d'Argent</body></html>";
        assert_eq!(
            seven_html_title(page).as_deref(),
            Some("Air - La Femme d'Argent")
        );

        assert_eq!(seven_html_title("<BODY>1,1,1</BODY>"), None);
        assert_eq!(seven_html_title("no body here"), None);
    }

    #[test]
    fn test_icestats_source_object_or_array() {
        let single = json!({"icestats": {"source": {"title": "A - B"}}});
        let many = json!({"icestats": {"source": [{"title": "C - D"}, {"title": "E - F"}]}});

        assert_eq!(text_field(icestats_source(&single).unwrap(), "title"), Some("A - B"));
        assert_eq!(text_field(icestats_source(&many).unwrap(), "title"), Some("C - D"));
        assert!(icestats_source(&json!({"icestats": {}})).is_none());
    }

    #[test]
    fn test_text_field_skips_blank() {
        let value = json!({"title": "  ", "songtitle": 5});
        assert_eq!(text_field(&value, "title"), None);
        assert_eq!(text_field(&value, "songtitle"), None);
    }
}
