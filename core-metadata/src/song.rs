//! Now-playing text normalization

use serde::{Deserialize, Serialize};

/// Substrings that mark an advertisement or jingle slot rather than a song.
pub const BLACKLIST: [&str; 5] = ["werbung", "ad", "promo", "news", "jingle"];

const SEPARATOR: &str = " - ";

/// Current artist and title of a stream
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub artist: String,
    pub title: String,
}

impl TrackMetadata {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// True when neither artist nor title carries text.
    pub fn is_empty(&self) -> bool {
        self.artist.trim().is_empty() && self.title.trim().is_empty()
    }

    /// "artist title", the query used for cover art and music links
    pub fn search_query(&self) -> String {
        format!("{} {}", self.artist, self.title)
    }
}

/// Whether the text looks like an ad break, news or jingle.
///
/// The check is a case-insensitive substring match, so any text containing
/// "ad" is rejected as well.
pub fn is_blacklisted(text: &str) -> bool {
    let lower = text.to_lowercase();
    BLACKLIST.iter().any(|word| lower.contains(word))
}

/// Split a stream title of the form `Artist - Title`.
///
/// Only the first separator splits artist from title; the remaining parts
/// stay in the title. Text without a separator becomes the title with an
/// empty artist. Empty or blacklisted text yields `None`.
pub fn parse_song(text: &str) -> Option<TrackMetadata> {
    if text.trim().is_empty() || is_blacklisted(text) {
        return None;
    }

    match text.split_once(SEPARATOR) {
        Some((artist, title)) => Some(TrackMetadata::new(artist.trim(), title.trim())),
        None => Some(TrackMetadata::new("", text.trim())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_and_title() {
        assert_eq!(
            parse_song("Artist - Title"),
            Some(TrackMetadata::new("Artist", "Title"))
        );
    }

    #[test]
    fn test_title_only() {
        assert_eq!(
            parse_song("Just A Title"),
            Some(TrackMetadata::new("", "Just A Title"))
        );
    }

    #[test]
    fn test_only_first_separator_splits() {
        assert_eq!(
            parse_song("A - B - C"),
            Some(TrackMetadata::new("A", "B - C"))
        );
    }

    #[test]
    fn test_blacklisted_text() {
        assert_eq!(parse_song("Werbung - Block"), None);
        assert_eq!(parse_song("JINGLE"), None);
        assert_eq!(parse_song("Morning News"), None);
        // Substring match, not word match
        assert_eq!(parse_song("Radiohead - Creep"), None);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(parse_song(""), None);
        assert_eq!(parse_song("   "), None);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(
            parse_song("  Miles Davis  -  So What "),
            Some(TrackMetadata::new("Miles Davis", "So What"))
        );
    }

    #[test]
    fn test_search_query() {
        let track = TrackMetadata::new("Nils Frahm", "Says");
        assert_eq!(track.search_query(), "Nils Frahm Says");
        assert!(!track.is_empty());
        assert!(TrackMetadata::default().is_empty());
    }
}
