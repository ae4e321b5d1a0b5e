//! Search links for the current track on music streaming services

use core_runtime::events::MusicServiceLinks;

/// Spotify, YouTube Music and SoundCloud searches for "artist title".
pub fn music_service_links(artist: &str, title: &str) -> MusicServiceLinks {
    let query = urlencoding::encode(&format!("{} {}", artist, title)).into_owned();

    MusicServiceLinks {
        spotify: format!("https://open.spotify.com/search/{}", query),
        youtube_music: format!("https://music.youtube.com/search?q={}", query),
        soundcloud: format!("https://soundcloud.com/search?q={}", query),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_share_encoded_query() {
        let links = music_service_links("Bonobo", "Kerala & Co");
        assert_eq!(links.spotify, "https://open.spotify.com/search/Bonobo%20Kerala%20%26%20Co");
        assert_eq!(
            links.youtube_music,
            "https://music.youtube.com/search?q=Bonobo%20Kerala%20%26%20Co"
        );
        assert_eq!(
            links.soundcloud,
            "https://soundcloud.com/search?q=Bonobo%20Kerala%20%26%20Co"
        );
    }
}
