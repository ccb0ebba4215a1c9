//! Recommended songs
//!
//! A fixed placeholder list until a music engine is wired in. Nothing here
//! depends on the detected mood.

/// A song entry shown under "Recommended Songs"
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Song {
    pub title: &'static str,
    pub artist: &'static str,
    /// Cover art URL
    pub cover_url: &'static str,
    /// Track page URL, opened by the play button
    pub track_url: &'static str,
}

const PLACEHOLDER_COVER: &str =
    "https://i.scdn.co/image/ab67616d0000b273e1c8a9c8e5f1b2c3d4e5f6";
const PLACEHOLDER_TRACK: &str =
    "https://open.spotify.com/track/1cTZMwcBJT0Ka3UJPXOeeN?si=1234567890abcdef";

static RECOMMENDED: [Song; 2] = [
    Song {
        title: "test_title",
        artist: "test_artist",
        cover_url: PLACEHOLDER_COVER,
        track_url: PLACEHOLDER_TRACK,
    },
    Song {
        title: "test_title",
        artist: "test_artist",
        cover_url: PLACEHOLDER_COVER,
        track_url: PLACEHOLDER_TRACK,
    },
];

/// Songs to display, in display order
pub fn recommended() -> &'static [Song] {
    &RECOMMENDED
}

impl Song {
    /// Accessibility label for the song row
    pub fn describe(&self) -> String {
        format!("{} by {}", self.title, self.artist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_list() {
        let songs = recommended();
        assert_eq!(songs.len(), 2);
        for song in songs {
            assert_eq!(song.title, "test_title");
            assert_eq!(song.artist, "test_artist");
            assert!(song.track_url.starts_with("https://open.spotify.com/track/"));
            assert!(song.cover_url.starts_with("https://"));
        }
    }

    #[test]
    fn test_describe() {
        assert_eq!(recommended()[0].describe(), "test_title by test_artist");
    }
}
