use serde::{Deserialize, Serialize};

/// A single collected song, ready to be persisted.
///
/// Records are built once from a provider response and never mutated
/// afterwards; use [`SongRecord::new`] so the word count always matches the
/// lyrics body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRecord {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub lyrics: String,
    pub lyrics_word_count: usize,
}

impl SongRecord {
    #[must_use]
    pub fn new(
        artist: impl Into<String>,
        title: impl Into<String>,
        album: Option<String>,
        lyrics: impl Into<String>,
    ) -> Self {
        let lyrics = lyrics.into();
        let lyrics_word_count = word_count(&lyrics);
        Self {
            artist: artist.into(),
            title: title.into(),
            album,
            lyrics,
            lyrics_word_count,
        }
    }

    /// The metadata half of the record, i.e. everything but the lyrics body.
    #[must_use]
    pub fn metadata(&self) -> SongMetadata {
        SongMetadata {
            artist: self.artist.clone(),
            title: self.title.clone(),
            album: self.album.clone(),
            lyrics_word_count: self.lyrics_word_count,
        }
    }
}

/// The JSON sidecar written next to each lyrics file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMetadata {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub lyrics_word_count: usize,
}

/// Number of whitespace-separated tokens in `text`.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
