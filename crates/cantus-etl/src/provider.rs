//! The seam between the pipeline and a remote lyrics provider.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollectError;

/// Album reference attached to a provider song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAlbum {
    #[serde(default)]
    pub name: Option<String>,
}

/// A song as returned by the provider, before normalization.
///
/// Every field may be missing in a malformed response; the
/// [`builder`](crate::builder) degrades missing values instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSong {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub album: Option<RawAlbum>,
}

impl RawSong {
    #[must_use]
    pub fn new(title: impl Into<String>, lyrics: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            lyrics: Some(lyrics.into()),
            album: None,
        }
    }

    #[must_use]
    pub fn with_album(mut self, name: impl Into<String>) -> Self {
        self.album = Some(RawAlbum {
            name: Some(name.into()),
        });
        self
    }
}

/// Result of one provider lookup.
///
/// The four variants are exhaustive: an adapter maps every response and
/// every error onto exactly one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Songs found, most popular first.
    Success { songs: Vec<RawSong> },
    /// The provider does not know the artist.
    NotFound,
    /// The artist exists but has no collectable songs.
    Empty,
    /// Network, rate-limit, or parse failure. Worth retrying.
    TransientFailure { cause: String },
}

impl FetchOutcome {
    /// Classify an error raised while talking to the provider.
    ///
    /// Only a missing artist and an empty catalog are terminal; every other
    /// error is worth another attempt.
    pub fn from_error(error: &CollectError) -> Self {
        match error {
            CollectError::NotFound { .. } => Self::NotFound,
            CollectError::Empty { .. } => Self::Empty,
            other => Self::TransientFailure {
                cause: other.to_string(),
            },
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { songs } => write!(f, "{} songs", songs.len()),
            Self::NotFound => f.write_str("artist not found"),
            Self::Empty => f.write_str("no songs"),
            Self::TransientFailure { cause } => write!(f, "transient failure: {cause}"),
        }
    }
}

/// A single remote lookup of an artist's catalog.
///
/// Implementations request only the artist's own songs (no guest
/// features), most popular first, capped at `max_songs`. They never return
/// an error: failures are reported as [`FetchOutcome`] variants.
#[async_trait]
pub trait FetchAdapter: Send + Sync {
    async fn fetch(&self, artist_name: &str, max_songs: usize) -> FetchOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_classification() {
        let missing = CollectError::NotFound {
            entity: "artist X".to_string(),
            source_name: "Genius".to_string(),
        };
        assert_eq!(FetchOutcome::from_error(&missing), FetchOutcome::NotFound);

        let empty = CollectError::Empty {
            artist: "X".to_string(),
        };
        assert_eq!(FetchOutcome::from_error(&empty), FetchOutcome::Empty);

        let limited = CollectError::RateLimited {
            source_name: "Genius".to_string(),
        };
        match FetchOutcome::from_error(&limited) {
            FetchOutcome::TransientFailure { cause } => assert!(cause.contains("rate limited")),
            other => panic!("Expected TransientFailure, got {other:?}"),
        }

        let http = CollectError::Http {
            source_name: "Genius".to_string(),
            message: "502 Bad Gateway".to_string(),
        };
        assert!(matches!(
            FetchOutcome::from_error(&http),
            FetchOutcome::TransientFailure { .. }
        ));
    }

    #[test]
    fn test_raw_song_deserializes_with_missing_fields() {
        let song: RawSong = serde_json::from_str(r#"{"title": "Sawdust & Diamonds"}"#).unwrap();
        assert_eq!(song.title.as_deref(), Some("Sawdust & Diamonds"));
        assert!(song.lyrics.is_none());
        assert!(song.album.is_none());
    }

    #[test]
    fn test_outcome_display() {
        let outcome = FetchOutcome::Success {
            songs: vec![RawSong::new("a", "b")],
        };
        assert_eq!(outcome.to_string(), "1 songs");
        assert_eq!(FetchOutcome::NotFound.to_string(), "artist not found");
    }
}
