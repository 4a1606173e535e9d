use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of collecting one artist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    Success,
    Failed,
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// One row of the run summary: what happened to a single artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistCollectionResult {
    pub artist: String,
    pub status: CollectionStatus,
    pub songs_collected: usize,
    pub elapsed_seconds: f64,
    pub collected_at: DateTime<Utc>,
}

impl ArtistCollectionResult {
    #[must_use]
    pub fn success(artist: impl Into<String>, songs_collected: usize, elapsed_seconds: f64) -> Self {
        Self {
            artist: artist.into(),
            status: CollectionStatus::Success,
            songs_collected,
            elapsed_seconds,
            collected_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn failed(artist: impl Into<String>, elapsed_seconds: f64) -> Self {
        Self {
            artist: artist.into(),
            status: CollectionStatus::Failed,
            songs_collected: 0,
            elapsed_seconds,
            collected_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == CollectionStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_has_no_songs() {
        let result = ArtistCollectionResult::failed("Kate Bush", 1.5);
        assert_eq!(result.status, CollectionStatus::Failed);
        assert_eq!(result.songs_collected, 0);
        assert!(!result.is_success());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&CollectionStatus::Success).unwrap();
        assert_eq!(json, "\"success\"");
        assert_eq!(CollectionStatus::Failed.to_string(), "failed");
    }
}
