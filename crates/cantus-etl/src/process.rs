//! Downstream normalization of the combined song export.
//!
//! Reads `all_songs_raw.csv` (or, failing that, the first CSV found in the
//! processed directory), trims each lyrics body, counts words and
//! characters, and writes `processed.csv`. Only the `artist`, `title`,
//! `album` and `lyrics` columns are required.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use cantus_core::store::tabular::{self, ALL_SONGS_FILE};

use crate::error::{CollectError, CollectResult};

pub const PROCESSED_FILE: &str = "processed.csv";

/// Rows between progress messages.
const PROGRESS_EVERY: usize = 20;

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    artist: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    album: Option<String>,
    #[serde(default)]
    lyrics: Option<String>,
}

/// One row of `processed.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedSong {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub cleaned_lyrics: String,
    pub num_words: usize,
    pub num_chars: usize,
}

/// What a processing run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub songs: usize,
    pub artists: usize,
}

/// Normalizes the collected CSV into an analysis-ready table.
#[derive(Debug, Clone)]
pub struct LyricsProcessor {
    processed_dir: PathBuf,
}

impl LyricsProcessor {
    pub fn new(processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_dir: processed_dir.into(),
        }
    }

    /// Trim surrounding whitespace from a lyrics body.
    pub fn clean_lyrics(lyrics: &str) -> String {
        lyrics.trim().to_string()
    }

    /// Clean one row and count its words and characters.
    fn process_row(row: RawRow) -> ProcessedSong {
        let cleaned_lyrics = Self::clean_lyrics(row.lyrics.as_deref().unwrap_or_default());
        ProcessedSong {
            artist: row.artist,
            title: row.title,
            album: row.album.filter(|album| !album.is_empty()),
            num_words: cleaned_lyrics.split_whitespace().count(),
            num_chars: cleaned_lyrics.chars().count(),
            cleaned_lyrics,
        }
    }

    /// Locate the input CSV: `all_songs_raw.csv`, else the first `.csv`
    /// (by name) that is not this processor's own output.
    pub fn find_input(&self) -> CollectResult<PathBuf> {
        let preferred = self.processed_dir.join(ALL_SONGS_FILE);
        if preferred.exists() {
            return Ok(preferred);
        }

        let mut candidates: Vec<PathBuf> = match fs::read_dir(&self.processed_dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
                .filter(|path| !path.ends_with(PROCESSED_FILE))
                .filter(|path| !path.ends_with(tabular::SUMMARY_FILE))
                .collect(),
            Err(_) => Vec::new(),
        };
        candidates.sort();

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| CollectError::NoInput {
                dir: self.processed_dir.clone(),
            })
    }

    /// Process the input CSV and write `processed.csv`.
    pub fn run(&self) -> CollectResult<ProcessSummary> {
        let input = self.find_input()?;
        log::info!("Loading: {}", input.display());
        println!("Loading: {}", input.display());

        let mut reader = csv::Reader::from_path(&input).map_err(cantus_core::Error::from)?;
        let rows = reader
            .deserialize::<RawRow>()
            .collect::<Result<Vec<_>, csv::Error>>()
            .map_err(cantus_core::Error::from)?;

        let total = rows.len();
        let mut processed = Vec::with_capacity(total);
        for (index, row) in rows.into_iter().enumerate() {
            processed.push(Self::process_row(row));
            if (index + 1) % PROGRESS_EVERY == 0 {
                println!("  Processed {}/{}", index + 1, total);
            }
        }

        let output = self.processed_dir.join(PROCESSED_FILE);
        tabular::write_rows(&output, &processed)?;
        println!("\nSaved processed data to: {}", output.display());

        let mut artists: Vec<&str> = processed.iter().map(|s| s.artist.as_str()).collect();
        artists.sort_unstable();
        artists.dedup();

        Ok(ProcessSummary {
            input,
            output,
            songs: processed.len(),
            artists: artists.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantus_core::model::SongRecord;
    use tempfile::TempDir;

    #[test]
    fn test_clean_lyrics_trims() {
        assert_eq!(LyricsProcessor::clean_lyrics("  la la\n\n"), "la la");
        assert_eq!(LyricsProcessor::clean_lyrics(""), "");
    }

    #[test]
    fn test_run_processes_all_songs() {
        let temp_dir = TempDir::new().unwrap();
        let songs = vec![
            SongRecord::new("Kate Bush", "Babooshka", None, "  She wanted him  \n"),
            SongRecord::new("Kate Bush", "Army Dreamers", Some("Never for Ever".to_string()), ""),
            SongRecord::new("Tori Amos", "Winter", None, "snow can wait"),
        ];
        tabular::write_all_songs(temp_dir.path(), &songs).unwrap();

        let summary = LyricsProcessor::new(temp_dir.path()).run().unwrap();
        assert_eq!(summary.songs, 3);
        assert_eq!(summary.artists, 2);

        let mut reader = csv::Reader::from_path(&summary.output).unwrap();
        let rows: Vec<ProcessedSong> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(rows[0].cleaned_lyrics, "She wanted him");
        assert_eq!(rows[0].num_words, 3);
        assert_eq!(rows[0].num_chars, 14);
        assert_eq!(rows[1].num_words, 0);
        assert_eq!(rows[1].album.as_deref(), Some("Never for Ever"));
    }

    #[test]
    fn test_find_input_falls_back_to_other_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("collected_Joni_Mitchell.csv");
        fs::write(&path, "artist,title,album,lyrics\nJoni Mitchell,River,Blue,it's coming on\n")
            .unwrap();

        let processor = LyricsProcessor::new(temp_dir.path());
        assert_eq!(processor.find_input().unwrap(), path);

        let summary = processor.run().unwrap();
        assert_eq!(summary.songs, 1);
    }

    #[test]
    fn test_find_input_without_data_fails() {
        let temp_dir = TempDir::new().unwrap();
        let processor = LyricsProcessor::new(temp_dir.path().join("missing"));
        assert!(matches!(
            processor.find_input(),
            Err(CollectError::NoInput { .. })
        ));
    }
}
