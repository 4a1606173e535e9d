//! CSV exports of collected songs and run summaries.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::model::{ArtistCollectionResult, SongRecord};
use crate::sanitize::sanitize;

pub const SUMMARY_FILE: &str = "collection_summary.csv";
pub const ALL_SONGS_FILE: &str = "all_songs_raw.csv";

/// File name of the per-artist intermediate export.
#[must_use]
pub fn collected_file_name(artist: &str) -> String {
    format!("collected_{}.csv", sanitize(artist).replace(' ', "_"))
}

/// Write `rows` to `path` as CSV with a header row, creating parent
/// directories as needed. An empty slice produces an empty file.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the songs collected for one artist to `collected_<artist>.csv`.
pub fn write_artist_songs(dir: &Path, artist: &str, songs: &[SongRecord]) -> Result<PathBuf> {
    let path = dir.join(collected_file_name(artist));
    write_rows(&path, songs)?;
    Ok(path)
}

/// Write every song of the run to `all_songs_raw.csv`.
pub fn write_all_songs(dir: &Path, songs: &[SongRecord]) -> Result<PathBuf> {
    let path = dir.join(ALL_SONGS_FILE);
    write_rows(&path, songs)?;
    Ok(path)
}

/// Write the per-artist outcomes of a run to `collection_summary.csv`.
pub fn write_summary(dir: &Path, results: &[ArtistCollectionResult]) -> Result<PathBuf> {
    let path = dir.join(SUMMARY_FILE);
    write_rows(&path, results)?;
    Ok(path)
}

/// Read back a song export written by [`write_all_songs`] or
/// [`write_artist_songs`].
pub fn read_songs(path: &Path) -> Result<Vec<SongRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let songs = reader
        .deserialize()
        .collect::<std::result::Result<Vec<SongRecord>, csv::Error>>()?;
    Ok(songs)
}
