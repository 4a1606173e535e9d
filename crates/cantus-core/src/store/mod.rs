//! File-backed storage for collected songs.
//!
//! [`LyricsStore`] owns the raw per-song files; [`tabular`] owns the CSV
//! exports written to the processed-data directory.

pub mod lyrics;
pub mod tabular;

pub use lyrics::{ArtistInventory, LyricsStore, PersistedPaths};
