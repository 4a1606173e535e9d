//! Lyrics collection pipeline for cantus.
//!
//! Fetches an artist's most popular songs from Genius with bounded
//! retries, turns each one into a [`SongRecord`], persists it through the
//! [`LyricsStore`], and accounts for every artist in a run summary. The
//! [`process`] module holds the downstream CSV normalizer.
//!
//! [`SongRecord`]: cantus_core::model::SongRecord
//! [`LyricsStore`]: cantus_core::store::LyricsStore

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod accountant;
pub mod builder;
pub mod collect;
pub mod config;
pub mod error;
pub mod genius;
pub mod process;
pub mod provider;
pub mod resilience;

pub use accountant::{RunAccountant, RunSummary};
pub use collect::Collector;
pub use config::Config;
pub use error::{CollectError, CollectResult};
pub use genius::GeniusClient;
pub use process::LyricsProcessor;
pub use provider::{FetchAdapter, FetchOutcome, RawAlbum, RawSong};
pub use resilience::{fetch_with_retry, RetryPolicy};
