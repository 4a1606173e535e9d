//! The collection orchestrator.
//!
//! Processes one artist at a time: fetch with retries, then build and
//! persist each song with a fixed pause between saves. Per-song failures
//! are logged and skipped; per-artist failures become a failed
//! [`ArtistCollectionResult`]. Nothing here aborts a run.

use std::path::Path;
use std::time::{Duration, Instant};

use backon::Sleeper;

use cantus_core::model::{ArtistCollectionResult, ArtistRequest, SongRecord};
use cantus_core::store::{tabular, LyricsStore};

use crate::accountant::{RunAccountant, RunSummary};
use crate::builder;
use crate::config::Config;
use crate::error::{truncate_cause, MAX_CAUSE_CHARS};
use crate::provider::{FetchAdapter, FetchOutcome};
use crate::resilience::{fetch_with_retry, RetryPolicy};

/// The sleeper used outside of tests.
pub type TokioSleep = fn(Duration) -> tokio::time::Sleep;

/// Drives a [`FetchAdapter`] over a roster and persists what it returns.
#[derive(Debug)]
pub struct Collector<'a, A, S = TokioSleep> {
    config: &'a Config,
    adapter: A,
    store: LyricsStore,
    accountant: RunAccountant,
    sleeper: S,
}

impl<'a, A: FetchAdapter> Collector<'a, A> {
    /// Create a collector storing songs under `config.raw_data_path`.
    pub fn new(config: &'a Config, adapter: A) -> Self {
        Self {
            config,
            adapter,
            store: LyricsStore::new(&config.raw_data_path),
            accountant: RunAccountant::new(),
            sleeper: tokio::time::sleep,
        }
    }
}

impl<'a, A, S> Collector<'a, A, S>
where
    A: FetchAdapter,
    S: Sleeper + Clone,
{
    /// Replace the sleeper used for retry backoff and song pacing.
    pub fn with_sleeper<S2: Sleeper + Clone>(self, sleeper: S2) -> Collector<'a, A, S2> {
        Collector {
            config: self.config,
            adapter: self.adapter,
            store: self.store,
            accountant: self.accountant,
            sleeper,
        }
    }

    pub fn store(&self) -> &LyricsStore {
        &self.store
    }

    pub fn accountant(&self) -> &RunAccountant {
        &self.accountant
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.config.retry_policy()
    }

    /// Collect one artist and record the outcome.
    ///
    /// Returns the songs that were persisted; empty when the lookup failed.
    pub async fn collect_artist(&mut self, request: &ArtistRequest) -> Vec<SongRecord> {
        let started = Instant::now();
        log::info!("Fetching songs for {}...", request.name);

        let outcome = fetch_with_retry(
            &self.adapter,
            request,
            self.retry_policy(),
            self.sleeper.clone(),
        )
        .await;

        let raw_songs = match outcome {
            FetchOutcome::Success { songs } => songs,
            other => {
                log::warn!("No songs collected for {}: {}", request.name, other);
                self.accountant.record(ArtistCollectionResult::failed(
                    &request.name,
                    started.elapsed().as_secs_f64(),
                ));
                return Vec::new();
            }
        };

        let delay = self.config.request_delay();
        let total = raw_songs.len();
        let mut collected = Vec::with_capacity(total);

        for (index, raw) in raw_songs.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                self.sleeper.sleep(delay).await;
            }

            let record = builder::build(raw, &request.name);
            match self.store.persist(&record) {
                Ok(paths) => {
                    log::info!(
                        "[{}/{}] Saved {} to {}",
                        index + 1,
                        total,
                        record.title,
                        paths.lyrics.display()
                    );
                    collected.push(record);
                }
                Err(e) => {
                    log::error!(
                        "[{}/{}] Could not save {:?} by {}: {}",
                        index + 1,
                        total,
                        record.title,
                        request.name,
                        truncate_cause(&e.to_string(), MAX_CAUSE_CHARS)
                    );
                }
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        log::info!(
            "Collected {}/{} songs for {} in {:.1}s",
            collected.len(),
            total,
            request.name,
            elapsed
        );
        self.accountant.record(ArtistCollectionResult::success(
            &request.name,
            collected.len(),
            elapsed,
        ));

        collected
    }

    /// Collect every artist in order, writing the per-artist and combined
    /// CSV exports to `config.processed_data_path`.
    ///
    /// Export failures are logged; they never stop the run.
    pub async fn collect_all(&mut self, requests: &[ArtistRequest]) -> Vec<SongRecord> {
        let processed = self.config.processed_data_path.clone();
        let mut all_songs = Vec::new();

        for (index, request) in requests.iter().enumerate() {
            log::info!(
                "Artist {}/{}: {}",
                index + 1,
                requests.len(),
                request.name
            );
            let songs = self.collect_artist(request).await;
            if !songs.is_empty() {
                export(&processed, "artist export", |dir| {
                    tabular::write_artist_songs(dir, &request.name, &songs)
                });
            }
            all_songs.extend(songs);
        }

        if !all_songs.is_empty() {
            export(&processed, "combined export", |dir| {
                tabular::write_all_songs(dir, &all_songs)
            });
        }

        all_songs
    }

    /// Print the run report and write the summary to
    /// `config.processed_data_path`.
    pub fn summarize(&self) -> RunSummary {
        self.accountant.summarize(&self.config.processed_data_path)
    }
}

fn export<F>(dir: &Path, what: &str, write: F)
where
    F: FnOnce(&Path) -> cantus_core::Result<std::path::PathBuf>,
{
    match write(dir) {
        Ok(path) => log::info!("Wrote {} to {}", what, path.display()),
        Err(e) => log::error!("Failed to write {}: {}", what, e),
    }
}
