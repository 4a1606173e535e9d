//! Run-level accounting of per-artist outcomes.

use std::path::{Path, PathBuf};

use cantus_core::model::{ArtistCollectionResult, CollectionStatus};
use cantus_core::store::tabular;

/// Totals for one run, returned by [`RunAccountant::summarize`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub artists: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub songs_collected: usize,
    pub elapsed_seconds: f64,
    /// Where `collection_summary.csv` was written; `None` if the write failed.
    pub summary_path: Option<PathBuf>,
}

/// Append-only log of [`ArtistCollectionResult`]s for a run.
#[derive(Debug, Default, Clone)]
pub struct RunAccountant {
    results: Vec<ArtistCollectionResult>,
}

impl RunAccountant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the outcome of one artist.
    pub fn record(&mut self, result: ArtistCollectionResult) {
        log::debug!(
            "Recorded {} for {} ({} songs)",
            result.status,
            result.artist,
            result.songs_collected
        );
        self.results.push(result);
    }

    /// Results in the order they were recorded.
    pub fn results(&self) -> &[ArtistCollectionResult] {
        &self.results
    }

    /// Human-readable report, one line per artist plus a totals line.
    pub fn report(&self) -> String {
        let mut lines: Vec<String> = self
            .results
            .iter()
            .map(|result| match result.status {
                CollectionStatus::Success => format!(
                    "  ✓ {}: {} songs in {:.1}s",
                    result.artist, result.songs_collected, result.elapsed_seconds
                ),
                CollectionStatus::Failed => format!(
                    "  ✗ {}: failed after {:.1}s",
                    result.artist, result.elapsed_seconds
                ),
            })
            .collect();

        let (artists, succeeded, failed, songs, elapsed) = self.totals();
        lines.push(String::new());
        lines.push(format!(
            "  {artists} artists ({succeeded} succeeded, {failed} failed), {songs} songs in {elapsed:.1}s"
        ));
        lines.join("\n")
    }

    /// Print the report and write `collection_summary.csv` under
    /// `processed_dir`.
    ///
    /// The report is printed first; a failed CSV write is logged and leaves
    /// `summary_path` empty.
    pub fn summarize(&self, processed_dir: &Path) -> RunSummary {
        println!("\nCollection Summary");
        println!("==================\n");
        println!("{}", self.report());

        let summary_path = match tabular::write_summary(processed_dir, &self.results) {
            Ok(path) => {
                println!("\n  Summary written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::error!(
                    "Failed to write {} under {}: {}",
                    tabular::SUMMARY_FILE,
                    processed_dir.display(),
                    e
                );
                None
            }
        };

        let (artists, succeeded, failed, songs_collected, elapsed_seconds) = self.totals();
        RunSummary {
            artists,
            succeeded,
            failed,
            songs_collected,
            elapsed_seconds,
            summary_path,
        }
    }

    fn totals(&self) -> (usize, usize, usize, usize, f64) {
        let succeeded = self.results.iter().filter(|r| r.is_success()).count();
        let songs = self.results.iter().map(|r| r.songs_collected).sum();
        let elapsed = self.results.iter().map(|r| r.elapsed_seconds).sum();
        (
            self.results.len(),
            succeeded,
            self.results.len() - succeeded,
            songs,
            elapsed,
        )
    }
}
