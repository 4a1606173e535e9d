//! Collection error types for the pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while collecting an artist's songs.
#[derive(Debug, Error)]
pub enum CollectError {
    /// An HTTP request to the provider failed.
    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },

    /// The provider returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// The requested artist does not exist at the provider.
    #[error("not found: {entity} at {source_name}")]
    NotFound { entity: String, source_name: String },

    /// The artist exists but has no songs to collect.
    #[error("no songs for {artist}")]
    Empty { artist: String },

    /// A response from the provider could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// A song could not be written to the store.
    #[error("persistence error: {0}")]
    Persistence(#[from] cantus_core::Error),

    /// A required setting is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// There is no collected CSV to process.
    #[error("no input data found in {}; run collection first", dir.display())]
    NoInput { dir: PathBuf },
}

/// Convenience alias for collection results.
pub type CollectResult<T> = std::result::Result<T, CollectError>;

/// Longest provider or storage error message echoed to the console.
pub const MAX_CAUSE_CHARS: usize = 200;

/// Shorten `message` to at most `max` characters for console output.
pub fn truncate_cause(message: &str, max: usize) -> String {
    if message.chars().count() <= max {
        return message.to_string();
    }
    let mut short: String = message.chars().take(max).collect();
    short.push_str("...");
    short
}
