use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use cantus_core::model::ArtistRequest;

use crate::error::{CollectError, CollectResult};
use crate::resilience::RetryPolicy;

/// Environment variable read when no token is configured, matching the
/// name Genius uses in its own client documentation.
pub const GENIUS_TOKEN_ENV: &str = "GENIUS_ACCESS_TOKEN";

const DEFAULT_ARTISTS: [&str; 6] = [
    "Joanna Newsom",
    "Joni Mitchell",
    "Sufjan Stevens",
    "Fiona Apple",
    "Kate Bush",
    "Tori Amos",
];

/// Configuration for cantus.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CANTUS_* prefix, plus GENIUS_ACCESS_TOKEN)
/// 3. Config file (~/.config/cantus/config.toml)
/// 4. Built-in defaults (lowest priority)
///
/// The value is read once at startup and passed by reference into the
/// collector; nothing mutates it during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Genius API client access token (required for collection).
    ///
    /// Can be set via:
    /// - ENV: CANTUS_GENIUS_ACCESS_TOKEN or GENIUS_ACCESS_TOKEN
    /// - Config: genius_access_token = "..."
    pub genius_access_token: Option<String>,

    /// Artist roster processed by `cantus collect`.
    pub artists: Vec<String>,

    /// Maximum number of songs to collect per artist.
    pub songs_per_artist: usize,

    /// Root of the raw lyrics/metadata store.
    ///
    /// Default: ~/.local/share/cantus/raw
    pub raw_data_path: PathBuf,

    /// Directory for CSV exports.
    ///
    /// Default: ~/.local/share/cantus/processed
    pub processed_data_path: PathBuf,

    /// Seconds between song saves; also the base of the retry backoff.
    pub request_delay_secs: f64,

    /// Number of fetch attempts per artist.
    pub max_retries: usize,

    /// Title fragments that exclude a song (case-insensitive).
    pub excluded_terms: Vec<String>,

    /// Strip `[Chorus]`-style section headers from lyrics.
    pub remove_section_headers: bool,

    /// Skip tracklists, liner notes and other non-song pages.
    pub skip_non_songs: bool,

    pub logging: LoggingConfig,
}

/// Logger settings handed to twyg by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    pub level: String,
    pub coloured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            coloured: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            genius_access_token: None,
            artists: DEFAULT_ARTISTS.iter().map(|a| (*a).to_string()).collect(),
            songs_per_artist: 10,
            raw_data_path: default_data_dir().join("raw"),
            processed_data_path: default_data_dir().join("processed"),
            request_delay_secs: 1.0,
            max_retries: 3,
            excluded_terms: vec!["(Live)".to_string(), "(Remix)".to_string()],
            remove_section_headers: true,
            skip_non_songs: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/cantus/config.toml
    /// Reads environment variables with CANTUS_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("cantus");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let mut config: Self = builder.build().context("Failed to build configuration")?;

        if config.genius_access_token.is_none() {
            config.genius_access_token = std::env::var(GENIUS_TOKEN_ENV)
                .ok()
                .filter(|token| !token.trim().is_empty());
        }

        Ok(config)
    }

    /// Point both the raw store and the CSV exports below `data_dir`.
    ///
    /// This is used when the --data-dir CLI flag is provided.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: &Path) -> Self {
        self.raw_data_path = data_dir.join("raw");
        self.processed_data_path = data_dir.join("processed");
        self
    }

    /// Check the settings a collection run depends on.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Configuration`] naming the first bad setting.
    pub fn validate(&self) -> CollectResult<()> {
        match self.genius_access_token.as_deref() {
            Some(token) if !token.trim().is_empty() => {}
            _ => {
                return Err(CollectError::Configuration(format!(
                    "Genius access token not set (use {GENIUS_TOKEN_ENV}, \
                     CANTUS_GENIUS_ACCESS_TOKEN or genius_access_token in {})",
                    config_file_path().display()
                )));
            }
        }
        if self.artists.iter().all(|a| a.trim().is_empty()) {
            return Err(CollectError::Configuration(
                "artist roster is empty".to_string(),
            ));
        }
        if self.songs_per_artist == 0 {
            return Err(CollectError::Configuration(
                "songs_per_artist must be at least 1".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(CollectError::Configuration(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if !self.request_delay_secs.is_finite() || self.request_delay_secs < 0.0 {
            return Err(CollectError::Configuration(format!(
                "request_delay_secs must be a non-negative number, got {}",
                self.request_delay_secs
            )));
        }
        Ok(())
    }

    /// The configured roster as collection requests, skipping blank names.
    #[must_use]
    pub fn artist_requests(&self) -> Vec<ArtistRequest> {
        self.artists
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(|name| ArtistRequest::new(name, self.songs_per_artist))
            .collect()
    }

    /// Delay between song saves.
    #[must_use]
    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_delay_secs).unwrap_or(Duration::ZERO)
    }

    /// Retry policy for provider lookups.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.request_delay())
    }
}

/// Get the default data directory.
///
/// Returns: ~/.local/share/cantus (or platform equivalent)
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cantus")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/cantus/config.toml
/// - macOS: ~/Library/Application Support/cantus/config.toml
/// - Windows: %APPDATA%\cantus\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cantus")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Cantus Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CANTUS_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Genius API client access token
# Required for collecting lyrics
#
# Create an API client at: https://genius.com/api-clients
#
# Can also be set via:
# - Environment: GENIUS_ACCESS_TOKEN=your-token-here (also read from .env)
# - Environment: CANTUS_GENIUS_ACCESS_TOKEN=your-token-here
genius_access_token = "your-genius-access-token-here"

# Artists to collect, in order
artists = [
    "Joanna Newsom",
    "Joni Mitchell",
    "Sufjan Stevens",
    "Fiona Apple",
    "Kate Bush",
    "Tori Amos",
]

# Songs per artist, most popular first
songs_per_artist = 10

# Seconds between song saves; also the base delay of the retry backoff
request_delay_secs = 1.0

# Fetch attempts per artist before giving up
max_retries = 3

# Songs whose title contains one of these are skipped
excluded_terms = ["(Live)", "(Remix)"]

# Strip [Chorus], [Verse 1], ... headers from lyrics
remove_section_headers = true

# Skip tracklists, liner notes, interviews and similar pages
skip_non_songs = true

# Storage locations
#
# Can also be set via:
# - CLI: cantus --data-dir /custom/dir collect
#
# Default: Platform-specific data directory
#raw_data_path = "/path/to/cantus/raw"
#processed_data_path = "/path/to/cantus/processed"

[logging]
level = "info"
coloured = true
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
