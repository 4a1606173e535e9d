use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use cantus_etl::config::LoggingConfig;
use cantus_etl::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cantus", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory holding raw/ and processed/ (default: ~/.local/share/cantus)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Collect lyrics and metadata for the configured artists
    ///
    /// For each artist, in order:
    ///
    /// - Looks the artist up on Genius and fetches their most popular songs
    /// - Retries transient failures with a growing backoff
    /// - Writes lyrics/<artist>/<title>.txt and metadata/<artist>/<title>.json
    ///   under the raw data directory
    /// - Pauses between saved songs
    ///
    /// A failing artist or song never stops the run. Afterwards the combined
    /// and per-artist CSV exports and collection_summary.csv are written to
    /// the processed data directory.
    ///
    /// Requires a Genius access token (GENIUS_ACCESS_TOKEN, also read from
    /// .env, or genius_access_token in the config file).
    Collect {
        /// Artist to collect (repeatable; replaces the configured roster)
        #[arg(long = "artist", value_name = "NAME")]
        artists: Vec<String>,

        /// Songs per artist (overrides songs_per_artist)
        #[arg(long)]
        songs: Option<usize>,
    },
    /// Clean the collected CSV and write processed.csv
    Process,
    /// Show what has been collected so far
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults if it does not exist
    Init,
}

fn setup_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose {
        twyg::LogLevel::Debug
    } else {
        match logging.level.to_ascii_lowercase().as_str() {
            "trace" => twyg::LogLevel::Trace,
            "debug" => twyg::LogLevel::Debug,
            "warn" | "warning" => twyg::LogLevel::Warn,
            "error" => twyg::LogLevel::Error,
            _ => twyg::LogLevel::Info,
        }
    };

    let opts = twyg::OptsBuilder::new()
        .coloured(logging.coloured)
        .level(level)
        .build()
        .map_err(|e| anyhow!("Invalid logger options: {e:?}"))?;

    twyg::setup(opts).map_err(|e| anyhow!("Could not set up logger: {e:?}"))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is normal; the token may come from the environment or config.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(anyhow!("Failed to read .env: {e}"));
        }
    }

    let mut config = Config::load()?;
    if let Some(data_dir) = &cli.data_dir {
        config = config.with_data_dir(data_dir);
    }

    setup_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Collect { artists, songs } => {
            if !artists.is_empty() {
                config.artists = artists;
            }
            if let Some(songs) = songs {
                config.songs_per_artist = songs;
            }
            commands::run_collect(&config).await?;
        }
        Commands::Process => {
            commands::run_process(&config)?;
        }
        Commands::Status => {
            commands::show_status(&config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
