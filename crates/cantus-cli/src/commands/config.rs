use anyhow::Result;
use cantus_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());
    println!(
        "File exists: {}\n",
        if config_path.exists() { "yes" } else { "no (using defaults)" }
    );

    let token = match config.genius_access_token.as_deref() {
        Some(token) if !token.trim().is_empty() => "<set>",
        _ => "<not set>",
    };

    println!("Settings:");
    println!("  genius_access_token: {}", token);
    println!("  artists: {}", config.artists.join(", "));
    println!("  songs_per_artist: {}", config.songs_per_artist);
    println!("  raw_data_path: {}", config.raw_data_path.display());
    println!("  processed_data_path: {}", config.processed_data_path.display());
    println!("  request_delay_secs: {}", config.request_delay_secs);
    println!("  max_retries: {}", config.max_retries);
    println!("  excluded_terms: {:?}", config.excluded_terms);
    println!("  remove_section_headers: {}", config.remove_section_headers);
    println!("  skip_non_songs: {}", config.skip_non_songs);
    println!("  logging.level: {}", config.logging.level);
    println!("  logging.coloured: {}", config.logging.coloured);

    println!("\nPriority: CLI args > ENV vars (CANTUS_*) > Config file > Defaults");

    if let Err(e) = config.validate() {
        println!("\n⚠ {}", e);
    }

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to set your Genius token and artist roster.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
