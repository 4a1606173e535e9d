use anyhow::{Context, Result};
use cantus_etl::{Collector, Config, GeniusClient};

pub async fn run_collect(config: &Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let requests = config.artist_requests();
    let client = GeniusClient::from_config(config).context("Failed to create Genius client")?;

    println!("\n🎤 Collecting lyrics\n");
    println!("  Artists: {}", requests.len());
    println!("  Songs per artist: {}", config.songs_per_artist);
    println!("  Raw data: {}", config.raw_data_path.display());
    println!("  Exports: {}\n", config.processed_data_path.display());

    let mut collector = Collector::new(config, client);
    let songs = collector.collect_all(&requests).await;
    log::info!("Collected {} songs in total", songs.len());

    let summary = collector.summarize();

    if summary.songs_collected > 0 {
        println!("\n  Run `cantus process` to build processed.csv");
    }

    Ok(())
}
