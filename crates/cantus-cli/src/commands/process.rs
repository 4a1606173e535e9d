use anyhow::{Context, Result};
use cantus_etl::{Config, LyricsProcessor};

pub fn run_process(config: &Config) -> Result<()> {
    let processor = LyricsProcessor::new(&config.processed_data_path);
    let summary = processor.run().context("Processing failed")?;

    println!("\n✓ Processed {} songs", summary.songs);
    println!("  Artists: {}", summary.artists);

    Ok(())
}
