use anyhow::Result;
use cantus_core::store::{tabular, LyricsStore};
use cantus_etl::process::PROCESSED_FILE;
use cantus_etl::Config;

pub fn show_status(config: &Config) -> Result<()> {
    let store = LyricsStore::new(&config.raw_data_path);
    let inventory = store.inventory()?;
    let total: usize = inventory.iter().map(|artist| artist.songs).sum();

    println!("\n📊 Cantus Status\n");
    println!("  Raw data: {}", config.raw_data_path.display());
    println!("  Artists: {}", inventory.len());
    println!("  Songs: {}", total);

    for artist in &inventory {
        println!("    {}: {}", artist.artist, artist.songs);
    }

    println!("\n  Exports: {}", config.processed_data_path.display());
    for file in [tabular::ALL_SONGS_FILE, tabular::SUMMARY_FILE, PROCESSED_FILE] {
        let present = config.processed_data_path.join(file).exists();
        println!("    {}: {}", file, if present { "yes" } else { "no" });
    }

    if inventory.is_empty() {
        println!("\n  Run `cantus collect` to start collecting");
    }

    Ok(())
}
