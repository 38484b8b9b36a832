//! Status command

use crate::app::OutputFormat;
use crate::output;
use anyhow::Result;
use medfinder_core::SyncCoordinator;

pub async fn run(sync: &SyncCoordinator, format: OutputFormat) -> Result<()> {
    let status = sync.status().await;

    match format {
        OutputFormat::Json => print!("{}", output::to_json(&status)),
        OutputFormat::Cli => {
            let availability = if status.store_available {
                "available"
            } else {
                "unavailable, in memory"
            };
            println!("Device:          {}", status.device.device_id);
            println!("Store:           {} ({})", status.store_type, availability);
            println!();
            println!("Registry:");
            println!("  Modules:       {}", status.modules);
            println!("  Updated:       {}", status.registry_updated.to_rfc3339());
            for (category, count) in status.categories.iter().filter(|(_, n)| **n > 0) {
                println!("  {:<24} {}", category.key(), count);
            }
            println!();
            println!("Index:");
            println!("  Indexed:       {}", status.indexed);
            println!("  Keywords:      {}", status.keywords);
            println!("  Updated:       {}", status.index_updated.to_rfc3339());
            println!();
            println!("Bookmarks:       {}", status.bookmarks);
            if let Some(event) = &status.last_event {
                println!(
                    "Last sync:       {} at {}",
                    event.kind,
                    event.timestamp.to_rfc3339()
                );
            }
        }
    }
    Ok(())
}
