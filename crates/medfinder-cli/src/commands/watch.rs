//! Watch command

use crate::app::{OutputFormat, WatchArgs};
use crate::output;
use anyhow::Result;
use medfinder_core::SyncCoordinator;

pub async fn run(args: WatchArgs, sync: SyncCoordinator, format: OutputFormat) -> Result<()> {
    if args.runs.is_none() {
        eprintln!(
            "Syncing every {}s, press Ctrl-C to stop",
            sync.config().sync.interval().as_secs()
        );
    }

    let runs = sync.run_periodic(args.runs).await;
    let history = sync.history();

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "runs": runs,
                "modules": sync.registry().total_modules(),
                "indexed": sync.index().total_indexed(),
                "lastEvent": history.last(),
            });
            print!("{}", output::to_json(&value));
        }
        OutputFormat::Cli => println!(
            "Completed {} syncs: {} modules, {} indexed",
            runs,
            sync.registry().total_modules(),
            sync.index().total_indexed()
        ),
    }
    Ok(())
}
