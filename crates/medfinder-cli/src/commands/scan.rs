//! Scan, index and sync commands

use crate::app::OutputFormat;
use crate::output;
use anyhow::Result;
use medfinder_core::{BuildReport, SyncCoordinator};

pub async fn run(sync: &SyncCoordinator, format: OutputFormat) -> Result<()> {
    let report = sync.scan().await;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "modules": report.total_modules(),
                "candidatesChecked": report.candidates_checked,
                "durationMs": report.duration.as_millis() as u64,
                "categories": report.categories,
            });
            print!("{}", output::to_json(&value));
        }
        OutputFormat::Cli => {
            for summary in &report.categories {
                let source = if summary.used_listing { "listing" } else { "probe" };
                println!(
                    "{:<28} {:>3} modules ({} checked, {})",
                    summary.category.display_name(),
                    summary.modules,
                    summary.candidates_checked,
                    source
                );
            }
            println!();
            println!(
                "Found {} modules in {:.1}s",
                report.total_modules(),
                report.duration.as_secs_f64()
            );
        }
    }
    Ok(())
}

pub async fn run_index(sync: &SyncCoordinator, format: OutputFormat) -> Result<()> {
    if sync.registry().is_empty() {
        eprintln!("Warning: registry is empty. Run 'medfinder scan' first.");
    }

    let report = sync.build_index().await;
    print_build(&report, format);
    Ok(())
}

pub async fn run_sync(sync: &SyncCoordinator, format: OutputFormat) -> Result<()> {
    let report = sync.full_sync().await;

    match format {
        OutputFormat::Json => print!("{}", output::to_json(&report)),
        OutputFormat::Cli => {
            println!(
                "Modules:         {} ({} candidates checked)",
                report.modules, report.candidates_checked
            );
            println!(
                "Merged:          {} added, {} updated",
                report.merged.added, report.merged.updated
            );
            print_build(&report.build, format);
        }
    }
    Ok(())
}

fn print_build(report: &BuildReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print!("{}", output::to_json(report)),
        OutputFormat::Cli => {
            println!(
                "Indexed:         {} in {} batches ({:.1}s)",
                report.indexed,
                report.batches,
                report.duration.as_secs_f64()
            );
            if !report.failed.is_empty() {
                println!("Failed:          {}", report.failed.join(", "));
            }
            if report.superseded {
                println!("Superseded by a newer build, result discarded");
            }
        }
    }
}
