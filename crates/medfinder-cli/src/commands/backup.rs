//! Backup export and import commands

use crate::app::{FileArgs, OutputFormat};
use crate::output;
use anyhow::{Context, Result};
use medfinder_core::SyncCoordinator;
use std::fs;

pub fn run_export(args: FileArgs, sync: &SyncCoordinator, format: OutputFormat) -> Result<()> {
    let backup = sync.export_backup();
    let json = backup.to_json()?;
    fs::write(&args.file, json)
        .with_context(|| format!("writing backup to {}", args.file.display()))?;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "file": args.file,
                "modules": backup.registry.total_modules(),
                "indexed": backup.search_index.total_indexed(),
            });
            print!("{}", output::to_json(&value));
        }
        OutputFormat::Cli => println!(
            "Exported {} modules ({} indexed) to {}",
            backup.registry.total_modules(),
            backup.search_index.total_indexed(),
            args.file.display()
        ),
    }
    Ok(())
}

pub fn run_import(args: FileArgs, sync: &SyncCoordinator, format: OutputFormat) -> Result<()> {
    let json = fs::read_to_string(&args.file)
        .with_context(|| format!("reading backup from {}", args.file.display()))?;
    let report = sync.import_backup(&json)?;

    match format {
        OutputFormat::Json => print!("{}", output::to_json(&report)),
        OutputFormat::Cli => {
            println!(
                "Registry:        {} added, {} updated, {} unchanged",
                report.registry.added, report.registry.updated, report.registry.unchanged
            );
            println!("Imported:        {} content records", report.imported_content);
            println!("Modules:         {}", report.modules);
            println!("Indexed:         {}", report.indexed);
        }
    }
    Ok(())
}
