//! Medfinder CLI
//!
//! Offline discovery and fuzzy search for a medical reference site.

use anyhow::Result;
use clap::Parser;
use medfinder_core::MedfinderError;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<MedfinderError>()
            .map(MedfinderError::exit_code)
            .unwrap_or(medfinder_core::error::exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let sync = commands::open(&cli)?;

    match cli.command {
        Commands::Scan => commands::scan::run(&sync, cli.format).await,
        Commands::Index => commands::scan::run_index(&sync, cli.format).await,
        Commands::Sync => commands::scan::run_sync(&sync, cli.format).await,
        Commands::Search(args) => commands::search::run(args, &sync, cli.format),
        Commands::Find(args) => commands::search::run_find(args, &sync, cli.format),
        Commands::Ls(args) => commands::ls::run(args, &sync, cli.format),
        Commands::Status => commands::status::run(&sync, cli.format).await,
        Commands::Export(args) => commands::backup::run_export(args, &sync, cli.format),
        Commands::Import(args) => commands::backup::run_import(args, &sync, cli.format),
        Commands::Watch(args) => commands::watch::run(args, sync, cli.format).await,
    }
}
