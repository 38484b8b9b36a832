//! CLI command handlers

pub mod backup;
pub mod ls;
pub mod scan;
pub mod search;
pub mod status;
pub mod watch;

use crate::app::{Cli, Commands};
use anyhow::Result;
use medfinder_core::{fetcher_for, Config, SqliteStore, StoreHandle, SyncCoordinator};
use std::path::PathBuf;
use std::sync::Arc;

/// Path of the SQLite store (MEDFINDER_DB if set, otherwise the cache dir)
pub fn store_path() -> PathBuf {
    std::env::var("MEDFINDER_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| SqliteStore::default_path())
}

/// Load config, open the store and restore persisted state
pub fn open(cli: &Cli) -> Result<SyncCoordinator> {
    let mut config = Config::load()?;
    if let Some(source) = &cli.source {
        config.source.location = source.clone();
    }
    if let Commands::Watch(args) = &cli.command {
        if let Some(secs) = args.interval {
            config.sync.interval_secs = secs;
        }
    }

    let path = store_path();
    let store = match SqliteStore::open(&path) {
        Ok(sqlite) => StoreHandle::new(Arc::new(sqlite)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "store unavailable, using memory");
            StoreHandle::in_memory()
        }
    };

    let fetcher = fetcher_for(&config.source)?;
    let sync = SyncCoordinator::new(config, fetcher, store);
    let loaded = sync.load();
    tracing::debug!(modules = loaded.modules, indexed = loaded.indexed, "state restored");
    Ok(sync)
}
