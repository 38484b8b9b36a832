//! Synchronization coordinator
//!
//! Owns the live registry, index, user data and history of one execution
//! context and keeps them in step with the persistence substrate:
//! - scans and index builds are computed off to the side and swapped in
//! - foreign writes to the store are merged back as they are announced
//! - backups are validated in full before anything is touched

mod backup;
mod cache;
mod history;
mod user_data;

pub use backup::{Backup, BACKUP_TYPE, BACKUP_VERSION};
pub use cache::{DocumentCache, NoopCache};
pub use history::{DeviceInfo, SyncEvent, SyncHistory, SyncKind};
pub use user_data::{Progress, UserData};

use crate::category::Category;
use crate::config::Config;
use crate::discovery::{DocumentProbe, ScanReport};
use crate::error::Result;
use crate::fetch::DocumentFetcher;
use crate::index::{BuildReport, IndexBuilder, SearchIndex};
use crate::registry::{MergeReport, ModuleRecord, ModuleRegistry};
use crate::search::{QueryEngine, SearchHit, SearchOptions};
use crate::shared::Shared;
use crate::store::{keys, StoreEvent, StoreHandle};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Outcome of [`SyncCoordinator::load`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub modules: usize,
    pub indexed: usize,
    pub user_data: bool,
    pub history: usize,
}

/// Outcome of [`SyncCoordinator::full_sync`]
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub modules: usize,
    pub candidates_checked: usize,
    pub merged: MergeReport,
    pub build: BuildReport,
}

/// Outcome of [`SyncCoordinator::import_backup`]
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub registry: MergeReport,
    pub imported_content: usize,
    pub user_data_changed: bool,
    pub modules: usize,
    pub indexed: usize,
}

/// Snapshot of the coordinator state for status output
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub device: DeviceInfo,
    pub store_type: &'static str,
    pub store_available: bool,
    pub modules: usize,
    pub categories: BTreeMap<Category, usize>,
    pub indexed: usize,
    pub keywords: usize,
    pub registry_updated: DateTime<Utc>,
    pub index_updated: DateTime<Utc>,
    pub bookmarks: usize,
    pub last_event: Option<SyncEvent>,
    pub cache_bytes: u64,
}

/// Drives discovery, indexing and cross-context reconciliation
pub struct SyncCoordinator {
    config: Config,
    fetcher: Arc<dyn DocumentFetcher>,
    store: StoreHandle,
    cache: Arc<dyn DocumentCache>,
    device: DeviceInfo,
    registry: Shared<ModuleRegistry>,
    index: Shared<SearchIndex>,
    user_data: Shared<UserData>,
    history: Shared<SyncHistory>,
    /// Stored registry JSON already reflected in `registry`
    absorbed_registry: Mutex<Option<String>>,
}

impl SyncCoordinator {
    /// Coordinator with empty state; call [`SyncCoordinator::load`] to restore
    pub fn new(config: Config, fetcher: Arc<dyn DocumentFetcher>, store: StoreHandle) -> Self {
        let device = match store.load::<DeviceInfo>(keys::DEVICE) {
            Some(device) if !device.device_id.is_empty() => device,
            _ => {
                let device = DeviceInfo::generate();
                store.save(keys::DEVICE, &device);
                device
            }
        };

        Self {
            config,
            fetcher,
            store,
            cache: Arc::new(NoopCache),
            device,
            registry: Shared::default(),
            index: Shared::default(),
            user_data: Shared::default(),
            history: Shared::default(),
            absorbed_registry: Mutex::new(None),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn DocumentCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn registry(&self) -> Arc<ModuleRegistry> {
        self.registry.snapshot()
    }

    pub fn index(&self) -> Arc<SearchIndex> {
        self.index.snapshot()
    }

    pub fn user_data(&self) -> Arc<UserData> {
        self.user_data.snapshot()
    }

    pub fn history(&self) -> Arc<SyncHistory> {
        self.history.snapshot()
    }

    /// Change user data locally and persist it
    pub fn update_user_data<R>(&self, f: impl FnOnce(&mut UserData) -> R) -> R {
        let result = self.user_data.update(f);
        self.store.save(keys::USER_DATA, &*self.user_data.snapshot());
        result
    }

    fn mark_absorbed(&self, raw: Option<String>) {
        *self
            .absorbed_registry
            .lock()
            .unwrap_or_else(|p| p.into_inner()) = raw;
    }

    /// Stored registry unless it is one this context already wrote, loaded or merged
    fn unabsorbed_registry(&self) -> Option<ModuleRegistry> {
        let raw = self.store.get(keys::REGISTRY)?;
        {
            let mut absorbed = self
                .absorbed_registry
                .lock()
                .unwrap_or_else(|p| p.into_inner());
            if absorbed.as_deref() == Some(raw.as_str()) {
                return None;
            }
            *absorbed = Some(raw.clone());
        }
        ModuleRegistry::from_json(&raw)
            .map_err(|e| warn!(error = %e, "ignoring unreadable stored registry"))
            .ok()
    }

    fn stored_index(&self) -> Option<SearchIndex> {
        let raw = self.store.get(keys::SEARCH_INDEX)?;
        SearchIndex::from_json(&raw)
            .map_err(|e| warn!(error = %e, "ignoring unreadable stored index"))
            .ok()
    }

    fn persist_registry(&self) {
        match self.registry.snapshot().to_json() {
            Ok(json) => {
                self.store.set(keys::REGISTRY, &json);
                self.mark_absorbed(Some(json));
            }
            Err(e) => warn!(error = %e, "failed to serialize registry"),
        }
    }

    fn persist_index(&self) {
        match self.index.snapshot().to_json() {
            Ok(json) => {
                self.store.set(keys::SEARCH_INDEX, &json);
            }
            Err(e) => warn!(error = %e, "failed to serialize index"),
        }
    }

    fn record(&self, kind: SyncKind) {
        let event = SyncEvent {
            timestamp: Utc::now(),
            kind,
            device_id: self.device.device_id.clone(),
            modules: self.registry.snapshot().total_modules(),
            indexed: self.index.snapshot().total_indexed(),
        };
        let limit = self.config.sync.history_limit;
        self.history.update(|h| h.record(event, limit));
        self.store.save(keys::SYNC_HISTORY, &*self.history.snapshot());
    }

    /// Restore state from the store; unreadable entries are skipped
    pub fn load(&self) -> LoadReport {
        let mut report = LoadReport::default();

        let raw = self.store.get(keys::REGISTRY);
        if let Some(json) = &raw {
            match ModuleRegistry::from_json(json) {
                Ok(registry) => {
                    report.modules = registry.total_modules();
                    self.registry.replace(registry);
                }
                Err(e) => warn!(error = %e, "ignoring unreadable stored registry"),
            }
        }
        self.mark_absorbed(raw);
        if let Some(index) = self.stored_index() {
            report.indexed = index.total_indexed();
            self.index.replace(index);
        }
        if let Some(data) = self.store.load::<UserData>(keys::USER_DATA) {
            report.user_data = true;
            self.user_data.replace(data);
        }
        if let Some(history) = self.store.load::<SyncHistory>(keys::SYNC_HISTORY) {
            report.history = history.len();
            self.history.replace(history);
        }

        debug!(?report, "state loaded");
        report
    }

    async fn discover(&self) -> ScanReport {
        let probe = DocumentProbe::new(Arc::clone(&self.fetcher), self.config.probe.clone());
        probe.scan_all().await
    }

    async fn precache(&self, registry: &ModuleRegistry) {
        if !self.config.sync.precache {
            return;
        }
        for module in registry.iter() {
            if let Err(e) = self.cache.cache_document(&module.path).await {
                warn!(path = %module.path, error = %e, "precache failed");
            }
        }
    }

    /// Rediscover every category and replace the registry wholesale
    pub async fn scan(&self) -> ScanReport {
        let report = self.discover().await;
        self.registry.replace(report.registry.clone());
        self.persist_registry();

        // Index content must stay a subset of the registry
        if !self.index.snapshot().is_empty() {
            let removed = self.index.update(|i| i.prune(&report.registry));
            if removed > 0 {
                debug!(removed, "pruned index entries for vanished modules");
                self.persist_index();
            }
        }

        self.precache(&report.registry).await;
        self.record(SyncKind::Scan);
        report
    }

    /// Rebuild the index from the current registry.
    ///
    /// The result is discarded (`superseded`) when another build or an import
    /// replaced the index while this one was running.
    pub async fn build_index(&self) -> BuildReport {
        let generation = self.index.begin();
        let registry = self.registry.snapshot();

        let builder = IndexBuilder::new(Arc::clone(&self.fetcher), self.config.index.clone());
        let (index, mut report) = builder.build(&registry).await;

        if self.index.commit(generation, index) {
            self.persist_index();
            self.record(SyncKind::Build);
        } else {
            info!(generation, "index build superseded, result discarded");
            report.superseded = true;
        }
        report
    }

    /// Adopt new or newer records from `remote`
    pub fn merge_remote_registry(&self, remote: &ModuleRegistry) -> MergeReport {
        let report = self.registry.update(|r| r.merge(remote));
        if report.changed() {
            self.persist_registry();
            self.record(SyncKind::Merge);
        }
        info!(
            added = report.added,
            updated = report.updated,
            unchanged = report.unchanged,
            "registry merged"
        );
        report
    }

    /// Scan, fold in whatever registry another context persisted, rebuild the index.
    ///
    /// A stored registry this context wrote or already merged is not folded in
    /// again, so modules that vanished from the site stay gone.
    pub async fn full_sync(&self) -> SyncReport {
        let foreign = self.unabsorbed_registry();

        let scan = self.discover().await;
        self.registry.replace(scan.registry.clone());
        self.record(SyncKind::Scan);

        let merged = match foreign {
            Some(foreign) => self.registry.update(|r| r.merge(&foreign)),
            None => MergeReport::default(),
        };
        self.persist_registry();
        self.precache(&scan.registry).await;

        let build = self.build_index().await;
        let report = SyncReport {
            modules: self.registry.snapshot().total_modules(),
            candidates_checked: scan.candidates_checked,
            merged,
            build,
        };
        info!(
            modules = report.modules,
            indexed = report.build.indexed,
            "full sync complete"
        );
        report
    }

    /// React to a store write; own writes are ignored.
    ///
    /// Returns whether local state changed.
    pub fn handle_store_event(&self, event: &StoreEvent) -> bool {
        if event.origin == self.store.context_id() {
            return false;
        }
        debug!(key = %event.key, origin = event.origin, "foreign store write");

        match event.key.as_str() {
            keys::REGISTRY => match self.unabsorbed_registry() {
                Some(foreign) => self.merge_remote_registry(&foreign).changed(),
                None => false,
            },
            keys::SEARCH_INDEX => match self.stored_index() {
                Some(foreign) => {
                    let taken = self.index.update(|i| i.import_merge(&foreign));
                    taken > 0
                }
                None => false,
            },
            keys::USER_DATA => match self.store.load::<UserData>(keys::USER_DATA) {
                Some(foreign) => {
                    let changed = self.user_data.update(|d| d.merge(&foreign));
                    if changed {
                        self.store.save(keys::USER_DATA, &*self.user_data.snapshot());
                    }
                    changed
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Events for this context's substrate; subscribe before spawning [`SyncCoordinator::watch`]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    /// Apply store events until the channel closes
    pub async fn watch(&self, mut events: broadcast::Receiver<StoreEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    self.handle_store_event(&event);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "store events dropped, reloading");
                    for key in [keys::REGISTRY, keys::SEARCH_INDEX, keys::USER_DATA] {
                        self.handle_store_event(&StoreEvent {
                            key: key.to_string(),
                            origin: u64::MAX,
                        });
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Run [`SyncCoordinator::full_sync`] every `sync.interval_secs`, the first
    /// one immediately. Stops after `max_runs` when given.
    pub async fn run_periodic(&self, max_runs: Option<usize>) -> usize {
        let mut ticker = tokio::time::interval(self.config.sync.interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut runs = 0;
        loop {
            if max_runs.is_some_and(|max| runs >= max) {
                return runs;
            }
            ticker.tick().await;
            self.full_sync().await;
            runs += 1;
        }
    }

    /// Ranked search over the current index snapshot
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        let index = self.index.snapshot();
        QueryEngine::new(&index).search(query, options)
    }

    /// Weighted registry search; records and scores
    pub fn find(&self, query: &str) -> Vec<(ModuleRecord, u32)> {
        let registry = self.registry.snapshot();
        registry
            .search(query)
            .into_iter()
            .map(|m| (m.record.clone(), m.score))
            .collect()
    }

    pub fn export_backup(&self) -> Backup {
        self.record(SyncKind::Export);
        Backup {
            version: BACKUP_VERSION,
            kind: BACKUP_TYPE.to_string(),
            device_info: self.device.clone(),
            timestamp: Utc::now(),
            registry: (*self.registry.snapshot()).clone(),
            search_index: (*self.index.snapshot()).clone(),
            user_data: (*self.user_data.snapshot()).clone(),
            sync_history: (*self.history.snapshot()).clone(),
        }
    }

    /// Validate `json` completely, then merge it into local state
    pub fn import_backup(&self, json: &str) -> Result<ImportReport> {
        let backup = Backup::parse(json)?;

        let registry = self.registry.update(|r| r.merge(&backup.registry));
        let imported_content = self.index.update(|i| i.import_merge(&backup.search_index));
        let user_data_changed = self.user_data.update(|d| d.merge(&backup.user_data));
        let limit = self.config.sync.history_limit;
        self.history.update(|h| h.union(&backup.sync_history, limit));

        self.persist_registry();
        self.persist_index();
        self.store.save(keys::USER_DATA, &*self.user_data.snapshot());
        self.record(SyncKind::Import);

        let report = ImportReport {
            registry,
            imported_content,
            user_data_changed,
            modules: self.registry.snapshot().total_modules(),
            indexed: self.index.snapshot().total_indexed(),
        };
        info!(
            modules = report.modules,
            indexed = report.indexed,
            from = %backup.device_info.device_id,
            "backup imported"
        );
        Ok(report)
    }

    pub async fn status(&self) -> SyncStatus {
        let registry = self.registry.snapshot();
        let index = self.index.snapshot();
        let cache_bytes = self.cache.cache_size().await.unwrap_or_else(|e| {
            warn!(error = %e, "cache size unavailable");
            0
        });

        SyncStatus {
            device: self.device.clone(),
            store_type: self.store.store_type(),
            store_available: self.store.is_available(),
            modules: registry.total_modules(),
            categories: registry.category_counts(),
            indexed: index.total_indexed(),
            keywords: index.all_keywords().len(),
            registry_updated: registry.last_update(),
            index_updated: index.last_update(),
            bookmarks: self.user_data.snapshot().bookmarks.len(),
            last_event: self.history.snapshot().last().cloned(),
            cache_bytes,
        }
    }
}
