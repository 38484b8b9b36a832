//! Synchronization integration tests
//!
//! Tests:
//! 1. Backup export -> import on an empty store
//! 2. Invalid backups leave state untouched
//! 3. Two contexts on one SQLite file reconcile through store events
//! 4. Persistence failure degrades to memory without failing operations

use medfinder_core::config::Config;
use medfinder_core::store::keys;
use medfinder_core::sync::{SyncCoordinator, SyncKind};
use medfinder_core::{KeyValueStore, MemoryFetcher, MergeReport, SqliteStore, StoreHandle};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn site() -> Arc<MemoryFetcher> {
    Arc::new(
        MemoryFetcher::new()
            .with_document(
                "aminosaeuren/ahornsirupkrankheit.html",
                "<title>Ahornsirupkrankheit</title><h1>MSUD</h1>\
                 <p>Leucin, Isoleucin und Valin sind im Plasma erhöht.</p>",
            )
            .with_document(
                "organoazidurien/propionazidaemie.html",
                "<h1>Propionazidämie</h1><ul><li>Propionylcarnitin erhöht</li>\
                 <li>Hyperammonämie in der Krise</li></ul>",
            )
            .with_document(
                "vitamine_kofaktoren/cobalamin.html",
                "<h1>Cobalamin</h1><p>Vitamin B12 ist Kofaktor der Methylmalonyl-CoA-Mutase.</p>",
            ),
    )
}

fn config() -> Config {
    let mut config = Config::default();
    config.probe.use_directory_listing = false;
    config.index.batch_pause_ms = 0;
    config
}

async fn populated() -> SyncCoordinator {
    let sync = SyncCoordinator::new(config(), site(), StoreHandle::in_memory());
    sync.full_sync().await;
    sync.update_user_data(|d| {
        d.bookmarks.insert("organoazidurien_propionazidaemie_html".to_string());
    });
    sync
}

#[tokio::test]
async fn test_backup_round_trip_on_empty_store() {
    let source = populated().await;
    let json = source.export_backup().to_json().unwrap();

    let target = SyncCoordinator::new(config(), Arc::new(MemoryFetcher::new()), StoreHandle::in_memory());
    let report = target.import_backup(&json).unwrap();
    assert_eq!(report.registry.added, 3);

    let (src, dst) = (source.index(), target.index());
    assert_eq!(dst.total_indexed(), src.total_indexed());
    assert_eq!(
        dst.inverted_index().keys().collect::<Vec<_>>(),
        src.inverted_index().keys().collect::<Vec<_>>()
    );
    for record in src.contents() {
        assert_eq!(dst.get(&record.module_id).unwrap().keywords, record.keywords);
    }

    assert_eq!(target.registry().total_modules(), 3);
    assert!(target
        .user_data()
        .bookmarks
        .contains("organoazidurien_propionazidaemie_html"));
    let kinds: HashSet<SyncKind> = target.history().events.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&SyncKind::Export));
    assert!(kinds.contains(&SyncKind::Import));

    // Persisted too, so a fresh context sees the import
    assert!(target.store().get(keys::SEARCH_INDEX).is_some());
}

#[tokio::test]
async fn test_backup_without_version_rejected() {
    let source = populated().await;
    let mut value: serde_json::Value =
        serde_json::from_str(&source.export_backup().to_json().unwrap()).unwrap();
    value.as_object_mut().unwrap().remove("version");

    let target = populated().await;
    target.update_user_data(|d| d.bookmarks.clear());
    let registry_before = target.registry();
    let index_before = target.index();

    assert!(target.import_backup(&value.to_string()).is_err());
    assert_eq!(*target.registry(), *registry_before);
    assert_eq!(*target.index(), *index_before);
    assert!(target.user_data().bookmarks.is_empty());
}

#[tokio::test]
async fn test_contexts_reconcile_over_sqlite() {
    let dir = TempDir::new().unwrap();
    let substrate: Arc<dyn KeyValueStore> =
        Arc::new(SqliteStore::open(dir.path().join("store.sqlite")).unwrap());
    let root = StoreHandle::new(substrate);

    let writer = Arc::new(SyncCoordinator::new(config(), site(), root.attach_context()));
    let reader = Arc::new(SyncCoordinator::new(config(), site(), root.attach_context()));
    assert_eq!(writer.device().device_id, reader.device().device_id);

    let events = reader.subscribe();
    let watcher = {
        let reader = Arc::clone(&reader);
        tokio::spawn(async move { reader.watch(events).await })
    };

    writer.full_sync().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(reader.registry().total_modules(), 3);
    assert_eq!(reader.index().total_indexed(), 3);
    assert_eq!(
        reader.merge_remote_registry(&writer.registry()),
        MergeReport {
            added: 0,
            updated: 0,
            unchanged: 3
        }
    );

    watcher.abort();
}

struct FullDisk;

impl KeyValueStore for FullDisk {
    fn store_type(&self) -> &'static str {
        "full-disk"
    }
    fn get(&self, _key: &str) -> medfinder_core::Result<Option<String>> {
        Ok(None)
    }
    fn set(&self, _key: &str, _value: &str) -> medfinder_core::Result<()> {
        Err(medfinder_core::MedfinderError::StorageUnavailable(
            "quota exceeded".to_string(),
        ))
    }
    fn remove(&self, _key: &str) -> medfinder_core::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_unavailable_store_degrades() {
    let store = StoreHandle::new(Arc::new(FullDisk));
    assert!(!store.is_available());

    let sync = SyncCoordinator::new(config(), site(), store);
    let report = sync.full_sync().await;
    assert_eq!(report.modules, 3);
    assert_eq!(report.build.indexed, 3);

    let status = sync.status().await;
    assert!(!status.store_available);
    assert_eq!(status.store_type, "memory");
    assert_eq!(sync.load().modules, 3);
}
