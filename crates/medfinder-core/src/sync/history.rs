//! Sync history and device identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a sync event recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Scan,
    Build,
    Merge,
    Import,
    Export,
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncKind::Scan => "scan",
            SyncKind::Build => "build",
            SyncKind::Merge => "merge",
            SyncKind::Import => "import",
            SyncKind::Export => "export",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: SyncKind,
    pub device_id: String,
    /// Registry size after the event
    pub modules: usize,
    /// Index size after the event
    pub indexed: usize,
}

/// Bounded, oldest-first list of sync events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncHistory {
    #[serde(default)]
    pub events: Vec<SyncEvent>,
}

impl SyncHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&SyncEvent> {
        self.events.last()
    }

    /// Append and drop the oldest events beyond `limit`
    pub fn record(&mut self, event: SyncEvent, limit: usize) {
        self.events.push(event);
        self.truncate(limit);
    }

    /// Union with another device's history, ordered by time, duplicates dropped
    pub fn union(&mut self, other: &SyncHistory, limit: usize) {
        for event in &other.events {
            if !self.events.contains(event) {
                self.events.push(event.clone());
            }
        }
        self.events.sort_by_key(|e| e.timestamp);
        self.truncate(limit);
    }

    fn truncate(&mut self, limit: usize) {
        if self.events.len() > limit {
            let excess = self.events.len() - limit;
            self.events.drain(..excess);
        }
    }
}

/// Identity of this installation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_id: String,
    pub platform: String,
    pub app_version: String,
}

impl DeviceInfo {
    /// Fresh identity with a random v4 id
    pub fn generate() -> Self {
        Self {
            device_id: uuid::Uuid::new_v4().to_string(),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(secs: i64, kind: SyncKind, device: &str) -> SyncEvent {
        SyncEvent {
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            kind,
            device_id: device.to_string(),
            modules: 1,
            indexed: 1,
        }
    }

    #[test]
    fn test_record_is_bounded() {
        let mut history = SyncHistory::new();
        for i in 0..5 {
            history.record(event(i, SyncKind::Scan, "a"), 3);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.events[0].timestamp.timestamp(), 2);
        assert_eq!(history.last().unwrap().timestamp.timestamp(), 4);
    }

    #[test]
    fn test_union_orders_and_dedups() {
        let mut ours = SyncHistory::new();
        ours.record(event(10, SyncKind::Scan, "a"), 10);
        ours.record(event(30, SyncKind::Build, "a"), 10);

        let mut theirs = SyncHistory::new();
        theirs.record(event(20, SyncKind::Export, "b"), 10);
        theirs.record(event(30, SyncKind::Build, "a"), 10);

        ours.union(&theirs, 10);
        let kinds: Vec<SyncKind> = ours.events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![SyncKind::Scan, SyncKind::Export, SyncKind::Build]);
    }

    #[test]
    fn test_device_ids_are_unique() {
        let a = DeviceInfo::generate();
        let b = DeviceInfo::generate();
        assert_ne!(a.device_id, b.device_id);
        assert_eq!(a.device_id.len(), 36);
        assert_eq!(
            serde_json::to_value(SyncKind::Import).unwrap(),
            serde_json::json!("import")
        );
    }
}
