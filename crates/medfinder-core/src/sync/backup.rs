//! Backup file format

use super::{DeviceInfo, SyncHistory, UserData};
use crate::error::{MedfinderError, Result};
use crate::index::SearchIndex;
use crate::registry::ModuleRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const BACKUP_TYPE: &str = "medfinder-backup";
pub const BACKUP_VERSION: u32 = 1;

/// Full snapshot of one device's state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: u32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub device_info: DeviceInfo,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub registry: ModuleRegistry,
    #[serde(default)]
    pub search_index: SearchIndex,
    #[serde(default)]
    pub user_data: UserData,
    #[serde(default)]
    pub sync_history: SyncHistory,
}

impl Backup {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate and parse a backup file.
    ///
    /// `type` must be present and equal to [`BACKUP_TYPE`], `version` must be
    /// present; anything else is an [`MedfinderError::InvalidBackup`].
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| MedfinderError::InvalidBackup(format!("not JSON: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| MedfinderError::InvalidBackup("expected a JSON object".into()))?;

        match object.get("type").and_then(Value::as_str) {
            None | Some("") => return Err(MedfinderError::InvalidBackup("missing type".into())),
            Some(kind) if kind != BACKUP_TYPE => {
                return Err(MedfinderError::InvalidBackup(format!(
                    "unexpected type '{}'",
                    kind
                )))
            }
            Some(_) => {}
        }
        match object.get("version") {
            None | Some(Value::Null) => {
                return Err(MedfinderError::InvalidBackup("missing version".into()))
            }
            Some(v) if v.as_u64().map_or(true, |n| n == 0) => {
                return Err(MedfinderError::InvalidBackup(format!(
                    "unsupported version {}",
                    v
                )))
            }
            Some(_) => {}
        }

        let mut backup: Backup = serde_json::from_value(value)
            .map_err(|e| MedfinderError::InvalidBackup(e.to_string()))?;
        backup.registry = backup.registry.restored()?;
        backup.search_index.rebuild();
        Ok(backup)
    }
}
