//! Module registry
//!
//! Catalog of every discovered page, grouped by category. Two copies of a
//! registry (this device and another one) are reconciled with [`ModuleRegistry::merge`],
//! which adopts a foreign record only when it is new or strictly more recent.

use crate::category::{Category, ALL_CATEGORIES};
use crate::error::{MedfinderError, Result};
use crate::extract::{extract_keywords, ModuleMetadata, DEFAULT_SUBTITLE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Snapshot format version
pub const REGISTRY_VERSION: u32 = 2;

/// Scoring weights for [`ModuleRegistry::search`]
const TITLE_WEIGHT: u32 = 10;
const CATEGORY_WEIGHT: u32 = 5;
const KEYWORD_WEIGHT: u32 = 3;
const PREVIEW_WEIGHT: u32 = 1;

/// Deterministic id for a page path: non-alphanumerics become `_`, runs collapse,
/// the result is lowercased and trimmed.
pub fn module_id(path: &str) -> String {
    let mut id = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c.to_ascii_lowercase());
        } else if !id.ends_with('_') {
            id.push('_');
        }
    }
    id.trim_matches('_').to_string()
}

/// One discovered page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub path: String,
    pub category: Category,
    pub keywords: BTreeSet<String>,
    pub text_content_preview: String,
    pub last_modified: DateTime<Utc>,
    pub file_size: u64,
}

impl ModuleRecord {
    /// Minimal record for `path`, mostly useful for tests and manual additions
    pub fn new(path: &str, category: Category, title: &str) -> Self {
        Self {
            id: module_id(path),
            title: title.to_string(),
            subtitle: DEFAULT_SUBTITLE.to_string(),
            path: path.to_string(),
            category,
            keywords: extract_keywords(title).into_iter().collect(),
            text_content_preview: String::new(),
            last_modified: Utc::now(),
            file_size: 0,
        }
    }

    /// Record built from extracted page metadata
    pub fn from_metadata(
        path: &str,
        category: Category,
        metadata: ModuleMetadata,
        last_modified: DateTime<Utc>,
        file_size: u64,
    ) -> Self {
        Self {
            id: module_id(path),
            title: metadata.title,
            subtitle: metadata.subtitle,
            path: path.to_string(),
            category,
            keywords: metadata.keywords,
            text_content_preview: metadata.text_preview,
            last_modified,
            file_size,
        }
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    pub fn with_preview(mut self, preview: &str) -> Self {
        self.text_content_preview = preview.to_string();
        self
    }
}

/// Outcome of a registry merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        self.added + self.updated > 0
    }
}

/// Registry search hit
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryMatch<'a> {
    pub record: &'a ModuleRecord,
    pub score: u32,
}

/// Catalog of discovered modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRegistry {
    version: u32,
    last_update_timestamp: DateTime<Utc>,
    total_modules: usize,
    categories_to_modules: BTreeMap<Category, Vec<ModuleRecord>>,
    modules_by_id: BTreeMap<String, ModuleRecord>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    /// Empty registry with every category present
    pub fn new() -> Self {
        Self {
            version: REGISTRY_VERSION,
            last_update_timestamp: Utc::now(),
            total_modules: 0,
            categories_to_modules: ALL_CATEGORIES.iter().map(|c| (*c, Vec::new())).collect(),
            modules_by_id: BTreeMap::new(),
        }
    }

    /// Registry holding `records`; later duplicates replace earlier ones
    pub fn from_records(records: impl IntoIterator<Item = ModuleRecord>) -> Self {
        let mut registry = Self::new();
        for record in records {
            registry.upsert(record);
        }
        registry.total_modules = registry.modules_by_id.len();
        registry
    }

    /// Parse a persisted snapshot and restore the registry invariants
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: ModuleRegistry = serde_json::from_str(json)?;
        snapshot.restored()
    }

    /// Re-derive category lists and totals from `modules_by_id`
    pub(crate) fn restored(self) -> Result<Self> {
        if self.version == 0 {
            return Err(MedfinderError::Parse(
                "registry snapshot without version".to_string(),
            ));
        }
        let (version, last_update) = (self.version, self.last_update_timestamp);
        let mut registry = Self::from_records(self.modules_by_id.into_values());
        registry.version = version;
        registry.last_update_timestamp = last_update;
        Ok(registry)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update_timestamp
    }

    pub fn total_modules(&self) -> usize {
        self.total_modules
    }

    pub fn is_empty(&self) -> bool {
        self.modules_by_id.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ModuleRecord> {
        self.modules_by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules_by_id.contains_key(id)
    }

    /// Modules of one category in list order
    pub fn list(&self, category: Category) -> &[ModuleRecord] {
        self.categories_to_modules
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every module, category by category, each in list order
    pub fn iter(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.categories_to_modules.values().flatten()
    }

    /// Module count per category (zero counts included)
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        self.categories_to_modules
            .iter()
            .map(|(c, list)| (*c, list.len()))
            .collect()
    }

    /// Insert or replace a record, keeping its list position when the id is known
    pub fn add_or_update(&mut self, record: ModuleRecord) -> bool {
        let replaced = self.upsert(record);
        self.total_modules = self.modules_by_id.len();
        self.last_update_timestamp = Utc::now();
        replaced
    }

    /// Remove a record by id; absent ids are a no-op
    pub fn remove(&mut self, id: &str) -> Option<ModuleRecord> {
        let removed = self.modules_by_id.remove(id)?;
        if let Some(list) = self.categories_to_modules.get_mut(&removed.category) {
            list.retain(|m| m.id != id);
        }
        self.total_modules = self.modules_by_id.len();
        self.last_update_timestamp = Utc::now();
        Some(removed)
    }

    fn upsert(&mut self, record: ModuleRecord) -> bool {
        let previous = self.modules_by_id.insert(record.id.clone(), record.clone());

        if let Some(old) = &previous {
            if old.category != record.category {
                if let Some(list) = self.categories_to_modules.get_mut(&old.category) {
                    list.retain(|m| m.id != record.id);
                }
            }
        }

        let list = self.categories_to_modules.entry(record.category).or_default();
        match list.iter().position(|m| m.id == record.id) {
            Some(pos) => list[pos] = record,
            None => list.push(record),
        }
        previous.is_some()
    }

    /// Adopt every record of `remote` that is missing here or strictly newer.
    ///
    /// Records present in both with `remote.last_modified <= local.last_modified`
    /// are left alone, so merging a registry with itself changes nothing.
    pub fn merge(&mut self, remote: &ModuleRegistry) -> MergeReport {
        let mut report = MergeReport::default();

        for record in remote.iter() {
            let local_modified = self.modules_by_id.get(&record.id).map(|l| l.last_modified);
            match local_modified {
                None => {
                    self.upsert(record.clone());
                    report.added += 1;
                }
                Some(local) if record.last_modified > local => {
                    self.upsert(record.clone());
                    report.updated += 1;
                }
                Some(_) => report.unchanged += 1,
            }
        }

        self.total_modules = self.modules_by_id.len();
        if report.changed() && remote.last_update_timestamp > self.last_update_timestamp {
            self.last_update_timestamp = remote.last_update_timestamp;
        }
        report
    }

    /// Weighted substring search over title, category, keywords and preview.
    ///
    /// Results with a zero score are dropped; ties keep registry order.
    pub fn search(&self, query: &str) -> Vec<RegistryMatch<'_>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<RegistryMatch<'_>> = self
            .iter()
            .filter_map(|record| {
                let mut score = 0;
                if record.title.to_lowercase().contains(&needle) {
                    score += TITLE_WEIGHT;
                }
                if record.category.key().contains(&needle)
                    || record
                        .category
                        .display_name()
                        .to_lowercase()
                        .contains(&needle)
                {
                    score += CATEGORY_WEIGHT;
                }
                if record.keywords.iter().any(|k| k.contains(&needle)) {
                    score += KEYWORD_WEIGHT;
                }
                if record.text_content_preview.to_lowercase().contains(&needle) {
                    score += PREVIEW_WEIGHT;
                }
                (score > 0).then_some(RegistryMatch { record, score })
            })
            .collect();

        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches
    }
}
