//! Search index
//!
//! Owns every [`ContentRecord`] plus the structures derived from them:
//! - keyword -> module ids (inverted index)
//! - the set of all indexed keywords
//! - per-category aggregate statistics
//!
//! Derived structures are always rebuilt from `content_by_id` as a whole,
//! never patched in place. Posting lists follow insertion order, which the
//! builder keeps equal to registry (discovery) order.

mod builder;

pub use builder::{BuildReport, IndexBuilder};

use crate::category::Category;
use crate::error::Result;
use crate::extract::{ContentRecord, Section};
use crate::registry::ModuleRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Snapshot format version
pub const INDEX_VERSION: u32 = 1;

/// Aggregates for one category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub module_count: usize,
    pub total_words: usize,
    pub keyword_frequency: BTreeMap<String, usize>,
    pub domain_terms_seen: BTreeSet<String>,
    pub table_count: usize,
    pub list_count: usize,
}

/// Summary counts for status output
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_indexed: usize,
    pub keywords: usize,
    pub total_words: usize,
    pub last_update: DateTime<Utc>,
    pub categories: BTreeMap<Category, usize>,
}

/// Inverted keyword index over content records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIndex {
    version: u32,
    last_update: DateTime<Utc>,
    total_indexed: usize,
    content_by_id: BTreeMap<String, ContentRecord>,
    /// Module ids in insertion order
    #[serde(default)]
    order: Vec<String>,
    all_keywords: BTreeSet<String>,
    inverted_index: BTreeMap<String, Vec<String>>,
    category_stats: BTreeMap<Category, CategoryStats>,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchIndex {
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            last_update: Utc::now(),
            total_indexed: 0,
            content_by_id: BTreeMap::new(),
            order: Vec::new(),
            all_keywords: BTreeSet::new(),
            inverted_index: BTreeMap::new(),
            category_stats: BTreeMap::new(),
        }
    }

    /// Index holding `records`, derived structures built
    pub fn from_records(records: impl IntoIterator<Item = ContentRecord>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.insert(record);
        }
        index.rebuild();
        index
    }

    /// Parse a persisted snapshot; derived structures are recomputed, not trusted
    pub fn from_json(json: &str) -> Result<Self> {
        let mut index: SearchIndex = serde_json::from_str(json)?;
        index.rebuild();
        Ok(index)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Add or replace a record; a replaced record keeps its position
    pub(crate) fn insert(&mut self, record: ContentRecord) {
        let id = record.module_id.clone();
        if self.content_by_id.insert(id.clone(), record).is_none() {
            self.order.push(id);
        }
    }

    /// Drop stale or duplicate ids from `order`; ids missing from it go last
    fn normalize_order(&mut self) {
        let content = &self.content_by_id;
        let mut seen: HashSet<String> = HashSet::with_capacity(content.len());
        self.order
            .retain(|id| content.contains_key(id) && seen.insert(id.clone()));
        for id in content.keys() {
            if !seen.contains(id) {
                self.order.push(id.clone());
            }
        }
    }

    /// Recompute the inverted index, keyword set and category stats from content
    pub fn rebuild(&mut self) {
        let mut inverted: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut all_keywords = BTreeSet::new();
        let mut stats: BTreeMap<Category, CategoryStats> = BTreeMap::new();

        self.normalize_order();
        for id in &self.order {
            let Some(record) = self.content_by_id.get(id) else {
                continue;
            };
            for keyword in &record.keywords {
                let ids = inverted.entry(keyword.clone()).or_default();
                if !ids.contains(id) {
                    ids.push(id.clone());
                }
                all_keywords.insert(keyword.clone());
            }

            let entry = stats.entry(record.category).or_default();
            entry.module_count += 1;
            entry.total_words += record.word_count;
            for keyword in &record.keywords {
                *entry.keyword_frequency.entry(keyword.clone()).or_insert(0) += 1;
            }
            entry
                .domain_terms_seen
                .extend(record.domain_terms.iter().cloned());
            for section in &record.sections {
                match section {
                    Section::Heading { .. } => {}
                    Section::Table { .. } => entry.table_count += 1,
                    Section::List { .. } => entry.list_count += 1,
                }
            }
        }

        self.inverted_index = inverted;
        self.all_keywords = all_keywords;
        self.category_stats = stats;
        self.total_indexed = self.content_by_id.len();
        self.last_update = Utc::now();
    }

    /// Drop everything
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Take every foreign record (foreign wins on id collision) and rebuild.
    ///
    /// Returns the number of records taken over.
    pub fn import_merge(&mut self, foreign: &SearchIndex) -> usize {
        for record in foreign.contents() {
            self.insert(record.clone());
        }
        self.rebuild();
        foreign.content_by_id.len()
    }

    /// Remove content for modules the registry no longer knows
    pub fn prune(&mut self, registry: &ModuleRegistry) -> usize {
        let before = self.content_by_id.len();
        self.content_by_id.retain(|id, _| registry.contains(id));
        self.order.retain(|id| registry.contains(id));
        let removed = before - self.content_by_id.len();
        if removed > 0 {
            self.rebuild();
        }
        removed
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    pub fn total_indexed(&self) -> usize {
        self.total_indexed
    }

    pub fn is_empty(&self) -> bool {
        self.content_by_id.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ContentRecord> {
        self.content_by_id.get(id)
    }

    /// Records in insertion order
    pub fn contents(&self) -> impl Iterator<Item = &ContentRecord> {
        self.order.iter().filter_map(|id| self.content_by_id.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn all_keywords(&self) -> &BTreeSet<String> {
        &self.all_keywords
    }

    /// Module ids containing `keyword`, in index order
    pub fn modules_for(&self, keyword: &str) -> &[String] {
        self.inverted_index
            .get(keyword)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn inverted_index(&self) -> &BTreeMap<String, Vec<String>> {
        &self.inverted_index
    }

    pub fn category_stats(&self) -> &BTreeMap<Category, CategoryStats> {
        &self.category_stats
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_indexed: self.total_indexed,
            keywords: self.all_keywords.len(),
            total_words: self.category_stats.values().map(|s| s.total_words).sum(),
            last_update: self.last_update,
            categories: self
                .category_stats
                .iter()
                .map(|(c, s)| (*c, s.module_count))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ContentExtractor;
    use crate::registry::ModuleRecord;

    fn record(path: &str, category: Category, title: &str, html: &str) -> ContentRecord {
        let module = ModuleRecord::new(path, category, title);
        ContentExtractor::new().extract_html(html, &module).unwrap()
    }

    fn sample() -> SearchIndex {
        SearchIndex::from_records(vec![
            record(
                "aminosaeuren/pku.html",
                Category::Aminosaeuren,
                "Phenylketonurie",
                "<p>Phenylalanin ist bei der Phenylketonurie erhöht.</p>",
            ),
            record(
                "aminosaeuren/msud.html",
                Category::Aminosaeuren,
                "Ahornsirupkrankheit",
                "<p>Leucin und Valin sind bei der Ahornsirupkrankheit erhöht.</p>",
            ),
            record(
                "diagnostik/screening.html",
                Category::Diagnostik,
                "Neugeborenenscreening",
                "<p>Phenylalanin wird im Screening gemessen.</p><ul><li>Tandem-MS</li></ul>",
            ),
        ])
    }

    #[test]
    fn test_inverted_index_consistency() {
        let index = sample();
        for (keyword, ids) in index.inverted_index() {
            for id in ids {
                assert!(index.get(id).unwrap().keywords.contains(keyword));
            }
        }
        for record in index.contents() {
            for keyword in &record.keywords {
                assert!(index.modules_for(keyword).contains(&record.module_id));
            }
        }
    }

    #[test]
    fn test_shared_keyword_lists_both_modules() {
        let index = sample();
        assert_eq!(
            index.modules_for("phenylalanin"),
            &[
                "aminosaeuren_pku_html".to_string(),
                "diagnostik_screening_html".to_string()
            ]
        );
        assert!(index.modules_for("unbekannt").is_empty());
    }

    #[test]
    fn test_postings_follow_insertion_order() {
        let zeta = record(
            "aminosaeuren/zeta.html",
            Category::Aminosaeuren,
            "Zeta",
            "<p>Homocystein ist erhöht.</p>",
        );
        let alpha = record(
            "aminosaeuren/alpha.html",
            Category::Aminosaeuren,
            "Alpha",
            "<p>Homocystein ist erniedrigt.</p>",
        );
        let index = SearchIndex::from_records(vec![zeta, alpha]);
        let expected = vec![
            "aminosaeuren_zeta_html".to_string(),
            "aminosaeuren_alpha_html".to_string(),
        ];
        assert_eq!(index.modules_for("homocystein"), expected.as_slice());
        assert_eq!(index.ids().cloned().collect::<Vec<_>>(), expected);

        let restored = SearchIndex::from_json(&index.to_json().unwrap()).unwrap();
        assert_eq!(restored.modules_for("homocystein"), expected.as_slice());
    }

    #[test]
    fn test_category_stats() {
        let index = sample();
        let amino = &index.category_stats()[&Category::Aminosaeuren];
        assert_eq!(amino.module_count, 2);
        assert_eq!(amino.keyword_frequency["erhöht"], 2);
        assert!(amino.domain_terms_seen.contains("phenylketonurie"));

        let diag = &index.category_stats()[&Category::Diagnostik];
        assert_eq!(diag.list_count, 1);
        assert_eq!(index.stats().total_indexed, 3);
    }

    #[test]
    fn test_import_merge_foreign_wins() {
        let mut local = sample();
        let replacement = record(
            "aminosaeuren/pku.html",
            Category::Aminosaeuren,
            "Phenylketonurie",
            "<p>Neue Fassung mit Sapropterin als Therapieoption.</p>",
        );
        let extra = record(
            "vitamine_kofaktoren/biotin.html",
            Category::VitamineKofaktoren,
            "Biotin",
            "<p>Biotinidasemangel wird mit Biotin behandelt.</p>",
        );
        let foreign = SearchIndex::from_records(vec![replacement, extra]);

        let taken = local.import_merge(&foreign);
        assert_eq!(taken, 2);
        assert_eq!(local.total_indexed(), 4);
        assert!(local
            .get("aminosaeuren_pku_html")
            .unwrap()
            .full_text
            .contains("Sapropterin"));
        assert_eq!(
            local.modules_for("phenylalanin"),
            &["diagnostik_screening_html".to_string()]
        );
        assert!(local.all_keywords().contains("sapropterin"));
    }

    #[test]
    fn test_prune_and_clear() {
        let mut index = sample();
        let registry = ModuleRegistry::from_records(vec![ModuleRecord::new(
            "aminosaeuren/pku.html",
            Category::Aminosaeuren,
            "Phenylketonurie",
        )]);
        assert_eq!(index.prune(&registry), 2);
        assert_eq!(index.total_indexed(), 1);
        assert!(index.modules_for("leucin").is_empty());

        index.clear();
        assert!(index.is_empty());
        assert!(index.inverted_index().is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let index = sample();
        let restored = SearchIndex::from_json(&index.to_json().unwrap()).unwrap();
        assert_eq!(restored.total_indexed(), index.total_indexed());
        assert_eq!(
            restored.inverted_index().keys().collect::<Vec<_>>(),
            index.inverted_index().keys().collect::<Vec<_>>()
        );
    }
}
