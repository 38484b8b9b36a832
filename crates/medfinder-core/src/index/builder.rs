//! Batched index construction

use super::SearchIndex;
use crate::config::IndexConfig;
use crate::error::{MedfinderError, Result};
use crate::extract::{ContentExtractor, ContentRecord};
use crate::fetch::DocumentFetcher;
use crate::registry::{ModuleRecord, ModuleRegistry};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of an index build
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub indexed: usize,
    pub failed: Vec<String>,
    pub batches: usize,
    #[serde(skip)]
    pub duration: Duration,
    /// A newer build or replacement won the race; this result was discarded
    pub superseded: bool,
}

/// Fetches registry documents in bounded batches and extracts their content
pub struct IndexBuilder {
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: ContentExtractor,
    config: IndexConfig,
}

impl IndexBuilder {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, config: IndexConfig) -> Self {
        Self {
            fetcher,
            extractor: ContentExtractor::new(),
            config,
        }
    }

    async fn index_one(&self, module: &ModuleRecord) -> Result<ContentRecord> {
        let doc = tokio::time::timeout(self.config.fetch_timeout(), self.fetcher.get(&module.path))
            .await
            .map_err(|_| MedfinderError::Timeout {
                path: module.path.clone(),
                secs: self.config.fetch_timeout_secs,
            })??;
        self.extractor.extract_html(&doc.body, module)
    }

    /// Build a fresh index for every module in `registry`.
    ///
    /// At most `batch_size` documents are in flight at once, with a pause between
    /// batches. Modules that cannot be fetched or parsed are logged and left out.
    pub async fn build(&self, registry: &ModuleRegistry) -> (SearchIndex, BuildReport) {
        let started = Instant::now();
        let modules: Vec<&ModuleRecord> = registry.iter().collect();
        let batch_size = self.config.batch_size.max(1);

        let mut index = SearchIndex::new();
        let mut report = BuildReport::default();

        for (n, batch) in modules.chunks(batch_size).enumerate() {
            if n > 0 {
                tokio::time::sleep(self.config.batch_pause()).await;
            }
            let results = join_all(batch.iter().map(|m| self.index_one(m))).await;
            for (module, result) in batch.iter().zip(results) {
                match result {
                    Ok(record) => {
                        debug!(module = %module.id, words = record.word_count, "indexed");
                        index.insert(record);
                    }
                    Err(e) => {
                        warn!(module = %module.id, error = %e, "skipping module");
                        report.failed.push(module.id.clone());
                    }
                }
            }
            report.batches += 1;
        }

        index.rebuild();
        report.indexed = index.total_indexed();
        report.duration = started.elapsed();
        info!(
            indexed = report.indexed,
            failed = report.failed.len(),
            batches = report.batches,
            "index build complete"
        );
        (index, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::fetch::MemoryFetcher;

    fn registry(paths: &[&str]) -> ModuleRegistry {
        ModuleRegistry::from_records(
            paths
                .iter()
                .map(|p| ModuleRecord::new(p, Category::Organoazidurien, p)),
        )
    }

    fn config(batch_size: usize) -> IndexConfig {
        IndexConfig {
            batch_size,
            batch_pause_ms: 10,
            fetch_timeout_secs: 10,
        }
    }

    #[tokio::test]
    async fn test_batches_and_failures() {
        let fetcher = Arc::new(MemoryFetcher::new());
        for i in 0..7 {
            fetcher.insert(
                &format!("organoazidurien/m{}.html", i),
                &format!("<p>Methylmalonazidurie Dokument Nummer {} mit genug Text.</p>", i),
            );
        }
        fetcher.fail("organoazidurien/m3.html");

        let paths: Vec<String> = (0..8).map(|i| format!("organoazidurien/m{}.html", i)).collect();
        let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        let builder = IndexBuilder::new(fetcher, config(3));
        let (index, report) = builder.build(&registry(&refs)).await;

        assert_eq!(report.batches, 3);
        assert_eq!(report.indexed, 6);
        assert_eq!(index.total_indexed(), 6);
        assert_eq!(
            report.failed,
            vec![
                "organoazidurien_m3_html".to_string(),
                "organoazidurien_m7_html".to_string()
            ]
        );
        assert_eq!(index.modules_for("methylmalonazidurie").len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_document_times_out() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_document("organoazidurien/a.html", "<p>Propionazidämie ausführlich erklärt.</p>")
                .with_document("organoazidurien/b.html", "<p>Isovalerianazidämie ausführlich erklärt.</p>"),
        );
        fetcher.delay("organoazidurien/b.html", Duration::from_secs(120));

        let builder = IndexBuilder::new(fetcher, config(5));
        let (index, report) = builder
            .build(&registry(&["organoazidurien/a.html", "organoazidurien/b.html"]))
            .await;

        assert_eq!(index.total_indexed(), 1);
        assert_eq!(report.failed, vec!["organoazidurien_b_html".to_string()]);
    }

    #[tokio::test]
    async fn test_postings_follow_registry_order() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_document("organoazidurien/zeta.html", "<p>Glutarazidurie Typ eins.</p>")
                .with_document("organoazidurien/alpha.html", "<p>Glutarazidurie Typ zwei.</p>"),
        );
        let builder = IndexBuilder::new(fetcher, config(1));
        let (index, _) = builder
            .build(&registry(&["organoazidurien/zeta.html", "organoazidurien/alpha.html"]))
            .await;

        assert_eq!(
            index.modules_for("glutarazidurie"),
            &[
                "organoazidurien_zeta_html".to_string(),
                "organoazidurien_alpha_html".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let builder = IndexBuilder::new(Arc::new(MemoryFetcher::new()), config(5));
        let (index, report) = builder.build(&ModuleRegistry::new()).await;
        assert!(index.is_empty());
        assert_eq!(report.batches, 0);
    }
}
