//! Query engine
//!
//! Ranked keyword search over a [`SearchIndex`]:
//! - exact phase against the inverted index
//! - fuzzy phase comparing indexed keywords with Jaro-Winkler
//! - optional excerpts around each matched keyword

mod jaro;
mod snippet;

pub use jaro::{jaro, jaro_winkler};
pub use snippet::{extract_excerpt, Excerpt, EXCERPT_RADIUS, MARK_CLOSE, MARK_OPEN};

use crate::category::Category;
use crate::extract::extract_keywords;
use crate::index::SearchIndex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Queries shorter than this (trimmed, in chars) return nothing
pub const MIN_QUERY_CHARS: usize = 2;
/// Base score of an exact keyword hit
pub const EXACT_SCORE: f64 = 10.0;
/// Base score of a fuzzy hit, scaled by similarity
pub const FUZZY_SCORE: f64 = 5.0;
/// Multiplier when the module title contains the matched keyword
pub const TITLE_MULTIPLIER: f64 = 2.0;
/// Keywords whose length differs from the first query token by more are skipped
pub const MAX_LENGTH_DELTA: usize = 3;

/// Search options
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Maximum number of results
    pub max_results: usize,
    /// Only return modules of this category
    pub category: Option<Category>,
    pub fuzzy_enabled: bool,
    pub include_excerpts: bool,
    /// Fuzzy matches need a similarity strictly above this
    pub fuzzy_threshold: f64,
    /// Ceiling on Jaro-Winkler comparisons per query
    pub max_fuzzy_checks: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 20,
            category: None,
            fuzzy_enabled: true,
            include_excerpts: true,
            fuzzy_threshold: 0.7,
            max_fuzzy_checks: 1000,
        }
    }
}

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub module_id: String,
    pub title: String,
    pub category: Category,
    pub score: f64,
    pub matched_keywords: Vec<String>,
    pub excerpts: Vec<String>,
}

/// Accumulates hits in first-discovery order
#[derive(Default)]
struct Accumulator {
    hits: Vec<SearchHit>,
    positions: HashMap<String, usize>,
}

impl Accumulator {
    fn credit(&mut self, index: &SearchIndex, module_id: &str, keyword: &str, base: f64) {
        let Some(record) = index.get(module_id) else {
            return;
        };
        let score = if record.title.to_lowercase().contains(keyword) {
            base * TITLE_MULTIPLIER
        } else {
            base
        };

        let pos = match self.positions.get(module_id) {
            Some(pos) => *pos,
            None => {
                self.hits.push(SearchHit {
                    module_id: module_id.to_string(),
                    title: record.title.clone(),
                    category: record.category,
                    score: 0.0,
                    matched_keywords: Vec::new(),
                    excerpts: Vec::new(),
                });
                self.positions.insert(module_id.to_string(), self.hits.len() - 1);
                self.hits.len() - 1
            }
        };

        let hit = &mut self.hits[pos];
        hit.score += score;
        if !hit.matched_keywords.iter().any(|k| k == keyword) {
            hit.matched_keywords.push(keyword.to_string());
        }
    }
}

/// Answers keyword queries against one index snapshot
pub struct QueryEngine<'a> {
    index: &'a SearchIndex,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a SearchIndex) -> Self {
        Self { index }
    }

    /// Ranked hits for `query`; never fails, possibly empty
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        if query.trim().chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }
        let tokens = extract_keywords(query);
        let mut acc = Accumulator::default();

        for token in &tokens {
            for module_id in self.index.modules_for(token) {
                acc.credit(self.index, module_id, token, EXACT_SCORE);
            }
        }

        if options.fuzzy_enabled && !tokens.is_empty() {
            let checks = self.fuzzy_phase(&tokens, options, &mut acc);
            debug!(query, checks, "fuzzy phase");
        }

        let mut hits = acc.hits;
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if let Some(category) = options.category {
            hits.retain(|h| h.category == category);
        }
        hits.truncate(options.max_results);

        if options.include_excerpts {
            for hit in &mut hits {
                hit.excerpts = self.excerpts(&hit.module_id, &hit.matched_keywords);
            }
        }
        hits
    }

    /// Every comparison counts toward the ceiling; the phase stops once it is reached.
    fn fuzzy_phase(&self, tokens: &[String], options: &SearchOptions, acc: &mut Accumulator) -> usize {
        let first_len = tokens[0].chars().count();
        let mut checks = 0;

        'keywords: for keyword in self.index.all_keywords() {
            if keyword.chars().count().abs_diff(first_len) > MAX_LENGTH_DELTA {
                continue;
            }
            for token in tokens {
                if checks >= options.max_fuzzy_checks {
                    break 'keywords;
                }
                checks += 1;

                let similarity = jaro_winkler(keyword, token);
                if similarity > options.fuzzy_threshold && similarity < 1.0 {
                    for module_id in self.index.modules_for(keyword) {
                        acc.credit(self.index, module_id, keyword, FUZZY_SCORE * similarity);
                    }
                }
            }
        }
        checks
    }

    fn excerpts(&self, module_id: &str, keywords: &[String]) -> Vec<String> {
        let Some(record) = self.index.get(module_id) else {
            return Vec::new();
        };
        let mut excerpts: Vec<String> = Vec::new();
        for keyword in keywords {
            if let Some(excerpt) = extract_excerpt(&record.full_text, keyword, EXCERPT_RADIUS) {
                if !excerpts.contains(&excerpt.text) {
                    excerpts.push(excerpt.text);
                }
            }
        }
        excerpts
    }
}

/// Convenience wrapper around [`QueryEngine::search`]
pub fn search(index: &SearchIndex, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
    QueryEngine::new(index).search(query, options)
}
