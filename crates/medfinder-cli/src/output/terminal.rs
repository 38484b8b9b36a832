//! Terminal output formatter

use medfinder_core::search::{MARK_CLOSE, MARK_OPEN};
use medfinder_core::{ModuleRecord, SearchHit};

/// Swap highlight tags for plain brackets
fn plain(excerpt: &str) -> String {
    excerpt.replace(MARK_OPEN, "[").replace(MARK_CLOSE, "]")
}

pub fn format_results(hits: &[SearchHit]) -> String {
    let mut output = String::new();

    for hit in hits {
        output.push_str(&format!(
            "{:>5.1} {} ({}) #{}\n",
            hit.score, hit.title, hit.category, hit.module_id
        ));
        if !hit.matched_keywords.is_empty() {
            output.push_str(&format!("      matched: {}\n", hit.matched_keywords.join(", ")));
        }
        for excerpt in &hit.excerpts {
            output.push_str(&format!("      {}\n", plain(excerpt)));
        }
    }

    output
}

pub fn format_matches(matches: &[(ModuleRecord, u32)]) -> String {
    matches
        .iter()
        .map(|(m, score)| format!("{:>3} {} ({}) {}\n", score, m.title, m.category, m.path))
        .collect()
}

pub fn format_modules(modules: &[ModuleRecord]) -> String {
    modules
        .iter()
        .map(|m| {
            if m.subtitle.is_empty() {
                format!("{} #{}\n", m.path, m.id)
            } else {
                format!("{} #{}  {}\n", m.path, m.id, m.subtitle)
            }
        })
        .collect()
}
