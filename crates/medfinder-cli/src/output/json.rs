//! JSON output formatter

use medfinder_core::{ModuleRecord, SearchHit};

pub fn format_results(hits: &[SearchHit]) -> String {
    serde_json::to_string_pretty(hits).unwrap_or_else(|_| "[]".to_string()) + "\n"
}

pub fn format_matches(matches: &[(ModuleRecord, u32)]) -> String {
    let output: Vec<serde_json::Value> = matches
        .iter()
        .map(|(m, score)| {
            serde_json::json!({
                "id": m.id,
                "score": score,
                "title": m.title,
                "category": m.category,
                "path": m.path,
            })
        })
        .collect();

    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "[]".to_string()) + "\n"
}

pub fn format_modules(modules: &[ModuleRecord]) -> String {
    let output: Vec<serde_json::Value> = modules
        .iter()
        .map(|m| {
            serde_json::json!({
                "id": m.id,
                "title": m.title,
                "subtitle": m.subtitle,
                "category": m.category,
                "path": m.path,
                "lastModified": m.last_modified,
                "fileSize": m.file_size,
            })
        })
        .collect();

    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "[]".to_string()) + "\n"
}
