//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use medfinder_core::{ModuleRecord, SearchHit};

/// Format ranked search hits
pub fn format_search_results(hits: &[SearchHit], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_results(hits),
        OutputFormat::Cli => terminal::format_results(hits),
    }
}

/// Format registry matches with their weights
pub fn format_matches(matches: &[(ModuleRecord, u32)], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_matches(matches),
        OutputFormat::Cli => terminal::format_matches(matches),
    }
}

/// Format a plain module listing
pub fn format_modules(modules: &[ModuleRecord], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_modules(modules),
        OutputFormat::Cli => terminal::format_modules(modules),
    }
}

/// Serialize any report as pretty JSON
pub fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}
