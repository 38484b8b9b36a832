//! Lightweight metadata used when a module is first discovered

use super::tokenizer::extract_keywords;
use crate::html::HtmlDocument;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::BTreeSet;

lazy_static! {
    static ref NUMBERED_PART_RE: Regex =
        Regex::new(r"(?i)\b(teil|part|modul|module|kapitel|chapter)\s*(\d+)\b").unwrap();
}

/// Subtitle used when a page has neither a description nor an `<h2>`
pub const DEFAULT_SUBTITLE: &str = "Medizinisches Lernmodul";

/// Characters kept in a module's text preview
pub const PREVIEW_CHARS: usize = 500;

/// Metadata extracted from a discovered page
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleMetadata {
    pub title: String,
    pub subtitle: String,
    pub keywords: BTreeSet<String>,
    pub text_preview: String,
}

/// Resolve title, subtitle, keywords and preview for the page at `path`
pub fn extract_metadata(doc: &HtmlDocument, path: &str) -> ModuleMetadata {
    let title = doc
        .title()
        .or_else(|| doc.first_text_of("h1"))
        .unwrap_or_else(|| beautify_filename(path));

    let subtitle = doc
        .meta("description")
        .or_else(|| doc.first_text_of("h2"))
        .unwrap_or_else(|| DEFAULT_SUBTITLE.to_string());

    let mut keywords: BTreeSet<String> = BTreeSet::new();
    keywords.extend(extract_keywords(&title));
    keywords.extend(extract_keywords(&subtitle));
    if let Some(meta) = doc.meta("keywords") {
        keywords.extend(extract_keywords(&meta));
    }
    for heading in doc.select(&["h1", "h2", "h3"]) {
        keywords.extend(extract_keywords(&doc.text_content(heading)));
    }

    ModuleMetadata {
        title,
        subtitle,
        keywords,
        text_preview: doc.body_text().chars().take(PREVIEW_CHARS).collect(),
    }
}

/// Turn a file path into a display title.
///
/// `aminosaeuren/phenylketonurie_teil3.html` becomes `Phenylketonurie Teil 3`.
pub fn beautify_filename(path: &str) -> String {
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };

    let spaced = stem.replace(['_', '-'], " ");
    let numbered = NUMBERED_PART_RE.replace_all(&spaced, |caps: &Captures| {
        let word = match caps[1].to_lowercase().as_str() {
            "teil" | "part" => "Teil",
            "modul" | "module" => "Modul",
            _ => "Kapitel",
        };
        format!("{} {}", word, &caps[2])
    });

    numbered
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
