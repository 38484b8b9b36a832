//! Structural content extraction
//!
//! Turns a parsed reference page into a [`ContentRecord`]: heading sections,
//! tables and lists as typed [`Section`]s, a flattened full text and the
//! keyword and domain-term sets the search index is built from.

mod domain;
mod metadata;
mod tokenizer;

pub use domain::{has_domain_suffix, identify_domain_terms, DOMAIN_SUFFIXES, DOMAIN_TERMS};
pub use metadata::{beautify_filename, extract_metadata, ModuleMetadata, DEFAULT_SUBTITLE};
pub use tokenizer::{extract_keywords, is_stop_word, MIN_KEYWORD_CHARS};

use crate::category::Category;
use crate::error::Result;
use crate::html::{normalize_whitespace, HtmlDocument, NodeId};
use crate::registry::ModuleRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Words per minute used for reading time estimates
pub const WORDS_PER_MINUTE: usize = 200;

/// Paragraph-like elements folded into the full text outside heading scope
const PARAGRAPH_TAGS: &[&str] = &["p", "blockquote", "dd", "figcaption"];

/// One structural unit of a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Section {
    Heading {
        level: u8,
        title: String,
        text: String,
        keywords: BTreeSet<String>,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        keywords: BTreeSet<String>,
    },
    List {
        items: Vec<String>,
        keywords: BTreeSet<String>,
    },
}

impl Section {
    pub fn keywords(&self) -> &BTreeSet<String> {
        match self {
            Section::Heading { keywords, .. }
            | Section::Table { keywords, .. }
            | Section::List { keywords, .. } => keywords,
        }
    }
}

/// Searchable extraction of one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub module_id: String,
    pub title: String,
    pub category: Category,
    pub sections: Vec<Section>,
    pub keywords: BTreeSet<String>,
    pub domain_terms: BTreeSet<String>,
    pub full_text: String,
    pub word_count: usize,
    pub estimated_reading_minutes: usize,
}

/// Count whitespace-delimited words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes needed at [`WORDS_PER_MINUTE`], rounded up
pub fn reading_minutes(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE)
}

/// Extracts [`ContentRecord`]s from parsed pages
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    /// Paragraphs must be longer than this (trimmed, in chars) to be folded in
    pub min_paragraph_chars: usize,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self {
            min_paragraph_chars: 20,
        }
    }

    /// Parse `html` and extract it for `module`
    pub fn extract_html(&self, html: &str, module: &ModuleRecord) -> Result<ContentRecord> {
        let doc = HtmlDocument::parse(html)?;
        Ok(self.extract(&doc, module))
    }

    /// Extract the content record for `module` from a parsed page
    pub fn extract(&self, doc: &HtmlDocument, module: &ModuleRecord) -> ContentRecord {
        let mut keywords: BTreeSet<String> = extract_keywords(&module.title).into_iter().collect();
        let mut sections = Vec::new();
        let mut text_parts: Vec<String> = Vec::new();
        let mut covered: HashSet<NodeId> = HashSet::new();

        for heading in doc.headings() {
            let level = doc.heading_level(heading).unwrap_or(1);
            let title = doc.text_content(heading);

            let mut scope = Vec::new();
            let mut body = Vec::new();
            for sibling in doc.following_siblings(heading) {
                if doc.heading_level(*sibling).is_some() {
                    break;
                }
                let text = doc.text_content(*sibling);
                if !text.is_empty() {
                    body.push(text);
                }
                scope.push(*sibling);
            }
            let text = body.join(" ");

            let section_keywords: BTreeSet<String> =
                extract_keywords(&format!("{} {}", title, text))
                    .into_iter()
                    .collect();
            keywords.extend(section_keywords.iter().cloned());

            if !is_covered(doc, heading, &covered) {
                text_parts.push(title.clone());
                if !text.is_empty() {
                    text_parts.push(text.clone());
                }
            }
            covered.insert(heading);
            covered.extend(scope);

            sections.push(Section::Heading {
                level,
                title,
                text,
                keywords: section_keywords,
            });
        }

        for table in doc.elements_by_tag("table") {
            let descendants = doc.descendants(table);
            let headers: Vec<String> = descendants
                .iter()
                .filter(|n| doc.tag(**n) == Some("th"))
                .map(|n| doc.text_content(*n))
                .collect();
            let rows: Vec<Vec<String>> = descendants
                .iter()
                .filter(|n| doc.tag(**n) == Some("tr"))
                .map(|tr| {
                    doc.child_elements(*tr, "td")
                        .into_iter()
                        .map(|td| doc.text_content(td))
                        .collect::<Vec<_>>()
                })
                .filter(|cells| !cells.is_empty())
                .collect();
            if headers.is_empty() && rows.is_empty() {
                continue;
            }

            let mut table_keywords = BTreeSet::new();
            for cell in headers.iter().chain(rows.iter().flatten()) {
                table_keywords.extend(extract_keywords(cell));
            }
            keywords.extend(table_keywords.iter().cloned());

            if !is_covered(doc, table, &covered) {
                let cells: Vec<&str> = headers
                    .iter()
                    .chain(rows.iter().flatten())
                    .map(|s| s.as_str())
                    .collect();
                text_parts.push(cells.join(" "));
                covered.insert(table);
            }

            sections.push(Section::Table {
                headers,
                rows,
                keywords: table_keywords,
            });
        }

        for list in doc.select(&["ul", "ol"]) {
            let items: Vec<String> = doc
                .child_elements(list, "li")
                .into_iter()
                .map(|li| doc.text_content(li))
                .filter(|t| !t.is_empty())
                .collect();
            if items.is_empty() {
                continue;
            }

            let mut list_keywords = BTreeSet::new();
            for item in &items {
                list_keywords.extend(extract_keywords(item));
            }
            keywords.extend(list_keywords.iter().cloned());

            if !is_covered(doc, list, &covered) {
                text_parts.push(items.join(" "));
                covered.insert(list);
            }

            sections.push(Section::List {
                items,
                keywords: list_keywords,
            });
        }

        for paragraph in doc.select(PARAGRAPH_TAGS) {
            let text = doc.text_content(paragraph);
            if text.chars().count() <= self.min_paragraph_chars {
                continue;
            }
            keywords.extend(extract_keywords(&text));
            if !is_covered(doc, paragraph, &covered) {
                text_parts.push(text);
                covered.insert(paragraph);
            }
        }

        if let Some(meta) = doc.meta("keywords") {
            for entry in meta.split(',') {
                keywords.extend(extract_keywords(entry));
            }
        }

        let full_text = normalize_whitespace(&text_parts.join(" "));
        let words = word_count(&full_text);
        let domain_terms = identify_domain_terms(&full_text, &keywords);

        ContentRecord {
            module_id: module.id.clone(),
            title: module.title.clone(),
            category: module.category,
            sections,
            keywords,
            domain_terms,
            full_text,
            word_count: words,
            estimated_reading_minutes: reading_minutes(words),
        }
    }
}

fn is_covered(doc: &HtmlDocument, node: NodeId, covered: &HashSet<NodeId>) -> bool {
    doc.has_ancestor_or_self(node, |n| covered.contains(&n))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
<title>MCAD-Mangel</title>
<meta name="keywords" content="Fettsäureoxidation, Acylcarnitine">
</head><body>
<h1>MCAD-Mangel</h1>
<p>Der MCAD-Mangel ist die häufigste Störung der Fettsäureoxidation.</p>
<h2>Labor</h2>
<table>
  <tr><th>Parameter</th><th>Befund</th></tr>
  <tr><td>Octanoylcarnitin</td><td>erhöht</td></tr>
</table>
<h2>Therapie</h2>
<ul><li>Fastenvermeidung</li><li>Notfallprotokoll bei Infekten</li></ul>
<div><p>Langfristig ist die Prognose bei früher Diagnose sehr gut.</p></div>
</body></html>"#;

    fn module() -> ModuleRecord {
        ModuleRecord::new(
            "fettsaeureoxidation/mcad.html",
            Category::Fettsaeureoxidation,
            "MCAD-Mangel",
        )
    }

    #[test]
    fn test_sections_are_typed() {
        let record = ContentExtractor::new().extract_html(PAGE, &module()).unwrap();
        let headings = record
            .sections
            .iter()
            .filter(|s| matches!(s, Section::Heading { .. }))
            .count();
        assert_eq!(headings, 3);

        let table = record
            .sections
            .iter()
            .find_map(|s| match s {
                Section::Table { headers, rows, .. } => Some((headers, rows)),
                _ => None,
            })
            .unwrap();
        assert_eq!(table.0, &vec!["Parameter".to_string(), "Befund".to_string()]);
        assert_eq!(table.1.len(), 1);

        let list = record
            .sections
            .iter()
            .find_map(|s| match s {
                Section::List { items, .. } => Some(items),
                _ => None,
            })
            .unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_heading_scope_stops_at_next_heading() {
        let record = ContentExtractor::new().extract_html(PAGE, &module()).unwrap();
        let labor = record
            .sections
            .iter()
            .find_map(|s| match s {
                Section::Heading { title, text, .. } if title == "Labor" => Some(text),
                _ => None,
            })
            .unwrap();
        assert!(labor.contains("Octanoylcarnitin"));
        assert!(!labor.contains("Fastenvermeidung"));
    }

    #[test]
    fn test_keywords_merge_all_sources() {
        let record = ContentExtractor::new().extract_html(PAGE, &module()).unwrap();
        for expected in [
            "mcad-mangel",
            "octanoylcarnitin",
            "fastenvermeidung",
            "prognose",
            "acylcarnitine",
            "fettsäureoxidation",
        ] {
            assert!(record.keywords.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_full_text_has_no_duplicates() {
        let record = ContentExtractor::new().extract_html(PAGE, &module()).unwrap();
        assert_eq!(record.full_text.matches("häufigste").count(), 1);
        assert_eq!(record.full_text.matches("Octanoylcarnitin").count(), 1);
        assert_eq!(record.word_count, word_count(&record.full_text));
        assert_eq!(
            record.estimated_reading_minutes,
            reading_minutes(record.word_count)
        );
    }

    #[test]
    fn test_paragraph_outside_heading_scope() {
        let html = "<body><div><p>Eine Hyperammonämie ist ein Notfall und muss sofort behandelt werden.</p></div></body>";
        let record = ContentExtractor::new().extract_html(html, &module()).unwrap();
        assert!(record.full_text.contains("Hyperammonämie"));
        assert!(record.keywords.contains("hyperammonämie"));
        assert!(record.domain_terms.contains("hyperammonämie"));
    }

    #[test]
    fn test_short_paragraphs_ignored() {
        let html = "<body><div><p>Kurz.</p></div></body>";
        let record = ContentExtractor::new().extract_html(html, &module()).unwrap();
        assert!(record.full_text.is_empty());
        assert_eq!(record.word_count, 0);
        assert_eq!(record.estimated_reading_minutes, 0);
    }

    #[test]
    fn test_reading_minutes_rounds_up() {
        assert_eq!(reading_minutes(1), 1);
        assert_eq!(reading_minutes(200), 1);
        assert_eq!(reading_minutes(201), 2);
    }

    #[test]
    fn test_deeply_nested_page_extracts() {
        let depth = 20_000;
        let html = format!(
            "<html><head><title>Galaktosämie</title></head><body>{}<p>Bei Galaktosämie muss Galaktose streng gemieden werden.</p>{}</body></html>",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let record = ContentExtractor::new().extract_html(&html, &module()).unwrap();
        assert!(record.full_text.contains("Galaktose streng gemieden"));
        assert!(record.keywords.contains("galaktose"));
    }
}
