//! Keyword tokenizer shared by indexing and querying

use lazy_static::lazy_static;
use std::collections::HashSet;

/// Minimum token length in characters
pub const MIN_KEYWORD_CHARS: usize = 3;

/// German function words plus short English stop words
const STOP_WORDS: &[&str] = &[
    // German
    "der", "die", "das", "den", "dem", "des", "ein", "eine", "einer", "eines", "einem", "einen",
    "und", "oder", "aber", "auch", "als", "wie", "bei", "mit", "von", "vom", "zum", "zur", "aus",
    "auf", "für", "fuer", "über", "ueber", "unter", "nach", "vor", "bis", "durch", "gegen",
    "ohne", "um", "ist", "sind", "war", "waren", "wird", "werden", "wurde", "wurden", "hat",
    "haben", "hatte", "kann", "können", "koennen", "muss", "soll", "sich", "nicht", "kein",
    "keine", "noch", "nur", "sehr", "mehr", "dass", "wenn", "dann", "sowie", "bzw", "ggf",
    "z.b", "dieser", "diese", "dieses", "diesem", "diesen", "sie", "ihr", "ihre", "sein",
    "seine", "man", "was", "wer", "wo", "hier", "dort", "alle", "allem", "beim", "im", "ins",
    "am", "an", "zu", "so", "es", "er", "wir", "ich", "du", "da", "ob", "je",
    // English
    "the", "and", "for", "are", "with", "that", "this", "from", "was", "were", "has", "have",
    "not", "but", "you", "can", "its", "all", "any", "one", "our", "out", "who", "how", "why",
    "what", "when", "which", "there", "their", "will", "would", "should", "could", "into",
    "than", "then", "them", "these", "those", "also", "been", "being", "may", "per",
];

lazy_static! {
    static ref STOP_WORD_SET: HashSet<&'static str> = STOP_WORDS.iter().copied().collect();
}

/// True when `word` (already lowercased) is a stop word
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORD_SET.contains(word)
}

/// Split text into distinct, lowercased keywords in first-seen order.
///
/// Everything except word characters (accented letters included) and hyphens
/// becomes a separator. Tokens shorter than three characters, purely numeric
/// tokens and stop words are dropped.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .map(|t| t.trim_matches('-'))
        .filter(|t| t.chars().count() >= MIN_KEYWORD_CHARS)
        .filter(|t| !t.chars().all(|c| c.is_numeric() || c == '-'))
        .filter(|t| !is_stop_word(t))
        .filter(|t| seen.insert(t.to_string()))
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_words_and_domain_words() {
        let keywords = extract_keywords("Der Patient hat eine Azidose.");
        assert!(!keywords.contains(&"der".to_string()));
        assert!(!keywords.contains(&"hat".to_string()));
        assert!(keywords.contains(&"patient".to_string()));
        assert!(keywords.contains(&"azidose".to_string()));
    }

    #[test]
    fn test_accents_and_hyphens_survive() {
        let keywords = extract_keywords("Aminosäurestörung, β-Oxidation; Galaktosämie!");
        assert_eq!(
            keywords,
            vec!["aminosäurestörung", "β-oxidation", "galaktosämie"]
        );
    }

    #[test]
    fn test_short_numeric_and_duplicates_dropped() {
        let keywords = extract_keywords("PKU pku 2024 12-15 ab Typ1 typ1");
        assert_eq!(keywords, vec!["pku", "typ1"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   ... !!! ").is_empty());
    }
}
