//! Domain vocabulary recognition

use std::collections::BTreeSet;

/// Fixed in-domain vocabulary, matched by substring against the full text
pub const DOMAIN_TERMS: &[&str] = &[
    "azidose",
    "alkalose",
    "ammoniak",
    "hyperammonämie",
    "laktat",
    "pyruvat",
    "ketone",
    "hypoglykämie",
    "stoffwechsel",
    "enzym",
    "enzymdefekt",
    "mitochondrien",
    "atmungskette",
    "carnitin",
    "acylcarnitin",
    "phenylalanin",
    "phenylketonurie",
    "tyrosin",
    "leucin",
    "glycin",
    "homocystein",
    "harnstoffzyklus",
    "glykogen",
    "galaktose",
    "fruktose",
    "lysosom",
    "peroxisom",
    "sphingolipid",
    "mukopolysaccharid",
    "biotin",
    "cobalamin",
    "folat",
    "neugeborenenscreening",
    "tandem-ms",
    "diät",
    "kofaktor",
    "autosomal-rezessiv",
    "x-chromosomal",
    "metabolische krise",
];

/// Suffixes typical for disease names and enzymes
pub const DOMAIN_SUFFIXES: &[&str] = &[
    "ämie", "aemie", "urie", "ose", "ase", "pathie", "itis", "azidurie", "dystrophie",
];

/// Vocabulary terms found in `full_text` plus keywords carrying a domain suffix
pub fn identify_domain_terms<'a, I>(full_text: &str, keywords: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let lower = full_text.to_lowercase();
    let mut terms: BTreeSet<String> = DOMAIN_TERMS
        .iter()
        .filter(|term| lower.contains(*term))
        .map(|term| term.to_string())
        .collect();

    for keyword in keywords {
        if has_domain_suffix(keyword) {
            terms.insert(keyword.clone());
        }
    }
    terms
}

/// True when `keyword` ends in a domain suffix and is longer than the suffix itself
pub fn has_domain_suffix(keyword: &str) -> bool {
    DOMAIN_SUFFIXES.iter().any(|suffix| {
        keyword.ends_with(suffix) && keyword.chars().count() > suffix.chars().count() + 1
    })
}
