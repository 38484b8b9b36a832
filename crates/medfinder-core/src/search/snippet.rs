//! Excerpt extraction for search results

/// Characters kept on each side of the match
pub const EXCERPT_RADIUS: usize = 100;

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";

/// Extracted excerpt with its char range in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Excerpt {
    pub text: String,
    pub start_pos: usize,
    pub end_pos: usize,
}

/// Window around the first case-insensitive occurrence of `keyword`.
///
/// Every occurrence inside the window is wrapped in `<mark>`; `...` marks a
/// side that was clipped. Returns `None` when the keyword does not occur.
pub fn extract_excerpt(text: &str, keyword: &str, radius: usize) -> Option<Excerpt> {
    let chars: Vec<char> = text.chars().collect();
    let folded = fold(&chars);
    let needle = fold(&keyword.chars().collect::<Vec<_>>());

    let pos = find_from(&folded, &needle, 0)?;
    let start = pos.saturating_sub(radius);
    let end = (pos + needle.len() + radius).min(chars.len());

    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }

    let mut cursor = start;
    let mut search_at = start;
    while let Some(hit) = find_from(&folded[..end], &needle, search_at) {
        out.extend(&chars[cursor..hit]);
        out.push_str(MARK_OPEN);
        out.extend(&chars[hit..hit + needle.len()]);
        out.push_str(MARK_CLOSE);
        cursor = hit + needle.len();
        search_at = cursor;
    }
    out.extend(&chars[cursor..end]);

    if end < chars.len() {
        out.push_str("...");
    }

    Some(Excerpt {
        text: out,
        start_pos: start,
        end_pos: end,
    })
}

/// Lowercase char by char so positions line up with the original text
fn fold(chars: &[char]) -> Vec<char> {
    chars
        .iter()
        .map(|c| c.to_lowercase().next().unwrap_or(*c))
        .collect()
}

fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}
