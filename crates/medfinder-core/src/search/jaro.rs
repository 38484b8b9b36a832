//! Jaro-Winkler string similarity

/// Jaro similarity over chars.
///
/// The match window is `floor(max_len / 2) - 1`; a negative window yields 0.
pub fn jaro(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let window = (a.len().max(b.len()) / 2) as isize - 1;
    if window < 0 || a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let window = window as usize;

    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let a_seq = a.iter().zip(&a_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let b_seq = b.iter().zip(&b_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let mismatched = a_seq.zip(b_seq).filter(|(x, y)| x != y).count();
    let transpositions = mismatched as f64 / 2.0;

    let m = matches as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - transpositions) / m) / 3.0
}

/// Jaro similarity plus the Winkler boost `0.1 * min(4, prefix) * (1 - jaro)`
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let sim = jaro(a, b);
    if sim == 0.0 {
        return 0.0;
    }
    let prefix = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .take(4)
        .count();
    sim + 0.1 * prefix as f64 * (1.0 - sim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        assert_eq!(jaro_winkler("carnitin", "carnitin"), 1.0);
    }

    #[test]
    fn test_empty_and_tiny() {
        assert_eq!(jaro_winkler("", "x"), 0.0);
        assert_eq!(jaro_winkler("", ""), 0.0);
        // window floor(1/2) - 1 is negative
        assert_eq!(jaro_winkler("a", "a"), 0.0);
    }

    #[test]
    fn test_classic_pairs() {
        let sim = jaro("martha", "marhta");
        assert!((sim - 0.944_444).abs() < 1e-5);
        let sim = jaro_winkler("martha", "marhta");
        assert!((sim - 0.961_111).abs() < 1e-5);

        let sim = jaro_winkler("dixon", "dicksonx");
        assert!((sim - 0.813_333).abs() < 1e-5);
    }

    #[test]
    fn test_symmetric() {
        for (a, b) in [
            ("carnitin", "karnitin"),
            ("azidose", "acidose"),
            ("leucin", "isoleucin"),
            ("ammoniak", "ammonium"),
        ] {
            assert_eq!(jaro_winkler(a, b), jaro_winkler(b, a));
        }
    }

    #[test]
    fn test_umlauts_are_single_chars() {
        let sim = jaro_winkler("galaktosämie", "galaktosaemie");
        assert!(sim > 0.9 && sim < 1.0);
    }
}
