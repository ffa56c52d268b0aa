//! FILENAME: core/pivot-engine/src/text.rs
//! Name normalization shared by classification, ordering, search and
//! filter-field resolution.

use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercases, strips diacritics and trims: "  Región " -> "region".
pub fn normalize(s: &str) -> String {
    fold(s).trim().to_string()
}

/// Lowercase + diacritic strip, no trimming.
fn fold(s: &str) -> String {
    s.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Case- and accent-insensitive ordering with a raw-string tiebreak so that
/// distinct names never compare equal.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

/// Bidirectional containment: either string contains the other.
pub fn contains_either(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_case_accents_and_whitespace() {
        assert_eq!(normalize("  Región "), "region");
        assert_eq!(normalize("PROMEDIO"), "promedio");
        assert_eq!(normalize("Ñandú"), "nandu");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_locale_compare_ignores_case_and_accents() {
        assert_eq!(locale_compare("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_compare("Éclair", "donut"), Ordering::Greater);
        assert_ne!(locale_compare("a", "A"), Ordering::Equal);
    }

    #[test]
    fn test_contains_either() {
        assert!(contains_either("sum(sales)", "sales"));
        assert!(contains_either("sales", "sum(sales)"));
        assert!(!contains_either("region", "sales"));
    }
}
