//! # Text Normalizer
//!
//! Produces the matching form of product names: lower-cased, letters and single
//! spaces only. Accented and Polish letters are letters.
//!
//! ```rust
//! use diet_pantry::text_normalizer::{normalize, strip_units_and_quantities};
//!
//! assert_eq!(normalize("  Mleko 3,2%  UHT "), "mleko uht");
//! assert_eq!(strip_units_and_quantities("Mąka pszenna 500 g"), "mąka pszenna");
//! ```

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

use crate::unit_patterns::QUANTITY_WITH_UNIT_REGEX;

lazy_static! {
    static ref NON_LETTER_REGEX: Regex =
        Regex::new(r"[^\p{L}\s]").expect("Non-letter pattern should be valid");
    static ref WHITESPACE_REGEX: Regex =
        Regex::new(r"\s+").expect("Whitespace pattern should be valid");
}

/// Lower-case the text, drop everything but letters and spaces, collapse whitespace
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lower = text.to_lowercase();
    let letters_only = NON_LETTER_REGEX.replace_all(&lower, "");
    let collapsed = WHITESPACE_REGEX.replace_all(&letters_only, " ");
    collapsed.trim().to_string()
}

/// Remove quantities (and the unit word following them) before normalizing
pub fn strip_units_and_quantities(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let stripped = QUANTITY_WITH_UNIT_REGEX.replace_all(text, " ");
    let normalized = normalize(&stripped);
    trace!("Stripped '{}' -> '{}'", text, normalized);
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Olive Oil"), "olive oil");
        assert_eq!(normalize("  extra   virgin\toil\n"), "extra virgin oil");
        assert_eq!(normalize("Tomatoes (canned)!"), "tomatoes canned");
    }

    #[test]
    fn test_normalize_keeps_accented_letters() {
        assert_eq!(normalize("Żółty SER"), "żółty ser");
        assert_eq!(normalize("crème fraîche"), "crème fraîche");
        assert_eq!(normalize("Łosoś wędzony"), "łosoś wędzony");
    }

    #[test]
    fn test_normalize_drops_digits() {
        assert_eq!(normalize("Jogurt 2%"), "jogurt");
        assert_eq!(normalize("123"), "");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn test_strip_units_and_quantities() {
        assert_eq!(strip_units_and_quantities("200 g mąki"), "mąki");
        assert_eq!(strip_units_and_quantities("Mleko 1 l"), "mleko");
        assert_eq!(strip_units_and_quantities("2 łyżki cukru"), "cukru");
        assert_eq!(strip_units_and_quantities("3 jajka"), "jajka");
        assert_eq!(strip_units_and_quantities("flour 500grams"), "flour");
        assert_eq!(strip_units_and_quantities("2 cloves garlic"), "garlic");
    }

    #[test]
    fn test_strip_does_not_eat_words_starting_like_units() {
        assert_eq!(strip_units_and_quantities("2 gruszki"), "gruszki");
        assert_eq!(strip_units_and_quantities("1 large egg"), "large egg");
    }

    #[test]
    fn test_strip_empty() {
        assert_eq!(strip_units_and_quantities(""), "");
        assert_eq!(strip_units_and_quantities("500 g"), "");
    }
}
