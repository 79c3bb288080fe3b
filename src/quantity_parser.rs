//! # Quantity Parser
//!
//! Converts a free-text quantity token into a number. Unparseable input yields
//! `None`; parsing never fails.
//!
//! Formats are tried in order, first match wins:
//!
//! 1. textual quantity words ("half", "pół", "one-and-a-half", "trzy", ...)
//! 2. ranges ("2-3" → 2.5)
//! 3. mixed numbers ("1 1/2" → 1.5)
//! 4. simple fractions ("3/4" → 0.75)
//! 5. plain decimals, with comma or dot ("1,5" → 1.5)
//!
//! ## Usage
//!
//! ```rust
//! use diet_pantry::quantity_parser::parse_quantity;
//!
//! assert_eq!(parse_quantity("2-3"), Some(2.5));
//! assert_eq!(parse_quantity("1 1/2"), Some(1.5));
//! assert_eq!(parse_quantity("pół"), Some(0.5));
//! assert_eq!(parse_quantity("1/0"), None);
//! ```

use log::trace;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static QUANTITY_PATTERNS: LazyLock<QuantityPatterns> = LazyLock::new(QuantityPatterns::new);

/// Textual quantities, matched case-insensitively against the whole token
static QUANTITY_WORDS: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // English
    map.insert("half", 0.5);
    map.insert("a half", 0.5);
    map.insert("quarter", 0.25);
    map.insert("a quarter", 0.25);
    map.insert("one-and-a-half", 1.5);
    map.insert("one and a half", 1.5);
    map.insert("one", 1.0);
    map.insert("two", 2.0);
    map.insert("three", 3.0);
    map.insert("four", 4.0);
    map.insert("five", 5.0);

    // Polish
    map.insert("pół", 0.5);
    map.insert("połowa", 0.5);
    map.insert("ćwierć", 0.25);
    map.insert("półtora", 1.5);
    map.insert("półtorej", 1.5);
    map.insert("jeden", 1.0);
    map.insert("jedna", 1.0);
    map.insert("jedno", 1.0);
    map.insert("dwa", 2.0);
    map.insert("dwie", 2.0);
    map.insert("trzy", 3.0);
    map.insert("cztery", 4.0);
    map.insert("pięć", 5.0);

    // Vulgar fractions
    map.insert("½", 0.5);
    map.insert("¼", 0.25);
    map.insert("¾", 0.75);
    map.insert("⅓", 1.0 / 3.0);
    map.insert("⅔", 2.0 / 3.0);

    map
});

/// Compiled regex patterns for the numeric formats
struct QuantityPatterns {
    /// "2-3", "1,5 - 2"
    range: Regex,
    /// "1 1/2"
    mixed: Regex,
    /// "3/4"
    fraction: Regex,
    /// "2", "1.5", "0,25"
    decimal: Regex,
}

impl QuantityPatterns {
    fn new() -> Self {
        Self {
            range: Regex::new(r"^(\d+(?:[.,]\d+)?)\s*-\s*(\d+(?:[.,]\d+)?)$")
                .expect("range pattern should be valid"),
            mixed: Regex::new(r"^(\d+)\s+(\d+)/(\d+)$").expect("mixed pattern should be valid"),
            fraction: Regex::new(r"^(\d+)/(\d+)$").expect("fraction pattern should be valid"),
            decimal: Regex::new(r"^\d*[.,]?\d+$").expect("decimal pattern should be valid"),
        }
    }
}

/// Parse a quantity token into a number
pub fn parse_quantity(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let lower = token.to_lowercase();
    if let Some(value) = QUANTITY_WORDS.get(lower.as_str()) {
        trace!("Quantity word '{}' -> {}", token, value);
        return Some(*value);
    }

    let patterns = &*QUANTITY_PATTERNS;

    if let Some(captures) = patterns.range.captures(token) {
        let low = parse_decimal(&captures[1])?;
        let high = parse_decimal(&captures[2])?;
        return Some((low + high) / 2.0);
    }

    if let Some(captures) = patterns.mixed.captures(token) {
        let whole: f64 = captures[1].parse().ok()?;
        let fraction = divide(&captures[2], &captures[3])?;
        return Some(whole + fraction);
    }

    if let Some(captures) = patterns.fraction.captures(token) {
        return divide(&captures[1], &captures[2]);
    }

    if patterns.decimal.is_match(token) {
        return parse_decimal(token);
    }

    trace!("Unparseable quantity token '{}'", token);
    None
}

/// Parse a decimal number written with a comma or a dot
fn parse_decimal(text: &str) -> Option<f64> {
    text.replace(',', ".").parse::<f64>().ok()
}

fn divide(numerator: &str, denominator: &str) -> Option<f64> {
    let numerator: f64 = numerator.parse().ok()?;
    let denominator: f64 = denominator.parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}
