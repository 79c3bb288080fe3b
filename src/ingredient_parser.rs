//! # Ingredient Parser
//!
//! Turns raw ingestion input into [`ParsedIngredient`] values. Two shapes of
//! input are supported:
//!
//! - a row of already separated tokens (name, quantity, unit), as produced by a
//!   table import
//! - a free-text line such as "200 g mąki" or "pół szklanki mleka"
//!
//! Units are normalized through the unit catalog. A unit token that is not in
//! the catalog is kept verbatim and flagged with `has_custom_unit`. When no unit
//! is given at all, the name is searched for one and the piece unit is used as
//! the fallback. Only a unit written as the whole name or right after a number
//! is taken, never one found inside a word.
//!
//! ## Usage
//!
//! ```rust
//! use diet_pantry::ingredient_parser::{parse_ingredient_row, parse_ingredient_text};
//! use diet_pantry::unit_service::UnitService;
//!
//! let units = UnitService::new();
//!
//! let flour = parse_ingredient_text(&units, "200 g mąki").unwrap();
//! assert_eq!(flour.name, "mąki");
//! assert_eq!(flour.quantity, Some(200.0));
//! assert_eq!(flour.unit, "g");
//!
//! let milk = parse_ingredient_row(&units, "Mleko", "1,5", "Litry");
//! assert_eq!(milk.unit, "l");
//! assert_eq!(milk.quantity, Some(1.5));
//! ```

use log::{debug, trace};
use regex::Regex;
use std::sync::LazyLock;

use crate::ingredient_model::ParsedIngredient;
use crate::quantity_parser::parse_quantity;
use crate::unit_service::UnitService;

/// Leading quantity of a free-text line: decimals, ranges, fractions and mixed numbers
static LEADING_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<qty>\d+(?:[.,]\d+)?(?:\s*-\s*\d+(?:[.,]\d+)?|\s+\d+/\d+|/\d+)?|[½¼¾⅓⅔])\s*(?P<rest>.*)$",
    )
    .expect("Leading quantity pattern should be valid")
});

/// Build an ingredient from separate name, quantity and unit tokens
pub fn parse_ingredient_row(
    units: &UnitService,
    name: &str,
    quantity_token: &str,
    unit_token: &str,
) -> ParsedIngredient {
    let name = name.trim();
    let quantity_token = quantity_token.trim();
    let unit_token = unit_token.trim();

    let original = [quantity_token, unit_token, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    let mut ingredient = ParsedIngredient::new(name).with_original(&original);
    ingredient.quantity = parse_quantity(quantity_token);
    if !quantity_token.is_empty() && ingredient.quantity.is_none() {
        debug!("Unparseable quantity '{}' for '{}'", quantity_token, name);
    }

    apply_unit(units, ingredient, unit_token)
}

/// Split a free-text line into quantity, unit and name.
///
/// Returns `None` for blank lines.
pub fn parse_ingredient_text(units: &UnitService, line: &str) -> Option<ParsedIngredient> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (quantity, rest) = split_quantity(units, line);
    let (unit_token, name) = split_unit(units, rest);

    let mut ingredient = ParsedIngredient::new(name).with_original(line);
    ingredient.quantity = quantity;
    let ingredient = apply_unit(units, ingredient, unit_token);

    trace!("Parsed '{}' -> {}", line, ingredient);
    Some(ingredient)
}

/// Parse every non-empty line of `text`
pub fn parse_ingredient_list(units: &UnitService, text: &str) -> Vec<ParsedIngredient> {
    let ingredients: Vec<ParsedIngredient> = text
        .lines()
        .filter_map(|line| parse_ingredient_text(units, line))
        .collect();
    debug!("Parsed {} ingredients from text", ingredients.len());
    ingredients
}

/// Take a numeric or textual quantity off the front of a line.
///
/// A quantity word ("pół", "two") only counts when a unit word follows it, so
/// names like "Five spice powder" or "Half and half" stay whole.
fn split_quantity<'a>(units: &UnitService, line: &'a str) -> (Option<f64>, &'a str) {
    if let Some(captures) = LEADING_QUANTITY.captures(line) {
        if let (Some(qty), Some(rest)) = (captures.name("qty"), captures.name("rest")) {
            if let Some(value) = parse_quantity(qty.as_str()) {
                return (Some(value), rest.as_str());
            }
        }
    }

    if let Some((first, rest)) = line.split_once(char::is_whitespace) {
        let rest = rest.trim_start();
        if let Some(value) = parse_quantity(first) {
            let (unit_token, _) = split_unit(units, rest);
            if !unit_token.is_empty() {
                return (Some(value), rest);
            }
        }
    }

    (None, line)
}

/// Take a known unit word off the front of the remaining text
fn split_unit<'a>(units: &UnitService, rest: &'a str) -> (&'a str, &'a str) {
    let Some((first, name)) = rest.split_once(char::is_whitespace) else {
        return ("", rest);
    };
    let name = name.trim_start();
    if name.is_empty() {
        return ("", rest);
    }

    if units.is_valid_unit(&units.normalize_unit_alias(first)) {
        (first, name)
    } else {
        ("", rest)
    }
}

fn apply_unit(units: &UnitService, ingredient: ParsedIngredient, unit_token: &str) -> ParsedIngredient {
    if unit_token.is_empty() {
        let detection = units.detect_explicit_unit(&ingredient.name);
        let quantity = ingredient.quantity.or(detection.quantity);
        let mut ingredient = ingredient.with_unit(&detection.unit_code);
        ingredient.quantity = quantity;
        return ingredient;
    }

    let code = units.normalize_unit_alias(unit_token);
    if units.is_valid_unit(&code) {
        ingredient.with_unit(&code)
    } else {
        debug!("Keeping custom unit '{}' for '{}'", unit_token, ingredient.name);
        ingredient.with_unit(unit_token).with_custom_unit(true)
    }
}
