//! # Unit Patterns Module
//!
//! This module contains the fixed unit catalog, the alias table and the regex
//! patterns used for unit detection and unit stripping. Adding a unit or an
//! inflection is a change to these tables only.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ingredient_model::{ProductUnit, UnitType};

/// The measurement unit catalog. Base units point at themselves with factor 1.
pub const UNIT_CATALOG: &[ProductUnit] = &[
    // Weight
    unit("g", "gram", UnitType::Weight, Some("g"), Some(1.0)),
    unit("dag", "dekagram", UnitType::Weight, Some("g"), Some(10.0)),
    unit("kg", "kilogram", UnitType::Weight, Some("g"), Some(1000.0)),
    unit("mg", "miligram", UnitType::Weight, Some("g"), Some(0.001)),
    // Volume
    unit("ml", "mililitr", UnitType::Volume, Some("ml"), Some(1.0)),
    unit("dl", "decylitr", UnitType::Volume, Some("ml"), Some(100.0)),
    unit("l", "litr", UnitType::Volume, Some("ml"), Some(1000.0)),
    // Piece
    unit("szt", "sztuka", UnitType::Piece, None, None),
    unit("opak", "opakowanie", UnitType::Piece, None, None),
    unit("pęczek", "pęczek", UnitType::Piece, None, None),
    unit("plaster", "plaster", UnitType::Piece, None, None),
    unit("ząbek", "ząbek", UnitType::Piece, None, None),
    unit("puszka", "puszka", UnitType::Piece, None, None),
    // Kitchen measures
    unit("łyżka", "łyżka", UnitType::Kitchen, Some("ml"), Some(15.0)),
    unit("łyżeczka", "łyżeczka", UnitType::Kitchen, Some("ml"), Some(5.0)),
    unit("szklanka", "szklanka", UnitType::Kitchen, Some("ml"), Some(250.0)),
    unit("szczypta", "szczypta", UnitType::Kitchen, None, None),
    unit("garść", "garść", UnitType::Kitchen, None, None),
];

const fn unit(
    code: &'static str,
    label: &'static str,
    unit_type: UnitType,
    base_unit_code: Option<&'static str>,
    conversion_factor: Option<f64>,
) -> ProductUnit {
    ProductUnit {
        code,
        label,
        unit_type,
        base_unit_code,
        conversion_factor,
    }
}

/// Inflected and alternate spellings mapped to their canonical unit code
pub const UNIT_ALIASES: &[(&str, &str)] = &[
    // Weight
    ("gr", "g"),
    ("gram", "g"),
    ("grama", "g"),
    ("gramy", "g"),
    ("gramów", "g"),
    ("grams", "g"),
    ("dkg", "dag"),
    ("deka", "dag"),
    ("dekagram", "dag"),
    ("dekagramy", "dag"),
    ("dekagramów", "dag"),
    ("kilo", "kg"),
    ("kilogram", "kg"),
    ("kilogramy", "kg"),
    ("kilogramów", "kg"),
    ("kilograms", "kg"),
    ("miligram", "mg"),
    ("miligramy", "mg"),
    ("miligramów", "mg"),
    ("milligram", "mg"),
    ("milligrams", "mg"),
    // Volume
    ("mililitr", "ml"),
    ("mililitry", "ml"),
    ("mililitrów", "ml"),
    ("milliliter", "ml"),
    ("milliliters", "ml"),
    ("millilitre", "ml"),
    ("millilitres", "ml"),
    ("decylitr", "dl"),
    ("decylitry", "dl"),
    ("decylitrów", "dl"),
    ("litr", "l"),
    ("litry", "l"),
    ("litrów", "l"),
    ("liter", "l"),
    ("liters", "l"),
    ("litre", "l"),
    ("litres", "l"),
    // Piece
    ("szt.", "szt"),
    ("sztuk", "szt"),
    ("sztuka", "szt"),
    ("sztuki", "szt"),
    ("piece", "szt"),
    ("pieces", "szt"),
    ("pcs", "szt"),
    ("opak.", "opak"),
    ("opakowanie", "opak"),
    ("opakowania", "opak"),
    ("opakowań", "opak"),
    ("pack", "opak"),
    ("packs", "opak"),
    ("package", "opak"),
    ("packages", "opak"),
    ("pęczki", "pęczek"),
    ("pęczków", "pęczek"),
    ("bunch", "pęczek"),
    ("bunches", "pęczek"),
    ("plasterek", "plaster"),
    ("plasterki", "plaster"),
    ("plastry", "plaster"),
    ("plastrów", "plaster"),
    ("slice", "plaster"),
    ("slices", "plaster"),
    ("ząbki", "ząbek"),
    ("ząbków", "ząbek"),
    ("clove", "ząbek"),
    ("cloves", "ząbek"),
    ("puszki", "puszka"),
    ("puszek", "puszka"),
    ("can", "puszka"),
    ("cans", "puszka"),
    // Kitchen measures
    ("łyżki", "łyżka"),
    ("łyżek", "łyżka"),
    ("tablespoon", "łyżka"),
    ("tablespoons", "łyżka"),
    ("tbsp", "łyżka"),
    ("łyżeczki", "łyżeczka"),
    ("łyżeczek", "łyżeczka"),
    ("teaspoon", "łyżeczka"),
    ("teaspoons", "łyżeczka"),
    ("tsp", "łyżeczka"),
    ("szklanki", "szklanka"),
    ("szklanek", "szklanka"),
    ("cup", "szklanka"),
    ("cups", "szklanka"),
    ("szczypt", "szczypta"),
    ("szczypty", "szczypta"),
    ("pinch", "szczypta"),
    ("pinches", "szczypta"),
    ("garści", "garść"),
    ("handful", "garść"),
    ("handfuls", "garść"),
];

/// Unit word alternations per unit family, longest spellings first
pub const UNIT_FAMILY_ALTERNATIONS: &[(UnitType, &str)] = &[
    (
        UnitType::Weight,
        r"kilogram(?:y|ów|s)?|kilo|kg|dekagram(?:y|ów)?|deka|dkg|dag|miligram(?:y|ów)?|milligrams?|mg|gram(?:y|ów|a|s)?|gr|g",
    ),
    (
        UnitType::Volume,
        r"mililitr(?:y|ów)?|millilit(?:er|re)s?|ml|decylitr(?:y|ów)?|dl|litr(?:y|ów)?|lit(?:er|re)s?|l",
    ),
    (
        UnitType::Piece,
        r"sztuk[ai]?|szt|pieces?|pcs|opakowani[ea]|opakowań|opak|packages?|packs?|pęcz(?:ek|ki|ków)|bunch(?:es)?|plaster(?:ek|ki)?|plastr(?:y|ów)|slices?|ząb(?:ek|ki|ków)|cloves?|puszk[ai]|puszek|cans?",
    ),
    (
        UnitType::Kitchen,
        r"łyżeczk[ai]|łyżeczek|teaspoons?|tsp|łyżk[ai]|łyżek|tablespoons?|tbsp|szklank[ai]|szklanek|cups?|szczypt[ay]?|pinch(?:es)?|garść|garści|handfuls?",
    ),
];

/// A number as written in ingredient text (decimal comma or dot)
pub const NUMBER_PATTERN: &str = r"\d+(?:[.,]\d+)?";

lazy_static! {
    /// `<number><optional space><unit>` matchers, one per unit family
    pub static ref UNIT_DETECTION_PATTERNS: Vec<(Regex, UnitType)> = UNIT_FAMILY_ALTERNATIONS
        .iter()
        .map(|(unit_type, alternation)| {
            let pattern = format!(r"(?i)\b({NUMBER_PATTERN})\s?({alternation})\b");
            let regex = Regex::new(&pattern).expect("Unit detection pattern should be valid");
            (regex, *unit_type)
        })
        .collect();

    /// A number optionally followed by any unit word, for stripping quantities from names
    pub static ref QUANTITY_WITH_UNIT_REGEX: Regex = {
        let all_units = UNIT_FAMILY_ALTERNATIONS
            .iter()
            .map(|(_, alternation)| *alternation)
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"(?i)\d+(?:[.,/]\d+)?(?:\s*(?:{all_units})\b\.?)?");
        Regex::new(&pattern).expect("Quantity stripping pattern should be valid")
    };

    /// Aliases used by the substring scan, longest first so that the most specific
    /// spelling wins; too-short aliases are left out since they occur inside words
    pub static ref SCANNABLE_ALIASES: Vec<(&'static str, &'static str)> = {
        let mut aliases: Vec<(&'static str, &'static str)> = UNIT_ALIASES
            .iter()
            .copied()
            .filter(|(alias, _)| alias.chars().count() >= 3)
            .collect();
        aliases.sort_by(|a, b| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| a.0.cmp(b.0))
        });
        aliases
    };
}
