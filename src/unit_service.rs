//! # Unit Service
//!
//! Read-only access to the measurement unit catalog: lookups, alias
//! normalization, conversion to base units, unit detection in free text and the
//! combinability test that decides whether two quantities may be summed.
//!
//! The catalog and alias tables live in [`crate::unit_patterns`] and are never
//! mutated at runtime, so a single `UnitService` can be shared freely.
//!
//! ## Usage
//!
//! ```rust
//! use diet_pantry::unit_service::UnitService;
//!
//! let units = UnitService::new();
//! assert_eq!(units.normalize_unit_alias("Gramów"), "g");
//! assert_eq!(units.convert_to_base_unit(2.0, "kg"), Some(2000.0));
//! assert!(units.can_combine_quantities("g", "kg"));
//! assert!(!units.can_combine_quantities("g", "ml"));
//!
//! let detection = units.detect_unit_in_text("2 łyżki cukru");
//! assert_eq!(detection.unit_code, "łyżka");
//! assert!(detection.matched);
//! ```

use log::{debug, trace};
use std::collections::HashMap;

use crate::ingredient_model::{ProductUnit, UnitType, DEFAULT_UNIT_CODE};
use crate::quantity_parser::parse_quantity;
use crate::unit_patterns::{
    SCANNABLE_ALIASES, UNIT_ALIASES, UNIT_CATALOG, UNIT_DETECTION_PATTERNS,
};

/// Result of looking for a unit in free text
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDetection {
    /// Canonical unit code, or the piece sentinel when nothing was found
    pub unit_code: String,
    pub unit_type: UnitType,
    /// Whether a unit was actually found
    pub matched: bool,
    /// Quantity written in front of the unit, when the pattern tier found one
    pub quantity: Option<f64>,
}

impl UnitDetection {
    /// The "no unit found" sentinel
    pub fn not_found() -> Self {
        Self {
            unit_code: DEFAULT_UNIT_CODE.to_string(),
            unit_type: UnitType::Piece,
            matched: false,
            quantity: None,
        }
    }

    fn found(unit: &ProductUnit, quantity: Option<f64>) -> Self {
        Self {
            unit_code: unit.code.to_string(),
            unit_type: unit.unit_type,
            matched: true,
            quantity,
        }
    }
}

/// Unit catalog service
#[derive(Debug, Clone)]
pub struct UnitService {
    units: &'static [ProductUnit],
    aliases: HashMap<&'static str, &'static str>,
}

impl UnitService {
    /// Create a service over the built-in unit catalog
    pub fn new() -> Self {
        Self {
            units: UNIT_CATALOG,
            aliases: UNIT_ALIASES.iter().copied().collect(),
        }
    }

    /// All catalog units
    pub fn units(&self) -> &[ProductUnit] {
        self.units
    }

    /// Catalog units of one family
    pub fn units_of_type(&self, unit_type: UnitType) -> Vec<&ProductUnit> {
        self.units
            .iter()
            .filter(|unit| unit.unit_type == unit_type)
            .collect()
    }

    pub fn get_unit(&self, code: &str) -> Option<&ProductUnit> {
        self.units.iter().find(|unit| unit.code == code)
    }

    pub fn is_valid_unit(&self, code: &str) -> bool {
        self.get_unit(code).is_some()
    }

    /// Convert a value to the base unit of its family
    pub fn convert_to_base_unit(&self, value: f64, from_code: &str) -> Option<f64> {
        self.normalize_to_base_unit(value, from_code)
            .map(|(converted, _)| converted)
    }

    /// Convert a value to the base unit of its family, returning the base unit code too
    pub fn normalize_to_base_unit(&self, value: f64, code: &str) -> Option<(f64, &'static str)> {
        let unit = self.get_unit(code)?;
        match (unit.base_unit_code, unit.conversion_factor) {
            (Some(base), Some(factor)) => Some((value * factor, base)),
            _ => None,
        }
    }

    /// Convert a value between two combinable units
    pub fn convert(&self, value: f64, from_code: &str, to_code: &str) -> Option<f64> {
        if from_code == to_code && self.is_valid_unit(from_code) {
            return Some(value);
        }
        if !self.can_combine_quantities(from_code, to_code) {
            return None;
        }

        let (base_value, _) = self.normalize_to_base_unit(value, from_code)?;
        let target_factor = self.get_unit(to_code)?.conversion_factor?;
        if target_factor == 0.0 {
            return None;
        }
        Some(base_value / target_factor)
    }

    /// Map an alternate spelling to its canonical unit code.
    ///
    /// Unknown tokens come back lower-cased, unchanged otherwise.
    pub fn normalize_unit_alias(&self, token: &str) -> String {
        let lower = token.trim().to_lowercase();
        match self.aliases.get(lower.as_str()) {
            Some(code) => (*code).to_string(),
            None => lower,
        }
    }

    /// Find a unit in free text.
    ///
    /// Tries, in order: the whole text as a unit or alias, a `<number><unit>`
    /// pattern per unit family (earliest occurrence wins), and finally any
    /// alias appearing as a substring. Falls back to [`UnitDetection::not_found`].
    pub fn detect_unit_in_text(&self, text: &str) -> UnitDetection {
        let detection = self.detect_explicit_unit(text);
        if detection.matched {
            return detection;
        }

        // Alias anywhere in the text
        let lower = text.trim().to_lowercase();
        for (alias, code) in SCANNABLE_ALIASES.iter() {
            if lower.contains(alias) {
                if let Some(unit) = self.get_unit(code) {
                    trace!("Unit '{}' detected by alias '{}' in '{}'", unit.code, alias, text);
                    return UnitDetection::found(unit, None);
                }
            }
        }

        debug!("No unit detected in '{}'", text);
        UnitDetection::not_found()
    }

    /// Find a unit written as the whole text or right after a number.
    ///
    /// Unlike [`UnitService::detect_unit_in_text`] this never looks inside
    /// words, so product names such as "cannelloni" keep the piece fallback.
    pub fn detect_explicit_unit(&self, text: &str) -> UnitDetection {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return UnitDetection::not_found();
        }

        // Whole text is a unit
        let code = self.normalize_unit_alias(&lower);
        if let Some(unit) = self.get_unit(&code) {
            trace!("Unit '{}' detected as whole text '{}'", unit.code, text);
            return UnitDetection::found(unit, None);
        }

        // <number><unit> patterns
        let mut best: Option<(usize, &ProductUnit, Option<f64>)> = None;
        for (pattern, unit_type) in UNIT_DETECTION_PATTERNS.iter() {
            let Some(captures) = pattern.captures(&lower) else {
                continue;
            };
            let (Some(number), Some(token)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            let code = self.normalize_unit_alias(token.as_str());
            let Some(unit) = self.get_unit(&code) else {
                debug!(
                    "Captured {} unit token '{}' is not in the catalog",
                    unit_type,
                    token.as_str()
                );
                continue;
            };
            let start = number.start();
            if best.map_or(true, |(best_start, _, _)| start < best_start) {
                best = Some((start, unit, parse_quantity(number.as_str())));
            }
        }
        if let Some((_, unit, quantity)) = best {
            trace!("Unit '{}' detected by pattern in '{}'", unit.code, text);
            return UnitDetection::found(unit, quantity);
        }

        UnitDetection::not_found()
    }

    /// Whether quantities in the two units may be summed
    pub fn can_combine_quantities(&self, code_a: &str, code_b: &str) -> bool {
        let (Some(unit_a), Some(unit_b)) = (self.get_unit(code_a), self.get_unit(code_b)) else {
            return false;
        };

        if unit_a.code == unit_b.code {
            return true;
        }

        match (unit_a.base_unit_code, unit_b.base_unit_code) {
            (Some(base_a), Some(base_b)) => base_a == base_b,
            _ => false,
        }
    }
}

impl Default for UnitService {
    fn default() -> Self {
        Self::new()
    }
}
