//! # Ingredient, Unit and Shopping List Data Model
//!
//! This module defines the values that flow through the pipeline: ingredients as
//! produced by ingestion, the fixed measurement unit records, learned catalog
//! entries owned by the categorizer, and the shopping list lines produced by the
//! generator. It also carries the diet structure the generator walks.
//!
//! ## Usage
//!
//! ```rust
//! use diet_pantry::ingredient_model::ParsedIngredient;
//!
//! let milk = ParsedIngredient::new("Milk")
//!     .with_quantity(1.0)
//!     .with_unit("l")
//!     .with_category("dairy");
//!
//! assert_eq!(milk.to_string(), "1 l Milk");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unit code used when no unit could be determined
pub const DEFAULT_UNIT_CODE: &str = "szt";

/// An ingredient mention after ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIngredient {
    /// Display name of the ingredient (e.g., "Milk", "mąka pszenna")
    pub name: String,

    /// Numeric quantity, if one could be parsed
    #[serde(default)]
    pub quantity: Option<f64>,

    /// Unit code (e.g., "g", "l", "szt")
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Raw text the ingredient was extracted from
    #[serde(default)]
    pub original: String,

    /// Category identifier, set by the categorizer or by the user
    #[serde(default)]
    pub category_id: Option<String>,

    /// Whether the unit is not part of the known unit catalog
    #[serde(default)]
    pub has_custom_unit: bool,

    /// Reference into the external product catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

fn default_unit() -> String {
    DEFAULT_UNIT_CODE.to_string()
}

impl ParsedIngredient {
    /// Create an ingredient with just a name; the original text defaults to the name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: None,
            unit: default_unit(),
            original: name.to_string(),
            category_id: None,
            has_custom_unit: false,
            product_id: None,
        }
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    /// Override the raw text this ingredient came from
    pub fn with_original(mut self, original: &str) -> Self {
        self.original = original.to_string();
        self
    }

    pub fn with_category(mut self, category_id: &str) -> Self {
        self.category_id = Some(category_id.to_string());
        self
    }

    /// Link this ingredient to a product of the external catalog
    pub fn with_product(mut self, product_id: &str) -> Self {
        self.product_id = Some(product_id.to_string());
        self
    }

    pub fn with_custom_unit(mut self, has_custom_unit: bool) -> Self {
        self.has_custom_unit = has_custom_unit;
        self
    }

    /// Quantity used for summing; a missing quantity counts as zero
    pub fn quantity_or_zero(&self) -> f64 {
        self.quantity.unwrap_or(0.0)
    }
}

/// Family a measurement unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    /// Mass units (g, kg, ...)
    Weight,
    /// Liquid volume units (ml, l, ...)
    Volume,
    /// Countable units (pieces, packages, ...)
    Piece,
    /// Household measures (spoons, glasses, ...)
    Kitchen,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Weight => "weight",
            UnitType::Volume => "volume",
            UnitType::Piece => "piece",
            UnitType::Kitchen => "kitchen",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A measurement unit from the fixed unit catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductUnit {
    /// Canonical unit code (e.g., "g")
    pub code: &'static str,
    /// Human readable label (e.g., "gram")
    pub label: &'static str,
    /// Unit family
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    /// Base unit of the family this unit converts to
    pub base_unit_code: Option<&'static str>,
    /// Multiplier converting a value in this unit to the base unit
    pub conversion_factor: Option<f64>,
}

/// A product name learned from observed ingredient mentions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedProductEntry {
    /// Normalized product name, the key of the learned catalog
    pub normalized_name: String,
    /// Category the product was last filed under
    pub category_id: String,
    /// Every raw spelling seen for this product
    pub variations: BTreeSet<String>,
    /// Number of sightings
    pub usage_count: u64,
    pub last_used: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LearnedProductEntry {
    /// Create an entry for a first sighting
    pub fn new(normalized_name: &str, category_id: &str, original: &str, now: DateTime<Utc>) -> Self {
        let mut variations = BTreeSet::new();
        variations.insert(original.to_string());
        Self {
            normalized_name: normalized_name.to_string(),
            category_id: category_id.to_string(),
            variations,
            usage_count: 1,
            last_used: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record another sighting of this product
    pub fn record_sighting(&mut self, original: &str, category_id: Option<&str>, now: DateTime<Utc>) {
        self.usage_count += 1;
        if !self.variations.contains(original) {
            self.variations.insert(original.to_string());
        }
        if let Some(category_id) = category_id {
            self.category_id = category_id.to_string();
        }
        self.last_used = now;
        self.updated_at = now;
    }
}

/// A product record of the external product catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub category_id: String,
}

/// Where a shopping list quantity came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeReference {
    /// Recipe name, or the meal name when the meal has no recipe
    pub recipe_or_meal_name: String,
    /// Position of the day inside the diet (0-based)
    pub day_index: usize,
    /// Meal type (e.g., "breakfast")
    pub meal_type: String,
    /// Planned time of the meal, if any
    pub meal_time: Option<String>,
}

/// One line of a generated shopping list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    /// Matching name (catalog product name or normalized ingredient name)
    pub name: String,
    /// Sum of all contributing quantities
    pub quantity: f64,
    pub unit: String,
    /// Display name
    pub original: String,
    /// One reference per contributing ingredient, in diet order
    pub recipes: Vec<RecipeReference>,
}

impl ShoppingListItem {
    pub fn new(name: &str, unit: &str, original: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: 0.0,
            unit: unit.to_string(),
            original: original.to_string(),
            recipes: Vec::new(),
        }
    }
}

/// A multi-day diet plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diet {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub days: Vec<DietDay>,
}

/// One day of a diet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DietDay {
    #[serde(default)]
    pub meals: Vec<DietMeal>,
}

/// One meal of a diet day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietMeal {
    pub name: String,
    /// Name of the recipe this meal is cooked from, if any
    #[serde(default)]
    pub recipe_name: Option<String>,
    pub meal_type: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<ParsedIngredient>,
}

impl DietMeal {
    pub fn new(name: &str, meal_type: &str) -> Self {
        Self {
            name: name.to_string(),
            recipe_name: None,
            meal_type: meal_type.to_string(),
            time: None,
            ingredients: Vec::new(),
        }
    }

    pub fn with_recipe(mut self, recipe_name: &str) -> Self {
        self.recipe_name = Some(recipe_name.to_string());
        self
    }

    pub fn with_time(mut self, time: &str) -> Self {
        self.time = Some(time.to_string());
        self
    }

    pub fn with_ingredient(mut self, ingredient: ParsedIngredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    /// Name used for provenance: the recipe name when present, else the meal name
    pub fn display_name(&self) -> &str {
        self.recipe_name.as_deref().unwrap_or(&self.name)
    }
}

impl Diet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            days: Vec::new(),
        }
    }

    pub fn with_day(mut self, meals: Vec<DietMeal>) -> Self {
        self.days.push(DietDay { meals });
        self
    }

    /// Iterate over every ingredient of the diet, in day and meal order
    pub fn ingredients(&self) -> impl Iterator<Item = &ParsedIngredient> {
        self.days
            .iter()
            .flat_map(|day| day.meals.iter())
            .flat_map(|meal| meal.ingredients.iter())
    }
}

/// Format a quantity without a trailing ".0" for whole numbers
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{}", quantity)
    }
}

impl fmt::Display for ParsedIngredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quantity {
            Some(quantity) => write!(f, "{} {} {}", format_quantity(quantity), self.unit, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Display for ShoppingListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}",
            self.original,
            format_quantity(self.quantity),
            self.unit
        )?;
        if !self.recipes.is_empty() {
            write!(f, " ({} meals)", self.recipes.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_creation() {
        let ingredient = ParsedIngredient::new("Milk")
            .with_quantity(1.5)
            .with_unit("l")
            .with_category("dairy")
            .with_product("p-1");

        assert_eq!(ingredient.name, "Milk");
        assert_eq!(ingredient.original, "Milk");
        assert_eq!(ingredient.quantity, Some(1.5));
        assert_eq!(ingredient.unit, "l");
        assert_eq!(ingredient.category_id.as_deref(), Some("dairy"));
        assert_eq!(ingredient.product_id.as_deref(), Some("p-1"));
        assert!(!ingredient.has_custom_unit);
    }

    #[test]
    fn test_ingredient_defaults() {
        let ingredient = ParsedIngredient::new("salt");
        assert_eq!(ingredient.unit, DEFAULT_UNIT_CODE);
        assert_eq!(ingredient.quantity_or_zero(), 0.0);
        assert_eq!(ingredient.to_string(), "salt");
    }

    #[test]
    fn test_ingredient_deserialize_with_missing_fields() {
        let ingredient: ParsedIngredient =
            serde_json::from_str(r#"{"name": "Eggs", "quantity": 3}"#).unwrap();
        assert_eq!(ingredient.unit, "szt");
        assert_eq!(ingredient.quantity, Some(3.0));
        assert_eq!(ingredient.category_id, None);
        assert_eq!(ingredient.product_id, None);
    }

    #[test]
    fn test_learned_entry_sighting() {
        let now = Utc::now();
        let mut entry = LearnedProductEntry::new("mleko", "dairy", "Mleko 2%", now);
        assert_eq!(entry.usage_count, 1);

        entry.record_sighting("Mleko 2%", None, now);
        entry.record_sighting("mleko", Some("drinks"), now);

        assert_eq!(entry.usage_count, 3);
        assert_eq!(entry.variations.len(), 2);
        assert_eq!(entry.category_id, "drinks");
    }

    #[test]
    fn test_unit_type_serialization() {
        assert_eq!(serde_json::to_string(&UnitType::Kitchen).unwrap(), "\"kitchen\"");
        assert_eq!(UnitType::Weight.to_string(), "weight");
    }

    #[test]
    fn test_meal_display_name() {
        let meal = DietMeal::new("Breakfast", "breakfast");
        assert_eq!(meal.display_name(), "Breakfast");

        let meal = meal.with_recipe("Porridge");
        assert_eq!(meal.display_name(), "Porridge");
    }

    #[test]
    fn test_diet_ingredient_order() {
        let diet = Diet::new("week")
            .with_day(vec![DietMeal::new("a", "breakfast")
                .with_ingredient(ParsedIngredient::new("oats"))
                .with_ingredient(ParsedIngredient::new("milk"))])
            .with_day(vec![DietMeal::new("b", "dinner")
                .with_ingredient(ParsedIngredient::new("rice"))]);

        let names: Vec<&str> = diet.ingredients().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["oats", "milk", "rice"]);
    }

    #[test]
    fn test_display_formatting() {
        let ingredient = ParsedIngredient::new("flour").with_quantity(250.0).with_unit("g");
        assert_eq!(ingredient.to_string(), "250 g flour");

        let mut item = ShoppingListItem::new("milk", "l", "Milk");
        item.quantity = 2.5;
        assert_eq!(item.to_string(), "Milk: 2.5 l");
    }
}
