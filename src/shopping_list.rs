//! # Shopping List Generator
//!
//! Aggregates every ingredient of a diet into a shopping list grouped by
//! category, keeping track of which meal and day each quantity came from.
//!
//! Quantities are summed per aggregation key:
//!
//! - `catalog:{product_id}:{unit}` for ingredients linked to a known catalog
//!   product (the catalog name and category win over the free-text ones)
//! - `raw:{name}:{unit}` otherwise, with the name lower-cased and trimmed
//!
//! The unit is part of the key, so the same product listed in grams and in
//! kilograms ends up as two lines. No unit conversion happens here.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ShoppingListConfig;
use crate::error::CatalogError;
use crate::ingredient_model::{
    CatalogProduct, Diet, ParsedIngredient, RecipeReference, ShoppingListItem,
};
use crate::product_catalog::ProductCatalog;
use crate::unit_service::UnitService;

/// An ingredient together with the meal it belongs to
#[derive(Debug, Clone, Copy)]
pub struct DietIngredient<'a> {
    pub ingredient: &'a ParsedIngredient,
    pub meal_name: &'a str,
    pub day_index: usize,
    pub meal_type: &'a str,
    pub meal_time: Option<&'a str>,
}

impl DietIngredient<'_> {
    fn recipe_reference(&self) -> RecipeReference {
        RecipeReference {
            recipe_or_meal_name: self.meal_name.to_string(),
            day_index: self.day_index,
            meal_type: self.meal_type.to_string(),
            meal_time: self.meal_time.map(str::to_string),
        }
    }
}

/// Flatten a diet into its ingredients, in day then meal order
pub fn flatten_diet(diet: &Diet) -> Vec<DietIngredient<'_>> {
    diet.days
        .iter()
        .enumerate()
        .flat_map(|(day_index, day)| {
            day.meals.iter().flat_map(move |meal| {
                meal.ingredients.iter().map(move |ingredient| DietIngredient {
                    ingredient,
                    meal_name: meal.display_name(),
                    day_index,
                    meal_type: &meal.meal_type,
                    meal_time: meal.time.as_deref(),
                })
            })
        })
        .collect()
}

/// Shopping list items grouped by category id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ShoppingList {
    pub categories: BTreeMap<String, Vec<ShoppingListItem>>,
}

impl ShoppingList {
    /// Items of one category
    pub fn items(&self, category_id: &str) -> &[ShoppingListItem] {
        self.categories
            .get(category_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn category_ids(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn total_items(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

struct Accumulated {
    category_id: String,
    item: ShoppingListItem,
}

/// Builds shopping lists out of diets
pub struct ShoppingListGenerator {
    units: Arc<UnitService>,
    catalog: Arc<dyn ProductCatalog>,
    config: ShoppingListConfig,
}

impl ShoppingListGenerator {
    pub fn new(
        units: Arc<UnitService>,
        catalog: Arc<dyn ProductCatalog>,
        config: ShoppingListConfig,
    ) -> Self {
        Self {
            units,
            catalog,
            config,
        }
    }

    /// Generate the shopping list of a diet.
    ///
    /// All referenced catalog products are fetched with one lookup; a failing
    /// lookup fails the whole generation.
    pub async fn generate(&self, diet: &Diet) -> Result<ShoppingList, CatalogError> {
        let ingredients = flatten_diet(diet);

        let product_ids: HashSet<String> = ingredients
            .iter()
            .filter_map(|entry| entry.ingredient.product_id.clone())
            .collect();

        let products: HashMap<String, CatalogProduct> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            self.catalog
                .find_all_by_ids(&product_ids)
                .await?
                .into_iter()
                .map(|product| (product.id.clone(), product))
                .collect()
        };
        debug!(
            requested = product_ids.len(),
            resolved = products.len(),
            "Resolved catalog products"
        );

        let list = self.aggregate(&ingredients, &products);
        info!(
            diet = %diet.name,
            ingredients = ingredients.len(),
            items = list.total_items(),
            categories = list.categories.len(),
            "Generated shopping list"
        );
        Ok(list)
    }

    /// Sum flattened ingredients into a shopping list using resolved products
    pub fn aggregate(
        &self,
        ingredients: &[DietIngredient<'_>],
        products: &HashMap<String, CatalogProduct>,
    ) -> ShoppingList {
        let mut accumulator: HashMap<String, Accumulated> = HashMap::new();

        for entry in ingredients {
            let ingredient = entry.ingredient;
            let unit = self.units.normalize_unit_alias(&ingredient.unit);
            let product = ingredient
                .product_id
                .as_ref()
                .and_then(|id| products.get(id));

            let (key, name, original, category_id) = match product {
                Some(product) => (
                    format!("catalog:{}:{}", product.id, unit),
                    product.name.clone(),
                    product.name.clone(),
                    product.category_id.clone(),
                ),
                None => {
                    let name = ingredient.name.trim().to_lowercase();
                    (
                        format!("raw:{}:{}", name, unit),
                        name,
                        ingredient.name.trim().to_string(),
                        ingredient
                            .category_id
                            .clone()
                            .unwrap_or_else(|| self.config.default_category.clone()),
                    )
                }
            };

            let accumulated = accumulator.entry(key).or_insert_with(|| Accumulated {
                category_id,
                item: ShoppingListItem::new(&name, &unit, &original),
            });
            accumulated.item.quantity += ingredient.quantity_or_zero();
            accumulated.item.recipes.push(entry.recipe_reference());
        }

        let mut categories: BTreeMap<String, Vec<ShoppingListItem>> = BTreeMap::new();
        for accumulated in accumulator.into_values() {
            categories
                .entry(accumulated.category_id)
                .or_default()
                .push(accumulated.item);
        }
        for items in categories.values_mut() {
            items.sort_by(|a, b| {
                a.original
                    .to_lowercase()
                    .cmp(&b.original.to_lowercase())
                    .then_with(|| a.original.cmp(&b.original))
                    .then_with(|| a.unit.cmp(&b.unit))
                    .then_with(|| a.name.cmp(&b.name))
            });
        }

        ShoppingList { categories }
    }
}
