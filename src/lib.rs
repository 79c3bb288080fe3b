//! # Diet Pantry
//!
//! Ingredient normalization, learned product categorization and shopping list
//! aggregation for diet plans.
//!
//! Ingredients are parsed and their units normalized, then filed under a category
//! learned from earlier sightings (exact, variation or fuzzy match), and finally
//! summed into a categorized shopping list.

pub mod categorizer;
pub mod category_store;
pub mod config;
pub mod error;
pub mod ingredient_model;
pub mod ingredient_parser;
pub mod product_catalog;
pub mod quantity_parser;
pub mod shopping_list;
pub mod similarity;
pub mod text_normalizer;
pub mod unit_patterns;
pub mod unit_service;
