//! # Product Categorizer
//!
//! Learned mapping from normalized product names to category ids. Every
//! categorized ingredient teaches the catalog a spelling; later ingredients are
//! matched against it in three tiers:
//!
//! 1. **exact**: an entry whose normalized name equals the ingredient's
//! 2. **variation**: an entry that has seen this exact spelling before
//! 3. **similarity**: the closest entry by normalized Levenshtein similarity,
//!    at or above the configured threshold
//!
//! Within a tier the most used entry wins; equal usage falls back to the
//! alphabetically first name so results do not depend on map iteration order.
//!
//! ## Concurrency
//!
//! The catalog is a [`DashMap`]: suggestions read concurrently, and
//! [`ProductCategorizer::update_categorization`] upserts through the entry API,
//! which holds the shard lock for the whole read-modify-write. Saving is a full
//! overwrite of the backing store, so batch updates and flushes take
//! `save_lock` and run one at a time. Suggestions never take it.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::category_store::{CategoryStore, LearnedCatalog};
use crate::config::CategorizerConfig;
use crate::error::StoreError;
use crate::ingredient_model::{LearnedProductEntry, ParsedIngredient};
use crate::similarity::calculate_similarity;
use crate::text_normalizer::strip_units_and_quantities;

/// Which tier produced a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Variation,
    Similarity,
}

/// A category suggestion with the entry it came from
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMatch {
    pub category_id: String,
    pub normalized_name: String,
    pub kind: MatchKind,
    /// 1.0 for exact and variation matches
    pub similarity: f64,
}

#[derive(Debug, Clone)]
struct Candidate {
    score: f64,
    usage_count: u64,
    normalized_name: String,
    category_id: String,
}

impl Candidate {
    fn from_entry(score: f64, entry: &LearnedProductEntry) -> Self {
        Self {
            score,
            usage_count: entry.usage_count,
            normalized_name: entry.normalized_name.clone(),
            category_id: entry.category_id.clone(),
        }
    }

    fn outranks(&self, other: &Candidate) -> bool {
        if self.score != other.score {
            return self.score > other.score;
        }
        if self.usage_count != other.usage_count {
            return self.usage_count > other.usage_count;
        }
        self.normalized_name < other.normalized_name
    }

    fn into_match(self, kind: MatchKind) -> CategoryMatch {
        CategoryMatch {
            category_id: self.category_id,
            normalized_name: self.normalized_name,
            kind,
            similarity: self.score,
        }
    }
}

fn keep_best(best: &mut Option<Candidate>, candidate: Candidate) {
    let replace = best
        .as_ref()
        .map_or(true, |current| candidate.outranks(current));
    if replace {
        *best = Some(candidate);
    }
}

/// Key under which an ingredient is learned and matched
pub fn matching_key(ingredient: &ParsedIngredient) -> String {
    let source = if ingredient.original.trim().is_empty() {
        &ingredient.name
    } else {
        &ingredient.original
    };
    strip_units_and_quantities(source)
}

fn sighting_text(ingredient: &ParsedIngredient) -> &str {
    if ingredient.original.trim().is_empty() {
        &ingredient.name
    } else {
        &ingredient.original
    }
}

/// Learned product categorizer
pub struct ProductCategorizer {
    catalog: DashMap<String, LearnedProductEntry>,
    store: Arc<dyn CategoryStore>,
    config: CategorizerConfig,
    save_lock: Mutex<()>,
}

impl ProductCategorizer {
    /// Load the learned catalog from `store`
    pub async fn load(
        store: Arc<dyn CategoryStore>,
        config: CategorizerConfig,
    ) -> Result<Self, StoreError> {
        let entries = store.load_all().await?;
        info!(entries = entries.len(), "Learned product catalog loaded");
        Ok(Self::with_catalog(store, config, entries))
    }

    /// Create a categorizer over an already loaded catalog
    pub fn with_catalog(
        store: Arc<dyn CategoryStore>,
        config: CategorizerConfig,
        entries: LearnedCatalog,
    ) -> Self {
        Self {
            catalog: entries.into_iter().collect(),
            store,
            config,
            save_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CategorizerConfig {
        &self.config
    }

    /// Suggest a category for an ingredient
    pub fn suggest_category(&self, ingredient: &ParsedIngredient) -> Option<String> {
        self.find_match(ingredient).map(|found| found.category_id)
    }

    /// Suggest a category, reporting which tier matched
    pub fn find_match(&self, ingredient: &ParsedIngredient) -> Option<CategoryMatch> {
        let key = matching_key(ingredient);
        if key.is_empty() {
            return None;
        }

        if let Some(found) = self.exact_match(&key) {
            debug!(name = %key, category = %found.category_id, "Exact category match");
            return Some(found.into_match(MatchKind::Exact));
        }

        if let Some(found) = self.variation_match(&key) {
            debug!(name = %key, category = %found.category_id, "Variation category match");
            return Some(found.into_match(MatchKind::Variation));
        }

        if let Some(found) = self.similarity_match(&key) {
            debug!(
                name = %key,
                matched = %found.normalized_name,
                similarity = found.score,
                category = %found.category_id,
                "Similarity category match"
            );
            return Some(found.into_match(MatchKind::Similarity));
        }

        debug!(name = %key, "No category match");
        None
    }

    fn exact_match(&self, key: &str) -> Option<Candidate> {
        let mut best = None;
        for entry in self.catalog.iter() {
            if strip_units_and_quantities(&entry.normalized_name) == key {
                keep_best(&mut best, Candidate::from_entry(1.0, entry.value()));
            }
        }
        best
    }

    fn variation_match(&self, key: &str) -> Option<Candidate> {
        let mut best = None;
        for entry in self.catalog.iter() {
            let seen = entry
                .variations
                .iter()
                .any(|variation| strip_units_and_quantities(variation) == key);
            if seen {
                keep_best(&mut best, Candidate::from_entry(1.0, entry.value()));
            }
        }
        best
    }

    fn similarity_match(&self, key: &str) -> Option<Candidate> {
        let mut best = None;
        for entry in self.catalog.iter() {
            let name = strip_units_and_quantities(&entry.normalized_name);
            let similarity = calculate_similarity(key, &name, self.config.min_similarity_length);
            if similarity >= self.config.similarity_threshold {
                keep_best(&mut best, Candidate::from_entry(similarity, entry.value()));
            }
        }
        best
    }

    /// Fill in missing category ids from suggestions; returns how many were filled
    pub fn categorize_ingredients(&self, ingredients: &mut [ParsedIngredient]) -> usize {
        let mut filled = 0;
        for ingredient in ingredients.iter_mut().filter(|i| i.category_id.is_none()) {
            if let Some(category_id) = self.suggest_category(ingredient) {
                ingredient.category_id = Some(category_id);
                filled += 1;
            }
        }
        debug!(filled, total = ingredients.len(), "Categorized ingredients");
        filled
    }

    /// Learn from one ingredient sighting.
    ///
    /// A new name needs a category id to be learned; a known name is counted
    /// even without one.
    pub fn update_categorization(&self, ingredient: &ParsedIngredient) {
        let key = matching_key(ingredient);
        if key.is_empty() {
            debug!(original = %ingredient.original, "Nothing to learn from empty name");
            return;
        }

        let now = Utc::now();
        let original = sighting_text(ingredient);
        let category_id = ingredient.category_id.as_deref();

        match self.catalog.entry(key) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().record_sighting(original, category_id, now);
            }
            Entry::Vacant(vacant) => match category_id {
                Some(category_id) => {
                    let entry = LearnedProductEntry::new(vacant.key(), category_id, original, now);
                    vacant.insert(entry);
                }
                None => {
                    debug!(name = %vacant.key(), "Skipping uncategorized new product");
                }
            },
        }
    }

    /// Assign each group's category to its ingredients, learn from all of them,
    /// then save the whole catalog. Returns the number of ingredients learned.
    ///
    /// A failed save is logged; the in-memory catalog stays authoritative.
    pub async fn update_categories_in_transaction(
        &self,
        grouped: &mut HashMap<String, Vec<ParsedIngredient>>,
    ) -> usize {
        let _guard = self.save_lock.lock().await;

        // A name listed under several categories ends up in the last one by id
        let mut batches: Vec<(&String, &mut Vec<ParsedIngredient>)> = grouped.iter_mut().collect();
        batches.sort_by(|a, b| a.0.cmp(b.0));

        let mut learned = 0;
        for (category_id, ingredients) in batches {
            for ingredient in ingredients.iter_mut() {
                ingredient.category_id = Some(category_id.clone());
                self.update_categorization(ingredient);
                learned += 1;
            }
        }

        info!(
            categories = grouped.len(),
            ingredients = learned,
            "Learned category batch"
        );
        self.save_catalog().await;
        learned
    }

    /// Save the whole catalog; returns whether the save succeeded
    pub async fn flush(&self) -> bool {
        let _guard = self.save_lock.lock().await;
        self.save_catalog().await
    }

    // Callers hold `save_lock`
    async fn save_catalog(&self) -> bool {
        let snapshot = self.snapshot();
        match self.store.save_all(&snapshot).await {
            Ok(()) => {
                debug!(entries = snapshot.len(), "Learned catalog saved");
                true
            }
            Err(e) => {
                error!(error = %e, entries = snapshot.len(), "Failed to save learned catalog");
                false
            }
        }
    }

    /// Copy of one learned entry
    pub fn entry(&self, normalized_name: &str) -> Option<LearnedProductEntry> {
        self.catalog
            .get(normalized_name)
            .map(|entry| entry.value().clone())
    }

    /// Copy of the whole learned catalog
    pub fn snapshot(&self) -> LearnedCatalog {
        self.catalog
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category_store::InMemoryCategoryStore;

    fn categorizer_with(entries: &[(&str, &str, u64)]) -> ProductCategorizer {
        let now = Utc::now();
        let catalog = entries
            .iter()
            .map(|(name, category, usage)| {
                let mut entry = LearnedProductEntry::new(name, category, name, now);
                entry.usage_count = *usage;
                (name.to_string(), entry)
            })
            .collect();
        ProductCategorizer::with_catalog(
            Arc::new(InMemoryCategoryStore::new()),
            CategorizerConfig::default(),
            catalog,
        )
    }

    #[test]
    fn test_matching_key_strips_units() {
        let ingredient = ParsedIngredient::new("Mleko").with_original("Mleko 2% 1 l");
        assert_eq!(matching_key(&ingredient), "mleko");

        let mut blank = ParsedIngredient::new("Ser Żółty");
        blank.original = "  ".to_string();
        assert_eq!(matching_key(&blank), "ser żółty");
    }

    #[test]
    fn test_exact_match() {
        let categorizer = categorizer_with(&[("mleko", "dairy", 1)]);
        let found = categorizer
            .find_match(&ParsedIngredient::new("MLEKO 500 ml"))
            .unwrap();
        assert_eq!(found.category_id, "dairy");
        assert_eq!(found.kind, MatchKind::Exact);
    }

    #[test]
    fn test_variation_match() {
        let categorizer = categorizer_with(&[("pomidory", "vegetables", 1)]);
        categorizer.update_categorization(
            &ParsedIngredient::new("pomidory")
                .with_original("Pomidory!")
                .with_category("vegetables"),
        );

        let mut entry = categorizer.entry("pomidory").unwrap();
        entry.variations.insert("pomidor malinowy".to_string());
        categorizer.catalog.insert("pomidory".to_string(), entry);

        let found = categorizer
            .find_match(&ParsedIngredient::new("Pomidor Malinowy"))
            .unwrap();
        assert_eq!(found.kind, MatchKind::Variation);
        assert_eq!(found.category_id, "vegetables");
    }

    #[test]
    fn test_similarity_match() {
        let categorizer = categorizer_with(&[("ser gouda", "dairy", 1), ("chleb", "bakery", 1)]);
        let found = categorizer
            .find_match(&ParsedIngredient::new("ser gołda"))
            .unwrap();
        assert_eq!(found.kind, MatchKind::Similarity);
        assert_eq!(found.category_id, "dairy");
        assert!(found.similarity >= 0.85);
    }

    #[test]
    fn test_similarity_below_threshold() {
        let categorizer = categorizer_with(&[("ser gouda", "dairy", 1)]);
        assert_eq!(
            categorizer.suggest_category(&ParsedIngredient::new("sos sojowy")),
            None
        );
    }

    #[test]
    fn test_short_names_never_match_fuzzily() {
        let categorizer = categorizer_with(&[("ab", "other", 1)]);
        assert_eq!(categorizer.suggest_category(&ParsedIngredient::new("ac")), None);
    }

    #[test]
    fn test_highest_usage_wins_and_ties_are_deterministic() {
        let categorizer = categorizer_with(&[
            ("ser goudy", "dairy", 2),
            ("ser guda", "cheese", 7),
            ("sir gouda", "deli", 7),
        ]);
        // one edit away from each entry
        let found = categorizer
            .find_match(&ParsedIngredient::new("ser gouda"))
            .unwrap();
        assert_eq!(found.category_id, "cheese");
    }

    #[test]
    fn test_exact_match_beats_closer_fuzzy_entry_with_more_usage() {
        let categorizer = categorizer_with(&[("ser gouda", "dairy", 1), ("ser goudy", "cheese", 100)]);

        let found = categorizer
            .find_match(&ParsedIngredient::new("ser gouda"))
            .unwrap();

        assert_eq!(found.kind, MatchKind::Exact);
        assert_eq!(found.category_id, "dairy");
    }

    #[test]
    fn test_exact_match_beats_variation_with_more_usage() {
        let categorizer = categorizer_with(&[("kefir", "dairy", 1), ("napój mleczny", "drinks", 50)]);
        let mut entry = categorizer.entry("napój mleczny").unwrap();
        entry.variations.insert("Kefir".to_string());
        categorizer.catalog.insert("napój mleczny".to_string(), entry);

        let found = categorizer
            .find_match(&ParsedIngredient::new("Kefir"))
            .unwrap();

        assert_eq!(found.kind, MatchKind::Exact);
        assert_eq!(found.category_id, "dairy");
    }

    #[tokio::test]
    async fn test_transaction_applies_categories_in_sorted_order() {
        let categorizer = categorizer_with(&[]);
        let mut grouped = HashMap::new();
        for category in ["zupy", "dairy", "other", "bakery"] {
            grouped.insert(category.to_string(), vec![ParsedIngredient::new("Maślanka")]);
        }

        let learned = categorizer.update_categories_in_transaction(&mut grouped).await;

        assert_eq!(learned, 4);
        let entry = categorizer.entry("maślanka").unwrap();
        assert_eq!(entry.category_id, "zupy");
        assert_eq!(entry.usage_count, 4);
    }

    #[test]
    fn test_empty_name_has_no_suggestion() {
        let categorizer = categorizer_with(&[("mleko", "dairy", 1)]);
        assert_eq!(categorizer.suggest_category(&ParsedIngredient::new("500 g")), None);
    }

    #[test]
    fn test_update_creates_and_increments() {
        let categorizer = categorizer_with(&[]);
        let ingredient = ParsedIngredient::new("Jajka")
            .with_original("Jajka 10 szt")
            .with_category("dairy");

        categorizer.update_categorization(&ingredient);
        categorizer.update_categorization(&ingredient);

        let entry = categorizer.entry("jajka").unwrap();
        assert_eq!(entry.usage_count, 2);
        assert_eq!(entry.variations.len(), 1);
        assert!(entry.variations.contains("Jajka 10 szt"));
    }

    #[test]
    fn test_update_without_category_only_counts_known_names() {
        let categorizer = categorizer_with(&[("mleko", "dairy", 1)]);

        categorizer.update_categorization(&ParsedIngredient::new("mleko"));
        categorizer.update_categorization(&ParsedIngredient::new("kefir"));

        assert_eq!(categorizer.entry("mleko").unwrap().usage_count, 2);
        assert_eq!(categorizer.entry("mleko").unwrap().category_id, "dairy");
        assert!(categorizer.entry("kefir").is_none());
    }

    #[test]
    fn test_categorize_ingredients_keeps_existing_categories() {
        let categorizer = categorizer_with(&[("mleko", "dairy", 1)]);
        let mut ingredients = vec![
            ParsedIngredient::new("mleko"),
            ParsedIngredient::new("mleko").with_category("drinks"),
            ParsedIngredient::new("cegła"),
        ];

        let filled = categorizer.categorize_ingredients(&mut ingredients);

        assert_eq!(filled, 1);
        assert_eq!(ingredients[0].category_id.as_deref(), Some("dairy"));
        assert_eq!(ingredients[1].category_id.as_deref(), Some("drinks"));
        assert_eq!(ingredients[2].category_id, None);
    }
}
