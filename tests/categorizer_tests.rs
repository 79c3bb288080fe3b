//! # Categorizer Tests
//!
//! Learning, persistence and concurrent use of the product categorizer against
//! the in-memory and JSON file stores.

use diet_pantry::categorizer::{MatchKind, ProductCategorizer};
use diet_pantry::category_store::{CategoryStore, InMemoryCategoryStore, JsonFileCategoryStore};
use diet_pantry::config::CategorizerConfig;
use diet_pantry::ingredient_model::ParsedIngredient;
use std::collections::HashMap;
use std::sync::Arc;

async fn empty_categorizer() -> (Arc<InMemoryCategoryStore>, ProductCategorizer) {
    let store = Arc::new(InMemoryCategoryStore::new());
    let categorizer = ProductCategorizer::load(store.clone(), CategorizerConfig::default())
        .await
        .unwrap();
    (store, categorizer)
}

fn grouped(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<ParsedIngredient>> {
    pairs
        .iter()
        .map(|(category, names)| {
            (
                category.to_string(),
                names.iter().map(|name| ParsedIngredient::new(name)).collect(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_transaction_assigns_learns_and_saves() {
    let (store, categorizer) = empty_categorizer().await;
    let mut groups = grouped(&[("dairy", &["Mleko 2%", "Ser żółty"]), ("bakery", &["Chleb"])]);

    let learned = categorizer.update_categories_in_transaction(&mut groups).await;

    assert_eq!(learned, 3);
    assert!(groups["dairy"]
        .iter()
        .all(|i| i.category_id.as_deref() == Some("dairy")));
    assert_eq!(store.save_count(), 1);

    let stored = store.stored();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored["mleko"].category_id, "dairy");
    assert_eq!(stored["chleb"].category_id, "bakery");
}

#[tokio::test]
async fn test_learned_names_drive_later_suggestions() {
    let (_store, categorizer) = empty_categorizer().await;
    let mut groups = grouped(&[("vegetables", &["Pomidory"]), ("dairy", &["Ser gouda"])]);
    categorizer.update_categories_in_transaction(&mut groups).await;

    let exact = categorizer
        .find_match(&ParsedIngredient::new("pomidory 500 g"))
        .unwrap();
    assert_eq!(exact.kind, MatchKind::Exact);
    assert_eq!(exact.category_id, "vegetables");

    let fuzzy = categorizer
        .find_match(&ParsedIngredient::new("ser gauda"))
        .unwrap();
    assert_eq!(fuzzy.kind, MatchKind::Similarity);
    assert_eq!(fuzzy.category_id, "dairy");
}

#[tokio::test]
async fn test_recategorizing_moves_known_name() {
    let (store, categorizer) = empty_categorizer().await;
    categorizer
        .update_categories_in_transaction(&mut grouped(&[("other", &["Jogurt naturalny"])]))
        .await;
    categorizer
        .update_categories_in_transaction(&mut grouped(&[("dairy", &["jogurt naturalny"])]))
        .await;

    let entry = categorizer.entry("jogurt naturalny").unwrap();
    assert_eq!(entry.category_id, "dairy");
    assert_eq!(entry.usage_count, 2);
    assert_eq!(entry.variations.len(), 2);
    assert_eq!(store.stored()["jogurt naturalny"].category_id, "dairy");
}

#[tokio::test]
async fn test_failed_save_keeps_memory_authoritative() {
    let (store, categorizer) = empty_categorizer().await;
    store.set_fail_saves(true);

    let learned = categorizer
        .update_categories_in_transaction(&mut grouped(&[("fruit", &["Jabłka"])]))
        .await;

    assert_eq!(learned, 1);
    assert!(categorizer.entry("jabłka").is_some());
    assert!(store.stored().is_empty());
    assert!(!categorizer.flush().await);

    store.set_fail_saves(false);
    assert!(categorizer.flush().await);
    assert_eq!(store.stored().len(), 1);
}

#[tokio::test]
async fn test_large_catalog_is_saved_in_chunks() {
    let store = Arc::new(InMemoryCategoryStore::new().with_chunk_size(500));
    let categorizer = ProductCategorizer::load(store.clone(), CategorizerConfig::default())
        .await
        .unwrap();

    let names: Vec<String> = (0..1200).map(|i| format!("produkt {}", to_letters(i))).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    categorizer
        .update_categories_in_transaction(&mut grouped(&[("other", &refs)]))
        .await;

    assert_eq!(store.stored().len(), 1200);
    assert_eq!(store.batches_written(), 3);
}

// Digits are stripped from matching keys, so spell indices with letters
fn to_letters(mut value: usize) -> String {
    let mut letters = String::new();
    loop {
        letters.insert(0, (b'a' + (value % 26) as u8) as char);
        value /= 26;
        if value == 0 {
            return letters;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_lose_no_sightings() {
    let (_store, categorizer) = empty_categorizer().await;
    let categorizer = Arc::new(categorizer);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let categorizer = Arc::clone(&categorizer);
        handles.push(tokio::spawn(async move {
            for _ in 0..100 {
                categorizer.update_categorization(
                    &ParsedIngredient::new("Mleko").with_category("dairy"),
                );
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(categorizer.entry("mleko").unwrap().usage_count, 800);
    assert_eq!(categorizer.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transactions_all_persist() {
    let (store, categorizer) = empty_categorizer().await;
    let categorizer = Arc::new(categorizer);

    let categories = ["dairy", "bakery", "fruit", "vegetables"];
    let mut handles = Vec::new();
    for category in categories {
        let categorizer = Arc::clone(&categorizer);
        handles.push(tokio::spawn(async move {
            let names = [format!("{category} alpha"), format!("{category} beta")];
            let mut groups = HashMap::new();
            groups.insert(
                category.to_string(),
                names.iter().map(|n| ParsedIngredient::new(n)).collect(),
            );
            categorizer.update_categories_in_transaction(&mut groups).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 2);
    }

    assert_eq!(store.save_count(), 4);
    let stored = store.stored();
    assert_eq!(stored.len(), 8);
    assert_eq!(stored["fruit beta"].category_id, "fruit");
}

#[tokio::test]
async fn test_json_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learned.json");

    {
        let store: Arc<dyn CategoryStore> = Arc::new(JsonFileCategoryStore::new(&path));
        let categorizer = ProductCategorizer::load(store, CategorizerConfig::default())
            .await
            .unwrap();
        categorizer
            .update_categories_in_transaction(&mut grouped(&[("spices", &["Pieprz czarny"])]))
            .await;
    }

    let store: Arc<dyn CategoryStore> = Arc::new(JsonFileCategoryStore::new(&path));
    let categorizer = ProductCategorizer::load(store, CategorizerConfig::default())
        .await
        .unwrap();

    assert_eq!(categorizer.len(), 1);
    assert_eq!(
        categorizer
            .suggest_category(&ParsedIngredient::new("pieprz czarny mielony"))
            .as_deref(),
        None
    );
    assert_eq!(
        categorizer
            .suggest_category(&ParsedIngredient::new("Pieprz  czarny"))
            .as_deref(),
        Some("spices")
    );
}

#[tokio::test]
async fn test_stricter_threshold_rejects_fuzzy_match() {
    let store = Arc::new(InMemoryCategoryStore::new());
    let strict = CategorizerConfig {
        similarity_threshold: 0.95,
        ..CategorizerConfig::default()
    };
    let categorizer = ProductCategorizer::load(store, strict).await.unwrap();
    categorizer.update_categorization(&ParsedIngredient::new("ser gouda").with_category("dairy"));

    assert_eq!(
        categorizer.suggest_category(&ParsedIngredient::new("ser gauda")),
        None
    );
    assert_eq!(
        categorizer
            .suggest_category(&ParsedIngredient::new("ser gouda"))
            .as_deref(),
        Some("dairy")
    );
}
