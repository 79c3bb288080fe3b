use anyhow::{Context, Result};
use diet_pantry::categorizer::ProductCategorizer;
use diet_pantry::category_store::{CategoryStore, JsonFileCategoryStore};
use diet_pantry::config::AppConfig;
use diet_pantry::ingredient_model::{Diet, ParsedIngredient};
use diet_pantry::product_catalog::InMemoryProductCatalog;
use diet_pantry::shopping_list::ShoppingListGenerator;
use diet_pantry::unit_service::UnitService;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_logging();

    let diet_path = env::args()
        .nth(1)
        .context("usage: diet-pantry <diet.json>")?;

    let config = AppConfig::from_env();
    info!(?config, "Starting diet pantry");

    let store: Arc<dyn CategoryStore> = Arc::new(
        JsonFileCategoryStore::new(config.store.category_store_path.clone())
            .with_chunk_size(config.store.save_chunk_size),
    );
    let categorizer = ProductCategorizer::load(store, config.categorizer.clone())
        .await
        .context("Failed to load the learned product catalog")?;

    let catalog = InMemoryProductCatalog::from_json_file(&config.store.product_catalog_path)
        .await
        .context("Failed to load the product catalog")?;

    let content = tokio::fs::read_to_string(&diet_path)
        .await
        .with_context(|| format!("Failed to read diet file {diet_path}"))?;
    let mut diet: Diet = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse diet file {diet_path}"))?;

    let mut filled = 0;
    for day in diet.days.iter_mut() {
        for meal in day.meals.iter_mut() {
            filled += categorizer.categorize_ingredients(&mut meal.ingredients);
        }
    }
    info!(filled, "Suggested missing categories");

    // Learn from every ingredient that now has a category
    let mut grouped: HashMap<String, Vec<ParsedIngredient>> = HashMap::new();
    for ingredient in diet.ingredients() {
        if let Some(category_id) = &ingredient.category_id {
            grouped
                .entry(category_id.clone())
                .or_default()
                .push(ingredient.clone());
        }
    }
    categorizer.update_categories_in_transaction(&mut grouped).await;

    let generator = ShoppingListGenerator::new(
        Arc::new(UnitService::new()),
        Arc::new(catalog),
        config.shopping_list.clone(),
    );
    let list = generator
        .generate(&diet)
        .await
        .context("Failed to generate the shopping list")?;

    println!("{}", serde_json::to_string_pretty(&list)?);
    Ok(())
}
