//! One-shot population of the article and doctor collections.
//!
//! Not idempotent: every run inserts the fixtures again.

use log::{error, info};
use serde_json::Value;

use crate::fixtures;
use crate::store::{into_fields, DocumentStore, StoreError, COLLECTION_ARTICLES, COLLECTION_DOCTORS};

#[derive(Debug, Default)]
pub struct SeedReport {
    pub articles: Option<usize>,
    pub doctors: Option<usize>,
}

async fn insert_all(store: &dyn DocumentStore, collection: &str, docs: Vec<Value>) -> Result<usize, StoreError> {
    let mut inserted = 0;
    for doc in docs {
        store.add(collection, into_fields(doc)?).await?;
        inserted += 1;
    }
    info!("Seeded {} documents into {}", inserted, collection);
    Ok(inserted)
}

pub async fn seed_articles(store: &dyn DocumentStore) -> Result<usize, StoreError> {
    insert_all(store, COLLECTION_ARTICLES, fixtures::seed_articles()).await
}

pub async fn seed_doctors(store: &dyn DocumentStore) -> Result<usize, StoreError> {
    insert_all(store, COLLECTION_DOCTORS, fixtures::seed_doctors()).await
}

/// Seeds every collection. A failing collection is logged and skipped.
pub async fn seed_all(store: &dyn DocumentStore) -> SeedReport {
    info!("Starting database seeding");
    let articles = seed_articles(store)
        .await
        .map_err(|e| error!("Error seeding articles: {}", e))
        .ok();
    let doctors = seed_doctors(store)
        .await
        .map_err(|e| error!("Error seeding doctors: {}", e))
        .ok();
    SeedReport { articles, doctors }
}
