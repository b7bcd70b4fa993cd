use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::{compare_values, Direction, Document, DocumentStore, Query, StoreError};

/// In-process document store.
///
/// Used for offline runs and tests. Failures can be injected per store
/// (`set_offline`) or per collection for writes (`reject_writes_to`).
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    offline: RwLock<bool>,
    rejected_writes: RwLock<HashSet<String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every call, like a device with no connectivity.
    pub fn offline() -> Self {
        let store = Self::default();
        store.set_offline(true);
        store
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.write() = offline;
    }

    pub fn reject_writes_to(&self, collection: &str) {
        self.rejected_writes.write().insert(collection.to_string());
    }

    /// Stores a document under a caller-chosen id, bypassing failure injection.
    pub fn insert_raw(&self, collection: &str, id: &str, data: Map<String, Value>) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(Document { id: id.to_string(), data });
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections.read().get(collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if *self.offline.read() {
            return Err(StoreError::Unavailable("network unreachable".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self, collection: &str) -> Result<(), StoreError> {
        self.check_online()?;
        if self.rejected_writes.read().contains(collection) {
            return Err(StoreError::Unavailable(format!("permission denied on {collection}")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.check_online()?;
        let collections = self.collections.read();
        let mut docs: Vec<Document> = collections
            .get(&query.collection)
            .map(|docs| docs.iter().filter(|d| query.matches(&d.data)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = &query.order_by {
            docs.sort_by(|a, b| {
                let ordering = compare_values(
                    a.data.get(&order.field).unwrap_or(&Value::Null),
                    b.data.get(&order.field).unwrap_or(&Value::Null),
                );
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        debug!("memory query on {} returned {} documents", query.collection, docs.len());
        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_online()?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn add(&self, collection: &str, data: Map<String, Value>) -> Result<String, StoreError> {
        self.check_writable(collection)?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.insert_raw(collection, &id, data);
        Ok(id)
    }

    async fn set_merge(&self, collection: &str, id: &str, data: Map<String, Value>) -> Result<(), StoreError> {
        self.check_writable(collection)?;
        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(existing) => existing.data.extend(data),
            None => docs.push(Document { id: id.to_string(), data }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::into_fields;
    use serde_json::json;

    #[tokio::test]
    async fn merge_keeps_untouched_fields() {
        let store = MemoryDocumentStore::new();
        store
            .set_merge("users", "u1", into_fields(json!({ "name": "A", "createdAt": 1 })).unwrap())
            .await
            .unwrap();
        store
            .set_merge("users", "u1", into_fields(json!({ "name": "B" })).unwrap())
            .await
            .unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data.get("name"), Some(&json!("B")));
        assert_eq!(doc.data.get("createdAt"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn offline_store_fails_reads() {
        let store = MemoryDocumentStore::offline();
        assert!(store.query(&Query::collection("articles")).await.is_err());
        store.set_offline(false);
        assert!(store.query(&Query::collection("articles")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_collection_still_reads() {
        let store = MemoryDocumentStore::new();
        store.reject_writes_to("users");
        assert!(store.add("users", Map::new()).await.is_err());
        assert!(store.add("bookings", Map::new()).await.is_ok());
        assert!(store.get("users", "nobody").await.unwrap().is_none());
    }
}
