//! Access to the hosted document database.
//!
//! Documents are schemaless JSON objects grouped into named collections and
//! addressed by a server-assigned string id. Queries support equality and
//! array-contains filters plus a single ordering field.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::{Map, Value};

mod memory;
mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

pub const COLLECTION_ARTICLES: &str = "articles";
pub const COLLECTION_DOCTORS: &str = "doctors";
pub const COLLECTION_BOOKINGS: &str = "bookings";
pub const COLLECTION_USERS: &str = "users";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: String, value: Value },
    ArrayContains { field: String, value: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn collection(name: &str) -> Self {
        Query {
            collection: name.to_string(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq { field: field.to_string(), value: value.into() });
        self
    }

    pub fn where_array_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::ArrayContains { field: field.to_string(), value: value.into() });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy { field: field.to_string(), direction });
        self
    }

    /// Whether a document passes every filter and carries the ordering field.
    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        let filtered = self.filters.iter().all(|filter| match filter {
            Filter::Eq { field, value } => data.get(field) == Some(value),
            Filter::ArrayContains { field, value } => match data.get(field) {
                Some(Value::Array(items)) => items.contains(value),
                _ => false,
            },
        });
        let has_order_field = match &self.order_by {
            Some(order) => data.get(&order.field).is_some_and(|v| !v.is_null()),
            None => true,
        };
        filtered && has_order_field
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Inserts a new document and returns its server-assigned id.
    async fn add(&self, collection: &str, data: Map<String, Value>) -> Result<String, StoreError>;

    /// Creates the document or merges `data` into the existing fields.
    async fn set_merge(&self, collection: &str, id: &str, data: Map<String, Value>) -> Result<(), StoreError>;
}

// Same ordering Postgres uses for jsonb: null < string < number < bool < array < object.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Converts a `json!({...})` literal into the field map a store expects.
pub fn into_fields(value: Value) -> Result<Map<String, Value>, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ordered_query_requires_the_field() {
        let query = Query::collection("doctors").order_by("rating", Direction::Descending);
        let with = into_fields(json!({ "rating": "4.5" })).unwrap();
        let without = into_fields(json!({ "name": "x" })).unwrap();
        assert!(query.matches(&with));
        assert!(!query.matches(&without));
    }

    #[test]
    fn array_contains_only_matches_arrays() {
        let query = Query::collection("doctors").where_array_contains("searchTerms", "heart");
        assert!(query.matches(&into_fields(json!({ "searchTerms": ["heart", "cardio"] })).unwrap()));
        assert!(!query.matches(&into_fields(json!({ "searchTerms": "heart" })).unwrap()));
    }

    #[test]
    fn numbers_compare_numerically_and_strings_lexically() {
        assert_eq!(compare_values(&json!(9), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("9"), &json!("10")), Ordering::Greater);
        assert_eq!(compare_values(&json!("z"), &json!(1)), Ordering::Less);
    }
}
