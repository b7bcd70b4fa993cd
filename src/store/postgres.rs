use async_trait::async_trait;
use log::debug;
use serde_json::{json, Map, Value};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};

use super::{Direction, Document, DocumentStore, Filter, Query, StoreError};

/// Document store backed by one JSONB table in Postgres.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    data: Json<Value>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        match row.data.0 {
            Value::Object(data) => Ok(Document { id: row.id, data }),
            _ => Err(StoreError::NotAnObject),
        }
    }
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        PgDocumentStore { pool }
    }
}

/// Builds the SELECT for `query`. Documents missing the order field, or
/// holding null in it, are left out.
fn select_query(query: &Query) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT id, data FROM documents WHERE collection = ");
    qb.push_bind(query.collection.clone());

    for filter in &query.filters {
        match filter {
            Filter::Eq { field, value } => {
                qb.push(" AND data -> ")
                    .push_bind(field.clone())
                    .push(" = ")
                    .push_bind(Json(value.clone()));
            }
            Filter::ArrayContains { field, value } => {
                qb.push(" AND jsonb_typeof(data -> ")
                    .push_bind(field.clone())
                    .push(") = 'array' AND data -> ")
                    .push_bind(field.clone())
                    .push(" @> ")
                    .push_bind(Json(json!([value])));
            }
        }
    }

    if let Some(order) = &query.order_by {
        qb.push(" AND jsonb_typeof(data -> ")
            .push_bind(order.field.clone())
            .push(") IS DISTINCT FROM 'null' AND data ? ")
            .push_bind(order.field.clone());
        qb.push(" ORDER BY data -> ").push_bind(order.field.clone());
        qb.push(match order.direction {
            Direction::Ascending => " ASC",
            Direction::Descending => " DESC",
        });
    }
    qb
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut qb = select_query(query);
        let rows: Vec<DocumentRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        debug!("query on {} returned {} rows", query.collection, rows.len());
        rows.into_iter().map(Document::try_from).collect()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Document::try_from).transpose()
    }

    async fn add(&self, collection: &str, data: Map<String, Value>) -> Result<String, StoreError> {
        let id: String = sqlx::query_scalar(
            "INSERT INTO documents (collection, id, data) VALUES ($1, gen_random_uuid()::text, $2) RETURNING id",
        )
        .bind(collection)
        .bind(Json(Value::Object(data)))
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn set_merge(&self, collection: &str, id: &str, data: Map<String, Value>) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO UPDATE SET data = documents.data || EXCLUDED.data",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(data)))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_collection_scan() {
        let qb = select_query(&Query::collection("articles"));
        assert_eq!(qb.sql(), "SELECT id, data FROM documents WHERE collection = $1");
    }

    #[test]
    fn ordered_query_skips_documents_without_the_field() {
        let qb = select_query(&Query::collection("articles").order_by("date", Direction::Descending));
        assert_eq!(
            qb.sql(),
            "SELECT id, data FROM documents WHERE collection = $1 \
             AND jsonb_typeof(data -> $2) IS DISTINCT FROM 'null' AND data ? $3 \
             ORDER BY data -> $4 DESC"
        );
    }

    #[test]
    fn filters_come_before_the_ordering() {
        let query = Query::collection("bookings")
            .where_eq("userId", "u1")
            .order_by("createdAt", Direction::Ascending);
        let qb = select_query(&query);
        assert_eq!(
            qb.sql(),
            "SELECT id, data FROM documents WHERE collection = $1 AND data -> $2 = $3 \
             AND jsonb_typeof(data -> $4) IS DISTINCT FROM 'null' AND data ? $5 \
             ORDER BY data -> $6 ASC"
        );
    }

    #[test]
    fn array_contains_requires_an_array() {
        let qb = select_query(&Query::collection("doctors").where_array_contains("searchTerms", "heart"));
        assert_eq!(
            qb.sql(),
            "SELECT id, data FROM documents WHERE collection = $1 \
             AND jsonb_typeof(data -> $2) = 'array' AND data -> $3 @> $4"
        );
    }
}
