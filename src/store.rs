//! Collection store: a thin uniform abstraction over the document database.
//!
//! `PgStore` keeps each collection as a `(id, date, payload)` table with the
//! whole document in a JSONB column. `MemoryStore` is an in-process backend
//! with the same contract, used by the test suite and for local development
//! without a database.

use crate::error::AppError;
use crate::registry::{ItemKind, ACTIVITY_COLLECTION};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// New external identifier: RFC 4122 v4, 36 chars, 8-4-4-4-12. Generated
/// server-side whenever a create carries no id.
pub fn new_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Uniform CRUD contract shared by all collections. Lookups go by the
/// external `id` field, never a storage-internal key; listing order is
/// always `date` descending.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn list_all(&self, collection: &str) -> Result<Vec<Value>, AppError>;

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError>;

    /// Insert a new document. `date` is set server-side regardless of any
    /// client-supplied value; `id` is generated when absent. Returns the
    /// stored document including generated fields.
    async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
        id: Option<String>,
    ) -> Result<Value, AppError>;

    /// Shallow-merge `patch` into the document. Fields not mentioned in the
    /// patch are preserved. Returns `None` when no document has that id.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Option<Value>, AppError>;

    /// Returns whether a document was actually removed; callers surface 404
    /// on `false` rather than silently succeeding.
    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool, AppError>;

    /// Most recent `limit` documents, newest first. Activity log read view.
    async fn recent(&self, collection: &str, limit: i64) -> Result<Vec<Value>, AppError>;

    /// Remove every document in the collection. Returns the count removed.
    async fn clear(&self, collection: &str) -> Result<u64, AppError>;

    /// Liveness probe for the readiness endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}

fn stamp_document(
    mut fields: Map<String, Value>,
    id: &str,
    date: DateTime<Utc>,
) -> Map<String, Value> {
    fields.insert("id".into(), Value::String(id.to_string()));
    fields.insert(
        "date".into(),
        Value::String(date.to_rfc3339_opts(SecondsFormat::Micros, true)),
    );
    fields
}

// -------------------------------------------------------------------------
// PostgreSQL backend
// -------------------------------------------------------------------------

/// Document store over PostgreSQL. One table per collection:
/// `(id TEXT PRIMARY KEY, date TIMESTAMPTZ, payload JSONB)`. The `id` and
/// `date` columns are authoritative for lookup and ordering; the payload
/// carries mirrors of both for serialization.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create all collection tables if missing. Called once at startup.
    pub async fn ensure_collections(&self) -> Result<(), AppError> {
        let mut names: Vec<&'static str> =
            ItemKind::ALL.iter().map(|k| k.collection()).collect();
        names.push(ACTIVITY_COLLECTION);
        for table in names {
            let ddl = format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    payload JSONB NOT NULL
                )
                "#,
                table
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
            let idx = format!(
                "CREATE INDEX IF NOT EXISTS {}_date_idx ON {} (date DESC)",
                table, table
            );
            sqlx::query(&idx).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ItemStore for PgStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<Value>, AppError> {
        let sql = format!("SELECT payload FROM {} ORDER BY date DESC", collection);
        tracing::debug!(sql = %sql, "list");
        let rows: Vec<Value> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        let sql = format!("SELECT payload FROM {} WHERE id = $1", collection);
        tracing::debug!(sql = %sql, id = %id, "get");
        let row: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
        id: Option<String>,
    ) -> Result<Value, AppError> {
        let id = id.unwrap_or_else(new_item_id);
        let date = Utc::now();
        let payload = Value::Object(stamp_document(fields, &id, date));
        let sql = format!(
            "INSERT INTO {} (id, date, payload) VALUES ($1, $2, $3) RETURNING payload",
            collection
        );
        tracing::debug!(sql = %sql, id = %id, "create");
        let stored: Value = sqlx::query_scalar(&sql)
            .bind(&id)
            .bind(date)
            .bind(&payload)
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        // JSONB `||` is exactly the shallow merge the contract asks for:
        // patch keys overwrite, everything else is preserved.
        let sql = format!(
            "UPDATE {} SET payload = payload || $2 WHERE id = $1 RETURNING payload",
            collection
        );
        tracing::debug!(sql = %sql, id = %id, "update");
        let row: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(Value::Object(patch))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", collection);
        tracing::debug!(sql = %sql, id = %id, "delete");
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recent(&self, collection: &str, limit: i64) -> Result<Vec<Value>, AppError> {
        let sql = format!(
            "SELECT payload FROM {} ORDER BY date DESC LIMIT $1",
            collection
        );
        let rows: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn clear(&self, collection: &str) -> Result<u64, AppError> {
        let sql = format!("DELETE FROM {}", collection);
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

// -------------------------------------------------------------------------
// In-memory backend
// -------------------------------------------------------------------------

struct MemoryDoc {
    id: String,
    date: DateTime<Utc>,
    // Insertion counter breaking date ties so "newest first" stays stable.
    seq: u64,
    payload: Value,
}

/// In-process backend with the same contract as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<MemoryDoc>>>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_payloads(docs: &[MemoryDoc]) -> Vec<Value> {
        let mut refs: Vec<&MemoryDoc> = docs.iter().collect();
        refs.sort_by(|a, b| (b.date, b.seq).cmp(&(a.date, a.seq)));
        refs.into_iter().map(|d| d.payload.clone()).collect()
    }

    fn lock_poisoned() -> AppError {
        AppError::Storage("memory store lock poisoned".into())
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<Value>, AppError> {
        let guard = self.collections.read().map_err(|_| Self::lock_poisoned())?;
        Ok(guard
            .get(collection)
            .map(|docs| Self::sorted_payloads(docs))
            .unwrap_or_default())
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        let guard = self.collections.read().map_err(|_| Self::lock_poisoned())?;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .map(|d| d.payload.clone()))
    }

    async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
        id: Option<String>,
    ) -> Result<Value, AppError> {
        let id = id.unwrap_or_else(new_item_id);
        let date = Utc::now();
        let payload = Value::Object(stamp_document(fields, &id, date));
        let mut guard = self.collections.write().map_err(|_| Self::lock_poisoned())?;
        let docs = guard.entry(collection.to_string()).or_default();
        // Same contract as the primary-key column in PgStore.
        if docs.iter().any(|d| d.id == id) {
            return Err(AppError::Storage(format!(
                "duplicate id {} in {}",
                id, collection
            )));
        }
        docs.push(MemoryDoc {
            id,
            date,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            payload: payload.clone(),
        });
        Ok(payload)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let mut guard = self.collections.write().map_err(|_| Self::lock_poisoned())?;
        let doc = guard
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id));
        match doc {
            Some(doc) => {
                if let Value::Object(fields) = &mut doc.payload {
                    for (k, v) in patch {
                        fields.insert(k, v);
                    }
                }
                Ok(Some(doc.payload.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let mut guard = self.collections.write().map_err(|_| Self::lock_poisoned())?;
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() < before)
    }

    async fn recent(&self, collection: &str, limit: i64) -> Result<Vec<Value>, AppError> {
        let mut all = self.list_all(collection).await?;
        all.truncate(limit.max(0) as usize);
        Ok(all)
    }

    async fn clear(&self, collection: &str) -> Result<u64, AppError> {
        let mut guard = self.collections.write().map_err(|_| Self::lock_poisoned())?;
        Ok(guard
            .get_mut(collection)
            .map(|docs| {
                let n = docs.len() as u64;
                docs.clear();
                n
            })
            .unwrap_or(0))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
