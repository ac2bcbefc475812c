//! Record Store Module
//!
//! Rows travel between the API and the store as JSON objects keyed by column
//! name. The [`RecordStore`] trait executes the list-query model from
//! `vitrine-core` against either Postgres ([`PgStore`]) or an in-process table
//! set ([`MemoryStore`]); [`Db`] is the typed facade handlers use.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{DbConfig, PgStore};

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use vitrine_core::{
    ListPlan, PaginationMeta, Query, QueryError, Record, RowKey, Table,
};

use crate::error::{ApiError, ApiResult};
use crate::telemetry::METRICS;

// ============================================================================
// ERRORS
// ============================================================================

/// Failure reported by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("duplicate row in {table}: {detail}")]
    Conflict { table: &'static str, detail: String },

    /// A foreign key pointed at a missing row.
    #[error("missing referenced row for {table}: {detail}")]
    InvalidReference { table: &'static str, detail: String },

    /// A NOT NULL or CHECK constraint rejected the write.
    #[error("constraint violated on {table}: {detail}")]
    Constraint { table: &'static str, detail: String },

    #[error("connection pool exhausted")]
    PoolExhausted,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("store error: {0}")]
    Backend(String),

    #[error("row decode failed: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// STORE TRAIT
// ============================================================================

/// One page of matching rows plus the count of all matching rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub rows: Vec<Value>,
    pub total: u64,
}

/// Backend executing queries over JSON rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows matching `query` within its range, and the unranged match count.
    async fn select(&self, query: &Query) -> StoreResult<Page>;

    /// Number of rows matching `query`, ignoring order and range.
    async fn count(&self, query: &Query) -> StoreResult<u64> {
        let mut probe = query.clone();
        probe.order.clear();
        Ok(self.select(&probe.limit(0)).await?.total)
    }

    /// Insert a complete row and return it as stored.
    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value>;

    /// Apply `patch` to the row addressed by `key`; `None` when absent.
    async fn update(
        &self,
        table: Table,
        key: &RowKey,
        patch: Map<String, Value>,
    ) -> StoreResult<Option<Value>>;

    /// Delete the row addressed by `key`; `false` when absent.
    async fn delete(&self, table: Table, key: &RowKey) -> StoreResult<bool>;

    async fn health_check(&self) -> StoreResult<()>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

// ============================================================================
// TYPED FACADE
// ============================================================================

/// A decoded page of records with its pagination block.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<R> {
    pub items: Vec<R>,
    pub pagination: Option<PaginationMeta>,
}

/// Typed access to a [`RecordStore`].
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn RecordStore>,
}

impl Db {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Database backed by a fresh in-process store.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Execute a translated list request.
    pub async fn list<R: Record>(&self, plan: &ListPlan) -> ApiResult<Listing<R>> {
        let page = self
            .timed("select", R::TABLE, self.store.select(&plan.query))
            .await?;
        let items = decode_rows(page.rows)?;
        let pagination = plan
            .pagination
            .map(|pagination| PaginationMeta::new(pagination, page.total));
        Ok(Listing { items, pagination })
    }

    /// Every row matching `query` (range included).
    pub async fn select<R: Record>(&self, query: &Query) -> ApiResult<Vec<R>> {
        let page = self.timed("select", R::TABLE, self.store.select(query)).await?;
        decode_rows(page.rows)
    }

    /// First row matching `query`.
    pub async fn find_one<R: Record>(&self, query: Query) -> ApiResult<Option<R>> {
        let query = query.limit(1);
        let page = self.timed("select", R::TABLE, self.store.select(&query)).await?;
        page.rows.into_iter().next().map(decode_row).transpose()
    }

    /// Row addressed by a slug-or-id key.
    pub async fn get<R: Record>(&self, key: &RowKey) -> ApiResult<Option<R>> {
        self.get_where(key, Query::table(R::TABLE)).await
    }

    /// Row addressed by `key` that also satisfies the conditions of `scope`.
    pub async fn get_where<R: Record>(&self, key: &RowKey, scope: Query) -> ApiResult<Option<R>> {
        let query = match key {
            RowKey::Id(id) => scope.eq_uuid("id", *id),
            RowKey::Slug(slug) if R::TABLE.has_slug() => scope.eq_text("slug", slug.clone()),
            RowKey::Slug(_) => return Ok(None),
        };
        self.find_one(query).await
    }

    /// Like [`Db::get`] but 404s when absent.
    pub async fn require<R: Record>(&self, key: &RowKey) -> ApiResult<R> {
        self.get::<R>(key)
            .await?
            .ok_or_else(|| ApiError::entity_not_found(R::ENTITY_NAME, key))
    }

    pub async fn count(&self, query: &Query) -> ApiResult<u64> {
        Ok(self.timed("count", query.table, self.store.count(query)).await?)
    }

    pub async fn insert<R: Record>(&self, record: &R) -> ApiResult<R> {
        let row = serde_json::to_value(record)?;
        let stored = self
            .timed("insert", R::TABLE, self.store.insert(R::TABLE, row))
            .await?;
        decode_row(stored)
    }

    /// Apply a column patch, stamping `updated_at` where the table has one.
    pub async fn update<R: Record>(
        &self,
        key: &RowKey,
        mut patch: Map<String, Value>,
    ) -> ApiResult<Option<R>> {
        if matches!(key, RowKey::Slug(_)) && !R::TABLE.has_slug() {
            return Ok(None);
        }
        if R::TABLE.has_updated_at() {
            patch.insert("updated_at".to_string(), serde_json::to_value(vitrine_core::now())?);
        }
        let stored = self
            .timed("update", R::TABLE, self.store.update(R::TABLE, key, patch))
            .await?;
        stored.map(decode_row).transpose()
    }

    /// Set an integer counter column to `value` without touching
    /// `updated_at`. Concurrent bumps may lose increments.
    pub async fn set_counter<R: Record>(
        &self,
        key: &RowKey,
        column: &str,
        value: i64,
    ) -> ApiResult<bool> {
        let mut patch = Map::new();
        patch.insert(column.to_string(), Value::from(value));
        let stored = self
            .timed("update", R::TABLE, self.store.update(R::TABLE, key, patch))
            .await?;
        Ok(stored.is_some())
    }

    /// Delete by slug-or-id key; `false` when nothing matched.
    pub async fn delete<R: Record>(&self, key: &RowKey) -> ApiResult<bool> {
        if matches!(key, RowKey::Slug(_)) && !R::TABLE.has_slug() {
            return Ok(false);
        }
        Ok(self
            .timed("delete", R::TABLE, self.store.delete(R::TABLE, key))
            .await?)
    }

    pub async fn health_check(&self) -> ApiResult<()> {
        Ok(self.store.health_check().await?)
    }

    async fn timed<T>(
        &self,
        operation: &str,
        table: Table,
        fut: impl std::future::Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        let start = Instant::now();
        let result = fut.await;
        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_store_operation(
                operation,
                table.as_str(),
                result.is_ok(),
                start.elapsed().as_secs_f64(),
            );
        }
        if let Err(e) = &result {
            tracing::debug!(operation, table = %table, error = %e, "Store operation failed");
        }
        result
    }
}

fn decode_row<R: Record>(row: Value) -> ApiResult<R> {
    serde_json::from_value(row)
        .map_err(|e| ApiError::from(StoreError::Decode(format!("{}: {}", R::ENTITY_NAME, e))))
}

fn decode_rows<R: Record>(rows: Vec<Value>) -> ApiResult<Vec<R>> {
    rows.into_iter().map(decode_row).collect()
}
