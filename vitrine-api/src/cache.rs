//! TTL cache for public GET responses
//!
//! Entries are keyed by request path and query string and remember which
//! tables they were built from, so a write to a table drops every response
//! that read it. A zero TTL turns the cache off.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use vitrine_core::Table;

use crate::error::ApiResult;
use crate::telemetry::with_metrics;

/// Entries beyond this count trigger a sweep of expired ones.
const SWEEP_THRESHOLD: usize = 2_048;

#[derive(Debug, Clone)]
struct CacheEntry {
    tables: Vec<Table>,
    value: Arc<Value>,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Fresh value for `key`; expired entries are removed on sight.
    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        if !self.is_enabled() {
            return None;
        }

        let now = Instant::now();
        let hit = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                with_metrics(|m| m.record_cache_lookup(false));
                return None;
            }
        };

        if hit.is_none() {
            self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        with_metrics(|m| m.record_cache_lookup(hit.is_some()));
        hit
    }

    pub fn insert(&self, key: String, tables: &[Table], value: Value) -> Arc<Value> {
        let value = Arc::new(value);
        if !self.is_enabled() {
            return value;
        }

        if self.entries.len() >= SWEEP_THRESHOLD {
            self.sweep();
        }

        self.entries.insert(
            key,
            CacheEntry {
                tables: tables.to_vec(),
                value: value.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        value
    }

    /// Drop every entry built from `table`.
    pub fn invalidate(&self, table: Table) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.tables.contains(&table));
        let dropped = before.saturating_sub(self.entries.len());
        if dropped > 0 {
            tracing::debug!(table = %table, dropped, "Invalidated cached responses");
        }
    }

    pub fn clear(&self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Serve `key` from the cache, or run `load` and remember its result.
    /// Errors are never cached.
    pub async fn get_or_load<T, F, Fut>(
        &self,
        key: String,
        tables: &[Table],
        load: F,
    ) -> ApiResult<Arc<Value>>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let value = serde_json::to_value(load().await?)?;
        Ok(self.insert(key, tables, value))
    }
}
