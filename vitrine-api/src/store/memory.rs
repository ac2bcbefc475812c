//! In-process record store.
//!
//! Evaluates the same query model as the Postgres backend over JSON rows held
//! in memory, including the unique keys the schema declares. Used by tests and
//! by `VITRINE_STORE=memory` for local development.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use vitrine_core::{Query, RowKey, Table};

use super::{Page, RecordStore, StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<Table, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Columns each table keeps unique.
fn unique_columns(table: Table) -> &'static [&'static str] {
    match table {
        Table::NewsletterSubscriptions => &["id", "email"],
        Table::SeoSettings => &["id", "page_path"],
        t if t.has_slug() => &["id", "slug"],
        _ => &["id"],
    }
}

fn key_matches(row: &Value, key: &RowKey) -> bool {
    match key {
        RowKey::Id(id) => row.get("id").and_then(Value::as_str) == Some(id.to_string().as_str()),
        RowKey::Slug(slug) => row.get("slug").and_then(Value::as_str) == Some(slug.as_str()),
    }
}

/// Reject `candidate` if it repeats a unique value of any row except `skip`.
fn check_unique(
    table: Table,
    rows: &[Value],
    candidate: &Value,
    skip: Option<usize>,
) -> StoreResult<()> {
    for column in unique_columns(table) {
        let Some(value) = candidate.get(*column).filter(|v| !v.is_null()) else {
            continue;
        };
        let clash = rows
            .iter()
            .enumerate()
            .any(|(i, row)| Some(i) != skip && row.get(*column) == Some(value));
        if clash {
            return Err(StoreError::Conflict {
                table: table.as_str(),
                detail: format!("Key ({})=({}) already exists.", column, display(value)),
            });
        }
    }
    Ok(())
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, query: &Query) -> StoreResult<Page> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&Value> = tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| query.compare(a, b));

        let total = rows.len() as u64;
        let rows = match query.range {
            Some(range) => rows
                .into_iter()
                .skip(range.offset as usize)
                .take(range.limit as usize)
                .cloned()
                .collect(),
            None => rows.into_iter().cloned().collect(),
        };
        Ok(Page { rows, total })
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        if !row.is_object() {
            return Err(StoreError::Query(vitrine_core::QueryError::NotAnObject {
                table: table.as_str(),
            }));
        }
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        check_unique(table, rows, &row, None)?;
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: Table,
        key: &RowKey,
        patch: Map<String, Value>,
    ) -> StoreResult<Option<Value>> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(None);
        };
        let Some(index) = rows.iter().position(|row| key_matches(row, key)) else {
            return Ok(None);
        };

        let mut updated = rows[index].clone();
        if let Some(object) = updated.as_object_mut() {
            for (column, value) in patch {
                object.insert(column, value);
            }
        }
        check_unique(table, rows, &updated, Some(index))?;
        rows[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, table: Table, key: &RowKey) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|row| !key_matches(row, key));
        Ok(rows.len() != before)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vitrine_core::SortOrder;

    fn row(id: &str, slug: &str, title: &str, featured: bool) -> Value {
        json!({ "id": id, "slug": slug, "title": title, "featured": featured })
    }

    #[tokio::test]
    async fn test_select_filters_sorts_and_counts() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        store.insert(Table::Services, row("a", "one", "Zeta", true)).await?;
        store.insert(Table::Services, row("b", "two", "Alpha", true)).await?;
        store.insert(Table::Services, row("c", "three", "Beta", false)).await?;

        let query = Query::table(Table::Services)
            .eq_bool("featured", true)
            .order_by("title", SortOrder::Asc)
            .range(0, 1);
        let page = store.select(&query).await?;

        assert_eq!(page.total, 2);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0]["title"], "Alpha");
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        store.insert(Table::Services, row("a", "seo", "SEO", false)).await?;
        let result = store.insert(Table::Services, row("b", "seo", "SEO 2", false)).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_slug_clash() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        store.insert(Table::Services, row("a", "one", "One", false)).await?;
        store.insert(Table::Services, row("b", "two", "Two", false)).await?;

        let mut patch = Map::new();
        patch.insert("slug".into(), json!("one"));
        let result = store.update(Table::Services, &RowKey::Slug("two".into()), patch).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        store.insert(Table::Comments, json!({ "id": "x" })).await?;
        assert!(!store.delete(Table::Comments, &RowKey::Slug("x".into())).await?);
        assert!(!store.delete(Table::Jobs, &RowKey::Slug("x".into())).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_or() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        store
            .insert(Table::BlogPosts, json!({ "id": "1", "title": "Rust Tips", "excerpt": null }))
            .await?;
        store
            .insert(Table::BlogPosts, json!({ "id": "2", "title": "Other", "excerpt": "about RUST" }))
            .await?;
        store
            .insert(Table::BlogPosts, json!({ "id": "3", "title": "Go", "excerpt": "nothing" }))
            .await?;

        let query = Query::table(Table::BlogPosts).search("rust", &["title", "excerpt"]);
        assert_eq!(store.select(&query).await?.total, 2);
        Ok(())
    }
}
