//! List-query model
//!
//! A [`Query`] is a small AST over one table: equality/containment conditions,
//! an OR-joined case-insensitive search, ordering and an offset/limit window.
//! Every column name inside a query comes from a `&'static str` allow-list, so
//! user input can select among columns but never name one.
//!
//! [`apply_list_params`] translates raw URL query parameters into that AST
//! according to a per-endpoint [`ListConfig`]. It never fails: malformed
//! values fall back to defaults or are ignored.

use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

/// Page size used when `limit` is missing or malformed.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound for `limit`; larger values are clamped.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Search terms are cut to this many characters.
const MAX_SEARCH_CHARS: usize = 200;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `asc`/`desc`, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Asc),
            "desc" | "descending" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// How a filter parameter's raw text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Exact text equality.
    Text,
    /// `true`/`false`/`1`/`0`.
    Bool,
    Uuid,
    Int,
    /// Array column contains the value.
    Tag,
}

/// Maps a public query parameter onto a storage column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub param: &'static str,
    pub column: &'static str,
    pub kind: FilterKind,
}

impl FilterField {
    pub const fn text(param: &'static str, column: &'static str) -> Self {
        Self { param, column, kind: FilterKind::Text }
    }

    pub const fn bool(param: &'static str, column: &'static str) -> Self {
        Self { param, column, kind: FilterKind::Bool }
    }

    pub const fn uuid(param: &'static str, column: &'static str) -> Self {
        Self { param, column, kind: FilterKind::Uuid }
    }

    pub const fn int(param: &'static str, column: &'static str) -> Self {
        Self { param, column, kind: FilterKind::Int }
    }

    pub const fn tag(param: &'static str, column: &'static str) -> Self {
        Self { param, column, kind: FilterKind::Tag }
    }
}

/// Per-endpoint allow-lists and defaults for list translation.
#[derive(Debug, Clone, Copy)]
pub struct ListConfig {
    pub sortable: &'static [&'static str],
    pub filters: &'static [FilterField],
    pub searchable: &'static [&'static str],
    pub paginate: bool,
    pub default_sort: &'static str,
    pub default_order: SortOrder,
}

impl ListConfig {
    pub fn filter(&self, param: &str) -> Option<&FilterField> {
        self.filters.iter().find(|f| f.param == param)
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Raw query-string parameters of a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ListParams {
    raw: HashMap<String, String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            raw: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.raw.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.raw.remove(key)
    }

    /// `page` as a 1-based page number. Missing, zero, negative or
    /// non-numeric values yield 1.
    pub fn page(&self) -> u32 {
        self.get("page")
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|page| *page >= 1)
            .map(|page| page.min(u32::MAX as i64) as u32)
            .unwrap_or(1)
    }

    /// `limit` clamped to `1..=MAX_PAGE_SIZE`; missing or malformed values
    /// yield [`DEFAULT_PAGE_SIZE`].
    pub fn limit(&self) -> u32 {
        self.get("limit")
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|limit| *limit >= 1)
            .map(|limit| limit.min(MAX_PAGE_SIZE as i64) as u32)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Trimmed, non-empty search term.
    pub fn search(&self) -> Option<String> {
        let term = self.get("search")?.trim();
        if term.is_empty() {
            return None;
        }
        Some(term.chars().take(MAX_SEARCH_CHARS).collect())
    }
}

// ============================================================================
// QUERY AST
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    Uuid(Uuid),
    Int(i64),
}

impl FilterValue {
    /// Interpret raw parameter text for a filter kind. `None` when the text
    /// does not parse; the filter is then skipped.
    pub fn parse(kind: FilterKind, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match kind {
            FilterKind::Text | FilterKind::Tag => {
                (!raw.is_empty()).then(|| FilterValue::Text(raw.to_string()))
            }
            FilterKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(FilterValue::Bool(true)),
                "false" | "0" => Some(FilterValue::Bool(false)),
                _ => None,
            },
            FilterKind::Uuid => Uuid::parse_str(raw).ok().map(FilterValue::Uuid),
            FilterKind::Int => raw.parse::<i64>().ok().map(FilterValue::Int),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FilterValue::Text(expected) => match value {
                Value::String(s) => s == expected,
                Value::Number(n) => n.to_string() == *expected,
                Value::Bool(b) => b.to_string() == *expected,
                _ => false,
            },
            FilterValue::Bool(expected) => value.as_bool() == Some(*expected),
            FilterValue::Uuid(expected) => value
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .is_some_and(|id| id == *expected),
            FilterValue::Int(expected) => {
                value.as_i64() == Some(*expected)
                    || value.as_f64().is_some_and(|f| f == *expected as f64)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { column: &'static str, value: FilterValue },
    /// Array column contains a text element.
    Contains { column: &'static str, value: String },
}

impl Condition {
    pub fn column(&self) -> &'static str {
        match self {
            Condition::Eq { column, .. } | Condition::Contains { column, .. } => column,
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        let field = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Condition::Eq { value, .. } => value.matches(field),
            Condition::Contains { value, .. } => field
                .as_array()
                .is_some_and(|items| items.iter().any(|item| item.as_str() == Some(value))),
        }
    }
}

/// Case-insensitive substring match against any of `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    pub term: String,
    pub columns: Vec<&'static str>,
}

impl Search {
    pub fn matches(&self, row: &Value) -> bool {
        let needle = self.term.to_lowercase();
        self.columns.iter().any(|column| {
            row.get(*column)
                .and_then(Value::as_str)
                .is_some_and(|haystack| haystack.to_lowercase().contains(&needle))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRange {
    pub offset: u64,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub conditions: Vec<Condition>,
    pub search: Option<Search>,
    pub order: Vec<OrderBy>,
    pub range: Option<QueryRange>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            conditions: Vec::new(),
            search: None,
            order: Vec::new(),
            range: None,
        }
    }

    pub fn eq(mut self, column: &'static str, value: FilterValue) -> Self {
        self.conditions.push(Condition::Eq { column, value });
        self
    }

    pub fn eq_text(self, column: &'static str, value: impl Into<String>) -> Self {
        self.eq(column, FilterValue::Text(value.into()))
    }

    pub fn eq_bool(self, column: &'static str, value: bool) -> Self {
        self.eq(column, FilterValue::Bool(value))
    }

    pub fn eq_uuid(self, column: &'static str, value: Uuid) -> Self {
        self.eq(column, FilterValue::Uuid(value))
    }

    pub fn contains(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains {
            column,
            value: value.into(),
        });
        self
    }

    pub fn search(mut self, term: impl Into<String>, columns: &[&'static str]) -> Self {
        self.search = Some(Search {
            term: term.into(),
            columns: columns.to_vec(),
        });
        self
    }

    pub fn order_by(mut self, column: &'static str, order: SortOrder) -> Self {
        self.order.push(OrderBy { column, order });
        self
    }

    pub fn range(mut self, offset: u64, limit: u32) -> Self {
        self.range = Some(QueryRange { offset, limit });
        self
    }

    pub fn limit(self, limit: u32) -> Self {
        self.range(0, limit)
    }

    /// Every column the query references.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.conditions
            .iter()
            .map(Condition::column)
            .chain(self.search.iter().flat_map(|s| s.columns.iter().copied()))
            .chain(self.order.iter().map(|o| o.column))
    }

    /// Whether a row satisfies every condition and the search, if any.
    pub fn matches(&self, row: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
            && self.search.as_ref().map_or(true, |s| s.matches(row))
    }

    /// Row ordering: configured keys with nulls last, then `id` ascending.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for key in &self.order {
            let left = a.get(key.column).unwrap_or(&Value::Null);
            let right = b.get(key.column).unwrap_or(&Value::Null);
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let natural = compare_values(left, right);
                    match key.order {
                        SortOrder::Asc => natural,
                        SortOrder::Desc => natural.reverse(),
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        let left = a.get("id").and_then(Value::as_str).unwrap_or_default();
        let right = b.get("id").and_then(Value::as_str).unwrap_or_default();
        left.cmp(right)
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.to_lowercase().cmp(&y.to_lowercase()),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

// ============================================================================
// TRANSLATION
// ============================================================================

/// Requested page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

/// Pagination block returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total: u64) -> Self {
        let limit = pagination.limit.max(1) as u64;
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// A translated list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPlan {
    pub query: Query,
    /// `None` when the endpoint is not paginated.
    pub pagination: Option<Pagination>,
}

/// Extend `query` with the sort, filters, search and page window requested
/// in `params`, restricted to what `config` allows.
pub fn apply_list_params(mut query: Query, params: &ListParams, config: &ListConfig) -> ListPlan {
    for field in config.filters {
        let Some(raw) = params.get(field.param) else {
            continue;
        };
        let Some(value) = FilterValue::parse(field.kind, raw) else {
            continue;
        };
        query = match (field.kind, value) {
            (FilterKind::Tag, FilterValue::Text(tag)) => query.contains(field.column, tag),
            (_, value) => query.eq(field.column, value),
        };
    }

    if let Some(term) = params.search() {
        if !config.searchable.is_empty() {
            query = query.search(term, config.searchable);
        }
    }

    let sort_column = params
        .get("sort_by")
        .and_then(|requested| {
            config
                .sortable
                .iter()
                .copied()
                .find(|allowed| *allowed == requested.trim())
        })
        .unwrap_or(config.default_sort);
    let sort_order = params
        .get("sort_order")
        .and_then(SortOrder::parse)
        .unwrap_or(config.default_order);
    query = query.order_by(sort_column, sort_order);

    let pagination = config.paginate.then(|| Pagination {
        page: params.page(),
        limit: params.limit(),
    });
    if let Some(pagination) = pagination {
        query = query.range(pagination.offset(), pagination.limit);
    }

    ListPlan { query, pagination }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CONFIG: ListConfig = ListConfig {
        sortable: &["display_order", "title", "created_at"],
        filters: &[
            FilterField::bool("featured", "featured"),
            FilterField::text("category", "category"),
            FilterField::uuid("service", "service_id"),
            FilterField::tag("tag", "tags"),
        ],
        searchable: &["title", "description"],
        paginate: true,
        default_sort: "display_order",
        default_order: SortOrder::Asc,
    };

    fn plan(pairs: &[(&str, &str)]) -> ListPlan {
        let params = ListParams::from_pairs(pairs.iter().copied());
        apply_list_params(Query::table(Table::Services), &params, &CONFIG)
    }

    #[test]
    fn test_defaults() {
        let plan = plan(&[]);
        assert_eq!(
            plan.pagination,
            Some(Pagination { page: 1, limit: DEFAULT_PAGE_SIZE })
        );
        assert_eq!(plan.query.range, Some(QueryRange { offset: 0, limit: 10 }));
        assert_eq!(
            plan.query.order,
            vec![OrderBy { column: "display_order", order: SortOrder::Asc }]
        );
        assert!(plan.query.conditions.is_empty());
        assert!(plan.query.search.is_none());
    }

    #[test]
    fn test_unknown_sort_field_uses_default() {
        let plan = plan(&[("sort_by", "password_hash"), ("sort_order", "asc")]);
        assert_eq!(plan.query.order[0].column, "display_order");
        assert_eq!(plan.query.order[0].order, SortOrder::Asc);
    }

    #[test]
    fn test_allowed_sort_field_and_order() {
        let plan = plan(&[("sort_by", "title"), ("sort_order", "DESC")]);
        assert_eq!(
            plan.query.order,
            vec![OrderBy { column: "title", order: SortOrder::Desc }]
        );
    }

    #[test]
    fn test_page_fallbacks() {
        for raw in ["0", "-3", "abc", "", "1.5"] {
            let plan = plan(&[("page", raw)]);
            assert_eq!(plan.pagination.map(|p| p.page), Some(1), "page={raw:?}");
        }
    }

    #[test]
    fn test_limit_clamped_and_defaulted() {
        assert_eq!(plan(&[("limit", "1000")]).pagination.map(|p| p.limit), Some(MAX_PAGE_SIZE));
        assert_eq!(plan(&[("limit", "0")]).pagination.map(|p| p.limit), Some(DEFAULT_PAGE_SIZE));
        assert_eq!(plan(&[("limit", "ten")]).pagination.map(|p| p.limit), Some(DEFAULT_PAGE_SIZE));
        assert_eq!(plan(&[("limit", "25")]).pagination.map(|p| p.limit), Some(25));
    }

    #[test]
    fn test_offset_from_page_and_limit() {
        let plan = plan(&[("page", "2"), ("limit", "5")]);
        assert_eq!(plan.query.range, Some(QueryRange { offset: 5, limit: 5 }));
    }

    #[test]
    fn test_filters_restricted_to_allow_list() {
        let plan = plan(&[("featured", "true"), ("status", "draft"), ("owner", "x")]);
        assert_eq!(
            plan.query.conditions,
            vec![Condition::Eq { column: "featured", value: FilterValue::Bool(true) }]
        );
    }

    #[test]
    fn test_malformed_filter_values_are_ignored() {
        let plan = plan(&[("featured", "yes"), ("service", "not-a-uuid"), ("category", " ")]);
        assert!(plan.query.conditions.is_empty());
    }

    #[test]
    fn test_param_maps_to_column() {
        let id = Uuid::now_v7();
        let id_text = id.to_string();
        let plan = plan(&[("service", id_text.as_str()), ("tag", "rust")]);
        assert!(plan
            .query
            .conditions
            .contains(&Condition::Eq { column: "service_id", value: FilterValue::Uuid(id) }));
        assert!(plan
            .query
            .conditions
            .contains(&Condition::Contains { column: "tags", value: "rust".to_string() }));
    }

    #[test]
    fn test_search_is_or_and_case_insensitive() {
        let plan = plan(&[("search", "  RUST ")]);
        let search = plan.query.search.clone();
        assert_eq!(search.as_ref().map(|s| s.term.as_str()), Some("RUST"));

        let in_title = json!({"title": "Rust consulting", "description": "Backend"});
        let in_description = json!({"title": "Backend", "description": "We love rust"});
        let in_neither = json!({"title": "Go", "description": "Python", "category": "rust"});

        assert!(plan.query.matches(&in_title));
        assert!(plan.query.matches(&in_description));
        assert!(!plan.query.matches(&in_neither));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        assert!(plan(&[("search", "   ")]).query.search.is_none());
    }

    #[test]
    fn test_unpaginated_config() {
        let config = ListConfig { paginate: false, ..CONFIG };
        let params = ListParams::new().with("page", "3");
        let plan = apply_list_params(Query::table(Table::BlogTags), &params, &config);
        assert!(plan.pagination.is_none());
        assert!(plan.query.range.is_none());
    }

    #[test]
    fn test_conditions_match_rows() {
        let query = Query::table(Table::Services)
            .eq_bool("featured", true)
            .eq_text("status", "published")
            .contains("tags", "seo");
        assert!(query.matches(&json!({"featured": true, "status": "published", "tags": ["seo"]})));
        assert!(!query.matches(&json!({"featured": false, "status": "published", "tags": ["seo"]})));
        assert!(!query.matches(&json!({"featured": true, "status": "draft", "tags": ["seo"]})));
        assert!(!query.matches(&json!({"featured": true, "status": "published", "tags": []})));
    }

    #[test]
    fn test_compare_nulls_last_and_timestamps() {
        let query = Query::table(Table::BlogPosts).order_by("published_at", SortOrder::Desc);
        let older = json!({"id": "a", "published_at": "2024-01-01T00:00:00Z"});
        let newer = json!({"id": "b", "published_at": "2024-01-01T00:00:00.5Z"});
        let unpublished = json!({"id": "c", "published_at": null});

        let mut rows = vec![unpublished.clone(), older.clone(), newer.clone()];
        rows.sort_by(|a, b| query.compare(a, b));
        assert_eq!(rows, vec![newer, older, unpublished]);
    }

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(Pagination { page: 2, limit: 5 }, 11);
        assert_eq!(meta.total_pages, 3);
        let meta = PaginationMeta::new(Pagination { page: 1, limit: 10 }, 0);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn test_pagination_meta_serializes_camel_total_pages() -> Result<(), serde_json::Error> {
        let meta = PaginationMeta::new(Pagination { page: 2, limit: 5 }, 11);
        let json = serde_json::to_value(meta)?;
        assert_eq!(json, json!({"page": 2, "limit": 5, "total": 11, "totalPages": 3}));
        Ok(())
    }
}
