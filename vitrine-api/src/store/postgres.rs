//! Postgres record store.
//!
//! Renders the query model into parameterised SQL. Table names come from the
//! closed [`Table`] enum and column names from compile-time allow-lists; both
//! are still checked against an identifier pattern before being spliced into
//! SQL, and every value travels as a bound parameter. Rows are read back with
//! `to_jsonb` and written through `jsonb_populate_record`, so the serde shape
//! of a record is its column layout.

use async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, PoolError, RecyclingMethod, Runtime,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio_postgres::{error::SqlState, types::ToSql, NoTls};
use vitrine_core::{Condition, FilterValue, Query, QueryError, RowKey, Table};

use super::{Page, RecordStore, StoreError, StoreResult};

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("Invalid identifier regex"));

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait, create and recycle timeout for pooled connections
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "vitrine".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("VITRINE_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("VITRINE_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("VITRINE_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("VITRINE_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("VITRINE_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("VITRINE_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("VITRINE_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> StoreResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool = PoolConfig::new(self.max_size);
        pool.timeouts.wait = Some(self.timeout);
        pool.timeouts.create = Some(self.timeout);
        pool.timeouts.recycle = Some(self.timeout);
        cfg.pool = Some(pool);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::Unavailable(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// SQL RENDERING
// ============================================================================

fn ident(name: &str) -> StoreResult<&str> {
    if IDENT_RE.is_match(name) {
        Ok(name)
    } else {
        Err(QueryError::InvalidColumn {
            column: name.to_string(),
        }
        .into())
    }
}

/// Escape LIKE metacharacters so a search term only ever matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// SQL text plus its positional parameters.
#[derive(Default)]
struct Statement {
    sql: String,
    params: Vec<Box<dyn ToSql + Sync + Send>>,
}

impl Statement {
    fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind a value and return its placeholder.
    fn bind<T: ToSql + Sync + Send + 'static>(&mut self, value: T) -> String {
        self.params.push(Box::new(value));
        format!("${}", self.params.len())
    }

    fn bind_filter(&mut self, value: &FilterValue) -> String {
        match value {
            FilterValue::Text(text) => format!("{}::text", self.bind(text.clone())),
            FilterValue::Bool(flag) => format!("{}::bool", self.bind(*flag)),
            FilterValue::Uuid(id) => format!("{}::uuid", self.bind(*id)),
            FilterValue::Int(n) => format!("{}::int8", self.bind(*n)),
        }
    }

    fn bind_key(&mut self, key: &RowKey) -> String {
        match key {
            RowKey::Id(id) => format!("{}::uuid", self.bind(*id)),
            RowKey::Slug(slug) => format!("{}::text", self.bind(slug.clone())),
        }
    }

    fn push_where(&mut self, query: &Query) -> StoreResult<()> {
        let mut clauses = Vec::new();
        for condition in &query.conditions {
            let column = ident(condition.column())?;
            let clause = match condition {
                Condition::Eq { value, .. } => {
                    let placeholder = self.bind_filter(value);
                    format!("t.{} = {}", column, placeholder)
                }
                Condition::Contains { value, .. } => {
                    let placeholder = self.bind(value.clone());
                    format!("t.{} @> ARRAY[{}::text]", column, placeholder)
                }
            };
            clauses.push(clause);
        }

        if let Some(search) = query.search.as_ref().filter(|s| !s.columns.is_empty()) {
            let pattern = self.bind(format!("%{}%", escape_like(&search.term)));
            let alternatives = search
                .columns
                .iter()
                .map(|column| Ok(format!("t.{}::text ILIKE {}", ident(column)?, pattern)))
                .collect::<StoreResult<Vec<_>>>()?;
            clauses.push(format!("({})", alternatives.join(" OR ")));
        }

        if !clauses.is_empty() {
            self.sql.push_str(" WHERE ");
            self.sql.push_str(&clauses.join(" AND "));
        }
        Ok(())
    }

    fn push_order_and_range(&mut self, query: &Query) -> StoreResult<()> {
        let mut keys = query
            .order
            .iter()
            .map(|o| Ok(format!("t.{} {} NULLS LAST", ident(o.column)?, o.order.as_sql())))
            .collect::<StoreResult<Vec<_>>>()?;
        keys.push("t.id ASC".to_string());
        self.sql.push_str(" ORDER BY ");
        self.sql.push_str(&keys.join(", "));

        if let Some(range) = query.range {
            let limit = self.bind(i64::from(range.limit));
            let offset = self.bind(i64::try_from(range.offset).unwrap_or(i64::MAX));
            self.sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }
        Ok(())
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }
}

fn select_statement(query: &Query) -> StoreResult<Statement> {
    let mut stmt = Statement::new(format!(
        "SELECT to_jsonb(t) FROM {} AS t",
        ident(query.table.as_str())?
    ));
    stmt.push_where(query)?;
    stmt.push_order_and_range(query)?;
    Ok(stmt)
}

fn count_statement(query: &Query) -> StoreResult<Statement> {
    let mut stmt = Statement::new(format!(
        "SELECT count(*) FROM {} AS t",
        ident(query.table.as_str())?
    ));
    stmt.push_where(query)?;
    Ok(stmt)
}

fn insert_statement(table: Table, row: Value) -> StoreResult<Statement> {
    let name = ident(table.as_str())?;
    let mut stmt = Statement::default();
    let placeholder = stmt.bind(row);
    stmt.sql = format!(
        "INSERT INTO {name} AS t SELECT * FROM jsonb_populate_record(NULL::{name}, {placeholder}::jsonb) \
         RETURNING to_jsonb(t)"
    );
    Ok(stmt)
}

fn update_statement(
    table: Table,
    key: &RowKey,
    patch: Map<String, Value>,
) -> StoreResult<Statement> {
    let name = ident(table.as_str())?;
    let assignments = patch
        .keys()
        .map(|column| {
            let column = ident(column)?;
            Ok(format!("{column} = p.{column}"))
        })
        .collect::<StoreResult<Vec<_>>>()?;

    let mut stmt = Statement::default();
    let row = stmt.bind(Value::Object(patch));
    let key_placeholder = stmt.bind_key(key);
    stmt.sql = format!(
        "UPDATE {name} AS t SET {} FROM jsonb_populate_record(NULL::{name}, {row}::jsonb) AS p \
         WHERE t.{} = {key_placeholder} RETURNING to_jsonb(t)",
        assignments.join(", "),
        key.column(),
    );
    Ok(stmt)
}

fn delete_statement(table: Table, key: &RowKey) -> StoreResult<Statement> {
    let name = ident(table.as_str())?;
    let mut stmt = Statement::default();
    let key_placeholder = stmt.bind_key(key);
    stmt.sql = format!("DELETE FROM {name} AS t WHERE t.{} = {key_placeholder}", key.column());
    Ok(stmt)
}

fn store_error(table: Table, err: tokio_postgres::Error) -> StoreError {
    if let Some(db) = err.as_db_error() {
        let detail = db.detail().unwrap_or_else(|| db.message()).to_string();
        let table = table.as_str();
        let code = db.code();
        if code == &SqlState::UNIQUE_VIOLATION {
            return StoreError::Conflict { table, detail };
        }
        if code == &SqlState::FOREIGN_KEY_VIOLATION {
            return StoreError::InvalidReference { table, detail };
        }
        if code == &SqlState::NOT_NULL_VIOLATION || code == &SqlState::CHECK_VIOLATION {
            return StoreError::Constraint { table, detail };
        }
    }
    if err.is_closed() {
        return StoreError::Unavailable(err.to_string());
    }
    StoreError::Backend(err.to_string())
}

impl From<PoolError> for StoreError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Timeout(_) => StoreError::PoolExhausted,
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

/// Record store over a deadpool-postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> StoreResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Current pool size, for health output.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn rows(&self, table: Table, stmt: Statement) -> StoreResult<Vec<Value>> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(stmt.sql.as_str(), &stmt.params())
            .await
            .map_err(|e| store_error(table, e))?;
        rows.iter()
            .map(|row| {
                row.try_get::<_, Value>(0)
                    .map_err(|e| StoreError::Decode(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn select(&self, query: &Query) -> StoreResult<Page> {
        let rows = self.rows(query.table, select_statement(query)?).await?;
        let total = self.count(query).await?;
        Ok(Page { rows, total })
    }

    async fn count(&self, query: &Query) -> StoreResult<u64> {
        let stmt = count_statement(query)?;
        let conn = self.pool.get().await?;
        let row = conn
            .query_one(stmt.sql.as_str(), &stmt.params())
            .await
            .map_err(|e| store_error(query.table, e))?;
        let total: i64 = row.try_get(0).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        if !row.is_object() {
            return Err(QueryError::NotAnObject {
                table: table.as_str(),
            }
            .into());
        }
        self.rows(table, insert_statement(table, row)?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("insert into {} returned no row", table)))
    }

    async fn update(
        &self,
        table: Table,
        key: &RowKey,
        patch: Map<String, Value>,
    ) -> StoreResult<Option<Value>> {
        if patch.is_empty() {
            let query = match key {
                RowKey::Id(id) => Query::table(table).eq_uuid("id", *id),
                RowKey::Slug(slug) => Query::table(table).eq_text("slug", slug.clone()),
            };
            return Ok(self.select(&query.limit(1)).await?.rows.into_iter().next());
        }
        Ok(self
            .rows(table, update_statement(table, key, patch)?)
            .await?
            .into_iter()
            .next())
    }

    async fn delete(&self, table: Table, key: &RowKey) -> StoreResult<bool> {
        let stmt = delete_statement(table, key)?;
        let conn = self.pool.get().await?;
        let affected = conn
            .execute(stmt.sql.as_str(), &stmt.params())
            .await
            .map_err(|e| store_error(table, e))?;
        Ok(affected > 0)
    }

    async fn health_check(&self) -> StoreResult<()> {
        let conn = self.pool.get().await?;
        conn.query_one("SELECT 1", &[])
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
