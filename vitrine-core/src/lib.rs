//! Vitrine Core - Domain Types
//!
//! Site content, form submissions, analytics rows, input validation and the
//! list-query model shared by every list endpoint. No I/O lives here; the API
//! crate executes [`Query`] values against a record store.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod analytics;
pub mod blog;
pub mod careers;
pub mod content;
pub mod enums;
pub mod error;
pub mod forms;
pub mod key;
pub mod query;
pub mod site;
pub mod table;
pub mod validation;

pub use analytics::*;
pub use blog::*;
pub use careers::*;
pub use content::*;
pub use enums::*;
pub use error::*;
pub use forms::*;
pub use key::RowKey;
pub use query::{
    apply_list_params, Condition, FilterField, FilterKind, FilterValue, ListConfig, ListParams,
    ListPlan, Pagination, PaginationMeta, Query, QueryRange, Search, SortOrder,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use site::*;
pub use table::{Record, Table};
pub use validation::{serialize_patch, slugify, HasUpdates, Validate, Validator};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Row identifier using UUIDv7 so ids sort by creation time.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

/// Current wall-clock time, truncated to microseconds so values survive a
/// round trip through a Postgres `timestamptz` unchanged.
pub fn now() -> Timestamp {
    let now = Utc::now();
    let micros = now.timestamp_micros();
    DateTime::from_timestamp_micros(micros).unwrap_or(now)
}
