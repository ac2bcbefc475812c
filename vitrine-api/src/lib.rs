//! Vitrine API - REST Backend for the Agency Website
//!
//! Serves published content from a TTL response cache, stores form
//! submissions before notifying staff over email, chat and signed webhooks,
//! and exposes an authenticated admin API for content management.
//!
//! Records live in Postgres in production ([`store::PgStore`]) or in process
//! memory for development and tests ([`store::MemoryStore`]).

#[macro_use]
mod macros;

pub mod auth;
pub mod cache;
pub mod component;
pub mod config;
pub mod envelope;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod notify;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{
    authenticate, authenticate_api_key, authenticate_jwt, generate_jwt_token, validate_api_key,
    validate_jwt_token, AuthConfig, AuthContext, AuthMethod, Claims,
};
pub use cache::ResponseCache;
pub use config::{ApiConfig, StoreKind};
pub use envelope::{ApiResponse, Created, Deleted, ListData};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, rate_limit_middleware, AuthMiddlewareState, RateLimitState};
pub use notify::{NotificationJob, Notifier, NotifyConfig};
pub use openapi::ApiDoc;
pub use routes::create_app;
pub use state::AppState;
pub use store::{Db, DbConfig, MemoryStore, PgStore};
