//! Middleware modules for the Vitrine API
//!
//! - `auth`: admin authentication and the [`AuthExtractor`]
//! - `rate_limit`: per-IP limits on form intake routes
//!
//! # Middleware Order
//!
//! ```ignore
//! Router::new()
//!     .merge(public_routes)
//!     .merge(form_routes.layer(from_fn_with_state(rate_limit_state, rate_limit_middleware)))
//!     .merge(admin_routes.layer(from_fn_with_state(auth_state, auth_middleware)))
//!     // Outermost: observability, CORS, panic catching
//! ```

mod auth;
mod rate_limit;

pub use auth::{
    auth_middleware, extract_auth_context, AuthExtractor, AuthMiddlewareError,
    AuthMiddlewareState,
};
pub use rate_limit::{extract_client_ip, rate_limit_middleware, RateLimitError, RateLimitState};
