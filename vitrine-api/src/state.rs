//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use crate::auth::AuthConfig;
use crate::cache::ResponseCache;
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::notify::{Notifier, NotifyConfig};
use crate::store::Db;

/// Application-wide state shared across all routes.
///
/// Every field is cheap to clone; the store client, HTTP client, response
/// cache and configuration are created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    /// Public GET responses, invalidated by admin writes.
    pub cache: Arc<ResponseCache>,
    pub notifier: Notifier,
    pub config: Arc<ApiConfig>,
    pub auth: Arc<AuthConfig>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        db: Db,
        config: ApiConfig,
        auth: AuthConfig,
        notify: NotifyConfig,
    ) -> ApiResult<Self> {
        Ok(Self {
            db,
            cache: Arc::new(ResponseCache::new(config.cache_ttl)),
            notifier: Notifier::new(notify)?,
            config: Arc::new(config),
            auth: Arc::new(auth),
            start_time: Instant::now(),
        })
    }
}

crate::impl_from_ref!(Db, db);
crate::impl_from_ref!(Arc<ResponseCache>, cache);
crate::impl_from_ref!(Notifier, notifier);
crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(Arc<AuthConfig>, auth);
crate::impl_from_ref!(Instant, start_time);

/// In-memory state with no notification channels configured.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    AppState::new(
        Db::memory(),
        ApiConfig::default(),
        AuthConfig::default(),
        NotifyConfig::default(),
    )
    .expect("in-memory state builds")
}
