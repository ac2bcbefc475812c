//! API Configuration Module
//!
//! Configuration for CORS, form rate limiting, response caching and the
//! store backend. Values come from environment variables (a `.env` file is
//! honoured by the binary) with defaults suited to local development.

use std::time::Duration;

// ============================================================================
// STORE SELECTION
// ============================================================================

/// Which record store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Postgres,
    /// Process-local tables; data is lost on restart.
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => StoreKind::Memory,
            _ => StoreKind::Postgres,
        })
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS, rate limiting, caching and production hardening.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Rate Limiting Configuration (form intake routes)
    // ========================================================================
    pub rate_limit_enabled: bool,

    /// Form submissions allowed per client IP per minute.
    pub rate_limit_per_minute: u32,

    /// Burst capacity beyond the steady rate.
    pub rate_limit_burst: u32,

    // ========================================================================
    // Site
    // ========================================================================
    /// TTL of cached public responses; zero disables the cache.
    pub cache_ttl: Duration,

    /// Public site URL used in email links.
    pub site_url: String,

    /// Deployment environment name.
    pub environment: String,

    pub store: StoreKind,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,

            rate_limit_enabled: true,
            rate_limit_per_minute: 20,
            rate_limit_burst: 5,

            cache_ttl: Duration::from_secs(60),
            site_url: "http://localhost:3000".to_string(),
            environment: "development".to_string(),
            store: StoreKind::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `VITRINE_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `VITRINE_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `VITRINE_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `VITRINE_RATE_LIMIT_ENABLED`: "true" or "false" (default: true)
    /// - `VITRINE_RATE_LIMIT_PER_MINUTE`: Form posts per minute per IP (default: 20)
    /// - `VITRINE_RATE_LIMIT_BURST`: Burst capacity (default: 5)
    /// - `VITRINE_CACHE_TTL_SECS`: Public response cache TTL (default: 60, 0 = off)
    /// - `VITRINE_SITE_URL`: Public site URL for links in emails
    /// - `VITRINE_ENVIRONMENT`: "production" enables startup hardening checks
    /// - `VITRINE_STORE`: "postgres" (default) or "memory"
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("VITRINE_CORS_ORIGINS")
            .ok()
            .map(|s| split_list(&s))
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("VITRINE_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("VITRINE_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let rate_limit_enabled = std::env::var("VITRINE_RATE_LIMIT_ENABLED")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        let rate_limit_per_minute = std::env::var("VITRINE_RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.rate_limit_per_minute);

        let rate_limit_burst = std::env::var("VITRINE_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.rate_limit_burst);

        let cache_ttl = std::env::var("VITRINE_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            rate_limit_enabled,
            rate_limit_per_minute,
            rate_limit_burst,
            cache_ttl,
            site_url: std::env::var("VITRINE_SITE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_url),
            environment: std::env::var("VITRINE_ENVIRONMENT").unwrap_or(defaults.environment),
            store: std::env::var("VITRINE_STORE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Whether the deployment declares itself production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.example.com
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}

/// Split a comma-separated list, dropping blanks.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvVarGuard {
        key: &'static str,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let original = std::env::var(key).ok();
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
            Self { key, original }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.original.as_deref() {
                Some(v) => std::env::set_var(self.key, v),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert!(config.rate_limit_enabled);
        assert_eq!(config.rate_limit_per_minute, 20);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.store, StoreKind::Postgres);
        assert!(!config.is_production());
    }

    #[test]
    fn test_from_env_reads_cache_ttl_and_store() {
        let _ttl = EnvVarGuard::set("VITRINE_CACHE_TTL_SECS", Some("0"));
        let _store = EnvVarGuard::set("VITRINE_STORE", Some("memory"));
        let _site = EnvVarGuard::set("VITRINE_SITE_URL", Some("https://agency.example/"));

        let config = ApiConfig::from_env();
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.site_url, "https://agency.example");
    }

    #[test]
    fn test_origin_allowed_production() {
        let config = ApiConfig {
            cors_origins: vec![
                "https://agency.example".to_string(),
                "*.agency.example".to_string(),
            ],
            ..Default::default()
        };

        assert!(config.is_origin_allowed("https://agency.example"));
        assert!(config.is_origin_allowed("https://www.agency.example"));
        assert!(!config.is_origin_allowed("https://evil.com"));
        assert!(!config.is_origin_allowed("https://notagency.example"));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" a, ,b "), vec!["a".to_string(), "b".to_string()]);
        assert!(split_list("").is_empty());
    }
}
