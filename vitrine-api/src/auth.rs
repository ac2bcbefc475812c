//! Authentication Module
//!
//! Admin endpoints accept two kinds of credentials:
//! 1. API keys (via the `X-API-Key` header), which always carry the admin role
//! 2. HS256 JWTs (via `Authorization: Bearer`), whose `roles` claim must
//!    include one of the configured admin roles
//!
//! Token time validation runs against an injected [`JwtClock`] so tests stay
//! deterministic.

use crate::error::{ApiError, ApiResult};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

/// Role granted to API-key callers.
pub const ADMIN_ROLE: &str = "admin";

// ============================================================================
// CLOCK ABSTRACTION
// ============================================================================

/// Clock abstraction for JWT time validation.
///
/// `jsonwebtoken` only checks `exp` against the system clock; owning the
/// check lets tests pin time and lets us fail loudly on a pre-epoch clock.
pub trait JwtClock: Send + Sync {
    /// Current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}


// ============================================================================
// JWT SECRET
// ============================================================================

/// JWT signing secret that never shows up in logs or debug output.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Wrap a secret, rejecting blank values.
    pub fn new(secret: String) -> ApiResult<Self> {
        if secret.trim().is_empty() {
            return Err(ApiError::invalid_input("JWT secret must not be empty"));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    fn insecure_default() -> Self {
        Self(SecretString::new(INSECURE_DEFAULT_SECRET.to_string().into()))
    }

    /// Expose the secret value for signing and verification only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration for the admin surface.
#[derive(Clone)]
pub struct AuthConfig {
    /// Valid admin API keys.
    pub api_keys: HashSet<String>,

    /// JWT secret key for signing and verification.
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (HS256).
    pub jwt_algorithm: Algorithm,

    /// Lifetime of generated tokens in seconds.
    pub jwt_expiration_secs: i64,

    /// Tolerance applied to `exp` for clock drift between issuer and server.
    pub jwt_clock_skew_secs: i64,

    /// Roles that grant admin access; a JWT needs at least one of them.
    pub admin_roles: Vec<String>,

    /// Clock for JWT time validation (injected for testing).
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_keys", &format!("[{} keys]", self.api_keys.len()))
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("admin_roles", &self.admin_roles)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_keys: HashSet::new(),
            jwt_secret: JwtSecret::insecure_default(),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 3600,
            jwt_clock_skew_secs: 60,
            admin_roles: vec![ADMIN_ROLE.to_string()],
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `VITRINE_API_KEYS`: Comma-separated admin API keys
    /// - `VITRINE_JWT_SECRET`: JWT signing secret
    /// - `VITRINE_JWT_EXPIRATION_SECS`: Token lifetime (default: 3600)
    /// - `VITRINE_JWT_CLOCK_SKEW_SECS`: Clock skew tolerance (default: 60)
    /// - `VITRINE_ADMIN_ROLES`: Comma-separated admin roles (default: admin)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_keys = std::env::var("VITRINE_API_KEYS")
            .map(|raw| crate::config::split_list(&raw).into_iter().collect())
            .unwrap_or_default();

        let jwt_secret = std::env::var("VITRINE_JWT_SECRET")
            .ok()
            .and_then(|raw| JwtSecret::new(raw).ok())
            .unwrap_or(defaults.jwt_secret);

        let admin_roles = std::env::var("VITRINE_ADMIN_ROLES")
            .map(|raw| crate::config::split_list(&raw))
            .ok()
            .filter(|roles| !roles.is_empty())
            .unwrap_or(defaults.admin_roles);

        Self {
            api_keys,
            jwt_secret,
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: std::env::var("VITRINE_JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.jwt_expiration_secs),
            jwt_clock_skew_secs: std::env::var("VITRINE_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.jwt_clock_skew_secs),
            admin_roles,
            clock: Arc::new(SystemClock),
        }
    }

    /// Refuse insecure secrets in production; warn about them elsewhere.
    pub fn validate_for_production(&self, is_production: bool) -> ApiResult<()> {
        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::invalid_input(
                    "Cannot start in production with the default JWT secret. \
                     Set VITRINE_JWT_SECRET to a secure value.",
                ));
            }
            tracing::warn!(
                "Using the default JWT secret. Set VITRINE_JWT_SECRET before deploying."
            );
        } else if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "JWT secret is too short for production use ({} chars); use at least 32",
                    self.jwt_secret.len()
                )));
            }
            tracing::warn!(
                length = self.jwt_secret.len(),
                "JWT secret is shorter than 32 characters"
            );
        }

        if self.api_keys.is_empty() {
            tracing::warn!("No VITRINE_API_KEYS configured; admin access requires a JWT");
        }

        Ok(())
    }

    pub fn add_api_key(&mut self, key: String) {
        self.api_keys.insert(key);
    }

    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.api_keys.contains(key)
    }

    pub fn is_admin_role(&self, role: &str) -> bool {
        self.admin_roles.iter().any(|r| r == role)
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id or email)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    pub fn new(subject: String, expiration_secs: i64, clock: &dyn JwtClock) -> Self {
        let now = clock.now_epoch_secs();
        Self {
            sub: subject,
            iat: now,
            exp: now + expiration_secs,
            email: None,
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn is_expired(&self, clock: &dyn JwtClock) -> bool {
        self.exp < clock.now_epoch_secs()
    }
}

// ============================================================================
// AUTHENTICATION CONTEXT
// ============================================================================

/// Identity of an authenticated admin caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub roles: Vec<String>,
    pub auth_method: AuthMethod,
    pub email: Option<String>,
}

impl AuthContext {
    pub fn new(user_id: String, roles: Vec<String>, auth_method: AuthMethod) -> Self {
        Self {
            user_id,
            roles,
            auth_method,
            email: None,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_any_role(&self, roles: &[String]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    ApiKey,
    Jwt,
}

// ============================================================================
// AUTHENTICATION FUNCTIONS
// ============================================================================

pub fn validate_api_key(config: &AuthConfig, api_key: &str) -> ApiResult<()> {
    if config.is_valid_api_key(api_key) {
        Ok(())
    } else {
        Err(ApiError::unauthorized("Invalid API key"))
    }
}

/// `exp` may lag `now` by at most `leeway_secs`.
fn validate_claim_times(now: i64, exp: i64, leeway_secs: i64) -> ApiResult<()> {
    if exp < now - leeway_secs {
        return Err(ApiError::token_expired());
    }
    Ok(())
}

/// Verify a token's signature, then check its expiry against the configured
/// clock.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                ApiError::invalid_token("Token is invalid")
            }
            _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
        })?;

    let claims = token_data.claims;
    let now = config.clock.now_epoch_secs();
    if now < 0 {
        tracing::error!(timestamp = now, "System clock returned pre-epoch time");
        return Err(ApiError::internal_error("Server time configuration error"));
    }

    validate_claim_times(now, claims.exp, config.jwt_clock_skew_secs)?;
    Ok(claims)
}

/// Issue a token for `subject` with the given roles.
pub fn generate_jwt_token(
    config: &AuthConfig,
    subject: String,
    roles: Vec<String>,
) -> ApiResult<String> {
    let claims =
        Claims::new(subject, config.jwt_expiration_secs, &*config.clock).with_roles(roles);

    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    encode(&Header::new(config.jwt_algorithm), &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

pub fn authenticate_api_key(config: &AuthConfig, api_key: &str) -> ApiResult<AuthContext> {
    validate_api_key(config, api_key)?;

    let prefix: String = api_key.chars().take(8).collect();
    Ok(AuthContext::new(
        format!("api_key_{}", prefix),
        vec![ADMIN_ROLE.to_string()],
        AuthMethod::ApiKey,
    ))
}

pub fn authenticate_jwt(config: &AuthConfig, token: &str) -> ApiResult<AuthContext> {
    let claims = validate_jwt_token(config, token)?;
    let mut context = AuthContext::new(claims.sub, claims.roles, AuthMethod::Jwt);
    context.email = claims.email;
    Ok(context)
}

/// Authenticate with `X-API-Key` if present, otherwise a Bearer token.
pub fn authenticate(
    config: &AuthConfig,
    api_key_header: Option<&str>,
    auth_header: Option<&str>,
) -> ApiResult<AuthContext> {
    if let Some(api_key) = api_key_header {
        return authenticate_api_key(config, api_key);
    }

    if let Some(auth_value) = auth_header {
        return match auth_value.strip_prefix("Bearer ") {
            Some(token) => authenticate_jwt(config, token.trim()),
            None => Err(ApiError::invalid_token(
                "Authorization header must use Bearer scheme",
            )),
        };
    }

    Err(ApiError::unauthorized(
        "Authentication required: provide X-API-Key or Authorization header",
    ))
}

/// Admin routes require one of the configured admin roles.
pub fn require_admin(config: &AuthConfig, auth: &AuthContext) -> ApiResult<()> {
    if auth.has_any_role(&config.admin_roles) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin role required"))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn test_config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.add_api_key("test_key_123".to_string());
        config.jwt_secret =
            JwtSecret::new("test_secret".to_string()).expect("Test secret should be valid");
        config.clock = Arc::new(test_clocks::valid());
        config
    }

    #[test]
    fn test_api_key_validation() {
        let config = test_config();
        assert!(validate_api_key(&config, "test_key_123").is_ok());
        assert!(validate_api_key(&config, "invalid_key").is_err());
    }

    #[test]
    fn test_api_key_context_is_admin() -> ApiResult<()> {
        let config = test_config();
        let ctx = authenticate(&config, Some("test_key_123"), None)?;
        assert_eq!(ctx.auth_method, AuthMethod::ApiKey);
        assert_eq!(ctx.user_id, "api_key_test_key");
        assert!(require_admin(&config, &ctx).is_ok());
        Ok(())
    }

    #[test]
    fn test_jwt_generation_and_validation() -> ApiResult<()> {
        let config = test_config();
        let roles = vec!["admin".to_string()];

        let token = generate_jwt_token(&config, "editor@example.com".to_string(), roles.clone())?;
        let claims = validate_jwt_token(&config, &token)?;

        assert_eq!(claims.sub, "editor@example.com");
        assert_eq!(claims.roles, roles);
        assert!(!claims.is_expired(&test_clocks::valid()));
        Ok(())
    }

    #[test]
    fn test_expired_token() -> ApiResult<()> {
        let mut config = test_config();
        let token = generate_jwt_token(&config, "user123".to_string(), vec![])?;

        config.clock = Arc::new(test_clocks::future());
        let err = validate_jwt_token(&config, &token).err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::TokenExpired));
        Ok(())
    }

    #[test]
    fn test_expiry_within_skew_is_accepted() -> ApiResult<()> {
        let mut config = test_config();
        config.jwt_expiration_secs = 0;
        let token = generate_jwt_token(&config, "user123".to_string(), vec![])?;

        config.clock = Arc::new(FixedClock(test_clocks::valid().0 + 30));
        assert!(validate_jwt_token(&config, &token).is_ok());
        Ok(())
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() -> ApiResult<()> {
        let config = test_config();
        let mut other = test_config();
        other.jwt_secret = JwtSecret::new("another_secret".to_string())?;
        let token = generate_jwt_token(&other, "user123".to_string(), vec![])?;

        let err = validate_jwt_token(&config, &token).err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::InvalidToken));
        Ok(())
    }

    #[test]
    fn test_jwt_without_admin_role_is_forbidden() -> ApiResult<()> {
        let config = test_config();
        let token = generate_jwt_token(&config, "viewer".to_string(), vec!["viewer".to_string()])?;
        let header = format!("Bearer {}", token);

        let ctx = authenticate(&config, None, Some(&header))?;
        let err = require_admin(&config, &ctx).err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::Forbidden));
        Ok(())
    }

    #[test]
    fn test_missing_and_malformed_credentials() {
        let config = test_config();

        let err = authenticate(&config, None, None).err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::Unauthorized));

        let err = authenticate(&config, None, Some("Basic abc")).err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::InvalidToken));
    }

    #[test]
    fn test_production_rejects_default_secret() {
        let config = AuthConfig::default();
        assert!(config.validate_for_production(true).is_err());
        assert!(config.validate_for_production(false).is_ok());

        let mut strong = AuthConfig::default();
        strong.jwt_secret = JwtSecret::new("x".repeat(48)).expect("valid secret");
        assert!(strong.validate_for_production(true).is_ok());
    }

    #[test]
    fn test_secret_debug_is_redacted() -> ApiResult<()> {
        let secret = JwtSecret::new("super-secret-value".to_string())?;
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret-value"));
        assert!(JwtSecret::new("   ".to_string()).is_err());
        Ok(())
    }
}
