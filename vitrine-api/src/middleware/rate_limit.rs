//! Per-client rate limiting for form intake routes
//!
//! Each client IP gets its own GCRA limiter (governor) with the configured
//! per-minute quota and burst. Limiters live in a `DashMap` so concurrent
//! requests never contend on a global lock.

use crate::config::ApiConfig;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{clock::DefaultClock, Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectRateLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct RateLimitState {
    config: Arc<ApiConfig>,
    limiters: Arc<DashMap<IpAddr, Arc<DirectRateLimiter>>>,
}

impl RateLimitState {
    pub fn new(config: Arc<ApiConfig>) -> Self {
        Self {
            config,
            limiters: Arc::new(DashMap::new()),
        }
    }

    fn limiter_for(&self, ip: IpAddr) -> Arc<DirectRateLimiter> {
        self.limiters
            .entry(ip)
            .or_insert_with(|| {
                let quota = Quota::per_minute(
                    NonZeroU32::new(self.config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN),
                )
                .allow_burst(
                    NonZeroU32::new(self.config.rate_limit_burst).unwrap_or(NonZeroU32::MIN),
                );
                Arc::new(RateLimiter::direct(quota))
            })
            .clone()
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.limiters.len()
    }
}

/// Rejection carrying the wait before the next permitted request.
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut response =
            crate::error::ApiError::too_many_requests(Some(self.retry_after)).into_response();
        response.headers_mut().insert(
            HeaderName::from_static("retry-after"),
            HeaderValue::from_str(&self.retry_after.to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("60")),
        );
        response
    }
}

/// Client IP, preferring proxy headers over the socket address.
pub fn extract_client_ip(request: &Request, fallback: Option<SocketAddr>) -> IpAddr {
    if let Some(forwarded_for) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first_ip) = forwarded_for.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse() {
                return ip;
            }
        }
    }

    if let Some(real_ip) = request
        .headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
    {
        if let Ok(ip) = real_ip.trim().parse() {
            return ip;
        }
    }

    fallback
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Reject clients that exceed their quota with 429 and `Retry-After`.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    if !state.config.rate_limit_enabled {
        return Ok(next.run(request).await);
    }

    let ip = extract_client_ip(&request, connect_info.map(|ConnectInfo(addr)| addr));
    let limiter = state.limiter_for(ip);

    match limiter.check() {
        Ok(_) => {
            let mut response = next.run(request).await;
            response.headers_mut().insert(
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(state.config.rate_limit_per_minute),
            );
            Ok(response)
        }
        Err(not_until) => {
            let retry_after = not_until
                .wait_time_from(governor::clock::Clock::now(&DefaultClock::default()))
                .as_secs()
                .max(1);
            tracing::info!(client_ip = %ip, retry_after, "Rate limit exceeded");
            Err(RateLimitError { retry_after })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::post, Router};
    use tower::ServiceExt;

    fn limited_app(burst: u32) -> (Router, RateLimitState) {
        let config = ApiConfig {
            rate_limit_enabled: true,
            rate_limit_per_minute: 1,
            rate_limit_burst: burst,
            ..ApiConfig::default()
        };
        let state = RateLimitState::new(Arc::new(config));
        let app = Router::new()
            .route("/api/contact", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware));
        (app, state)
    }

    fn request_from(ip: &str) -> Result<Request, String> {
        Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .map_err(|e| e.to_string())
    }

    #[tokio::test]
    async fn test_burst_then_429() -> Result<(), String> {
        let (app, _) = limited_app(2);

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(request_from("203.0.113.7")?)
                .await
                .map_err(|e| format!("{:?}", e))?;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(request_from("203.0.113.7")?)
            .await
            .map_err(|e| format!("{:?}", e))?;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));
        Ok(())
    }

    #[tokio::test]
    async fn test_clients_are_limited_independently() -> Result<(), String> {
        let (app, state) = limited_app(1);

        for ip in ["198.51.100.1", "198.51.100.2"] {
            let response = app
                .clone()
                .oneshot(request_from(ip)?)
                .await
                .map_err(|e| format!("{:?}", e))?;
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(state.tracked_clients(), 2);
        Ok(())
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() -> Result<(), String> {
        let request = Request::builder()
            .header("x-forwarded-for", "192.0.2.10, 10.0.0.1")
            .header("x-real-ip", "192.0.2.99")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let ip = extract_client_ip(&request, None);
        assert_eq!(ip, "192.0.2.10".parse::<IpAddr>().map_err(|e| e.to_string())?);

        let bare = Request::builder().body(Body::empty()).map_err(|e| e.to_string())?;
        assert_eq!(extract_client_ip(&bare, None), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        Ok(())
    }
}
