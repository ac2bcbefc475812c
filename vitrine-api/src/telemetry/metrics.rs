//! Prometheus Metrics Definitions
//!
//! Defines all Vitrine metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Store operation latency buckets (seconds)
const STORE_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<VitrineMetrics>> = Lazy::new(VitrineMetrics::new);

/// Container for all Vitrine metrics.
#[derive(Clone)]
pub struct VitrineMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Store operation counter - labels: operation, table, status
    pub store_operations_total: CounterVec,

    /// Store operation duration histogram - labels: operation, table
    pub store_operation_duration_seconds: HistogramVec,

    /// Accepted form submissions - labels: form
    pub form_submissions_total: CounterVec,

    /// Notification deliveries - labels: channel, status (success/failure)
    pub notification_deliveries_total: CounterVec,

    /// Response cache lookups - labels: result (hit/miss)
    pub cache_lookups_total: CounterVec,
}

fn registration_failed(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

impl VitrineMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "vitrine_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_failed("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "vitrine_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("http_request_duration_seconds", e))?,

            store_operations_total: register_counter_vec!(
                "vitrine_store_operations_total",
                "Total number of record store operations",
                &["operation", "table", "status"]
            )
            .map_err(|e| registration_failed("store_operations_total", e))?,

            store_operation_duration_seconds: register_histogram_vec!(
                "vitrine_store_operation_duration_seconds",
                "Record store operation duration in seconds",
                &["operation", "table"],
                STORE_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("store_operation_duration_seconds", e))?,

            form_submissions_total: register_counter_vec!(
                "vitrine_form_submissions_total",
                "Total accepted form submissions",
                &["form"]
            )
            .map_err(|e| registration_failed("form_submissions_total", e))?,

            notification_deliveries_total: register_counter_vec!(
                "vitrine_notification_deliveries_total",
                "Total notification deliveries",
                &["channel", "status"]
            )
            .map_err(|e| registration_failed("notification_deliveries_total", e))?,

            cache_lookups_total: register_counter_vec!(
                "vitrine_cache_lookups_total",
                "Response cache lookups",
                &["result"]
            )
            .map_err(|e| registration_failed("cache_lookups_total", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a store operation.
    pub fn record_store_operation(
        &self,
        operation: &str,
        table: &str,
        success: bool,
        duration_secs: f64,
    ) {
        let status = if success { "success" } else { "error" };
        self.store_operations_total
            .with_label_values(&[operation, table, status])
            .inc();
        self.store_operation_duration_seconds
            .with_label_values(&[operation, table])
            .observe(duration_secs);
    }

    pub fn record_form_submission(&self, form: &str) {
        self.form_submissions_total.with_label_values(&[form]).inc();
    }

    /// Record a notification delivery on one channel.
    pub fn record_notification(&self, channel: &str, success: bool) {
        let status = if success { "success" } else { "failure" };
        self.notification_deliveries_total
            .with_label_values(&[channel, status])
            .inc();
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.cache_lookups_total.with_label_values(&[result]).inc();
    }
}

/// Run `f` against the global metrics if they registered.
pub fn with_metrics(f: impl FnOnce(&VitrineMetrics)) {
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // Make sure the Vitrine families exist even before the first request.
    Lazy::force(&METRICS);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_form_and_notification() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        metrics.record_form_submission("contact");
        metrics.record_notification("slack", true);
        metrics.record_notification("email", false);
        assert!(
            metrics
                .form_submissions_total
                .with_label_values(&["contact"])
                .get()
                >= 1.0
        );
        Ok(())
    }

    #[test]
    fn test_record_store_operation() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        metrics.record_store_operation("select", "services", true, 0.004);
        metrics.record_store_operation("insert", "contact_submissions", false, 0.010);
        Ok(())
    }
}
