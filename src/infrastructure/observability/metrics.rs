//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MetricsConfig;

static NUMERIC_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+(/|$)").expect("valid numeric segment pattern"));

static LOCALE_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(/api/v1/translations)/[a-z]{2}(?:-[A-Za-z]{2})?(/|$)")
        .expect("valid locale segment pattern")
});

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
    path: String,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
///
/// Returns `None` when disabled or when a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("site_cache_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!(path = %config.endpoint, "Prometheus metrics initialized");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
                path: config.endpoint.clone(),
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize Prometheus metrics");
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    let path = metrics.path.clone();

    Router::new()
        .route(&path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record a cache lookup outcome (`hit` or `miss`)
pub fn record_cache_lookup(hit: bool) {
    if hit {
        counter!("cache_hits_total").increment(1);
    } else {
        counter!("cache_misses_total").increment(1);
    }
}

/// Record an entry that could not be decoded and was purged
pub fn record_cache_corrupted() {
    counter!("cache_corrupted_total").increment(1);
}

/// Record a failed or timed out backend call
pub fn record_cache_error(operation: &'static str) {
    counter!("cache_errors_total", "operation" => operation).increment(1);
}

/// Record keys removed by a tag invalidation
pub fn record_invalidation(tag: &str, removed: usize) {
    counter!("cache_invalidations_total", "tag" => tag.to_string()).increment(1);
    counter!("cache_invalidated_keys_total").increment(removed as u64);
}

/// Record a request rejected by the rate gate
pub fn record_rate_limited(class: &str) {
    counter!("rate_limit_rejections_total", "class" => class.to_string()).increment(1);
}

/// Collapses ids and locales so path labels stay low-cardinality
fn sanitize_path(path: &str) -> String {
    let path = LOCALE_SEGMENT.replace(path, "$1/{locale}$2");
    let path = NUMERIC_SEGMENT.replace_all(&path, "/{id}$1");

    if path.len() > 50 {
        path.chars().take(50).collect()
    } else {
        path.to_string()
    }
}
