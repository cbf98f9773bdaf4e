//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_cache_corrupted, record_cache_error,
    record_cache_lookup, record_http_request, record_invalidation, record_rate_limited,
    PrometheusMetrics,
};
