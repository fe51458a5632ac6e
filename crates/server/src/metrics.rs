//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the addon server:
//! - HTTP request metrics (latency, counts)
//! - Resolution cache size (collected dynamically)
//! - Everything the core engine records (cache, providers, streams)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "debridge_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("debridge_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "debridge_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics
// =============================================================================

/// Entries held by the resolution cache (collected dynamically).
pub static CACHE_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "debridge_cache_entries",
        "Entries in the resolution cache, expired ones included",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION");
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .expect("Failed to register HTTP_REQUESTS_IN_FLIGHT");
    registry
        .register(Box::new(CACHE_ENTRIES.clone()))
        .expect("Failed to register CACHE_ENTRIES");

    debridge_core::metrics::register_core_metrics(registry);
}

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Update gauges that are read from application state.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    CACHE_ENTRIES.set(state.resolver().cache().len() as i64);
}

/// First path segments that are routes rather than addon configuration.
const ROUTE_ROOTS: &[&str] = &[
    "health",
    "metrics",
    "config",
    "manifest.json",
    "catalog",
    "meta",
    "stream",
];

/// Normalize a request path for use as a metric label or log field.
///
/// The addon configuration segment carries the user's credential and is
/// replaced by `{config}`; item ids become `{id}`.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if let Some(first) = segments.first() {
        if !ROUTE_ROOTS.contains(first) {
            segments[0] = "{config}";
        }
    }

    // <resource>/<type>/<id>.json
    let resource_at = segments
        .iter()
        .position(|s| matches!(*s, "catalog" | "meta" | "stream"));
    if let Some(i) = resource_at {
        if segments.len() == i + 3 {
            segments[i + 2] = "{id}";
        }
    }

    format!("/{}", segments.join("/"))
}
