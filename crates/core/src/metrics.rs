//! Prometheus metrics for the resolution engine.
//!
//! This module provides metrics for:
//! - Resolution cache (hits, misses, expired entries)
//! - Provider resolutions (results and duration per backend)
//! - Backend polling (status polls per resolution)
//! - Orchestrated stream requests

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("debridge_cache_lookups_total", "Resolution cache lookups"),
        &["result"], // "hit", "miss", "expired"
    )
    .unwrap()
});

// =============================================================================
// Provider Metrics
// =============================================================================

/// Provider resolutions by provider and result.
pub static RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "debridge_resolutions_total",
            "Provider resolutions attempted",
        ),
        &["provider", "result"], // "success", "timeout", "rejected", "no_playable_file"
    )
    .unwrap()
});

/// Provider resolution duration in seconds.
pub static RESOLUTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "debridge_resolution_duration_seconds",
            "Duration of a provider resolution",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 180.0]),
        &["provider"],
    )
    .unwrap()
});

/// Status polls needed to reach a terminal backend state.
pub static POLL_ATTEMPTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "debridge_poll_attempts",
            "Status polls per torrent registration",
        )
        .buckets(vec![1.0, 2.0, 5.0, 10.0, 20.0, 40.0]),
        &["provider"],
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Stream requests by outcome.
pub static STREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("debridge_stream_requests_total", "Stream resolution requests"),
        &["outcome"], // "resolved", "empty", "unknown_item"
    )
    .unwrap()
});

/// Magnet links handed out instead of debrid links.
pub static P2P_FALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("debridge_p2p_links_total", "Magnet links returned"),
        &["reason"], // "requested", "no_credential", "no_adapter", "provider_failed"
    )
    .unwrap()
});

/// Register all core metrics with the given registry.
pub fn register_core_metrics(registry: &Registry) {
    registry
        .register(Box::new(CACHE_LOOKUPS.clone()))
        .expect("Failed to register CACHE_LOOKUPS");
    registry
        .register(Box::new(RESOLUTIONS.clone()))
        .expect("Failed to register RESOLUTIONS");
    registry
        .register(Box::new(RESOLUTION_DURATION.clone()))
        .expect("Failed to register RESOLUTION_DURATION");
    registry
        .register(Box::new(POLL_ATTEMPTS.clone()))
        .expect("Failed to register POLL_ATTEMPTS");
    registry
        .register(Box::new(STREAM_REQUESTS.clone()))
        .expect("Failed to register STREAM_REQUESTS");
    registry
        .register(Box::new(P2P_FALLBACKS.clone()))
        .expect("Failed to register P2P_FALLBACKS");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_core_metrics() {
        let registry = Registry::new();
        register_core_metrics(&registry);

        CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
        RESOLUTIONS
            .with_label_values(&["realdebrid", "success"])
            .inc();

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.contains(&"debridge_cache_lookups_total".to_string()));
        assert!(names.contains(&"debridge_resolutions_total".to_string()));
    }
}
