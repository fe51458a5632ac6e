use axum::{http::Request, middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{addon, handlers, middleware::metrics_middleware};
use crate::metrics::normalize_path;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Addon paths carry the user's credential, so spans only see the
    // normalized path.
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %normalize_path(request.uri().path()),
        )
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Addon without configuration
        .route("/manifest.json", get(addon::manifest))
        .route("/catalog/{kind}/{id}", get(addon::catalog))
        .route("/meta/{kind}/{id}", get(addon::meta))
        .route("/stream/{kind}/{id}", get(addon::stream))
        // Addon with `provider=credential` or a bare credential
        .route("/{config}/manifest.json", get(addon::configured_manifest))
        .route("/{config}/catalog/{kind}/{id}", get(addon::configured_catalog))
        .route("/{config}/meta/{kind}/{id}", get(addon::configured_meta))
        .route("/{config}/stream/{kind}/{id}", get(addon::configured_stream))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(trace)
        .layer(cors)
}
