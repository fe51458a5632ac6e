#![allow(dead_code)]

//! Common test utilities for addon route tests.
//!
//! Builds an in-process router over an in-memory catalog with mock
//! provider adapters, so requests never leave the test process.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use debridge_core::{
    testing::MockAdapter, CatalogLookup, Config, Provider, ProviderRegistry, StreamResolver,
};
use debridge_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use debridge_core::testing::fixtures;

/// Movie with two variants.
pub const MOVIE_ID: &str = "tt0111161";
pub const MOVIE_HASHES: [&str; 2] = [
    "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
    "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
];

/// Series with two episodes in season 1 and one in season 2.
pub const SERIES_ID: &str = "tt0903747";
pub const EPISODE_HASH: &str = "cccccccccccccccccccccccccccccccccccccccc";

/// Test fixture with mock adapters for Real-Debrid and AllDebrid.
///
/// TorBox is left unregistered.
pub struct TestFixture {
    pub router: Router,
    pub realdebrid: MockAdapter,
    pub alldebrid: MockAdapter,
    pub state: Arc<AppState>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let catalog = Arc::new(fixtures::catalog(
            vec![
                fixtures::movie(
                    MOVIE_ID,
                    &[
                        (MOVIE_HASHES[0], Some("4K"), Some("LAT")),
                        (MOVIE_HASHES[1], Some("1080p"), Some("ENG")),
                    ],
                ),
                fixtures::episode(&format!("{}:2:1", SERIES_ID), EPISODE_HASH),
                fixtures::episode(&format!("{}:1:2", SERIES_ID), EPISODE_HASH),
                fixtures::episode(&format!("{}:1:1", SERIES_ID), EPISODE_HASH),
            ],
            vec![fixtures::series(SERIES_ID, "Breaking Bad")],
        ));

        let realdebrid = MockAdapter::new(Provider::RealDebrid);
        let alldebrid = MockAdapter::new(Provider::AllDebrid);
        let registry = ProviderRegistry::new()
            .with(Arc::new(realdebrid.clone()))
            .with(Arc::new(alldebrid.clone()));

        let lookup: Arc<dyn CatalogLookup> = catalog.clone();
        let resolver = Arc::new(StreamResolver::from_config(&config, lookup, registry));
        let state = Arc::new(AppState::new(config, catalog, resolver));

        Self {
            router: create_router(Arc::clone(&state)),
            realdebrid,
            alldebrid,
            state,
        }
    }

    /// Make a GET request.
    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("Origin", "https://app.strem.io")
            .body(Body::empty())
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
