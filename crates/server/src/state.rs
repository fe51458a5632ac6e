use std::sync::Arc;

use debridge_core::{Config, JsonCatalog, StreamResolver};

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: Arc<JsonCatalog>,
    resolver: Arc<StreamResolver>,
}

impl AppState {
    pub fn new(config: Config, catalog: Arc<JsonCatalog>, resolver: Arc<StreamResolver>) -> Self {
        Self {
            config,
            catalog,
            resolver,
        }
    }

    /// Credentials arrive per request, so the configuration holds no secrets.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &JsonCatalog {
        self.catalog.as_ref()
    }

    pub fn resolver(&self) -> &StreamResolver {
        self.resolver.as_ref()
    }
}
