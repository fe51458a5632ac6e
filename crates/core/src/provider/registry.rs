//! Lookup of provider adapters by provider name.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::ProvidersConfig;

use super::{
    AllDebridBackend, BackendError, DebridAdapter, Provider, ProviderAdapter, RealDebridBackend,
    TorBoxBackend,
};

/// Adapters available to the resolver, keyed by provider.
///
/// P2P never has an adapter: magnets are built without a backend.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<Provider, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the three debrid adapters from configuration.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self, BackendError> {
        let mut registry = Self::new();

        registry.register(Arc::new(DebridAdapter::new(
            RealDebridBackend::new(&config.realdebrid)?,
            config.realdebrid.poll_policy(),
            config.realdebrid.reselect_delay(),
        )));
        registry.register(Arc::new(DebridAdapter::new(
            AllDebridBackend::new(&config.alldebrid)?,
            config.alldebrid.poll_policy(),
            config.alldebrid.reselect_delay(),
        )));
        registry.register(Arc::new(DebridAdapter::new(
            TorBoxBackend::new(&config.torbox)?,
            config.torbox.poll_policy(),
            config.torbox.reselect_delay(),
        )));

        Ok(registry)
    }

    /// Add or replace the adapter for its provider.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        let provider = adapter.provider();
        debug!(%provider, "Registering provider adapter");
        self.adapters.insert(provider, adapter);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&provider).cloned()
    }

    /// Registered providers, in [`Provider::ALL`] order.
    pub fn providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}
