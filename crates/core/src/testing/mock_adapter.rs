//! Mock provider adapter for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::cache::normalize_hash;
use crate::provider::{PlayableLink, Provider, ProviderAdapter, ResolutionError};

/// A recorded `resolve` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResolve {
    pub credential: String,
    pub info_hash: String,
    pub file_hint: Option<String>,
}

/// Mock implementation of [`ProviderAdapter`].
///
/// Resolves every hash to `https://<provider>.mock/<HASH>` unless a failure
/// is scripted for it. An optional delay simulates slow backends.
#[derive(Debug, Clone)]
pub struct MockAdapter {
    provider: Provider,
    failures: Arc<RwLock<HashMap<String, ResolutionError>>>,
    calls: Arc<RwLock<Vec<RecordedResolve>>>,
    delay: Arc<RwLock<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockAdapter {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            failures: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// URL this mock returns for `info_hash`.
    pub fn link_for(provider: Provider, info_hash: &str) -> String {
        format!("https://{}.mock/{}", provider.as_str(), normalize_hash(info_hash))
    }

    /// Make resolution of `info_hash` fail with `error`.
    pub async fn fail_hash(&self, info_hash: &str, error: ResolutionError) {
        self.failures
            .write()
            .await
            .insert(normalize_hash(info_hash), error);
    }

    /// Sleep this long inside every `resolve`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub async fn calls(&self) -> Vec<RecordedResolve> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Number of calls made for one hash.
    pub async fn calls_for(&self, info_hash: &str) -> usize {
        let hash = normalize_hash(info_hash);
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| normalize_hash(&c.info_hash) == hash)
            .count()
    }

    /// Highest number of `resolve` calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn resolve(
        &self,
        credential: &str,
        info_hash: &str,
        file_hint: Option<&str>,
    ) -> Result<PlayableLink, ResolutionError> {
        self.calls.write().await.push(RecordedResolve {
            credential: credential.to_string(),
            info_hash: info_hash.to_string(),
            file_hint: file_hint.map(str::to_string),
        });

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.failures.read().await.get(&normalize_hash(info_hash)) {
            return Err(error.clone());
        }

        Ok(PlayableLink {
            url: Self::link_for(self.provider, info_hash),
            provider_label: self.provider.label().to_string(),
        })
    }
}
