//! Stream resolver - turns a catalog item into playable links.
//!
//! For every infohash of the item the resolver either serves a cached link,
//! builds a magnet for peer-to-peer playback, or asks the selected debrid
//! provider. Failures are logged and dropped: the caller always receives a
//! list, possibly empty.

mod flight;
mod types;

pub use types::{ResolverOptions, StreamLink};

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use crate::cache::{normalize_hash, ResolutionCache};
use crate::catalog::{CatalogLookup, ContentItem, ItemVariant};
use crate::config::Config;
use crate::metrics;
use crate::provider::{
    MagnetBuilder, Provider, ProviderAdapter, ProviderRegistry, ResolutionError,
};

use flight::{FlightRelease, InFlight, Joined, Resolution};

/// Resolves catalog items to stream links.
pub struct StreamResolver {
    catalog: Arc<dyn CatalogLookup>,
    registry: ProviderRegistry,
    cache: Arc<ResolutionCache>,
    magnets: MagnetBuilder,
    options: ResolverOptions,
    in_flight: InFlight,
}

impl StreamResolver {
    pub fn new(
        catalog: Arc<dyn CatalogLookup>,
        registry: ProviderRegistry,
        cache: Arc<ResolutionCache>,
        magnets: MagnetBuilder,
        options: ResolverOptions,
    ) -> Self {
        Self {
            catalog,
            registry,
            cache,
            magnets,
            options,
            in_flight: InFlight::default(),
        }
    }

    /// Build a resolver with the cache, trackers and policy from `config`.
    pub fn from_config(
        config: &Config,
        catalog: Arc<dyn CatalogLookup>,
        registry: ProviderRegistry,
    ) -> Self {
        let cache = Arc::new(ResolutionCache::new(
            config.cache.capacity,
            config.cache.ttl(),
        ));
        Self::new(
            catalog,
            registry,
            cache,
            MagnetBuilder::new(config.p2p.trackers.clone()),
            ResolverOptions::from_config(&config.resolver, &config.addon),
        )
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve every infohash of `item_id` through `provider`.
    ///
    /// Links keep the catalog's variant order; a URL appears at most once.
    /// Unknown items, items without hashes and failed resolutions all yield
    /// fewer (or zero) links, never an error.
    pub async fn resolve_stream(
        &self,
        item_id: &str,
        provider: Provider,
        credential: Option<&str>,
    ) -> Vec<StreamLink> {
        let Some(item) = self.catalog.find_by_id(item_id) else {
            debug!(item_id, "Item not in catalog");
            metrics::STREAM_REQUESTS
                .with_label_values(&["unknown_item"])
                .inc();
            return Vec::new();
        };

        let credential = credential.map(str::trim).filter(|c| !c.is_empty());
        let resolved = join_all(
            item.variants
                .iter()
                .map(|variant| self.resolve_variant(&item, variant, provider, credential)),
        )
        .await;

        let mut seen = HashSet::new();
        let links: Vec<StreamLink> = resolved
            .into_iter()
            .flatten()
            .filter(|link| seen.insert(link.url.clone()))
            .collect();

        let outcome = if links.is_empty() { "empty" } else { "resolved" };
        metrics::STREAM_REQUESTS.with_label_values(&[outcome]).inc();
        info!(
            item_id,
            %provider,
            variants = item.variants.len(),
            links = links.len(),
            "Resolved streams"
        );

        links
    }

    async fn resolve_variant(
        &self,
        item: &ContentItem,
        variant: &ItemVariant,
        provider: Provider,
        credential: Option<&str>,
    ) -> Option<StreamLink> {
        let hash = normalize_hash(&variant.info_hash);
        if hash.is_empty() {
            return None;
        }

        if let Some(link) = self.cached_link(&hash, variant) {
            return Some(link);
        }

        if !provider.is_debrid() {
            return Some(self.magnet_link(&hash, variant, "requested"));
        }
        let Some(credential) = credential else {
            return Some(self.magnet_link(&hash, variant, "no_credential"));
        };
        let Some(adapter) = self.registry.get(provider) else {
            warn!(%provider, "No adapter registered, handing out a magnet");
            return Some(self.magnet_link(&hash, variant, "no_adapter"));
        };

        let hint = item.file_hint();
        let outcome = if self.options.single_flight {
            let joined = self.in_flight.join(
                &hash,
                || self.cached_link(&hash, variant),
                |release| self.spawn_resolution(adapter, credential, &hash, hint, Some(release)),
            );
            match joined {
                Joined::Ready(link) => return Some(link),
                Joined::Flight(flight) => flight.await,
            }
        } else {
            self.spawn_resolution(adapter, credential, &hash, hint, None)
                .await
        };

        match outcome {
            Ok(playable) => Some(StreamLink {
                url: playable.url,
                title: self.options.debrid_title(
                    variant.quality.as_deref(),
                    variant.language.as_deref(),
                    false,
                ),
                provider_label: self.options.label.clone(),
                from_cache: false,
                info_hash: hash,
            }),
            Err(e) => {
                warn!(item_id = %item.id, hash = %hash, error = %e, "Skipping variant");
                if self.options.fallback_to_p2p {
                    Some(self.magnet_link(&hash, variant, "provider_failed"))
                } else {
                    None
                }
            }
        }
    }

    /// Run the adapter call and the cache write on their own task.
    ///
    /// The task outlives the request that started it, so a client hanging
    /// up mid-resolution still leaves the link in the cache. `release` is
    /// dropped only after the cache write.
    fn spawn_resolution(
        &self,
        adapter: Arc<dyn ProviderAdapter>,
        credential: &str,
        hash: &str,
        hint: Option<String>,
        release: Option<FlightRelease>,
    ) -> BoxFuture<'static, Resolution> {
        let provider = adapter.provider();
        let cache = self.cache.clone();
        let credential = credential.to_string();
        let hash = hash.to_string();

        let task = tokio::spawn(async move {
            let _release = release;
            let result = adapter.resolve(&credential, &hash, hint.as_deref()).await;
            if let Ok(playable) = &result {
                cache.put_default(&hash, playable.url.clone());
            }
            result
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(ResolutionError::rejected(provider, e)))
        }
        .boxed()
    }

    fn cached_link(&self, hash: &str, variant: &ItemVariant) -> Option<StreamLink> {
        let entry = self.cache.get(hash)?;
        debug!(hash, "Serving cached link");
        Some(StreamLink {
            url: entry.url,
            title: self.options.debrid_title(
                variant.quality.as_deref(),
                variant.language.as_deref(),
                true,
            ),
            provider_label: self.options.label.clone(),
            from_cache: true,
            info_hash: hash.to_string(),
        })
    }

    fn magnet_link(&self, hash: &str, variant: &ItemVariant, reason: &str) -> StreamLink {
        metrics::P2P_FALLBACKS.with_label_values(&[reason]).inc();
        let magnet = self.magnets.build(hash);
        StreamLink {
            url: magnet.uri,
            title: self
                .options
                .p2p_title(variant.quality.as_deref(), variant.language.as_deref()),
            provider_label: magnet.label,
            from_cache: false,
            info_hash: magnet.info_hash,
        }
    }
}

impl std::fmt::Debug for StreamResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResolver")
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .field("options", &self.options)
            .finish()
    }
}
