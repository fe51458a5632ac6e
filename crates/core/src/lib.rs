pub mod cache;
pub mod catalog;
pub mod config;
pub mod metrics;
pub mod polling;
pub mod provider;
pub mod resolver;
pub mod testing;

pub use cache::{normalize_hash, CacheEntry, ResolutionCache};
pub use catalog::{CatalogError, CatalogLookup, ContentItem, ContentKind, JsonCatalog};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use polling::{poll_until, PollError, PollPolicy};
pub use provider::{
    build_magnet, DebridAdapter, DebridBackend, MagnetDescriptor, PlayableLink, Provider,
    ProviderAdapter, ProviderRegistry, ResolutionError,
};
pub use resolver::{ResolverOptions, StreamLink, StreamResolver};
