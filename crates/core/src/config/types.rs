use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::polling::PollPolicy;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub addon: AddonConfig,
    #[serde(default)]
    pub p2p: P2pConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    7000
}

/// Where the JSON catalog files live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Directory holding `movies.json`, `series.json` and `episodes.json`.
    #[serde(default = "default_catalog_dir")]
    pub dir: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dir: default_catalog_dir(),
        }
    }
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from("public")
}

/// Resolution cache sizing and lifetime.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum number of resolved hashes kept (least recently used evicted first).
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// How long a resolved link stays valid, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_capacity() -> usize {
    10_000
}

fn default_cache_ttl() -> u64 {
    24 * 60 * 60
}

/// Orchestration policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Substitute a magnet link when a debrid provider fails for a hash.
    #[serde(default)]
    pub fallback_to_p2p: bool,
    /// Serialize concurrent resolutions of the same hash so only one
    /// backend registration happens.
    #[serde(default = "default_true")]
    pub single_flight: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fallback_to_p2p: false,
            single_flight: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Addon identity and stream title defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddonConfig {
    #[serde(default = "default_addon_id")]
    pub id: String,
    #[serde(default = "default_addon_name")]
    pub name: String,
    #[serde(default = "default_addon_description")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Quality tag used when a catalog item has none.
    #[serde(default = "default_quality")]
    pub default_quality: String,
    /// Language tag used when a catalog item has none.
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for AddonConfig {
    fn default() -> Self {
        Self {
            id: default_addon_id(),
            name: default_addon_name(),
            description: default_addon_description(),
            logo: None,
            background: None,
            default_quality: default_quality(),
            default_language: default_language(),
        }
    }
}

fn default_addon_id() -> String {
    "org.debridge.addon".to_string()
}

fn default_addon_name() -> String {
    "Debridge".to_string()
}

fn default_addon_description() -> String {
    "Movies and series through Real-Debrid, AllDebrid or TorBox".to_string()
}

fn default_quality() -> String {
    "1080p".to_string()
}

fn default_language() -> String {
    "LATINO".to_string()
}

/// Peer-to-peer fallback settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct P2pConfig {
    /// Tracker announce URLs appended to every magnet.
    #[serde(default = "default_trackers")]
    pub trackers: Vec<String>,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            trackers: default_trackers(),
        }
    }
}

pub fn default_trackers() -> Vec<String> {
    [
        "udp://tracker.opentrackr.org:1337/announce",
        "udp://open.tracker.cl:1337/announce",
        "udp://tracker.openbittorrent.com:80/announce",
        "udp://exodus.desync.com:6969/announce",
        "udp://tracker.torrent.eu.org:451/announce",
        "udp://tracker.moeking.me:6969/announce",
        "udp://open.stealth.si:80/announce",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Per-backend settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub realdebrid: ProviderConfig,
    #[serde(default)]
    pub alldebrid: ProviderConfig,
    #[serde(default)]
    pub torbox: ProviderConfig,
}

/// Transport and polling settings for one debrid backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// API base URL override (the vendor's public API when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// HTTP request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Delay between status polls in milliseconds (default: 3000)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Status polls before giving up (default: 40)
    #[serde(default = "default_poll_attempts")]
    pub max_poll_attempts: u32,
    /// Wait after a forced re-selection before re-fetching (default: 3000)
    #[serde(default = "default_reselect_delay")]
    pub reselect_delay_ms: u64,
}

impl ProviderConfig {
    /// Polling policy derived from this backend's settings.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_poll_attempts,
        }
    }

    pub fn reselect_delay(&self) -> Duration {
        Duration::from_millis(self.reselect_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs as u64)
    }

    /// Configured base URL or the given vendor default, without trailing slash.
    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout(),
            poll_interval_ms: default_poll_interval(),
            max_poll_attempts: default_poll_attempts(),
            reselect_delay_ms: default_reselect_delay(),
        }
    }
}

fn default_timeout() -> u32 {
    30
}

fn default_poll_interval() -> u64 {
    3000
}

fn default_poll_attempts() -> u32 {
    40
}

fn default_reselect_delay() -> u64 {
    3000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.catalog.dir, PathBuf::from("public"));
        assert_eq!(config.cache.capacity, 10_000);
        assert_eq!(config.cache.ttl(), Duration::from_secs(86_400));
        assert!(!config.resolver.fallback_to_p2p);
        assert!(config.resolver.single_flight);
        assert_eq!(config.p2p.trackers.len(), 7);
        assert_eq!(config.addon.default_quality, "1080p");
    }

    #[test]
    fn test_deserialize_server_section() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_deserialize_partial_provider_section() {
        let toml = r#"
[providers.alldebrid]
base_url = "http://localhost:1234/v4/"
max_poll_attempts = 10
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let ad = &config.providers.alldebrid;
        assert_eq!(ad.max_poll_attempts, 10);
        assert_eq!(ad.poll_interval_ms, 3000);
        assert_eq!(ad.timeout_secs, 30);
        assert_eq!(ad.base_url_or("unused"), "http://localhost:1234/v4");

        // Untouched providers keep every default
        assert!(config.providers.realdebrid.base_url.is_none());
        assert_eq!(
            config.providers.torbox.base_url_or("https://api.torbox.app/"),
            "https://api.torbox.app"
        );
    }

    #[test]
    fn test_poll_policy_from_provider_config() {
        let config = ProviderConfig {
            poll_interval_ms: 250,
            max_poll_attempts: 7,
            ..Default::default()
        };
        let policy = config.poll_policy();
        assert_eq!(policy.interval, Duration::from_millis(250));
        assert_eq!(policy.max_attempts, 7);
    }

    #[test]
    fn test_deserialize_custom_trackers() {
        let toml = r#"
[p2p]
trackers = ["udp://tracker.example:1337/announce"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.p2p.trackers, vec!["udp://tracker.example:1337/announce"]);
    }

    #[test]
    fn test_deserialize_resolver_policy() {
        let toml = r#"
[resolver]
fallback_to_p2p = true
single_flight = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.resolver.fallback_to_p2p);
        assert!(!config.resolver.single_flight);
    }
}
