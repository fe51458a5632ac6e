//! Types for stream resolution.

use serde::{Deserialize, Serialize};

use crate::config::{AddonConfig, ResolverConfig};

/// One playable stream returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLink {
    pub url: String,
    pub title: String,
    pub provider_label: String,
    /// Served from the resolution cache without contacting a provider.
    pub from_cache: bool,
    /// Normalized infohash this link plays.
    pub info_hash: String,
}

/// Behaviour switches and display defaults of the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Hand out a magnet link when a debrid provider fails for a hash.
    pub fallback_to_p2p: bool,
    /// Serialize concurrent resolutions of the same hash.
    pub single_flight: bool,
    /// Label shown next to debrid links.
    pub label: String,
    pub default_quality: String,
    pub default_language: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default(), &AddonConfig::default())
    }
}

impl ResolverOptions {
    pub fn from_config(resolver: &ResolverConfig, addon: &AddonConfig) -> Self {
        Self {
            fallback_to_p2p: resolver.fallback_to_p2p,
            single_flight: resolver.single_flight,
            label: addon.name.clone(),
            default_quality: addon.default_quality.clone(),
            default_language: addon.default_language.clone(),
        }
    }

    /// Title of a debrid link: `"{quality} {language}"`, marked when cached.
    pub fn debrid_title(&self, quality: Option<&str>, language: Option<&str>, cached: bool) -> String {
        let mut title = format!(
            "{} {}",
            quality.unwrap_or(&self.default_quality),
            language.unwrap_or(&self.default_language)
        );
        if cached {
            title.push_str(" ⚡ CACHED");
        }
        title
    }

    /// Title of a magnet link: `"{quality} · {language} [P2P]"`.
    pub fn p2p_title(&self, quality: Option<&str>, language: Option<&str>) -> String {
        format!(
            "{} · {} [P2P]",
            quality.unwrap_or(&self.default_quality),
            language.unwrap_or(&self.default_language)
        )
    }
}
