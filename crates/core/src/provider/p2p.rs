//! Magnet links for peer-to-peer playback.
//!
//! No backend is involved: the client plays the torrent itself, so the link
//! only needs the infohash and a tracker list to find peers quickly.

use serde::{Deserialize, Serialize};

use crate::cache::normalize_hash;

/// A magnet URI plus the metadata shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagnetDescriptor {
    pub uri: String,
    /// Normalized (uppercase) infohash.
    pub info_hash: String,
    pub label: String,
}

/// Build a magnet URI from an infohash and tracker announce URLs.
///
/// Trackers are appended in order as `&tr=` parameters, percent-encoded.
/// Blank tracker entries are skipped.
pub fn build_magnet(info_hash: &str, trackers: &[String]) -> MagnetDescriptor {
    let hash = normalize_hash(info_hash);
    let mut uri = format!("magnet:?xt=urn:btih:{}", hash);
    for tracker in trackers.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        uri.push_str("&tr=");
        uri.push_str(&urlencoding::encode(tracker));
    }

    MagnetDescriptor {
        uri,
        info_hash: hash,
        label: "P2P".to_string(),
    }
}

/// Builds magnets with a fixed tracker list.
#[derive(Debug, Clone)]
pub struct MagnetBuilder {
    trackers: Vec<String>,
}

impl MagnetBuilder {
    pub fn new(trackers: Vec<String>) -> Self {
        Self { trackers }
    }

    pub fn trackers(&self) -> &[String] {
        &self.trackers
    }

    pub fn build(&self, info_hash: &str) -> MagnetDescriptor {
        build_magnet(info_hash, &self.trackers)
    }
}

impl Default for MagnetBuilder {
    fn default() -> Self {
        Self::new(crate::config::default_trackers())
    }
}
