//! Types shared by every provider adapter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stream provider selectable by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    RealDebrid,
    AllDebrid,
    TorBox,
    /// Raw magnet links for client-side peer-to-peer playback.
    P2P,
}

impl Provider {
    /// All providers, debrid backends first.
    pub const ALL: [Provider; 4] = [
        Provider::RealDebrid,
        Provider::AllDebrid,
        Provider::TorBox,
        Provider::P2P,
    ];

    /// Returns the string representation used in URLs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::RealDebrid => "realdebrid",
            Provider::AllDebrid => "alldebrid",
            Provider::TorBox => "torbox",
            Provider::P2P => "p2p",
        }
    }

    /// Human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Provider::RealDebrid => "Real-Debrid",
            Provider::AllDebrid => "AllDebrid",
            Provider::TorBox => "TorBox",
            Provider::P2P => "P2P",
        }
    }

    /// Whether this provider needs a debrid backend and a credential.
    pub fn is_debrid(&self) -> bool {
        !matches!(self, Provider::P2P)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    /// Case-insensitive; dashes and underscores are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "realdebrid" | "rd" => Ok(Provider::RealDebrid),
            "alldebrid" | "ad" => Ok(Provider::AllDebrid),
            "torbox" | "tb" => Ok(Provider::TorBox),
            "p2p" => Ok(Provider::P2P),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// A directly downloadable URL produced by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableLink {
    pub url: String,
    pub provider_label: String,
}

/// Conceptual state of a torrent on a debrid backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendTorrentState {
    /// Not known to the backend.
    Unregistered,
    /// Accepted, metadata still being fetched.
    Registered,
    /// Waiting for the client to pick the files to download.
    AwaitingFileSelection,
    /// Downloading, queued, or being repackaged by the backend.
    Processing,
    /// Finished; links are available.
    Ready,
    /// The backend gave up on this torrent.
    Failed,
}

impl BackendTorrentState {
    /// Whether polling can stop at this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BackendTorrentState::Ready | BackendTorrentState::Failed)
    }
}

/// A file inside a backend torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Backend file id used for selection.
    pub id: String,
    /// Path within the torrent.
    pub path: String,
    /// Size in bytes (0 when unknown).
    pub bytes: u64,
}

/// A backend's view of one torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTorrent {
    /// Backend-assigned torrent id.
    pub id: String,
    /// Info hash as reported by the backend.
    pub hash: String,
    pub state: BackendTorrentState,
    /// File list (may be empty until metadata is known).
    pub files: Vec<RemoteFile>,
    /// Internal links to unrestrict once ready.
    pub links: Vec<String>,
}

impl RemoteTorrent {
    /// Case-insensitive infohash comparison.
    pub fn matches_hash(&self, hash: &str) -> bool {
        self.hash.trim().eq_ignore_ascii_case(hash.trim())
    }
}

/// Errors raised by a backend transport.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a provider could not produce a playable link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("{provider} did not finish after {attempts} polls")]
    ProviderTimeout { provider: Provider, attempts: u32 },

    #[error("{provider} rejected the request: {reason}")]
    ProviderRejected { provider: Provider, reason: String },

    #[error("{provider} exposed no playable file")]
    NoPlayableFile { provider: Provider },
}

impl ResolutionError {
    /// Wrap a transport error as a rejection by `provider`.
    pub fn rejected(provider: Provider, err: impl fmt::Display) -> Self {
        ResolutionError::ProviderRejected {
            provider,
            reason: err.to_string(),
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            ResolutionError::ProviderTimeout { provider, .. }
            | ResolutionError::ProviderRejected { provider, .. }
            | ResolutionError::NoPlayableFile { provider } => *provider,
        }
    }

    /// Result label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolutionError::ProviderTimeout { .. } => "timeout",
            ResolutionError::ProviderRejected { .. } => "rejected",
            ResolutionError::NoPlayableFile { .. } => "no_playable_file",
        }
    }
}
