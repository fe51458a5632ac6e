//! Transport seam between the resolution algorithm and a vendor API.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::{BackendError, Provider, RemoteFile, RemoteTorrent};

/// Raw operations a debrid vendor exposes.
///
/// Implementations only translate requests and map vendor status strings to
/// [`BackendTorrentState`](super::BackendTorrentState). The algorithm that
/// strings these calls together lives in [`DebridAdapter`](super::DebridAdapter).
#[async_trait]
pub trait DebridBackend: Send + Sync {
    /// Which provider this transport talks to.
    fn provider(&self) -> Provider;

    /// Torrents already present on the user's account.
    async fn list_torrents(&self, credential: &str) -> Result<Vec<RemoteTorrent>, BackendError>;

    /// Register a magnet URI. Returns the backend torrent id.
    async fn add_magnet(&self, credential: &str, magnet: &str) -> Result<String, BackendError>;

    /// Current state of one torrent.
    async fn torrent_info(&self, credential: &str, id: &str)
        -> Result<RemoteTorrent, BackendError>;

    /// Choose which files of the torrent the backend should fetch.
    async fn select_files(
        &self,
        credential: &str,
        id: &str,
        file_ids: &[String],
    ) -> Result<(), BackendError>;

    /// Turn an internal link into a directly downloadable URL.
    async fn unrestrict(&self, credential: &str, link: &str) -> Result<String, BackendError>;
}

static VIDEO_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mp4|mkv|avi|mov|webm)$").expect("valid regex"));

/// Whether a file path has a playable video extension.
pub fn is_video_file(path: &str) -> bool {
    VIDEO_EXTENSION.is_match(path.trim())
}

/// Pick the file to download from a torrent.
///
/// Preference order: a video file whose path contains `hint`
/// (case-insensitive), the first video file, then the first file.
pub fn select_video_file<'a>(files: &'a [RemoteFile], hint: Option<&str>) -> Option<&'a RemoteFile> {
    let videos = || files.iter().filter(|f| is_video_file(&f.path));

    if let Some(hint) = hint.map(str::to_lowercase).filter(|h| !h.is_empty()) {
        if let Some(file) = videos().find(|f| f.path.to_lowercase().contains(&hint)) {
            return Some(file);
        }
    }

    videos().next().or_else(|| files.first())
}
