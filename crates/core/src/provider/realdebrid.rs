//! Real-Debrid transport.
//!
//! REST API v1.0: form-encoded writes, bearer token auth.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ProviderConfig;

use super::http::{string_or_number, ApiClient};
use super::{BackendError, BackendTorrentState, DebridBackend, Provider, RemoteFile, RemoteTorrent};

pub const DEFAULT_BASE_URL: &str = "https://api.real-debrid.com/rest/1.0";

/// Real-Debrid API client.
pub struct RealDebridBackend {
    api: ApiClient,
}

impl RealDebridBackend {
    pub fn new(config: &ProviderConfig) -> Result<Self, BackendError> {
        Ok(Self {
            api: ApiClient::new(config.base_url_or(DEFAULT_BASE_URL), config.timeout())?,
        })
    }

    /// Client against a custom endpoint (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, BackendError> {
        Ok(Self {
            api: ApiClient::new(base_url.into(), Duration::from_secs(30))?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RdTorrent {
    id: String,
    #[serde(default)]
    hash: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    files: Vec<RdFile>,
    #[serde(default)]
    links: Vec<String>,
}

impl RdTorrent {
    fn into_remote(self) -> RemoteTorrent {
        RemoteTorrent {
            state: parse_rd_status(&self.status),
            id: self.id,
            hash: self.hash,
            files: self.files.into_iter().map(RdFile::into_remote).collect(),
            links: self.links,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RdFile {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    bytes: u64,
}

impl RdFile {
    fn into_remote(self) -> RemoteFile {
        RemoteFile {
            id: self.id,
            path: self.path,
            bytes: self.bytes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RdAddMagnet {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RdUnrestrict {
    download: String,
}

/// Map a Real-Debrid torrent status to the conceptual state.
fn parse_rd_status(status: &str) -> BackendTorrentState {
    match status {
        "magnet_conversion" => BackendTorrentState::Registered,
        "waiting_files_selection" => BackendTorrentState::AwaitingFileSelection,
        "queued" | "downloading" | "compressing" | "uploading" => BackendTorrentState::Processing,
        "downloaded" => BackendTorrentState::Ready,
        "magnet_error" | "error" | "virus" | "dead" => BackendTorrentState::Failed,
        _ => BackendTorrentState::Processing,
    }
}

#[async_trait]
impl DebridBackend for RealDebridBackend {
    fn provider(&self) -> Provider {
        Provider::RealDebrid
    }

    async fn list_torrents(&self, credential: &str) -> Result<Vec<RemoteTorrent>, BackendError> {
        let torrents: Vec<RdTorrent> = self.api.get(credential, "torrents?limit=1000").await?;
        Ok(torrents.into_iter().map(RdTorrent::into_remote).collect())
    }

    async fn add_magnet(&self, credential: &str, magnet: &str) -> Result<String, BackendError> {
        let added: RdAddMagnet = self
            .api
            .post_form(credential, "torrents/addMagnet", &[("magnet", magnet)])
            .await?;
        Ok(added.id)
    }

    async fn torrent_info(
        &self,
        credential: &str,
        id: &str,
    ) -> Result<RemoteTorrent, BackendError> {
        let torrent: RdTorrent = self
            .api
            .get(credential, &format!("torrents/info/{}", id))
            .await?;
        Ok(torrent.into_remote())
    }

    async fn select_files(
        &self,
        credential: &str,
        id: &str,
        file_ids: &[String],
    ) -> Result<(), BackendError> {
        let files = file_ids.join(",");
        self.api
            .post_form_raw(
                credential,
                &format!("torrents/selectFiles/{}", id),
                &[("files", files.as_str())],
            )
            .await?;
        Ok(())
    }

    async fn unrestrict(&self, credential: &str, link: &str) -> Result<String, BackendError> {
        let unrestricted: RdUnrestrict = self
            .api
            .post_form(credential, "unrestrict/link", &[("link", link)])
            .await?;
        Ok(unrestricted.download)
    }
}
