//! AllDebrid transport.
//!
//! API v4: JSON bodies, bearer token auth, responses wrapped in `data`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::ProviderConfig;

use super::http::{string_or_number, ApiClient, Envelope};
use super::{BackendError, BackendTorrentState, DebridBackend, Provider, RemoteFile, RemoteTorrent};

pub const DEFAULT_BASE_URL: &str = "https://api.alldebrid.com/v4";

/// AllDebrid API client.
pub struct AllDebridBackend {
    api: ApiClient,
}

impl AllDebridBackend {
    pub fn new(config: &ProviderConfig) -> Result<Self, BackendError> {
        Ok(Self {
            api: ApiClient::new(config.base_url_or(DEFAULT_BASE_URL), config.timeout())?,
        })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, BackendError> {
        Ok(Self {
            api: ApiClient::new(base_url.into(), Duration::from_secs(30))?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AdTorrent {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    hash: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    files: Vec<AdFile>,
    #[serde(default)]
    links: Vec<String>,
}

impl AdTorrent {
    fn into_remote(self) -> RemoteTorrent {
        RemoteTorrent {
            state: parse_ad_status(&self.status),
            id: self.id,
            hash: self.hash,
            files: self
                .files
                .into_iter()
                .map(|f| RemoteFile {
                    id: f.id,
                    path: f.path,
                    bytes: f.size,
                })
                .collect(),
            links: self.links,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AdFile {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default, alias = "name", alias = "n")]
    path: String,
    #[serde(default, alias = "s")]
    size: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdAddMagnet {
    #[serde(deserialize_with = "string_or_number")]
    torrent_id: String,
}

#[derive(Debug, Deserialize)]
struct AdLink {
    link: String,
}

fn parse_ad_status(status: &str) -> BackendTorrentState {
    match status.to_lowercase().as_str() {
        "added" | "in queue" | "magnet_conversion" => BackendTorrentState::Registered,
        "waiting_files_selection" => BackendTorrentState::AwaitingFileSelection,
        "queued" | "downloading" | "uploading" | "processing" => BackendTorrentState::Processing,
        "downloaded" | "ready" => BackendTorrentState::Ready,
        "error" | "failed" | "expired" => BackendTorrentState::Failed,
        _ => BackendTorrentState::Processing,
    }
}

#[async_trait]
impl DebridBackend for AllDebridBackend {
    fn provider(&self) -> Provider {
        Provider::AllDebrid
    }

    async fn list_torrents(&self, credential: &str) -> Result<Vec<RemoteTorrent>, BackendError> {
        let torrents: Envelope<Vec<AdTorrent>> = self.api.get(credential, "torrents").await?;
        Ok(torrents
            .into_inner()
            .into_iter()
            .map(AdTorrent::into_remote)
            .collect())
    }

    async fn add_magnet(&self, credential: &str, magnet: &str) -> Result<String, BackendError> {
        let added: Envelope<AdAddMagnet> = self
            .api
            .post_json(credential, "torrent/addMagnet", &json!({ "magnet": magnet }))
            .await?;
        Ok(added.into_inner().torrent_id)
    }

    async fn torrent_info(
        &self,
        credential: &str,
        id: &str,
    ) -> Result<RemoteTorrent, BackendError> {
        let torrent: Envelope<AdTorrent> = self
            .api
            .get(credential, &format!("torrent/{}", id))
            .await?;
        Ok(torrent.into_inner().into_remote())
    }

    async fn select_files(
        &self,
        credential: &str,
        id: &str,
        file_ids: &[String],
    ) -> Result<(), BackendError> {
        self.api
            .post_json_raw(
                credential,
                &format!("torrent/{}/selectFiles", id),
                &json!({ "files": file_ids }),
            )
            .await?;
        Ok(())
    }

    async fn unrestrict(&self, credential: &str, link: &str) -> Result<String, BackendError> {
        let unrestricted: Envelope<AdLink> = self
            .api
            .post_json(credential, "link/unrestrict", &json!({ "link": link }))
            .await?;
        Ok(unrestricted.into_inner().link)
    }
}
