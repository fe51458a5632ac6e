//! TorBox transport.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::ProviderConfig;

use super::http::{string_or_number, ApiClient, Envelope};
use super::{BackendError, BackendTorrentState, DebridBackend, Provider, RemoteFile, RemoteTorrent};

pub const DEFAULT_BASE_URL: &str = "https://api.torbox.app";

/// TorBox API client.
pub struct TorBoxBackend {
    api: ApiClient,
}

impl TorBoxBackend {
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
struct TbTorrent {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    hash: String,
    #[serde(default, alias = "download_state")]
    status: String,
    #[serde(default)]
    files: Vec<TbFile>,
    #[serde(default)]
    links: Vec<String>,
}

impl TbTorrent {
    fn into_remote(self) -> RemoteTorrent {
        RemoteTorrent {
            state: parse_tb_status(&self.status),
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
struct TbFile {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default, alias = "name", alias = "short_name")]
    path: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct TbCreated {
    #[serde(deserialize_with = "string_or_number", alias = "torrent_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct TbLink {
    link: String,
}

fn parse_tb_status(status: &str) -> BackendTorrentState {
    match status.to_lowercase().as_str() {
        "metadl" | "checking" | "added" => BackendTorrentState::Registered,
        "waiting_files_selection" => BackendTorrentState::AwaitingFileSelection,
        "queued" | "downloading" | "uploading" | "paused" | "stalled (no seeds)" => {
            BackendTorrentState::Processing
        }
        "downloaded" | "completed" | "cached" => BackendTorrentState::Ready,
        "error" | "failed" => BackendTorrentState::Failed,
        _ => BackendTorrentState::Processing,
    }
}

#[async_trait]
impl DebridBackend for TorBoxBackend {
    fn provider(&self) -> Provider {
        Provider::TorBox
    }

    async fn list_torrents(&self, credential: &str) -> Result<Vec<RemoteTorrent>, BackendError> {
        let torrents: Envelope<Vec<TbTorrent>> = self.api.get(credential, "torrents").await?;
        Ok(torrents
            .into_inner()
            .into_iter()
            .map(TbTorrent::into_remote)
            .collect())
    }

    async fn add_magnet(&self, credential: &str, magnet: &str) -> Result<String, BackendError> {
        let created: Envelope<TbCreated> = self
            .api
            .post_json(credential, "torrent/add", &json!({ "magnet": magnet }))
            .await?;
        Ok(created.into_inner().id)
    }

    async fn torrent_info(
        &self,
        credential: &str,
        id: &str,
    ) -> Result<RemoteTorrent, BackendError> {
        let torrent: Envelope<TbTorrent> = self
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
        let unrestricted: Envelope<TbLink> = self
            .api
            .post_json(credential, "link/unrestrict", &json!({ "link": link }))
            .await?;
        Ok(unrestricted.into_inner().link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_parse_tb_status() {
        assert_eq!(parse_tb_status("downloaded"), BackendTorrentState::Ready);
        assert_eq!(parse_tb_status("cached"), BackendTorrentState::Ready);
        assert_eq!(parse_tb_status("metaDL"), BackendTorrentState::Registered);
        assert_eq!(
            parse_tb_status("waiting_files_selection"),
            BackendTorrentState::AwaitingFileSelection
        );
        assert_eq!(parse_tb_status("failed"), BackendTorrentState::Failed);
    }

    #[tokio::test]
    async fn test_list_torrents_bare_array() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/torrents")
            .match_header("authorization", "Bearer tb-key")
            .with_status(200)
            .with_body(r#"[{"id": 7, "hash": "abc", "status": "downloaded", "links": ["https://torbox.app/l/7"]}]"#)
            .create_async()
            .await;

        let backend = TorBoxBackend::with_base_url(server.url()).unwrap();
        let torrents = backend.list_torrents("tb-key").await.unwrap();

        mock.assert_async().await;
        assert_eq!(torrents[0].id, "7");
        assert!(torrents[0].matches_hash("ABC"));
        assert_eq!(torrents[0].links, vec!["https://torbox.app/l/7".to_string()]);
    }

    #[tokio::test]
    async fn test_add_magnet_returns_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/torrent/add")
            .match_body(Matcher::Json(json!({"magnet": "magnet:?xt=urn:btih:ABC"})))
            .with_status(200)
            .with_body(r#"{"id": 8}"#)
            .create_async()
            .await;

        let backend = TorBoxBackend::with_base_url(server.url()).unwrap();
        let id = backend
            .add_magnet("tb-key", "magnet:?xt=urn:btih:ABC")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(id, "8");
    }

    #[tokio::test]
    async fn test_torrent_info() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/torrent/8")
            .with_status(200)
            .with_body(
                r#"{"success": true, "data": {"id": 8, "hash": "abc", "status": "downloading",
                    "files": [{"id": 0, "name": "Show/Ep1.mkv", "size": 99}]}}"#,
            )
            .create_async()
            .await;

        let backend = TorBoxBackend::with_base_url(server.url()).unwrap();
        let torrent = backend.torrent_info("tb-key", "8").await.unwrap();
        assert_eq!(torrent.state, BackendTorrentState::Processing);
        assert_eq!(torrent.files[0].path, "Show/Ep1.mkv");
        assert!(torrent.links.is_empty());
    }

    #[tokio::test]
    async fn test_unrestrict() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/link/unrestrict")
            .with_status(200)
            .with_body(r#"{"link": "https://store.torbox.app/Ep1.mkv"}"#)
            .create_async()
            .await;

        let backend = TorBoxBackend::with_base_url(format!("{}/", server.url())).unwrap();
        let url = backend
            .unrestrict("tb-key", "https://torbox.app/l/7")
            .await
            .unwrap();
        assert_eq!(url, "https://store.torbox.app/Ep1.mkv");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_connection_error() {
        // Nothing listens on port 9 of localhost
        let backend = TorBoxBackend::with_base_url("http://127.0.0.1:9").unwrap();
        let err = backend.list_torrents("tb-key").await.unwrap_err();
        assert!(matches!(err, BackendError::ConnectionFailed(_)));
    }
}
