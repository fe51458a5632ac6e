//! Mock debrid backend for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::provider::{BackendError, DebridBackend, Provider, RemoteTorrent};

/// Scriptable in-memory [`DebridBackend`].
///
/// - `list_torrents` returns torrents added with [`add_listed`](Self::add_listed)
/// - `add_magnet` returns the infohash of the magnet as torrent id
/// - `torrent_info` replays states scripted per id, repeating the last one
/// - `unrestrict` returns a mapped URL, or `unrestricted:<link>`
///
/// # Example
///
/// ```rust,ignore
/// let backend = MockBackend::new(Provider::RealDebrid);
/// backend.script_states("ABC", vec![
///     fixtures::torrent_in_state("ABC", BackendTorrentState::Processing),
///     fixtures::ready_torrent("ABC", "ABC", "https://rd/link"),
/// ]).await;
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    provider: Provider,
    listed: Arc<RwLock<Vec<RemoteTorrent>>>,
    scripts: Arc<RwLock<HashMap<String, VecDeque<RemoteTorrent>>>>,
    unrestricted: Arc<RwLock<HashMap<String, String>>>,
    added_magnets: Arc<RwLock<Vec<String>>>,
    selections: Arc<RwLock<Vec<(String, Vec<String>)>>>,
    credentials: Arc<RwLock<Vec<String>>>,
    info_calls: Arc<RwLock<usize>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<BackendError>>>,
}

impl MockBackend {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            listed: Arc::new(RwLock::new(Vec::new())),
            scripts: Arc::new(RwLock::new(HashMap::new())),
            unrestricted: Arc::new(RwLock::new(HashMap::new())),
            added_magnets: Arc::new(RwLock::new(Vec::new())),
            selections: Arc::new(RwLock::new(Vec::new())),
            credentials: Arc::new(RwLock::new(Vec::new())),
            info_calls: Arc::new(RwLock::new(0)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Make a torrent show up in `list_torrents`.
    pub async fn add_listed(&self, torrent: RemoteTorrent) {
        self.listed.write().await.push(torrent);
    }

    /// States returned by successive `torrent_info` calls for `id`.
    pub async fn script_states(&self, id: &str, states: Vec<RemoteTorrent>) {
        self.scripts
            .write()
            .await
            .insert(id.to_string(), states.into());
    }

    pub async fn set_unrestricted(&self, link: &str, url: &str) {
        self.unrestricted
            .write()
            .await
            .insert(link.to_string(), url.to_string());
    }

    /// Make the next operation fail with the given error.
    pub async fn set_next_error(&self, error: BackendError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn added_magnets(&self) -> Vec<String> {
        self.added_magnets.read().await.clone()
    }

    /// Recorded `(torrent id, file ids)` selections.
    pub async fn selections(&self) -> Vec<(String, Vec<String>)> {
        self.selections.read().await.clone()
    }

    /// Credential passed to each call, in order.
    pub async fn credentials_seen(&self) -> Vec<String> {
        self.credentials.read().await.clone()
    }

    pub async fn info_calls(&self) -> usize {
        *self.info_calls.read().await
    }

    /// Record the call and return the pending error, if any.
    async fn enter(&self, credential: &str) -> Result<(), BackendError> {
        self.credentials.write().await.push(credential.to_string());
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DebridBackend for MockBackend {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn list_torrents(&self, credential: &str) -> Result<Vec<RemoteTorrent>, BackendError> {
        self.enter(credential).await?;
        Ok(self.listed.read().await.clone())
    }

    async fn add_magnet(&self, credential: &str, magnet: &str) -> Result<String, BackendError> {
        self.enter(credential).await?;
        self.added_magnets.write().await.push(magnet.to_string());

        let hash = magnet
            .split("btih:")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .ok_or_else(|| BackendError::Status {
                status: 400,
                message: "invalid magnet".to_string(),
            })?;
        Ok(hash.to_string())
    }

    async fn torrent_info(
        &self,
        credential: &str,
        id: &str,
    ) -> Result<RemoteTorrent, BackendError> {
        self.enter(credential).await?;
        *self.info_calls.write().await += 1;

        let mut scripts = self.scripts.write().await;
        let states = scripts.get_mut(id).ok_or_else(|| BackendError::Status {
            status: 404,
            message: format!("unknown torrent {}", id),
        })?;

        let state = if states.len() > 1 {
            states.pop_front()
        } else {
            states.front().cloned()
        };
        state.ok_or_else(|| BackendError::Internal("empty script".to_string()))
    }

    async fn select_files(
        &self,
        credential: &str,
        id: &str,
        file_ids: &[String],
    ) -> Result<(), BackendError> {
        self.enter(credential).await?;
        self.selections
            .write()
            .await
            .push((id.to_string(), file_ids.to_vec()));
        Ok(())
    }

    async fn unrestrict(&self, credential: &str, link: &str) -> Result<String, BackendError> {
        self.enter(credential).await?;
        Ok(self
            .unrestricted
            .read()
            .await
            .get(link)
            .cloned()
            .unwrap_or_else(|| format!("unrestricted:{}", link)))
    }
}
