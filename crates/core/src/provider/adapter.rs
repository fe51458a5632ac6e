//! Generic resolution driver on top of a [`DebridBackend`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::cache::normalize_hash;
use crate::metrics;
use crate::polling::{poll_until, PollError, PollPolicy};

use super::{
    select_video_file, BackendError, BackendTorrentState, DebridBackend, PlayableLink, Provider,
    ProviderAdapter, RemoteTorrent, ResolutionError,
};

/// Drives any debrid backend from an infohash to a playable link.
///
/// 1. Reuse a torrent already ready on the account.
/// 2. Otherwise register the magnet and poll until it is ready, answering
///    file selection requests along the way.
/// 3. If the ready torrent exposes no links, select a file again and re-fetch.
/// 4. Unrestrict the first link.
pub struct DebridAdapter<B> {
    backend: B,
    policy: PollPolicy,
    reselect_delay: Duration,
}

impl<B: DebridBackend> DebridAdapter<B> {
    pub fn new(backend: B, policy: PollPolicy, reselect_delay: Duration) -> Self {
        Self {
            backend,
            policy,
            reselect_delay,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn reject(&self, err: BackendError) -> ResolutionError {
        ResolutionError::rejected(self.backend.provider(), err)
    }

    /// Look for a torrent with this hash that is already downloaded.
    async fn find_ready(
        &self,
        credential: &str,
        hash: &str,
    ) -> Result<Option<RemoteTorrent>, BackendError> {
        let torrents = self.backend.list_torrents(credential).await?;
        Ok(torrents
            .into_iter()
            .find(|t| t.matches_hash(hash) && t.state == BackendTorrentState::Ready))
    }

    /// One poll: fetch the state and answer a file selection request.
    async fn advance(
        &self,
        credential: &str,
        id: &str,
        file_hint: Option<&str>,
    ) -> Result<RemoteTorrent, BackendError> {
        let torrent = self.backend.torrent_info(credential, id).await?;
        debug!(id, state = ?torrent.state, "Polled torrent");

        if torrent.state == BackendTorrentState::AwaitingFileSelection {
            if let Some(file) = select_video_file(&torrent.files, file_hint) {
                debug!(id, file = %file.path, "Selecting file");
                self.backend
                    .select_files(credential, id, std::slice::from_ref(&file.id))
                    .await?;
            }
        }

        Ok(torrent)
    }

    async fn register_and_wait(
        &self,
        credential: &str,
        hash: &str,
        file_hint: Option<&str>,
    ) -> Result<RemoteTorrent, ResolutionError> {
        let provider = self.backend.provider();
        let magnet = format!("magnet:?xt=urn:btih:{}", hash);
        let id = self
            .backend
            .add_magnet(credential, &magnet)
            .await
            .map_err(|e| self.reject(e))?;
        info!(%provider, hash, id = %id, "Registered magnet");

        let mut polls: u32 = 0;
        let result = poll_until(
            || {
                polls += 1;
                self.advance(credential, &id, file_hint)
            },
            |t: &RemoteTorrent| t.state.is_terminal(),
            &self.policy,
        )
        .await;

        metrics::POLL_ATTEMPTS
            .with_label_values(&[provider.as_str()])
            .observe(polls as f64);

        match result {
            Ok(torrent) if torrent.state == BackendTorrentState::Failed => {
                Err(ResolutionError::ProviderRejected {
                    provider,
                    reason: format!("torrent {} failed on the backend", id),
                })
            }
            Ok(torrent) => Ok(torrent),
            Err(PollError::Timeout { attempts }) => {
                Err(ResolutionError::ProviderTimeout { provider, attempts })
            }
            Err(PollError::Poll(e)) => Err(self.reject(e)),
        }
    }

    /// Ready but link-less torrents need their file selection repeated.
    async fn reselect(
        &self,
        credential: &str,
        torrent: &RemoteTorrent,
        file_hint: Option<&str>,
    ) -> Result<RemoteTorrent, BackendError> {
        warn!(id = %torrent.id, "Ready torrent has no links, selecting files again");
        let fresh = self.backend.torrent_info(credential, &torrent.id).await?;
        if let Some(file) = select_video_file(&fresh.files, file_hint) {
            self.backend
                .select_files(credential, &torrent.id, std::slice::from_ref(&file.id))
                .await?;
        }

        tokio::time::sleep(self.reselect_delay).await;
        self.backend.torrent_info(credential, &torrent.id).await
    }

    async fn resolve_inner(
        &self,
        credential: &str,
        info_hash: &str,
        file_hint: Option<&str>,
    ) -> Result<PlayableLink, ResolutionError> {
        let provider = self.backend.provider();
        let hash = normalize_hash(info_hash);

        let existing = self
            .find_ready(credential, &hash)
            .await
            .map_err(|e| self.reject(e))?;
        let mut torrent = match existing {
            Some(torrent) => {
                debug!(%provider, hash = %hash, "Torrent already ready on account");
                torrent
            }
            None => self.register_and_wait(credential, &hash, file_hint).await?,
        };

        if torrent.links.is_empty() {
            torrent = self
                .reselect(credential, &torrent, file_hint)
                .await
                .map_err(|e| self.reject(e))?;
        }

        let link = torrent
            .links
            .first()
            .ok_or(ResolutionError::NoPlayableFile { provider })?;

        let url = self
            .backend
            .unrestrict(credential, link)
            .await
            .map_err(|e| self.reject(e))?;

        Ok(PlayableLink {
            url,
            provider_label: provider.label().to_string(),
        })
    }
}

#[async_trait]
impl<B: DebridBackend> ProviderAdapter for DebridAdapter<B> {
    fn provider(&self) -> Provider {
        self.backend.provider()
    }

    async fn resolve(
        &self,
        credential: &str,
        info_hash: &str,
        file_hint: Option<&str>,
    ) -> Result<PlayableLink, ResolutionError> {
        let provider = self.backend.provider();
        let start = Instant::now();

        let result = self.resolve_inner(credential, info_hash, file_hint).await;

        metrics::RESOLUTION_DURATION
            .with_label_values(&[provider.as_str()])
            .observe(start.elapsed().as_secs_f64());
        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::RESOLUTIONS
            .with_label_values(&[provider.as_str(), label])
            .inc();

        match &result {
            Ok(_) => info!(%provider, hash = info_hash, "Resolved playable link"),
            Err(e) => warn!(%provider, hash = info_hash, error = %e, "Resolution failed"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockBackend};
    use tokio_test::{assert_err, assert_ok};

    fn adapter(backend: MockBackend) -> DebridAdapter<MockBackend> {
        DebridAdapter::new(
            backend,
            PollPolicy {
                interval: Duration::from_secs(3),
                max_attempts: 40,
            },
            Duration::from_secs(2),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_ready_torrent_skips_registration() {
        let backend = MockBackend::new(Provider::RealDebrid);
        backend
            .add_listed(fixtures::ready_torrent("T1", "abc123", "https://rd/link/1"))
            .await;
        backend.set_unrestricted("https://rd/link/1", "https://cdn/movie.mkv").await;

        let adapter = adapter(backend);
        let link = assert_ok!(adapter.resolve("tok", " abc123 ", None).await);

        assert_eq!(link.url, "https://cdn/movie.mkv");
        assert_eq!(link.provider_label, "Real-Debrid");
        assert!(adapter.backend().added_magnets().await.is_empty());
        assert_eq!(adapter.backend().credentials_seen().await, vec!["tok".to_string(); 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registers_polls_and_selects_video_file() {
        let backend = MockBackend::new(Provider::TorBox);
        backend
            .script_states(
                "ABC",
                vec![
                    fixtures::torrent_in_state("ABC", BackendTorrentState::Registered),
                    fixtures::awaiting_selection("ABC", &["/sample.txt", "/Movie.mkv"]),
                    fixtures::torrent_in_state("ABC", BackendTorrentState::Processing),
                    fixtures::ready_torrent("ABC", "ABC", "https://tb/dl/1"),
                ],
            )
            .await;

        let adapter = adapter(backend);
        let start = tokio::time::Instant::now();
        let link = assert_ok!(adapter.resolve("tok", "abc", None).await);

        assert_eq!(link.url, "unrestricted:https://tb/dl/1");
        assert_eq!(
            adapter.backend().added_magnets().await,
            vec!["magnet:?xt=urn:btih:ABC".to_string()]
        );
        assert_eq!(
            adapter.backend().selections().await,
            vec![("ABC".to_string(), vec!["2".to_string()])]
        );
        // Four polls, three sleeps
        assert_eq!(start.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_ceiling_yields_timeout() {
        let backend = MockBackend::new(Provider::AllDebrid);
        backend
            .script_states(
                "DEF",
                vec![fixtures::torrent_in_state("DEF", BackendTorrentState::Processing)],
            )
            .await;

        let adapter = adapter(backend);
        let err = assert_err!(adapter.resolve("tok", "def", None).await);

        assert!(matches!(
            err,
            ResolutionError::ProviderTimeout {
                provider: Provider::AllDebrid,
                attempts: 40
            }
        ));
        assert_eq!(adapter.backend().info_calls().await, 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_torrent_is_rejected() {
        let backend = MockBackend::new(Provider::RealDebrid);
        backend
            .script_states(
                "BAD",
                vec![fixtures::torrent_in_state("BAD", BackendTorrentState::Failed)],
            )
            .await;

        let err = assert_err!(adapter(backend).resolve("tok", "bad", None).await);
        assert!(matches!(err, ResolutionError::ProviderRejected { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_rejected() {
        let backend = MockBackend::new(Provider::RealDebrid);
        backend
            .set_next_error(BackendError::Status {
                status: 401,
                message: "bad_token".to_string(),
            })
            .await;

        let err = assert_err!(adapter(backend).resolve("tok", "abc", None).await);
        match err {
            ResolutionError::ProviderRejected { provider, reason } => {
                assert_eq!(provider, Provider::RealDebrid);
                assert!(reason.contains("bad_token"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_without_links_reselects() {
        let backend = MockBackend::new(Provider::RealDebrid);
        let mut linkless = fixtures::ready_torrent("R1", "EEE", "unused");
        linkless.links.clear();
        linkless.files = fixtures::files(&["/Movie.mp4"]);
        backend.add_listed(linkless.clone()).await;
        backend
            .script_states(
                "R1",
                vec![linkless, fixtures::ready_torrent("R1", "EEE", "https://rd/l/9")],
            )
            .await;

        let adapter = adapter(backend);
        let start = tokio::time::Instant::now();
        let link = assert_ok!(adapter.resolve("tok", "eee", None).await);

        assert_eq!(link.url, "unrestricted:https://rd/l/9");
        assert_eq!(
            adapter.backend().selections().await,
            vec![("R1".to_string(), vec!["1".to_string()])]
        );
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_links_after_reselect_is_no_playable_file() {
        let backend = MockBackend::new(Provider::TorBox);
        let mut linkless = fixtures::ready_torrent("Z", "ZZZ", "unused");
        linkless.links.clear();
        backend.add_listed(linkless.clone()).await;
        backend.script_states("Z", vec![linkless]).await;

        let err = assert_err!(adapter(backend).resolve("tok", "zzz", None).await);
        assert!(matches!(
            err,
            ResolutionError::NoPlayableFile {
                provider: Provider::TorBox
            }
        ));
    }
}
