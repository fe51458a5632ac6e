//! Testing utilities and mock implementations.
//!
//! Mocks for the provider seams, so the resolver and the HTTP layer can be
//! exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use debridge_core::testing::{fixtures, MockAdapter};
//!
//! let adapter = MockAdapter::new(Provider::RealDebrid);
//! adapter.fail_hash("ABC", ResolutionError::NoPlayableFile { provider: Provider::RealDebrid }).await;
//! let registry = ProviderRegistry::new().with(Arc::new(adapter.clone()));
//! ```

mod mock_adapter;
mod mock_backend;

pub use mock_adapter::{MockAdapter, RecordedResolve};
pub use mock_backend::MockBackend;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{ContentItem, ContentKind, ItemVariant, JsonCatalog, SeriesEntry};
    use crate::provider::{BackendTorrentState, RemoteFile, RemoteTorrent};

    /// Files with ids `"1"`, `"2"`, ... in the given order.
    pub fn files(paths: &[&str]) -> Vec<RemoteFile> {
        paths
            .iter()
            .enumerate()
            .map(|(i, path)| RemoteFile {
                id: (i + 1).to_string(),
                path: path.to_string(),
                bytes: 1024 * 1024 * 700,
            })
            .collect()
    }

    /// A torrent whose hash equals its id, with no files or links.
    pub fn torrent_in_state(id: &str, state: BackendTorrentState) -> RemoteTorrent {
        RemoteTorrent {
            id: id.to_string(),
            hash: id.to_string(),
            state,
            files: Vec::new(),
            links: Vec::new(),
        }
    }

    /// A torrent waiting for file selection.
    pub fn awaiting_selection(id: &str, paths: &[&str]) -> RemoteTorrent {
        RemoteTorrent {
            files: files(paths),
            ..torrent_in_state(id, BackendTorrentState::AwaitingFileSelection)
        }
    }

    /// A downloaded torrent exposing one link.
    pub fn ready_torrent(id: &str, hash: &str, link: &str) -> RemoteTorrent {
        RemoteTorrent {
            id: id.to_string(),
            hash: hash.to_string(),
            state: BackendTorrentState::Ready,
            files: files(&["/Movie.mkv"]),
            links: vec![link.to_string()],
        }
    }

    /// A movie with one variant per `(hash, quality, language)` entry.
    pub fn movie(id: &str, variants: &[(&str, Option<&str>, Option<&str>)]) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            kind: ContentKind::Movie,
            title: Some(format!("Movie {}", id)),
            poster: None,
            variants: variants
                .iter()
                .map(|(hash, quality, language)| ItemVariant {
                    info_hash: hash.to_string(),
                    quality: quality.map(str::to_string),
                    language: language.map(str::to_string),
                })
                .collect(),
        }
    }

    /// An untagged single-hash episode.
    pub fn episode(id: &str, info_hash: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            kind: ContentKind::Episode,
            title: None,
            poster: None,
            variants: vec![ItemVariant {
                info_hash: info_hash.to_string(),
                quality: None,
                language: None,
            }],
        }
    }

    pub fn series(id: &str, title: &str) -> SeriesEntry {
        SeriesEntry {
            id: id.to_string(),
            title: Some(title.to_string()),
            poster: None,
        }
    }

    /// In-memory catalog, splitting items into movies and episodes.
    pub fn catalog(items: Vec<ContentItem>, series: Vec<SeriesEntry>) -> JsonCatalog {
        let (episodes, movies) = items
            .into_iter()
            .partition(|i| i.kind == ContentKind::Episode);
        JsonCatalog::from_items(movies, series, episodes)
    }
}
