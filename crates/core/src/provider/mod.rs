//! Provider adapters - turn an infohash into a playable link.
//!
//! Each debrid vendor is a [`DebridBackend`] transport. The shared
//! [`DebridAdapter`] runs the resolution algorithm on top of any transport,
//! so vendor quirks stay inside their own module.

mod adapter;
mod alldebrid;
mod backend;
mod http;
mod p2p;
mod realdebrid;
mod registry;
mod torbox;
mod types;

pub use adapter::DebridAdapter;
pub use alldebrid::AllDebridBackend;
pub use backend::{is_video_file, select_video_file, DebridBackend};
pub use p2p::{build_magnet, MagnetBuilder, MagnetDescriptor};
pub use realdebrid::RealDebridBackend;
pub use registry::ProviderRegistry;
pub use torbox::TorBoxBackend;
pub use types::*;

use async_trait::async_trait;

/// Resolves an infohash to a playable link through one provider.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter serves.
    fn provider(&self) -> Provider;

    /// Resolve `info_hash` using the caller's `credential`.
    ///
    /// `file_hint` narrows file selection in multi-file torrents (for
    /// example `S01E02` for an episode inside a season pack).
    async fn resolve(
        &self,
        credential: &str,
        info_hash: &str,
        file_hint: Option<&str>,
    ) -> Result<PlayableLink, ResolutionError>;
}
