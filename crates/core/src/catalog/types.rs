//! Types for the content catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Kind of catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Movie,
    Episode,
}

/// One playable variant of an item: an infohash plus its display tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemVariant {
    /// BitTorrent infohash, as found in the catalog.
    pub info_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// A playable unit (a movie or a single episode).
///
/// Multi-quality items carry several variants, one per infohash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub variants: Vec<ItemVariant>,
}

impl ContentItem {
    /// Whether the item can be resolved at all.
    pub fn has_hashes(&self) -> bool {
        !self.variants.is_empty()
    }

    /// First quality tag of the item, used for catalog display names.
    pub fn primary_quality(&self) -> Option<&str> {
        self.variants.iter().find_map(|v| v.quality.as_deref())
    }

    /// File name hint for picking the right file out of a season pack.
    pub fn file_hint(&self) -> Option<String> {
        match self.kind {
            ContentKind::Movie => None,
            ContentKind::Episode => EpisodeRef::parse(&self.id)
                .map(|ep| format!("S{:02}E{:02}", ep.season, ep.episode)),
        }
    }
}

/// A series entry. Episodes are separate items with ids
/// `<series id>:<season>:<episode>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

/// Position of an episode within its series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub id: String,
    pub season: u32,
    pub episode: u32,
}

impl EpisodeRef {
    /// Parse `<series>:<season>:<episode>`.
    pub fn parse(id: &str) -> Option<Self> {
        let mut parts = id.rsplitn(3, ':');
        let episode = parts.next()?.parse().ok()?;
        let season = parts.next()?.parse().ok()?;
        let series = parts.next()?;
        if series.is_empty() {
            return None;
        }
        Some(Self {
            id: id.to_string(),
            season,
            episode,
        })
    }
}

/// Number of entries per catalog section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub movies: usize,
    pub series: usize,
    pub episodes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_ref_parse() {
        let ep = EpisodeRef::parse("tt0903747:2:10").unwrap();
        assert_eq!(ep.season, 2);
        assert_eq!(ep.episode, 10);
        assert_eq!(ep.id, "tt0903747:2:10");
    }

    #[test]
    fn test_episode_ref_parse_rejects_malformed() {
        assert!(EpisodeRef::parse("tt0903747").is_none());
        assert!(EpisodeRef::parse("tt0903747:x:1").is_none());
        assert!(EpisodeRef::parse(":1:1").is_none());
    }

    #[test]
    fn test_has_hashes_and_primary_quality() {
        let mut item = ContentItem {
            id: "tt1".to_string(),
            kind: ContentKind::Movie,
            title: None,
            poster: None,
            variants: vec![],
        };
        assert!(!item.has_hashes());
        assert!(item.primary_quality().is_none());

        item.variants.push(ItemVariant {
            info_hash: "abc".to_string(),
            quality: Some("4K".to_string()),
            language: None,
        });
        assert!(item.has_hashes());
        assert_eq!(item.primary_quality(), Some("4K"));
        assert!(item.file_hint().is_none());
    }

    #[test]
    fn test_episode_file_hint() {
        let item = ContentItem {
            id: "tt0903747:2:5".to_string(),
            kind: ContentKind::Episode,
            title: None,
            poster: None,
            variants: vec![],
        };
        assert_eq!(item.file_hint().as_deref(), Some("S02E05"));
    }
}
