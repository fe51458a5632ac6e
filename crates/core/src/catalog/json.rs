//! Catalog backed by static JSON files.
//!
//! Reads `movies.json`, `series.json` and `episodes.json` from one directory.
//! Each file is either a bare array of records or an object wrapping the
//! array under the section name (`{"movies": [...]}`).

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{
    CatalogError, CatalogLookup, CatalogStats, ContentItem, ContentKind, EpisodeRef, ItemVariant,
    SeriesEntry,
};

/// A field that may be a string, a `|`-separated string, or an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_values(self) -> Vec<String> {
        let raw = match self {
            OneOrMany::One(s) => s.split('|').map(str::to_string).collect(),
            OneOrMany::Many(v) => v,
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Raw catalog record as found on disk.
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    id: String,
    #[serde(default, alias = "name")]
    title: Option<String>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default, alias = "infoHash")]
    hash: Option<OneOrMany>,
    #[serde(default, alias = "q")]
    quality: Option<OneOrMany>,
    #[serde(default, alias = "l")]
    language: Option<OneOrMany>,
}

impl CatalogRecord {
    fn into_item(self, kind: ContentKind) -> ContentItem {
        let hashes = self.hash.map(OneOrMany::into_values).unwrap_or_default();
        let qualities = self.quality.map(OneOrMany::into_values).unwrap_or_default();
        let languages = self.language.map(OneOrMany::into_values).unwrap_or_default();

        let variants = if hashes.len() == 1 {
            // A single torrent: extra quality tags are alternatives, extra
            // language tags are the tracks it carries.
            vec![ItemVariant {
                info_hash: hashes[0].clone(),
                quality: qualities.first().cloned(),
                language: if languages.is_empty() {
                    None
                } else {
                    Some(languages.join(" · "))
                },
            }]
        } else {
            hashes
                .into_iter()
                .enumerate()
                .map(|(i, info_hash)| ItemVariant {
                    info_hash,
                    quality: positional(&qualities, i),
                    language: positional(&languages, i),
                })
                .collect()
        };

        ContentItem {
            id: self.id,
            kind,
            title: self.title,
            poster: self.poster,
            variants,
        }
    }

    fn into_series(self) -> SeriesEntry {
        SeriesEntry {
            id: self.id,
            title: self.title,
            poster: self.poster,
        }
    }
}

/// Tag paired with the hash at `index`, reusing the last tag when short.
fn positional(tags: &[String], index: usize) -> Option<String> {
    tags.get(index).or_else(|| tags.last()).cloned()
}

/// In-memory catalog loaded from JSON files.
#[derive(Debug, Default)]
pub struct JsonCatalog {
    movies: Vec<ContentItem>,
    series: Vec<SeriesEntry>,
    episodes: Vec<ContentItem>,
    /// Item id -> (is_episode, index)
    index: HashMap<String, (bool, usize)>,
}

impl JsonCatalog {
    /// Load all three sections from `dir`. Missing files yield empty sections.
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let movies = read_section(&dir.join("movies.json"), "movies")?
            .into_iter()
            .map(|r| r.into_item(ContentKind::Movie))
            .collect();
        let series = read_section(&dir.join("series.json"), "series")?
            .into_iter()
            .map(CatalogRecord::into_series)
            .collect();
        let episodes = read_section(&dir.join("episodes.json"), "episodes")?
            .into_iter()
            .map(|r| r.into_item(ContentKind::Episode))
            .collect();

        let catalog = Self::from_items(movies, series, episodes);
        let stats = catalog.stats();
        info!(
            "Catalog loaded: {} movies, {} series, {} episodes",
            stats.movies, stats.series, stats.episodes
        );
        Ok(catalog)
    }

    /// Build a catalog from already parsed items.
    pub fn from_items(
        movies: Vec<ContentItem>,
        series: Vec<SeriesEntry>,
        episodes: Vec<ContentItem>,
    ) -> Self {
        let mut index = HashMap::with_capacity(movies.len() + episodes.len());
        for (i, m) in movies.iter().enumerate() {
            index.entry(m.id.clone()).or_insert((false, i));
        }
        for (i, e) in episodes.iter().enumerate() {
            index.entry(e.id.clone()).or_insert((true, i));
        }

        Self {
            movies,
            series,
            episodes,
            index,
        }
    }

    pub fn movies(&self) -> &[ContentItem] {
        &self.movies
    }

    pub fn series(&self) -> &[SeriesEntry] {
        &self.series
    }

    /// Find a series by id.
    pub fn find_series(&self, id: &str) -> Option<&SeriesEntry> {
        self.series.iter().find(|s| s.id == id)
    }

    /// Episodes of a series, ordered by season then episode.
    pub fn episodes_of(&self, series_id: &str) -> Vec<EpisodeRef> {
        let prefix = format!("{}:", series_id);
        let mut episodes: Vec<EpisodeRef> = self
            .episodes
            .iter()
            .filter(|e| e.id.starts_with(&prefix))
            .filter_map(|e| EpisodeRef::parse(&e.id))
            .collect();
        episodes.sort_by_key(|e| (e.season, e.episode));
        episodes
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            movies: self.movies.len(),
            series: self.series.len(),
            episodes: self.episodes.len(),
        }
    }
}

impl CatalogLookup for JsonCatalog {
    fn find_by_id(&self, id: &str) -> Option<ContentItem> {
        match self.index.get(id)? {
            (false, i) => self.movies.get(*i).cloned(),
            (true, i) => self.episodes.get(*i).cloned(),
        }
    }
}

/// Read one section file, accepting a bare array or `{ "<section>": [...] }`.
fn read_section(path: &Path, section: &str) -> Result<Vec<CatalogRecord>, CatalogError> {
    if !path.exists() {
        warn!("Catalog file not found: {}", path.display());
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parse_error = |message: String| CatalogError::Parse {
        path: path.display().to_string(),
        message,
    };

    let value: Value = serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
    let records = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove(section)
            .ok_or_else(|| parse_error(format!("missing \"{}\" array", section)))?,
        _ => return Err(parse_error("expected an array or an object".to_string())),
    };

    serde_json::from_value(records).map_err(|e| parse_error(e.to_string()))
}
