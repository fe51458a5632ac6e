//! Stremio addon routes: manifest, catalog, meta and stream.
//!
//! The first path segment configures the addon: `provider=credential`
//! (provider case-insensitive) or a bare credential, which means
//! Real-Debrid. Routes without that segment serve P2P magnets.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use debridge_core::{CatalogLookup, ContentKind, Provider, StreamLink};

use crate::state::AppState;

pub const MOVIES_CATALOG: &str = "debridge_movies";
pub const SERIES_CATALOG: &str = "debridge_series";

/// Provider and credential decoded from the configuration segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonSelection {
    pub provider: Provider,
    pub credential: Option<String>,
}

impl AddonSelection {
    /// Parse `provider=credential` or a bare credential.
    ///
    /// Returns `None` when the provider name is not recognized.
    pub fn parse(segment: &str) -> Option<Self> {
        let (provider, credential) = match segment.split_once('=') {
            Some((name, credential)) => (name.parse().ok()?, credential),
            None => (Provider::RealDebrid, segment),
        };
        let credential = credential.trim();

        Some(Self {
            provider,
            credential: (!credential.is_empty()).then(|| credential.to_string()),
        })
    }
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    pub resources: Vec<&'static str>,
    pub types: Vec<&'static str>,
    pub catalogs: Vec<ManifestCatalog>,
    pub id_prefixes: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ManifestCatalog {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MetaPreview {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetasResponse {
    pub metas: Vec<MetaPreview>,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<Video>,
}

#[derive(Debug, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub season: u32,
    pub episode: u32,
}

#[derive(Debug, Serialize)]
pub struct MetaResponse {
    pub meta: Option<Meta>,
}

#[derive(Debug, Serialize)]
pub struct StreamObject {
    pub name: String,
    pub title: String,
    pub url: String,
}

impl From<StreamLink> for StreamObject {
    fn from(link: StreamLink) -> Self {
        Self {
            name: link.provider_label,
            title: link.title,
            url: link.url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<StreamObject>,
}

impl StreamsResponse {
    fn empty() -> Self {
        Self {
            streams: Vec::new(),
        }
    }
}

/// `tt123.json` -> `tt123`
fn strip_json(id: &str) -> &str {
    id.strip_suffix(".json").unwrap_or(id)
}

// =============================================================================
// Manifest
// =============================================================================

pub async fn manifest(State(state): State<Arc<AppState>>) -> Json<Manifest> {
    let addon = &state.config().addon;
    Json(Manifest {
        id: addon.id.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        name: addon.name.clone(),
        description: addon.description.clone(),
        logo: addon.logo.clone(),
        background: addon.background.clone(),
        resources: vec!["catalog", "meta", "stream"],
        types: vec!["movie", "series"],
        catalogs: vec![
            ManifestCatalog {
                kind: "movie",
                id: MOVIES_CATALOG,
                name: "Movies",
            },
            ManifestCatalog {
                kind: "series",
                id: SERIES_CATALOG,
                name: "Series",
            },
        ],
        id_prefixes: vec!["tt"],
    })
}

pub async fn configured_manifest(
    state: State<Arc<AppState>>,
    Path(_config): Path<String>,
) -> Json<Manifest> {
    manifest(state).await
}

// =============================================================================
// Catalog
// =============================================================================

pub async fn catalog(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Json<MetasResponse> {
    Json(list_catalog(&state, &kind, strip_json(&id)))
}

pub async fn configured_catalog(
    State(state): State<Arc<AppState>>,
    Path((_config, kind, id)): Path<(String, String, String)>,
) -> Json<MetasResponse> {
    Json(list_catalog(&state, &kind, strip_json(&id)))
}

fn list_catalog(state: &AppState, kind: &str, catalog_id: &str) -> MetasResponse {
    let logo = state.config().addon.logo.clone();
    let catalog = state.catalog();

    let metas = match (kind, catalog_id) {
        ("movie", MOVIES_CATALOG) => catalog
            .movies()
            .iter()
            .map(|m| {
                let title = m.title.clone().unwrap_or_else(|| m.id.clone());
                MetaPreview {
                    id: m.id.clone(),
                    kind: "movie",
                    name: match m.primary_quality() {
                        Some(quality) => format!("{} ({})", title, quality),
                        None => title,
                    },
                    poster: m.poster.clone().or_else(|| logo.clone()),
                }
            })
            .collect(),
        ("series", SERIES_CATALOG) => catalog
            .series()
            .iter()
            .map(|s| MetaPreview {
                id: s.id.clone(),
                kind: "series",
                name: s.title.clone().unwrap_or_else(|| s.id.clone()),
                poster: s.poster.clone().or_else(|| logo.clone()),
            })
            .collect(),
        _ => {
            debug!(kind, catalog_id, "Unknown catalog");
            Vec::new()
        }
    };

    MetasResponse { metas }
}

// =============================================================================
// Meta
// =============================================================================

pub async fn meta(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Json<MetaResponse> {
    Json(find_meta(&state, &kind, strip_json(&id)))
}

pub async fn configured_meta(
    State(state): State<Arc<AppState>>,
    Path((_config, kind, id)): Path<(String, String, String)>,
) -> Json<MetaResponse> {
    Json(find_meta(&state, &kind, strip_json(&id)))
}

fn find_meta(state: &AppState, kind: &str, id: &str) -> MetaResponse {
    let catalog = state.catalog();

    let meta = match kind {
        "movie" => catalog
            .find_by_id(id)
            .filter(|m| m.kind == ContentKind::Movie)
            .map(|m| Meta {
                name: m.title.unwrap_or_else(|| m.id.clone()),
                id: m.id,
                kind: "movie",
                poster: m.poster,
                videos: Vec::new(),
            }),
        "series" => {
            // Episode ids are accepted too: `tt123:1:2` -> `tt123`
            let base_id = id.split(':').next().unwrap_or(id);
            catalog.find_series(base_id).map(|s| Meta {
                id: s.id.clone(),
                kind: "series",
                name: s.title.clone().unwrap_or_else(|| s.id.clone()),
                poster: s.poster.clone(),
                videos: catalog
                    .episodes_of(&s.id)
                    .into_iter()
                    .map(|ep| Video {
                        title: format!("Episode {}", ep.episode),
                        id: ep.id,
                        season: ep.season,
                        episode: ep.episode,
                    })
                    .collect(),
            })
        }
        _ => None,
    };

    MetaResponse { meta }
}

// =============================================================================
// Stream
// =============================================================================

/// Whether the catalog item behind `id` has the type named in the route.
///
/// Unknown ids pass through; the resolver reports them.
fn kind_matches(state: &AppState, kind: &str, id: &str) -> bool {
    let expected = match kind {
        "movie" => ContentKind::Movie,
        "series" => ContentKind::Episode,
        _ => return false,
    };
    state
        .catalog()
        .find_by_id(id)
        .map_or(true, |item| item.kind == expected)
}

/// Streams without a configuration segment: magnets only.
pub async fn stream(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Json<StreamsResponse> {
    let id = strip_json(&id);
    if !kind_matches(&state, &kind, id) {
        debug!(%kind, id, "Stream type does not match catalog item");
        return Json(StreamsResponse::empty());
    }

    let links = state
        .resolver()
        .resolve_stream(id, Provider::P2P, None)
        .await;
    Json(StreamsResponse {
        streams: links.into_iter().map(StreamObject::from).collect(),
    })
}

pub async fn configured_stream(
    State(state): State<Arc<AppState>>,
    Path((config, kind, id)): Path<(String, String, String)>,
) -> Json<StreamsResponse> {
    let Some(selection) = AddonSelection::parse(&config) else {
        warn!("Unknown provider in addon configuration");
        return Json(StreamsResponse::empty());
    };
    let id = strip_json(&id);
    if !kind_matches(&state, &kind, id) {
        debug!(%kind, id, "Stream type does not match catalog item");
        return Json(StreamsResponse::empty());
    }

    let links = state
        .resolver()
        .resolve_stream(
            id,
            selection.provider,
            selection.credential.as_deref(),
        )
        .await;
    Json(StreamsResponse {
        streams: links.into_iter().map(StreamObject::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_and_credential() {
        assert_eq!(
            AddonSelection::parse("alldebrid=KEY123"),
            Some(AddonSelection {
                provider: Provider::AllDebrid,
                credential: Some("KEY123".to_string()),
            })
        );
        assert_eq!(
            AddonSelection::parse("TorBox=abc").unwrap().provider,
            Provider::TorBox
        );
    }

    #[test]
    fn test_parse_bare_credential_defaults_to_realdebrid() {
        assert_eq!(
            AddonSelection::parse("018302"),
            Some(AddonSelection {
                provider: Provider::RealDebrid,
                credential: Some("018302".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_empty_credential() {
        assert_eq!(
            AddonSelection::parse("p2p="),
            Some(AddonSelection {
                provider: Provider::P2P,
                credential: None,
            })
        );
    }

    #[test]
    fn test_parse_unknown_provider() {
        assert!(AddonSelection::parse("premiumize=abc").is_none());
    }

    #[test]
    fn test_credential_may_contain_equals() {
        let selection = AddonSelection::parse("realdebrid=abc==").unwrap();
        assert_eq!(selection.credential.as_deref(), Some("abc=="));
    }

    #[test]
    fn test_strip_json() {
        assert_eq!(strip_json("tt1.json"), "tt1");
        assert_eq!(strip_json("tt1:1:2.json"), "tt1:1:2");
        assert_eq!(strip_json("tt1"), "tt1");
    }
}
