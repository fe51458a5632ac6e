//! Content catalog - maps stable item ids to the infohashes that play them.
//!
//! The catalog is loaded once at startup and never mutated by the engine.

mod json;
mod types;

pub use json::JsonCatalog;
pub use types::*;

/// Read-only lookup of content items.
pub trait CatalogLookup: Send + Sync {
    /// Find a movie or episode by its id.
    fn find_by_id(&self, id: &str) -> Option<ContentItem>;
}
