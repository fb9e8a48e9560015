//! Catalog trait definition.

use async_trait::async_trait;

use anitrack_models::{Title, TitleId};

use crate::error::Result;

/// Read-only lookup of current title metadata.
///
/// Results are never cached by callers: every call reflects the catalog's
/// state at that moment.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Search titles by name. Returns an empty list when nothing matches.
    async fn search_by_name(&self, term: &str) -> Result<Vec<Title>>;

    /// Fetch titles by id.
    ///
    /// Returns whatever subset of `ids` currently resolves, in no
    /// particular order; callers must cope with missing entries.
    async fn search_by_ids(&self, ids: &[TitleId]) -> Result<Vec<Title>>;
}
