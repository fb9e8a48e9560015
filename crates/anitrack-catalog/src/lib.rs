//! Anime catalog access for Anitrack.
//!
//! The bot only needs two lookups from the catalog: a name search for the
//! subscribe flow and a by-id fetch for rendering and reconciliation. Both
//! are behind the [`Catalog`] trait; [`ShikimoriClient`] implements it
//! against the Shikimori GraphQL API.

pub mod catalog;
pub mod error;
pub mod shikimori;

pub use catalog::Catalog;
pub use error::{CatalogError, Result};
pub use shikimori::{ShikimoriClient, DEFAULT_ENDPOINT, MAX_IDS_PER_REQUEST};
