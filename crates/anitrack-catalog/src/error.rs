//! Error types for catalog lookups.

use thiserror::Error;

/// Errors that can occur while talking to the catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid catalog endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Transport-level failure (connect, timeout, TLS).
    #[error("catalog request failed: {0}")]
    RequestFailed(String),

    /// The catalog answered with a non-success status.
    #[error("catalog returned HTTP {0}")]
    Status(u16),

    /// The response body is not the expected JSON shape.
    #[error("failed to decode catalog response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The GraphQL layer reported errors.
    #[error("catalog query failed: {0}")]
    Graphql(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        CatalogError::RequestFailed(e.to_string())
    }
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
