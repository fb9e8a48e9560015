//! Error types for the core crate.

use thiserror::Error;

use anitrack_catalog::CatalogError;
use anitrack_models::TelegramId;
use anitrack_persistence::PersistenceError;

use crate::delivery::DeliveryError;

/// Errors raised while handling an inbound event or running a tick.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("store error: {0}")]
    Store(#[from] PersistenceError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// The subscriber record could not be created or read back.
    #[error("subscriber {0} could not be resolved")]
    SubscriberUnavailable(TelegramId),

    /// A selection pointed past the end of the current listing.
    #[error("selection {index} out of range for listing of {len}")]
    SelectionOutOfRange { index: usize, len: usize },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
