//! Persistence layer for Anitrack.
//!
//! This crate defines the store contracts the bot consumes
//! ([`UserStore`], [`SubscriptionStore`]) and file-backed implementations
//! that keep each table in a single JSON file, rewritten atomically
//! (write to temp file, then rename) on every mutation.
//!
//! # Example
//!
//! ```no_run
//! use anitrack_models::{TelegramId, TitleId};
//! use anitrack_persistence::{JsonSubscriptionStore, SubscriptionStore};
//!
//! # async fn demo() -> anitrack_persistence::Result<()> {
//! let store = JsonSubscriptionStore::open("/home/user/.anitrack/state/subscriptions.json")?;
//! let outcome = store.create(TelegramId(1), TitleId(52991), 12).await?;
//! println!("subscription {}", outcome.id());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod store;
pub mod subscription_store;
pub mod table;
pub mod user_store;

pub use error::{PersistenceError, Result};
pub use store::{CreateOutcome, SubscriptionStore, UserStore};
pub use subscription_store::JsonSubscriptionStore;
pub use user_store::JsonUserStore;
