//! Telegram bot interface for Anitrack.
//!
//! This crate connects the Anitrack dialog and notification engine to
//! Telegram: slash commands, text messages and inline button presses are
//! fed to the [`Conversation`](anitrack_core::Conversation), and both its
//! replies and the engine's notices go out through [`TelegramDelivery`].
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//!
//! Optional:
//! - `ANITRACK_STATE_DIR`: State directory (default: ~/.anitrack)
//! - `ANITRACK_CATALOG_URL`: Catalog GraphQL endpoint
//! - `ANITRACK_POLL_INTERVAL_SECS`: Notification tick period (default: 30)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use anitrack_catalog::ShikimoriClient;
//! use anitrack_core::config;
//! use anitrack_persistence::{JsonSubscriptionStore, JsonUserStore};
//! use anitrack_telegram::TelegramBot;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let users = Arc::new(JsonUserStore::open(config::users_file())?);
//!     let subscriptions = Arc::new(JsonSubscriptionStore::open(config::subscriptions_file())?);
//!     let catalog = Arc::new(ShikimoriClient::new()?);
//!
//!     let bot = TelegramBot::new(users, subscriptions, catalog)?;
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Commands
//!
//! - `/start` - Welcome message and menu
//! - `/help` - Show available commands
//! - `/search` - Search anime by name and subscribe
//! - `/subscriptions` - Show subscriptions
//! - `/remove` - Remove subscriptions
//! - `/enable`, `/disable` - Toggle notifications
//! - `/cancel` - Leave the current dialog

pub mod bot;
pub mod delivery;
pub mod error;
pub mod handlers;
pub mod state;

pub use bot::TelegramBot;
pub use delivery::TelegramDelivery;
pub use error::{Result, TelegramError};
pub use state::{create_shared_state, BotState};
