//! Anitrack Core - subscription tracking shared by every Anitrack frontend.
//!
//! - **config**: Configuration paths and environment variable names
//! - **conversation**: Per-subscriber dialog state machine
//! - **delivery**: Outbound message contract
//! - **engine**: Periodic notification reconciliation
//! - **render**: Message texts and keyboards
//! - **session**: In-memory dialog sessions
//! - **token**: Command vocabulary and button tokens

pub mod config;
pub mod conversation;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod render;
pub mod session;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{
    ensure_runtime_state_dir, env_file, runtime_state_dir, state_dir, subscriptions_file,
    users_file,
};
pub use conversation::{Conversation, Inbound, Input};
pub use delivery::{Button, Delivery, DeliveryError, Keyboard, Outbound};
pub use engine::{decide, Decision, NotificationEngine, TickReport};
pub use error::{CoreError, Result};
pub use session::{Mode, Session, SessionStore};
pub use token::{Command, Token};
