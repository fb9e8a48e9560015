//! Outbound message contract.
//!
//! The core never talks to Telegram directly. It produces [`Outbound`]
//! messages (text plus an optional grid of buttons carrying opaque tokens)
//! and hands them to a [`Delivery`] implementation.

use async_trait::async_trait;
use thiserror::Error;

use anitrack_models::ChatId;

/// A button shown under a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Text on the button.
    pub label: String,
    /// Opaque token sent back when the button is pressed.
    pub token: String,
}

impl Button {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Ordered rows of buttons.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Lays buttons out left to right, at most `per_row` per row.
    pub fn grid(buttons: Vec<Button>, per_row: usize) -> Self {
        let per_row = per_row.max(1);
        let mut rows = Vec::new();
        let mut row = Vec::with_capacity(per_row);
        for button in buttons {
            row.push(button);
            if row.len() == per_row {
                rows.push(std::mem::take(&mut row));
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
        Self { rows }
    }

    /// Appends a row, skipping empty ones.
    pub fn push_row(&mut self, row: Vec<Button>) {
        if !row.is_empty() {
            self.rows.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_empty())
    }

    /// All buttons in display order.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// A message addressed to one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub chat: ChatId,
    pub text: String,
    pub keyboard: Option<Keyboard>,
    /// Whether the client may render a preview of the first link.
    pub link_preview: bool,
}

impl Outbound {
    /// Plain text message without buttons.
    pub fn text(chat: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat,
            text: text.into(),
            keyboard: None,
            link_preview: true,
        }
    }

    /// Attaches a keyboard; an empty keyboard is dropped.
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = if keyboard.is_empty() { None } else { Some(keyboard) };
        self
    }

    /// Suppresses link previews, for messages listing many URLs.
    pub fn without_link_preview(mut self) -> Self {
        self.link_preview = false;
        self
    }
}

/// Errors reported by a delivery channel.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The channel rejected or failed to send the message.
    #[error("failed to deliver message to chat {chat}: {reason}")]
    Failed { chat: ChatId, reason: String },
}

/// Sends messages to subscribers.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, message: &Outbound) -> Result<(), DeliveryError>;
}
