//! Subscriber types.
//!
//! A subscriber is a bot end-user. It is created on the first inbound
//! message from an unseen Telegram id and never deleted by the bot itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChatId, TelegramId, UserId};

/// Profile data captured from the platform at first contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubscriber {
    /// Platform identity of the user.
    pub telegram_id: TelegramId,

    /// Chat the bot talks to this user in.
    pub chat_id: ChatId,

    /// First name as reported by the platform.
    pub first_name: String,

    /// Last name, if the user set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Public @username, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// IETF language tag of the user's client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,

    /// Whether the account is a bot.
    #[serde(default)]
    pub is_bot: bool,
}

impl NewSubscriber {
    /// Creates a minimal profile with only the identity fields set.
    pub fn new(telegram_id: TelegramId, chat_id: ChatId, first_name: impl Into<String>) -> Self {
        Self {
            telegram_id,
            chat_id,
            first_name: first_name.into(),
            last_name: None,
            username: None,
            language_code: None,
            is_bot: false,
        }
    }
}

/// A stored subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Internal account id.
    pub id: UserId,

    /// Platform profile.
    #[serde(flatten)]
    pub profile: NewSubscriber,

    /// Whether episode notifications are delivered to this subscriber.
    pub enabled: bool,

    /// When the subscriber was first seen.
    pub created_at: DateTime<Utc>,
}

impl Subscriber {
    /// Builds a subscriber from a profile. Notifications start enabled.
    pub fn new(id: UserId, profile: NewSubscriber) -> Self {
        Self {
            id,
            profile,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    /// Platform identity of this subscriber.
    pub fn telegram_id(&self) -> TelegramId {
        self.profile.telegram_id
    }

    /// Delivery address of this subscriber.
    pub fn chat_id(&self) -> ChatId {
        self.profile.chat_id
    }

    /// Name used in log lines: `@username` when present, otherwise the first name.
    pub fn display_name(&self) -> String {
        match &self.profile.username {
            Some(username) => format!("@{}", username),
            None => self.profile.first_name.clone(),
        }
    }
}
