//! Subscription types.
//!
//! A subscription links one subscriber to one catalog title and remembers
//! the last episode the subscriber was notified about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SubscriptionId, TelegramId, TitleId};

/// The durable link from a subscriber to a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Row id.
    pub id: SubscriptionId,

    /// Owning subscriber's platform id.
    pub subscriber: TelegramId,

    /// Catalog id of the tracked title.
    pub title_id: TitleId,

    /// Aired-episode count the subscriber was last told about.
    pub last_episode_notified: u32,

    /// When the subscription was created.
    pub created_at: DateTime<Utc>,

    /// When the counter last changed.
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Creates a subscription seeded with the title's current aired count.
    pub fn new(
        id: SubscriptionId,
        subscriber: TelegramId,
        title_id: TitleId,
        last_episode_notified: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            subscriber,
            title_id,
            last_episode_notified,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if this row links the given subscriber and title.
    pub fn matches(&self, subscriber: TelegramId, title_id: TitleId) -> bool {
        self.subscriber == subscriber && self.title_id == title_id
    }

    /// Records a new notified episode count.
    pub fn set_counter(&mut self, value: u32) {
        self.last_episode_notified = value;
        self.updated_at = Utc::now();
    }
}
