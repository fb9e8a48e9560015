//! Store contracts consumed by the bot.
//!
//! Both traits are object-safe so the bot can hold them as
//! `Arc<dyn UserStore>` / `Arc<dyn SubscriptionStore>` and tests can swap
//! in their own implementations. Every operation is atomic on its own; the
//! bot never needs a transaction spanning two calls.

use async_trait::async_trait;

use anitrack_models::{ChatId, NewSubscriber, Subscriber, Subscription, SubscriptionId, TelegramId, TitleId, UserId};

use crate::error::Result;

/// Result of a subscription create request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new row was inserted.
    Created(SubscriptionId),
    /// A row for the same (subscriber, title) pair already existed; nothing changed.
    Existing(SubscriptionId),
}

impl CreateOutcome {
    /// Id of the row that now links the pair.
    pub fn id(self) -> SubscriptionId {
        match self {
            CreateOutcome::Created(id) | CreateOutcome::Existing(id) => id,
        }
    }

    /// Returns true if this call inserted the row.
    pub fn is_created(self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

/// Durable mapping from platform identity to subscriber record.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a subscriber by platform id.
    async fn find_by_telegram_id(&self, telegram_id: TelegramId) -> Result<Option<Subscriber>>;

    /// Store a new subscriber with notifications enabled.
    ///
    /// Creating an already known platform id is a no-op that returns the
    /// existing account id.
    async fn create(&self, profile: NewSubscriber) -> Result<UserId>;

    /// Turn episode notifications on or off.
    async fn set_enabled(&self, id: UserId, enabled: bool) -> Result<()>;

    /// Point notifications at a different chat.
    async fn set_chat(&self, id: UserId, chat_id: ChatId) -> Result<()>;
}

/// Durable mapping from (subscriber, title) to last notified episode.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// All subscriptions of all subscribers, ordered by id.
    async fn find_all(&self) -> Result<Vec<Subscription>>;

    /// Subscriptions owned by one subscriber, ordered by id.
    async fn find_for_subscriber(&self, subscriber: TelegramId) -> Result<Vec<Subscription>>;

    /// The subscription linking a subscriber to a title, if any.
    async fn find_by_key(&self, subscriber: TelegramId, title_id: TitleId) -> Result<Option<Subscription>>;

    /// Create a subscription unless the pair is already linked.
    async fn create(
        &self,
        subscriber: TelegramId,
        title_id: TitleId,
        initial_counter: u32,
    ) -> Result<CreateOutcome>;

    /// Overwrite the last notified episode of a subscription.
    async fn set_counter(&self, id: SubscriptionId, value: u32) -> Result<()>;

    /// Delete a subscription. Removing an unknown id is a no-op.
    async fn remove(&self, id: SubscriptionId) -> Result<()>;
}
