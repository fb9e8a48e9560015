//! Shared state for the Telegram bot.

use std::sync::Arc;

use teloxide::Bot;

use anitrack_catalog::Catalog;
use anitrack_core::{Conversation, Delivery, NotificationEngine};
use anitrack_persistence::{SubscriptionStore, UserStore};

use crate::delivery::TelegramDelivery;

/// State shared by the update handlers and the tick loop.
pub struct BotState {
    /// Dialog state machine; owns the in-memory sessions.
    pub conversation: Conversation,
    /// Reconciliation engine run by the tick loop.
    pub engine: Arc<NotificationEngine>,
    /// Outbound channel used for handler replies.
    pub delivery: Arc<dyn Delivery>,
}

impl BotState {
    pub fn new(
        delivery: Arc<dyn Delivery>,
        users: Arc<dyn UserStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        let conversation = Conversation::new(
            Arc::clone(&users),
            Arc::clone(&subscriptions),
            Arc::clone(&catalog),
        );
        let engine = Arc::new(NotificationEngine::new(
            users,
            subscriptions,
            catalog,
            Arc::clone(&delivery),
        ));
        Self {
            conversation,
            engine,
            delivery,
        }
    }
}

/// Builds the shared state with replies going out through `bot`.
pub fn create_shared_state(
    bot: &Bot,
    users: Arc<dyn UserStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    catalog: Arc<dyn Catalog>,
) -> Arc<BotState> {
    let delivery: Arc<dyn Delivery> = Arc::new(TelegramDelivery::new(bot.clone()));
    Arc::new(BotState::new(delivery, users, subscriptions, catalog))
}
