//! File-backed subscription store.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use anitrack_models::{Subscription, SubscriptionId, TelegramId, TitleId};

use crate::error::{PersistenceError, Result};
use crate::store::{CreateOutcome, SubscriptionStore};
use crate::table::JsonTable;

/// Subscriptions kept in a single JSON table.
///
/// One row per (subscriber, title) pair; rows are appended with increasing
/// ids, so insertion order is id order.
pub struct JsonSubscriptionStore {
    table: JsonTable<Subscription>,
}

impl JsonSubscriptionStore {
    /// Opens (or lazily creates) the table at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            table: JsonTable::open(path)?,
        })
    }
}

#[async_trait]
impl SubscriptionStore for JsonSubscriptionStore {
    async fn find_all(&self) -> Result<Vec<Subscription>> {
        Ok(self.table.read(|t| t.rows.clone()).await)
    }

    async fn find_for_subscriber(&self, subscriber: TelegramId) -> Result<Vec<Subscription>> {
        Ok(self
            .table
            .read(|t| {
                t.rows
                    .iter()
                    .filter(|s| s.subscriber == subscriber)
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn find_by_key(&self, subscriber: TelegramId, title_id: TitleId) -> Result<Option<Subscription>> {
        Ok(self
            .table
            .read(|t| t.rows.iter().find(|s| s.matches(subscriber, title_id)).cloned())
            .await)
    }

    async fn create(
        &self,
        subscriber: TelegramId,
        title_id: TitleId,
        initial_counter: u32,
    ) -> Result<CreateOutcome> {
        let outcome = self
            .table
            .update(|t| {
                if let Some(existing) = t.rows.iter().find(|s| s.matches(subscriber, title_id)) {
                    return Ok(CreateOutcome::Existing(existing.id));
                }
                let id = SubscriptionId(t.allocate_id());
                t.rows
                    .push(Subscription::new(id, subscriber, title_id, initial_counter));
                Ok(CreateOutcome::Created(id))
            })
            .await?;

        match outcome {
            CreateOutcome::Created(id) => info!(
                subscription_id = %id,
                subscriber = %subscriber,
                title_id = %title_id,
                last_episode = initial_counter,
                "Subscription added"
            ),
            CreateOutcome::Existing(id) => debug!(
                subscription_id = %id,
                subscriber = %subscriber,
                title_id = %title_id,
                "Subscription already exists"
            ),
        }
        Ok(outcome)
    }

    async fn set_counter(&self, id: SubscriptionId, value: u32) -> Result<()> {
        self.table
            .update(|t| {
                let row = t
                    .rows
                    .iter_mut()
                    .find(|s| s.id == id)
                    .ok_or_else(|| PersistenceError::NotFound {
                        kind: "subscription",
                        id: id.to_string(),
                    })?;
                row.set_counter(value);
                Ok(())
            })
            .await
    }

    async fn remove(&self, id: SubscriptionId) -> Result<()> {
        let removed = self
            .table
            .update(|t| {
                let before = t.rows.len();
                t.rows.retain(|s| s.id != id);
                Ok(before != t.rows.len())
            })
            .await?;

        if removed {
            info!(subscription_id = %id, "Subscription removed");
        }
        Ok(())
    }
}
