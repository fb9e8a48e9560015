//! File-backed subscriber store.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use anitrack_models::{ChatId, NewSubscriber, Subscriber, TelegramId, UserId};

use crate::error::{PersistenceError, Result};
use crate::store::UserStore;
use crate::table::JsonTable;

/// Subscribers kept in a single JSON table, unique by Telegram id.
pub struct JsonUserStore {
    table: JsonTable<Subscriber>,
}

impl JsonUserStore {
    /// Opens (or lazily creates) the table at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            table: JsonTable::open(path)?,
        })
    }
}

#[async_trait]
impl UserStore for JsonUserStore {
    async fn find_by_telegram_id(&self, telegram_id: TelegramId) -> Result<Option<Subscriber>> {
        Ok(self
            .table
            .read(|t| t.rows.iter().find(|u| u.telegram_id() == telegram_id).cloned())
            .await)
    }

    async fn create(&self, profile: NewSubscriber) -> Result<UserId> {
        let telegram_id = profile.telegram_id;
        let (id, created) = self
            .table
            .update(move |t| {
                if let Some(existing) = t.rows.iter().find(|u| u.telegram_id() == profile.telegram_id) {
                    return Ok((existing.id, false));
                }
                let id = UserId(t.allocate_id());
                t.rows.push(Subscriber::new(id, profile));
                Ok((id, true))
            })
            .await?;

        if created {
            info!(user_id = %id, telegram_id = %telegram_id, "Subscriber stored");
        }
        Ok(id)
    }

    async fn set_enabled(&self, id: UserId, enabled: bool) -> Result<()> {
        self.table
            .update(|t| {
                let user = t
                    .rows
                    .iter_mut()
                    .find(|u| u.id == id)
                    .ok_or_else(|| PersistenceError::NotFound {
                        kind: "subscriber",
                        id: id.to_string(),
                    })?;
                user.enabled = enabled;
                Ok(())
            })
            .await?;

        info!(user_id = %id, enabled, "Notification flag updated");
        Ok(())
    }

    async fn set_chat(&self, id: UserId, chat_id: ChatId) -> Result<()> {
        self.table
            .update(|t| {
                let user = t
                    .rows
                    .iter_mut()
                    .find(|u| u.id == id)
                    .ok_or_else(|| PersistenceError::NotFound {
                        kind: "subscriber",
                        id: id.to_string(),
                    })?;
                user.profile.chat_id = chat_id;
                Ok(())
            })
            .await?;

        info!(user_id = %id, chat_id = %chat_id, "Subscriber chat updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn profile(telegram_id: i64) -> NewSubscriber {
        NewSubscriber::new(TelegramId(telegram_id), ChatId(telegram_id), "Himmel")
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let dir = tempdir().unwrap();
        let store = JsonUserStore::open(dir.path().join("users.json")).unwrap();

        let id = store.create(profile(100)).await.unwrap();
        let found = store.find_by_telegram_id(TelegramId(100)).await.unwrap().unwrap();

        assert_eq!(found.id, id);
        assert!(found.enabled);
        assert!(store.find_by_telegram_id(TelegramId(101)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_is_idempotent_per_telegram_id() {
        let dir = tempdir().unwrap();
        let store = JsonUserStore::open(dir.path().join("users.json")).unwrap();

        let first = store.create(profile(100)).await.unwrap();
        let second = store.create(profile(100)).await.unwrap();
        let other = store.create(profile(200)).await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_set_enabled_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonUserStore::open(&path).unwrap();
        let id = store.create(profile(100)).await.unwrap();

        store.set_enabled(id, false).await.unwrap();

        let reopened = JsonUserStore::open(&path).unwrap();
        let user = reopened.find_by_telegram_id(TelegramId(100)).await.unwrap().unwrap();
        assert!(!user.enabled);
    }

    #[tokio::test]
    async fn test_set_enabled_unknown_user() {
        let dir = tempdir().unwrap();
        let store = JsonUserStore::open(dir.path().join("users.json")).unwrap();

        let result = store.set_enabled(UserId(99), true).await;
        assert!(matches!(result, Err(PersistenceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_set_chat_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonUserStore::open(&path).unwrap();
        let id = store.create(profile(100)).await.unwrap();

        store.set_chat(id, ChatId(-500)).await.unwrap();

        let reopened = JsonUserStore::open(&path).unwrap();
        let user = reopened.find_by_telegram_id(TelegramId(100)).await.unwrap().unwrap();
        assert_eq!(user.chat_id(), ChatId(-500));
        assert_eq!(user.telegram_id(), TelegramId(100));
    }

    #[tokio::test]
    async fn test_set_chat_unknown_user() {
        let dir = tempdir().unwrap();
        let store = JsonUserStore::open(dir.path().join("users.json")).unwrap();

        let result = store.set_chat(UserId(99), ChatId(1)).await;
        assert!(matches!(result, Err(PersistenceError::NotFound { .. })));
    }
}
