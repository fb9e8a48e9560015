//! Test doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use anitrack_catalog::{Catalog, CatalogError};
use anitrack_models::{
    ChatId, NewSubscriber, ReleaseStatus, Subscriber, Subscription, SubscriptionId, TelegramId,
    Title, TitleId, UserId,
};
use anitrack_persistence::{
    CreateOutcome, JsonSubscriptionStore, JsonUserStore, PersistenceError, SubscriptionStore,
    UserStore,
};

use crate::delivery::{Delivery, DeliveryError, Outbound};

pub fn title(id: u64, name: &str, aired: u32, status: ReleaseStatus) -> Title {
    Title {
        id: TitleId(id),
        name: name.to_string(),
        english: None,
        japanese: None,
        status,
        episodes: 0,
        episodes_aired: aired,
        url: format!("https://shikimori.one/animes/{}", id),
    }
}

pub fn profile(telegram_id: i64) -> NewSubscriber {
    NewSubscriber::new(TelegramId(telegram_id), ChatId(telegram_id), "Tester")
}

pub fn json_stores(dir: &Path) -> (JsonUserStore, JsonSubscriptionStore) {
    let users = JsonUserStore::open(dir.join("users.json")).unwrap();
    let subs = JsonSubscriptionStore::open(dir.join("subscriptions.json")).unwrap();
    (users, subs)
}

fn injected() -> PersistenceError {
    PersistenceError::WriteError {
        path: "injected".into(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
    }
}

/// In-memory catalog with switchable failure.
#[derive(Default)]
pub struct FakeCatalog {
    titles: Mutex<HashMap<TitleId, Title>>,
    searches: Mutex<HashMap<String, Vec<Title>>>,
    failing: AtomicBool,
    pub id_calls: AtomicUsize,
    pub name_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a title returned by id lookups.
    pub fn put(&self, title: Title) {
        self.titles.lock().unwrap().insert(title.id, title);
    }

    /// Results of a name search; each title is also made available by id.
    pub fn set_search(&self, term: &str, results: Vec<Title>) {
        for title in &results {
            self.put(title.clone());
        }
        self.searches
            .lock()
            .unwrap()
            .insert(term.to_string(), results);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CatalogError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CatalogError::RequestFailed("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn search_by_name(&self, term: &str) -> anitrack_catalog::Result<Vec<Title>> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .searches
            .lock()
            .unwrap()
            .get(term)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_by_ids(&self, ids: &[TitleId]) -> anitrack_catalog::Result<Vec<Title>> {
        self.id_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let titles = self.titles.lock().unwrap();
        Ok(ids.iter().filter_map(|id| titles.get(id).cloned()).collect())
    }
}

/// Delivery that records every message it accepts.
#[derive(Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<Outbound>>,
    failing: AtomicBool,
    pub attempts: AtomicUsize,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn deliver(&self, message: &Outbound) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Failed {
                chat: message.chat,
                reason: "injected failure".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// User store wrapper whose calls can be made to fail.
pub struct FlakyUsers<S> {
    inner: S,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl<S> FlakyUsers<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl<S: UserStore> UserStore for FlakyUsers<S> {
    async fn find_by_telegram_id(
        &self,
        telegram_id: TelegramId,
    ) -> anitrack_persistence::Result<Option<Subscriber>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.find_by_telegram_id(telegram_id).await
    }

    async fn create(&self, profile: NewSubscriber) -> anitrack_persistence::Result<UserId> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.create(profile).await
    }

    async fn set_enabled(&self, id: UserId, enabled: bool) -> anitrack_persistence::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.set_enabled(id, enabled).await
    }

    async fn set_chat(&self, id: UserId, chat_id: ChatId) -> anitrack_persistence::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.set_chat(id, chat_id).await
    }
}

/// Subscription store wrapper whose mutations can be made to fail.
pub struct FlakySubscriptions<S> {
    inner: S,
    pub fail_writes: AtomicBool,
}

impl<S> FlakySubscriptions<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
        }
    }

    fn check(&self) -> anitrack_persistence::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(injected())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: SubscriptionStore> SubscriptionStore for FlakySubscriptions<S> {
    async fn find_all(&self) -> anitrack_persistence::Result<Vec<Subscription>> {
        self.inner.find_all().await
    }

    async fn find_for_subscriber(
        &self,
        subscriber: TelegramId,
    ) -> anitrack_persistence::Result<Vec<Subscription>> {
        self.inner.find_for_subscriber(subscriber).await
    }

    async fn find_by_key(
        &self,
        subscriber: TelegramId,
        title_id: TitleId,
    ) -> anitrack_persistence::Result<Option<Subscription>> {
        self.inner.find_by_key(subscriber, title_id).await
    }

    async fn create(
        &self,
        subscriber: TelegramId,
        title_id: TitleId,
        initial_counter: u32,
    ) -> anitrack_persistence::Result<CreateOutcome> {
        self.check()?;
        self.inner.create(subscriber, title_id, initial_counter).await
    }

    async fn set_counter(&self, id: SubscriptionId, value: u32) -> anitrack_persistence::Result<()> {
        self.check()?;
        self.inner.set_counter(id, value).await
    }

    async fn remove(&self, id: SubscriptionId) -> anitrack_persistence::Result<()> {
        self.check()?;
        self.inner.remove(id).await
    }
}
