//! Notification engine.
//!
//! On every tick the engine compares each stored subscription with the
//! catalog's current view of its title and sends at most one message per
//! subscription. It shares no in-memory state with [`Conversation`]; the
//! stores are the only meeting point.
//!
//! A message is always sent before the matching store mutation. If the
//! send fails nothing is mutated and the next tick retries; if the
//! mutation fails after a successful send the subscriber may be notified
//! twice, which is the only tolerated inconsistency.
//!
//! [`Conversation`]: crate::conversation::Conversation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use anitrack_catalog::Catalog;
use anitrack_models::{Subscriber, Subscription, TelegramId, Title, TitleId};
use anitrack_persistence::{SubscriptionStore, UserStore};

use crate::delivery::Delivery;
use crate::render;

/// What a tick should do with one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The title is fully released: notify once, then delete.
    Complete,
    /// New episodes aired: notify about the latest one and advance the counter.
    NewEpisode(u32),
    /// Nothing to report.
    Unchanged,
}

/// Compares a subscription with the current state of its title.
///
/// Completion wins over new episodes. A lower aired count than the stored
/// counter is treated as nothing new.
pub fn decide(subscription: &Subscription, title: &Title) -> Decision {
    if title.is_released() {
        Decision::Complete
    } else if title.episodes_aired > subscription.last_episode_notified {
        Decision::NewEpisode(title.episodes_aired)
    } else {
        Decision::Unchanged
    }
}

/// Counters of one tick, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Subscriptions loaded from the store.
    pub subscriptions: usize,
    /// Subscriptions compared against a fetched title.
    pub checked: usize,
    /// New-episode notices sent.
    pub notified: usize,
    /// Completion notices sent and subscriptions deleted.
    pub completed: usize,
    /// Skipped: disabled or unknown owner, or title not fetched.
    pub skipped: usize,
    /// Send or store failures.
    pub failed: usize,
}

/// Periodic reconciliation of subscriptions against the catalog.
pub struct NotificationEngine {
    users: Arc<dyn UserStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    catalog: Arc<dyn Catalog>,
    delivery: Arc<dyn Delivery>,
}

impl NotificationEngine {
    pub fn new(
        users: Arc<dyn UserStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        catalog: Arc<dyn Catalog>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            catalog,
            delivery,
        }
    }

    /// Runs one reconciliation pass over every subscription.
    ///
    /// Never fails: collaborator errors are logged and the affected
    /// subscriptions are left for the next tick.
    pub async fn run_tick(&self) -> TickReport {
        let mut report = TickReport::default();

        let subs = match self.subscriptions.find_all().await {
            Ok(subs) => subs,
            Err(err) => {
                warn!(error = %err, "Failed to load subscriptions, skipping tick");
                return report;
            }
        };
        report.subscriptions = subs.len();
        if subs.is_empty() {
            return report;
        }

        let eligible = self.eligible(subs, &mut report).await;
        if eligible.is_empty() {
            return report;
        }

        let mut ids: Vec<TitleId> = eligible.iter().map(|(sub, _)| sub.title_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let titles: HashMap<TitleId, Title> = match self.catalog.search_by_ids(&ids).await {
            Ok(titles) => titles.into_iter().map(|t| (t.id, t)).collect(),
            Err(err) => {
                warn!(error = %err, titles = ids.len(), "Catalog fetch failed, skipping tick");
                report.skipped += eligible.len();
                return report;
            }
        };

        for (sub, owner) in eligible {
            match titles.get(&sub.title_id) {
                Some(title) => {
                    report.checked += 1;
                    self.reconcile(&sub, &owner, title, &mut report).await;
                }
                None => {
                    debug!(subscription_id = %sub.id, title_id = %sub.title_id, "Title not returned by catalog");
                    report.skipped += 1;
                }
            }
        }

        report
    }

    /// Pairs subscriptions with their owners, dropping disabled and unknown ones.
    async fn eligible(
        &self,
        subs: Vec<Subscription>,
        report: &mut TickReport,
    ) -> Vec<(Subscription, Subscriber)> {
        let mut owners: HashMap<TelegramId, Option<Subscriber>> = HashMap::new();
        let mut eligible = Vec::with_capacity(subs.len());

        for sub in subs {
            if !owners.contains_key(&sub.subscriber) {
                let owner = match self.users.find_by_telegram_id(sub.subscriber).await {
                    Ok(owner) => owner,
                    Err(err) => {
                        warn!(telegram_id = %sub.subscriber, error = %err, "Failed to load subscriber");
                        None
                    }
                };
                owners.insert(sub.subscriber, owner);
            }

            match owners.get(&sub.subscriber).cloned().flatten() {
                Some(owner) if owner.enabled => eligible.push((sub, owner)),
                Some(_) => report.skipped += 1,
                None => {
                    debug!(subscription_id = %sub.id, telegram_id = %sub.subscriber, "No usable owner for subscription");
                    report.skipped += 1;
                }
            }
        }

        eligible
    }

    async fn reconcile(
        &self,
        sub: &Subscription,
        owner: &Subscriber,
        title: &Title,
        report: &mut TickReport,
    ) {
        let chat = owner.chat_id();
        match decide(sub, title) {
            Decision::Unchanged => {}
            Decision::Complete => {
                let notice = render::completed_notice(chat, title);
                if let Err(err) = self.delivery.deliver(&notice).await {
                    warn!(subscription_id = %sub.id, error = %err, "Failed to send completion notice");
                    report.failed += 1;
                    return;
                }
                match self.subscriptions.remove(sub.id).await {
                    Ok(()) => {
                        info!(subscription_id = %sub.id, title_id = %title.id, "Title complete, subscription removed");
                        report.completed += 1;
                    }
                    Err(err) => {
                        error!(subscription_id = %sub.id, error = %err, "Completion notice sent but subscription not removed");
                        report.failed += 1;
                    }
                }
            }
            Decision::NewEpisode(episode) => {
                let notice = render::new_episode_notice(chat, title, episode);
                if let Err(err) = self.delivery.deliver(&notice).await {
                    warn!(subscription_id = %sub.id, error = %err, "Failed to send episode notice");
                    report.failed += 1;
                    return;
                }
                match self.subscriptions.set_counter(sub.id, episode).await {
                    Ok(()) => {
                        info!(subscription_id = %sub.id, title_id = %title.id, episode, "Episode notice sent");
                        report.notified += 1;
                    }
                    Err(err) => {
                        error!(subscription_id = %sub.id, episode, error = %err, "Episode notice sent but counter not recorded");
                        report.failed += 1;
                    }
                }
            }
        }
    }

    /// Ticks every `period` until `shutdown` flips to true or its sender is
    /// dropped. A tick in progress is always finished first.
    pub async fn run(self: Arc<Self>, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "Notification engine started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = self.run_tick().await;
                    if report.notified + report.completed + report.failed > 0 {
                        info!(?report, "Tick finished");
                    } else {
                        debug!(?report, "Tick finished");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Notification engine stopped");
    }
}
