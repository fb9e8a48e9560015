//! Inbound event handling.
//!
//! [`Conversation`] owns the per-subscriber sessions and drives each one
//! through its [`Mode`]s. It is transport agnostic: callers feed it an
//! [`Inbound`] event and send back whatever [`Outbound`] messages it
//! returns.
//!
//! Collaborator failures are answered with a plain-language message and
//! never leave a session stuck outside [`Mode::Basic`]. The only errors
//! returned to the caller are ones where no sensible reply exists; the
//! session is reset before they are returned.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use anitrack_catalog::Catalog;
use anitrack_models::{ChatId, NewSubscriber, Subscriber, Subscription, TelegramId, Title, TitleId};
use anitrack_persistence::{CreateOutcome, SubscriptionStore, UserStore};

use crate::delivery::Outbound;
use crate::error::{CoreError, Result};
use crate::render;
use crate::session::{Mode, RemovalEntry, Session, SessionStore};
use crate::token::{Command, Token};

/// Payload of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Free-form text.
    Text(String),
    /// A slash command already recognized by the transport.
    Command(Command),
    /// Raw token of a pressed button.
    Button(String),
}

/// An event from one subscriber.
#[derive(Debug, Clone)]
pub struct Inbound {
    /// Sender profile; stored on first contact.
    pub profile: NewSubscriber,
    pub input: Input,
}

impl Inbound {
    pub fn new(profile: NewSubscriber, input: Input) -> Self {
        Self { profile, input }
    }
}

/// Session state machine over the user and subscription stores.
pub struct Conversation {
    users: Arc<dyn UserStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    catalog: Arc<dyn Catalog>,
    sessions: SessionStore,
}

impl Conversation {
    pub fn new(
        users: Arc<dyn UserStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            catalog,
            sessions: SessionStore::new(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles one event and returns the replies to send, in order.
    ///
    /// Events of the same subscriber are serialized on the session lock.
    pub async fn handle(&self, inbound: Inbound) -> Result<Vec<Outbound>> {
        let telegram_id = inbound.profile.telegram_id;
        let chat = inbound.profile.chat_id;
        let session = self.sessions.get_or_create(telegram_id).await;
        let mut session = session.lock().await;

        let result = match self.resolve_subscriber(inbound.profile).await {
            Ok(subscriber) => self.dispatch(&mut session, chat, &subscriber, inbound.input).await,
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            error!(telegram_id = %telegram_id, error = %err, "Event handling failed");
            // A subscriber that was never greeted keeps the welcome pending.
            if session.mode != Mode::Init {
                session.enter_basic();
            }
        }
        result
    }

    async fn resolve_subscriber(&self, profile: NewSubscriber) -> Result<Subscriber> {
        let telegram_id = profile.telegram_id;
        match self.users.find_by_telegram_id(telegram_id).await {
            Ok(Some(subscriber)) => return Ok(self.refresh_chat(subscriber, profile.chat_id).await),
            Ok(None) => {}
            Err(err) => {
                warn!(telegram_id = %telegram_id, error = %err, "Failed to look up subscriber");
                return Err(CoreError::SubscriberUnavailable(telegram_id));
            }
        }

        if let Err(err) = self.users.create(profile).await {
            warn!(telegram_id = %telegram_id, error = %err, "Failed to register subscriber");
            return Err(CoreError::SubscriberUnavailable(telegram_id));
        }
        info!(telegram_id = %telegram_id, "Registered new subscriber");

        match self.users.find_by_telegram_id(telegram_id).await {
            Ok(Some(subscriber)) => Ok(subscriber),
            Ok(None) => Err(CoreError::SubscriberUnavailable(telegram_id)),
            Err(err) => {
                warn!(telegram_id = %telegram_id, error = %err, "Failed to read back subscriber");
                Err(CoreError::SubscriberUnavailable(telegram_id))
            }
        }
    }

    /// Follows the subscriber to the chat the latest update came from.
    async fn refresh_chat(&self, mut subscriber: Subscriber, chat: ChatId) -> Subscriber {
        if subscriber.chat_id() == chat {
            return subscriber;
        }
        match self.users.set_chat(subscriber.id, chat).await {
            Ok(()) => {
                info!(telegram_id = %subscriber.telegram_id(), chat_id = %chat, "Subscriber chat changed");
                subscriber.profile.chat_id = chat;
            }
            Err(err) => {
                warn!(telegram_id = %subscriber.telegram_id(), error = %err, "Failed to update subscriber chat");
            }
        }
        subscriber
    }

    async fn dispatch(
        &self,
        session: &mut Session,
        chat: ChatId,
        subscriber: &Subscriber,
        input: Input,
    ) -> Result<Vec<Outbound>> {
        debug!(telegram_id = %subscriber.telegram_id(), mode = ?session.mode, input = ?input, "Handling event");

        if session.mode == Mode::Init {
            session.enter_basic();
            return Ok(vec![render::welcome(chat, subscriber.enabled)]);
        }

        if session.mode != Mode::Basic {
            if let Some(command) = escape_command(&input) {
                session.enter_basic();
                if matches!(command, Command::Cancel | Command::Start) {
                    return Ok(vec![render::with_menu(chat, "Cancelled.", subscriber.enabled)]);
                }
                return self.basic(session, chat, subscriber, Some(command)).await;
            }
        }

        match session.mode {
            Mode::Init | Mode::Basic => {
                let command = basic_command(&input);
                self.basic(session, chat, subscriber, command).await
            }
            Mode::Searching => match input {
                Input::Text(term) if !term.trim().is_empty() => {
                    self.search(session, chat, subscriber, term.trim()).await
                }
                _ => Ok(session.last_prompt.clone()),
            },
            Mode::SelectingSubscribe => match selection(&input, session.generation) {
                Some(Token::Select { index, .. }) => {
                    self.subscribe(session, chat, subscriber, index).await
                }
                _ => Ok(session.last_prompt.clone()),
            },
            Mode::SelectingRemove => match selection(&input, session.generation) {
                Some(Token::Select { index, .. }) => {
                    self.remove_one(session, chat, subscriber, index).await
                }
                Some(Token::SelectAll { .. }) => self.remove_all(session, chat, subscriber).await,
                _ => Ok(session.last_prompt.clone()),
            },
        }
    }

    async fn basic(
        &self,
        session: &mut Session,
        chat: ChatId,
        subscriber: &Subscriber,
        command: Option<Command>,
    ) -> Result<Vec<Outbound>> {
        let enabled = subscriber.enabled;
        match command {
            Some(Command::Enable) => Ok(vec![self.set_enabled(chat, subscriber, true).await]),
            Some(Command::Disable) => Ok(vec![self.set_enabled(chat, subscriber, false).await]),
            Some(Command::Subscriptions) => Ok(self.list_subscriptions(chat, subscriber).await),
            Some(Command::Search) => {
                let prompt = vec![render::search_prompt(chat)];
                session.enter_searching(prompt.clone());
                Ok(prompt)
            }
            Some(Command::Remove) => Ok(self.start_removal(session, chat, subscriber).await),
            Some(Command::Help) => Ok(vec![render::help(chat, enabled)]),
            Some(Command::Start) => Ok(vec![render::welcome(chat, enabled)]),
            Some(Command::Cancel) | None => Ok(vec![render::with_menu(chat, "", enabled)]),
        }
    }

    async fn set_enabled(&self, chat: ChatId, subscriber: &Subscriber, enabled: bool) -> Outbound {
        match self.users.set_enabled(subscriber.id, enabled).await {
            Ok(()) => {
                info!(telegram_id = %subscriber.telegram_id(), enabled, "Notification setting changed");
                let text = if enabled {
                    "You have enabled subscription notifications!"
                } else {
                    "You have disabled subscription notifications."
                };
                render::with_menu(chat, text, enabled)
            }
            Err(err) => {
                warn!(telegram_id = %subscriber.telegram_id(), error = %err, "Failed to change notification setting");
                render::with_menu(
                    chat,
                    "Could not update your notification settings, please try again later.",
                    subscriber.enabled,
                )
            }
        }
    }

    /// Loads the subscriber's subscriptions, or `None` after logging a store failure.
    async fn load_subscriptions(&self, subscriber: &Subscriber) -> Option<Vec<Subscription>> {
        match self.subscriptions.find_for_subscriber(subscriber.telegram_id()).await {
            Ok(subs) => Some(subs),
            Err(err) => {
                warn!(telegram_id = %subscriber.telegram_id(), error = %err, "Failed to load subscriptions");
                None
            }
        }
    }

    /// Resolves titles in one catalog call. A catalog failure yields an empty map.
    async fn resolve_titles(&self, subs: &[Subscription]) -> HashMap<TitleId, Title> {
        let ids: Vec<TitleId> = subs.iter().map(|s| s.title_id).collect();
        match self.catalog.search_by_ids(&ids).await {
            Ok(titles) => titles.into_iter().map(|t| (t.id, t)).collect(),
            Err(err) => {
                warn!(error = %err, count = ids.len(), "Failed to resolve subscribed titles");
                HashMap::new()
            }
        }
    }

    async fn list_subscriptions(&self, chat: ChatId, subscriber: &Subscriber) -> Vec<Outbound> {
        let Some(subs) = self.load_subscriptions(subscriber).await else {
            return vec![unavailable(chat, subscriber.enabled)];
        };
        if subs.is_empty() {
            return render::subscription_listing(chat, &[], subscriber.enabled);
        }

        let mut titles = self.resolve_titles(&subs).await;
        let entries: Vec<(Subscription, Option<Title>)> = subs
            .into_iter()
            .map(|sub| {
                let title = titles.remove(&sub.title_id);
                (sub, title)
            })
            .collect();
        render::subscription_listing(chat, &entries, subscriber.enabled)
    }

    async fn start_removal(
        &self,
        session: &mut Session,
        chat: ChatId,
        subscriber: &Subscriber,
    ) -> Vec<Outbound> {
        let Some(subs) = self.load_subscriptions(subscriber).await else {
            return vec![unavailable(chat, subscriber.enabled)];
        };
        if subs.is_empty() {
            return vec![render::with_menu(
                chat,
                "You are not subscribed to any anime notifications.",
                subscriber.enabled,
            )];
        }

        let titles = self.resolve_titles(&subs).await;
        let entries: Vec<RemovalEntry> = subs
            .into_iter()
            .map(|subscription| {
                let name = match titles.get(&subscription.title_id) {
                    Some(title) => title.display_name().to_string(),
                    None => format!("Title #{}", subscription.title_id),
                };
                RemovalEntry { subscription, name }
            })
            .collect();

        let generation = session.next_generation();
        let prompt = render::removal_listing(chat, &entries, generation);
        session.enter_selecting_remove(entries, prompt.clone());
        prompt
    }

    async fn search(
        &self,
        session: &mut Session,
        chat: ChatId,
        subscriber: &Subscriber,
        term: &str,
    ) -> Result<Vec<Outbound>> {
        let enabled = subscriber.enabled;
        let results = match self.catalog.search_by_name(term).await {
            Ok(results) => results,
            Err(err) => {
                warn!(term, error = %err, "Title search failed");
                session.enter_basic();
                return Ok(vec![render::with_menu(
                    chat,
                    "Search is unavailable right now, please try again later.",
                    enabled,
                )]);
            }
        };
        debug!(term, count = results.len(), "Title search finished");

        if results.is_empty() {
            session.enter_basic();
            return Ok(vec![render::with_menu(
                chat,
                &format!("No results for \"{}\".", term),
                enabled,
            )]);
        }

        if results.iter().all(Title::is_released) {
            session.enter_basic();
            return Ok(render::released_listing(chat, &results, enabled));
        }

        let generation = session.next_generation();
        let prompt = render::search_listing(chat, &results, generation);
        session.enter_selecting_subscribe(results, prompt.clone());
        Ok(prompt)
    }

    async fn subscribe(
        &self,
        session: &mut Session,
        chat: ChatId,
        subscriber: &Subscriber,
        index: usize,
    ) -> Result<Vec<Outbound>> {
        let title = session.search_result(index)?.clone();
        session.enter_basic();

        let telegram_id = subscriber.telegram_id();
        let name = title.display_name();
        let text = if title.is_released() {
            format!("{} is already complete, no subscription needed.", name)
        } else {
            match self.subscriptions.find_by_key(telegram_id, title.id).await {
                Ok(Some(_)) => format!("You are already subscribed to {}.", name),
                Ok(None) => self.create_subscription(telegram_id, &title).await,
                Err(err) => {
                    warn!(telegram_id = %telegram_id, title_id = %title.id, error = %err, "Failed to check subscription");
                    format!("Could not subscribe to {}, please try again later.", name)
                }
            }
        };
        Ok(vec![render::with_menu(chat, &text, subscriber.enabled)])
    }

    async fn create_subscription(&self, telegram_id: TelegramId, title: &Title) -> String {
        let name = title.display_name();
        match self
            .subscriptions
            .create(telegram_id, title.id, title.episodes_aired)
            .await
        {
            Ok(CreateOutcome::Created(id)) => {
                info!(
                    telegram_id = %telegram_id,
                    title_id = %title.id,
                    subscription_id = %id,
                    episode = title.episodes_aired,
                    "Subscription created"
                );
                format!("You have subscribed to anime: {}!", name)
            }
            Ok(CreateOutcome::Existing(_)) => format!("You are already subscribed to {}.", name),
            Err(err) => {
                warn!(telegram_id = %telegram_id, title_id = %title.id, error = %err, "Failed to create subscription");
                format!("Could not subscribe to {}, please try again later.", name)
            }
        }
    }

    async fn remove_one(
        &self,
        session: &mut Session,
        chat: ChatId,
        subscriber: &Subscriber,
        index: usize,
    ) -> Result<Vec<Outbound>> {
        let entry = session.removal_entry(index)?.clone();
        session.enter_basic();

        let text = match self.subscriptions.remove(entry.subscription.id).await {
            Ok(()) => {
                info!(telegram_id = %subscriber.telegram_id(), subscription_id = %entry.subscription.id, "Subscription removed");
                format!("Removed subscription {}. {}", index + 1, entry.name)
            }
            Err(err) => {
                warn!(subscription_id = %entry.subscription.id, error = %err, "Failed to remove subscription");
                format!("Could not remove {}, please try again later.", entry.name)
            }
        };
        Ok(vec![render::with_menu(chat, &text, subscriber.enabled)])
    }

    async fn remove_all(
        &self,
        session: &mut Session,
        chat: ChatId,
        subscriber: &Subscriber,
    ) -> Result<Vec<Outbound>> {
        let entries = std::mem::take(&mut session.removal_list);
        session.enter_basic();

        let total = entries.len();
        let mut lines = Vec::with_capacity(total);
        let mut failed = 0;
        for (i, entry) in entries.iter().enumerate() {
            match self.subscriptions.remove(entry.subscription.id).await {
                Ok(()) => lines.push(format!("Removed subscription {}. {}", i + 1, entry.name)),
                Err(err) => {
                    warn!(subscription_id = %entry.subscription.id, error = %err, "Failed to remove subscription");
                    failed += 1;
                }
            }
        }
        info!(telegram_id = %subscriber.telegram_id(), removed = total - failed, total, "Removed all subscriptions");

        if failed == 0 {
            lines.push("All subscriptions removed.".to_string());
        } else {
            lines.push(format!(
                "{} of {} subscriptions could not be removed, please try again later.",
                failed, total
            ));
        }
        let text = lines.join("\n");
        Ok(vec![render::with_menu(chat, &text, subscriber.enabled)])
    }
}

fn unavailable(chat: ChatId, enabled: bool) -> Outbound {
    render::with_menu(
        chat,
        "Your subscriptions are unavailable right now, please try again later.",
        enabled,
    )
}

/// Command meant to leave a dialog: a slash command or a menu button.
fn escape_command(input: &Input) -> Option<Command> {
    match input {
        Input::Command(command) => Some(*command),
        Input::Text(text) => Command::parse_slash(text),
        Input::Button(raw) => match Token::parse(raw) {
            Some(Token::Menu(command)) => Some(command),
            _ => None,
        },
    }
}

/// Command in the main menu, where bare words are accepted too.
fn basic_command(input: &Input) -> Option<Command> {
    match input {
        Input::Text(text) => Command::parse_word(text),
        other => escape_command(other),
    }
}

/// A selection token of the current listing. Tokens of older listings are ignored.
fn selection(input: &Input, generation: u32) -> Option<Token> {
    let Input::Button(raw) = input else {
        return None;
    };
    match Token::parse(raw)? {
        token @ Token::Select { generation: g, .. } if g == generation => Some(token),
        token @ Token::SelectAll { generation: g } if g == generation => Some(token),
        _ => None,
    }
}
