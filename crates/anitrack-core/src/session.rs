//! Per-subscriber dialog state.
//!
//! Sessions live in memory only. A restart puts every subscriber back in
//! [`Mode::Init`], which greets them again on their next message.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use anitrack_models::{Subscription, TelegramId, Title};

use crate::delivery::Outbound;
use crate::error::{CoreError, Result};

/// Dialog mode of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// No interaction since startup.
    #[default]
    Init,
    /// Main menu.
    Basic,
    /// Waiting for a search term.
    Searching,
    /// Waiting for a pick from the search results.
    SelectingSubscribe,
    /// Waiting for a pick from the subscription list.
    SelectingRemove,
}

/// A subscription offered for removal, with the name it was listed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalEntry {
    pub subscription: Subscription,
    pub name: String,
}

/// Dialog state of one subscriber.
#[derive(Debug, Default)]
pub struct Session {
    pub mode: Mode,
    /// Search results, valid in [`Mode::SelectingSubscribe`].
    pub search_results: Vec<Title>,
    /// Removal candidates, valid in [`Mode::SelectingRemove`].
    pub removal_list: Vec<RemovalEntry>,
    /// Messages of the prompt currently awaiting an answer.
    pub last_prompt: Vec<Outbound>,
    /// Generation of the most recent listing.
    pub generation: u32,
}

impl Session {
    /// Back to the main menu, dropping any listing.
    pub fn enter_basic(&mut self) {
        self.mode = Mode::Basic;
        self.search_results.clear();
        self.removal_list.clear();
        self.last_prompt.clear();
    }

    pub fn enter_searching(&mut self, prompt: Vec<Outbound>) {
        self.enter_basic();
        self.mode = Mode::Searching;
        self.last_prompt = prompt;
    }

    pub fn enter_selecting_subscribe(&mut self, results: Vec<Title>, prompt: Vec<Outbound>) {
        self.enter_basic();
        self.mode = Mode::SelectingSubscribe;
        self.search_results = results;
        self.last_prompt = prompt;
    }

    pub fn enter_selecting_remove(&mut self, entries: Vec<RemovalEntry>, prompt: Vec<Outbound>) {
        self.enter_basic();
        self.mode = Mode::SelectingRemove;
        self.removal_list = entries;
        self.last_prompt = prompt;
    }

    /// Starts a new listing generation and returns it.
    pub fn next_generation(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn search_result(&self, index: usize) -> Result<&Title> {
        self.search_results
            .get(index)
            .ok_or(CoreError::SelectionOutOfRange {
                index,
                len: self.search_results.len(),
            })
    }

    pub fn removal_entry(&self, index: usize) -> Result<&RemovalEntry> {
        self.removal_list
            .get(index)
            .ok_or(CoreError::SelectionOutOfRange {
                index,
                len: self.removal_list.len(),
            })
    }
}

/// In-memory sessions keyed by Telegram id.
///
/// Each session sits behind its own mutex so events of one subscriber are
/// handled one at a time while different subscribers proceed in parallel.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<TelegramId, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session of `telegram_id`, creating it in [`Mode::Init`].
    pub async fn get_or_create(&self, telegram_id: TelegramId) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(&telegram_id) {
            return session.clone();
        }
        self.sessions
            .write()
            .await
            .entry(telegram_id)
            .or_default()
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
