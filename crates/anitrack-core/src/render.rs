//! Message rendering.
//!
//! Pure functions turning titles and subscriptions into [`Outbound`]
//! messages. Listings longer than [`MAX_MESSAGE_CHARS`] are split into
//! several messages; each page carries the buttons of its own entries and
//! the last page carries the shared trailing controls.

use anitrack_models::{ChatId, Subscription, Title};

use crate::delivery::{Button, Keyboard, Outbound};
use crate::session::RemovalEntry;
use crate::token::{Command, Token};

/// Page size limit, kept under Telegram's 4096 character cap.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Selection buttons per keyboard row.
pub const BUTTONS_PER_ROW: usize = 5;

const MENU_PROMPT: &str = "Please choose one of the options:";

/// One rendered list item and its selection control, if it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub text: String,
    pub button: Option<Button>,
}

/// A chunk of a listing that fits in one message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub text: String,
    pub buttons: Vec<Button>,
}

/// Main menu keyboard. The notification toggle offers the opposite of the
/// current setting.
pub fn main_menu(enabled: bool) -> Keyboard {
    let toggle = if enabled {
        Button::new("Disable notifications", Command::Disable.as_str())
    } else {
        Button::new("Enable notifications", Command::Enable.as_str())
    };

    let mut keyboard = Keyboard::default();
    keyboard.push_row(vec![toggle]);
    keyboard.push_row(vec![Button::new("Show subscriptions", Command::Subscriptions.as_str())]);
    keyboard.push_row(vec![Button::new("Remove subscriptions", Command::Remove.as_str())]);
    keyboard.push_row(vec![Button::new("Search anime by name", Command::Search.as_str())]);
    keyboard
}

fn menu_text(enabled: bool) -> String {
    let status = if enabled {
        "Notifications are on."
    } else {
        "Notifications are off."
    };
    format!("{}\n{}", status, MENU_PROMPT)
}

/// `body` followed by the main menu.
pub fn with_menu(chat: ChatId, body: &str, enabled: bool) -> Outbound {
    let body = body.trim_end();
    let text = if body.is_empty() {
        menu_text(enabled)
    } else {
        format!("{}\n\n{}", body, menu_text(enabled))
    };
    Outbound::text(chat, text).with_keyboard(main_menu(enabled))
}

/// Greeting sent on first contact.
pub fn welcome(chat: ChatId, enabled: bool) -> Outbound {
    with_menu(
        chat,
        "Welcome! I can notify you when new episodes of an anime are aired.\n\
         Search for a title, subscribe to it, and I will message you about \
         every new episode until the series is complete.",
        enabled,
    )
}

/// Command overview.
pub fn help(chat: ChatId, enabled: bool) -> Outbound {
    with_menu(
        chat,
        "Available commands:\n\
         /search - search anime by name and subscribe\n\
         /subscriptions - show your subscriptions\n\
         /remove - remove subscriptions\n\
         /enable - enable notifications\n\
         /disable - disable notifications\n\
         /cancel - leave the current dialog\n\
         /help - show this message",
        enabled,
    )
}

fn cancel_button() -> Button {
    Button::new("Cancel", Token::cancel().encode())
}

/// Prompt shown when entering search mode.
pub fn search_prompt(chat: ChatId) -> Outbound {
    Outbound::text(chat, "Enter a name of anime in english to search it.")
        .with_keyboard(Keyboard { rows: vec![vec![cancel_button()]] })
}

/// Packs entries into pages of at most [`MAX_MESSAGE_CHARS`] characters.
///
/// The header opens the first page and the footer closes the last one. An
/// entry is never split; a single entry longer than the limit gets a page
/// of its own.
pub fn paginate(header: &str, entries: Vec<ListEntry>, footer: &str) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut page = Page {
        text: header.to_string(),
        buttons: Vec::new(),
    };
    let mut page_has_entries = false;

    for entry in entries {
        let len = page.text.chars().count() + entry.text.chars().count();
        if page_has_entries && len > MAX_MESSAGE_CHARS {
            pages.push(std::mem::take(&mut page));
            page_has_entries = false;
        }
        page.text.push_str(&entry.text);
        page.buttons.extend(entry.button);
        page_has_entries = true;
    }

    if !footer.is_empty() {
        let len = page.text.chars().count() + footer.chars().count() + 1;
        if page_has_entries && len > MAX_MESSAGE_CHARS {
            pages.push(std::mem::take(&mut page));
        }
        if !page.text.is_empty() {
            page.text.push('\n');
        }
        page.text.push_str(footer);
    }
    pages.push(page);
    pages
}

/// Turns pages into messages; `trailing` rows go under the last page only.
pub fn into_messages(chat: ChatId, pages: Vec<Page>, trailing: Vec<Vec<Button>>) -> Vec<Outbound> {
    let last = pages.len().saturating_sub(1);
    let mut trailing = Some(trailing);
    pages
        .into_iter()
        .enumerate()
        .map(|(i, page)| {
            let mut keyboard = Keyboard::grid(page.buttons, BUTTONS_PER_ROW);
            if i == last {
                for row in trailing.take().unwrap_or_default() {
                    keyboard.push_row(row);
                }
            }
            Outbound::text(chat, page.text)
                .with_keyboard(keyboard)
                .without_link_preview()
        })
        .collect()
}

fn episodes_line(title: &Title) -> String {
    if title.episodes > 0 {
        format!("Episodes aired: {} of {}", title.episodes_aired, title.episodes)
    } else {
        format!("Episodes aired: {}", title.episodes_aired)
    }
}

fn search_entries(titles: &[Title], generation: Option<u32>) -> Vec<ListEntry> {
    titles
        .iter()
        .enumerate()
        .map(|(index, title)| {
            let status = if title.is_released() {
                "Fully released!".to_string()
            } else {
                episodes_line(title)
            };
            let button = match generation {
                Some(generation) if !title.is_released() => Some(Button::new(
                    (index + 1).to_string(),
                    Token::Select { generation, index }.encode(),
                )),
                _ => None,
            };
            ListEntry {
                text: format!("{}. {}\n{}\n{}\n", index + 1, title.full_name(), title.url, status),
                button,
            }
        })
        .collect()
}

/// Search results with a selection control per airing title and a
/// trailing cancel control.
pub fn search_listing(chat: ChatId, titles: &[Title], generation: u32) -> Vec<Outbound> {
    let pages = paginate(
        "",
        search_entries(titles, Some(generation)),
        "Some of the found titles are still airing.\n\
         You can subscribe to be notified when new episodes are aired.\n\
         Choose the number of a title from the list above:",
    );
    into_messages(chat, pages, vec![vec![cancel_button()]])
}

/// Search results where every title is already complete.
pub fn released_listing(chat: ChatId, titles: &[Title], enabled: bool) -> Vec<Outbound> {
    let footer = format!(
        "All found titles are complete, no subscription needed.\n\n{}",
        menu_text(enabled)
    );
    let pages = paginate("", search_entries(titles, None), &footer);
    into_messages(chat, pages, main_menu(enabled).rows)
}

/// The subscriber's subscriptions followed by the main menu.
///
/// `entries` pairs each subscription with its title, or `None` if the
/// catalog did not resolve it.
pub fn subscription_listing(
    chat: ChatId,
    entries: &[(Subscription, Option<Title>)],
    enabled: bool,
) -> Vec<Outbound> {
    if entries.is_empty() {
        return vec![with_menu(chat, "You are not subscribed to any anime notifications.", enabled)];
    }

    let items = entries
        .iter()
        .enumerate()
        .map(|(i, (sub, title))| {
            let text = match title {
                Some(title) => format!(
                    "{}. {} / {} — last aired episode {} — last notified of episode {}\n",
                    i + 1,
                    title.display_name(),
                    title.url,
                    title.episodes_aired,
                    sub.last_episode_notified
                ),
                None => format!(
                    "{}. Title #{} (currently unavailable) — last notified of episode {}\n",
                    i + 1,
                    sub.title_id,
                    sub.last_episode_notified
                ),
            };
            ListEntry { text, button: None }
        })
        .collect();

    let pages = paginate(
        "You are subscribed to notifications about following titles:\n",
        items,
        &format!("\n{}", menu_text(enabled)),
    );
    into_messages(chat, pages, main_menu(enabled).rows)
}

/// Numbered subscriptions with one removal control each, plus `All` and
/// cancel controls.
pub fn removal_listing(chat: ChatId, entries: &[RemovalEntry], generation: u32) -> Vec<Outbound> {
    let items = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| ListEntry {
            text: format!("{}. {}\n", index + 1, entry.name),
            button: Some(Button::new(
                (index + 1).to_string(),
                Token::Select { generation, index }.encode(),
            )),
        })
        .collect();

    let pages = paginate(
        "You are subscribed to notifications about following titles:\n",
        items,
        "Choose the subscription you want to remove, or press \"All\" to remove all of them.",
    );
    into_messages(
        chat,
        pages,
        vec![vec![
            Button::new("All", Token::SelectAll { generation }.encode()),
            cancel_button(),
        ]],
    )
}

/// Notification about a newly aired episode.
pub fn new_episode_notice(chat: ChatId, title: &Title, episode: u32) -> Outbound {
    with_menu(
        chat,
        &format!("{} episode {} is released!\n{}", title.display_name(), episode, title.url),
        true,
    )
}

/// Notification that a title is complete and its subscription is dropped.
pub fn completed_notice(chat: ChatId, title: &Title) -> Outbound {
    with_menu(
        chat,
        &format!(
            "{} is complete!\n{}\nSubscription will be removed.",
            title.display_name(),
            title.url
        ),
        true,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::title;
    use anitrack_models::{ReleaseStatus, SubscriptionId, TelegramId, TitleId};

    fn tokens(msg: &Outbound) -> Vec<String> {
        msg.keyboard
            .as_ref()
            .map(|k| k.buttons().map(|b| b.token.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_main_menu_reflects_state() {
        assert_eq!(main_menu(true).rows[0][0].token, "disable");
        assert_eq!(main_menu(false).rows[0][0].token, "enable");
        assert_eq!(main_menu(true).rows.len(), 4);
    }

    #[test]
    fn test_search_listing_controls_only_for_airing() {
        let titles = vec![
            title(1, "Ongoing Show", 3, ReleaseStatus::Airing),
            title(2, "Finished Show", 12, ReleaseStatus::Released),
        ];

        let messages = search_listing(ChatId(5), &titles, 7);

        assert_eq!(messages.len(), 1);
        let msg = &messages[0];
        assert!(msg.text.contains("1. Ongoing Show"));
        assert!(msg.text.contains("2. Finished Show"));
        assert!(msg.text.contains("Fully released!"));
        let keyboard = msg.keyboard.as_ref().unwrap();
        assert_eq!(keyboard.rows[0], vec![Button::new("1", "sel:7:0")]);
        assert_eq!(tokens(msg), vec!["sel:7:0".to_string(), "cancel".to_string()]);
    }

    #[test]
    fn test_long_listing_is_paginated() {
        let titles: Vec<Title> = (0..40)
            .map(|i| {
                let mut t = title(i, &format!("Show {}", i), 1, ReleaseStatus::Airing);
                t.japanese = Some("長".repeat(150));
                t
            })
            .collect();

        let messages = search_listing(ChatId(5), &titles, 1);

        assert!(messages.len() > 1);
        for msg in &messages {
            assert!(msg.text.chars().count() <= MAX_MESSAGE_CHARS);
        }
        let all_tokens: Vec<String> = messages.iter().flat_map(tokens).collect();
        assert_eq!(all_tokens.iter().filter(|t| t.as_str() == "cancel").count(), 1);
        assert_eq!(tokens(messages.last().unwrap()).last().unwrap(), "cancel");
        assert_eq!(all_tokens.len(), 41);
        assert_eq!(all_tokens[39], "sel:1:39");
    }

    #[test]
    fn test_paginate_oversized_entry_gets_own_page() {
        let big = "x".repeat(MAX_MESSAGE_CHARS + 10);
        let entries = vec![
            ListEntry { text: "small\n".to_string(), button: None },
            ListEntry { text: big.clone(), button: None },
            ListEntry { text: "tail\n".to_string(), button: None },
        ];

        let pages = paginate("head\n", entries, "foot");

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].text, "head\nsmall\n");
        assert_eq!(pages[1].text, big);
        assert_eq!(pages[2].text, "tail\n\nfoot");
    }

    #[test]
    fn test_subscription_listing_format() {
        let sub = anitrack_models::Subscription::new(SubscriptionId(1), TelegramId(1), TitleId(10), 4);
        let missing = anitrack_models::Subscription::new(SubscriptionId(2), TelegramId(1), TitleId(11), 2);
        let entries = vec![
            (sub, Some(title(10, "Frieren", 6, ReleaseStatus::Airing))),
            (missing, None),
        ];

        let messages = subscription_listing(ChatId(1), &entries, true);

        assert_eq!(messages.len(), 1);
        let text = &messages[0].text;
        assert!(text.contains(
            "1. Frieren / https://shikimori.one/animes/10 — last aired episode 6 — last notified of episode 4"
        ));
        assert!(text.contains("2. Title #11 (currently unavailable) — last notified of episode 2"));
        assert_eq!(tokens(&messages[0])[0], "disable");
    }

    #[test]
    fn test_empty_subscription_listing() {
        let messages = subscription_listing(ChatId(1), &[], false);

        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.starts_with("You are not subscribed"));
        assert!(!messages[0].text.contains("following titles"));
    }

    #[test]
    fn test_removal_listing_controls() {
        let entries: Vec<RemovalEntry> = (0..2)
            .map(|i| RemovalEntry {
                subscription: anitrack_models::Subscription::new(
                    SubscriptionId(i + 1),
                    TelegramId(1),
                    TitleId(i + 10),
                    0,
                ),
                name: format!("Show {}", i),
            })
            .collect();

        let messages = removal_listing(ChatId(1), &entries, 4);

        assert_eq!(
            tokens(&messages[0]),
            vec!["sel:4:0", "sel:4:1", "all:4", "cancel"]
        );
        assert!(messages[0].text.contains("2. Show 1"));
    }

    #[test]
    fn test_notices() {
        let t = title(10, "Frieren", 6, ReleaseStatus::Airing);
        let notice = new_episode_notice(ChatId(9), &t, 6);
        assert_eq!(notice.chat, ChatId(9));
        assert!(notice.text.starts_with("Frieren episode 6 is released!"));

        let done = completed_notice(ChatId(9), &t);
        assert!(done.text.contains("Frieren is complete!"));
        assert!(done.text.contains("Subscription will be removed."));
        assert!(notice.link_preview);
    }

    #[test]
    fn test_listings_suppress_link_previews() {
        let titles = vec![
            title(1, "Ongoing Show", 3, ReleaseStatus::Airing),
            title(2, "Finished Show", 12, ReleaseStatus::Released),
        ];
        let subs = vec![(
            Subscription::new(SubscriptionId(1), TelegramId(5), TitleId(1), 2),
            Some(titles[0].clone()),
        )];

        let messages = search_listing(ChatId(5), &titles, 1)
            .into_iter()
            .chain(released_listing(ChatId(5), &titles[1..], true))
            .chain(subscription_listing(ChatId(5), &subs, true));

        for msg in messages {
            assert!(!msg.link_preview, "preview left on: {}", msg.text);
        }
        assert!(welcome(ChatId(5), true).link_preview);
    }
}
