//! Commands and button tokens.
//!
//! The recognized command vocabulary is a closed enum, and every button
//! the bot renders carries a [`Token`] encoded as a short string (Telegram
//! limits callback data to 64 bytes).
//!
//! Selection tokens embed the generation of the listing they belong to, so
//! a press on a button from an older listing can be told apart from a
//! press on the current one.

use std::fmt;

/// Fixed command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Help,
    Enable,
    Disable,
    Subscriptions,
    Search,
    Remove,
    Cancel,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Start,
        Command::Help,
        Command::Enable,
        Command::Disable,
        Command::Subscriptions,
        Command::Search,
        Command::Remove,
        Command::Cancel,
    ];

    /// Wire name of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Enable => "enable",
            Command::Disable => "disable",
            Command::Subscriptions => "subscriptions",
            Command::Search => "search",
            Command::Remove => "remove",
            Command::Cancel => "cancel",
        }
    }

    /// Parses `enable`, `/enable` or `/enable@SomeBot`, case-insensitively.
    pub fn parse_word(text: &str) -> Option<Self> {
        let word = text.trim();
        let word = word.strip_prefix('/').unwrap_or(word);
        let word = word.split('@').next().unwrap_or(word);
        Command::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(word))
    }

    /// Parses text only when it is written as a slash command.
    pub fn parse_slash(text: &str) -> Option<Self> {
        if text.trim_start().starts_with('/') {
            Self::parse_word(text)
        } else {
            None
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded payload of a button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A main-menu command (also used for the cancel button).
    Menu(Command),
    /// Pick entry `index` (0-based) of listing `generation`.
    Select { generation: u32, index: usize },
    /// Pick every entry of listing `generation`.
    SelectAll { generation: u32 },
}

impl Token {
    pub fn cancel() -> Self {
        Token::Menu(Command::Cancel)
    }

    pub fn encode(&self) -> String {
        match self {
            Token::Menu(command) => command.as_str().to_string(),
            Token::Select { generation, index } => format!("sel:{}:{}", generation, index),
            Token::SelectAll { generation } => format!("all:{}", generation),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(':');
        let tag = parts.next()?;
        let token = match tag {
            "sel" => Token::Select {
                generation: parts.next()?.parse().ok()?,
                index: parts.next()?.parse().ok()?,
            },
            "all" => Token::SelectAll {
                generation: parts.next()?.parse().ok()?,
            },
            word => {
                let command = Command::ALL.into_iter().find(|c| c.as_str() == word)?;
                Token::Menu(command)
            }
        };
        match parts.next() {
            Some(_) => None,
            None => Some(token),
        }
    }
}
