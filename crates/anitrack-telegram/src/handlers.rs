//! Update handlers for the Telegram bot.
//!
//! Handlers translate teloxide updates into [`Inbound`] events, run them
//! through the [`Conversation`](anitrack_core::Conversation) and send the
//! replies back.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, User};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, warn};

use anitrack_core::{Inbound, Input};
use anitrack_models::{NewSubscriber, TelegramId};

use crate::state::BotState;

const APOLOGY: &str = "Sorry, something went wrong. Please try again.";

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and show the menu")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Enable new episode notifications")]
    Enable,

    #[command(description = "Disable new episode notifications")]
    Disable,

    #[command(description = "Show your subscriptions")]
    Subscriptions,

    #[command(description = "Search anime by name and subscribe")]
    Search,

    #[command(description = "Remove subscriptions")]
    Remove,

    #[command(description = "Leave the current dialog")]
    Cancel,
}

impl From<Command> for anitrack_core::Command {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Start => anitrack_core::Command::Start,
            Command::Help => anitrack_core::Command::Help,
            Command::Enable => anitrack_core::Command::Enable,
            Command::Disable => anitrack_core::Command::Disable,
            Command::Subscriptions => anitrack_core::Command::Subscriptions,
            Command::Search => anitrack_core::Command::Search,
            Command::Remove => anitrack_core::Command::Remove,
            Command::Cancel => anitrack_core::Command::Cancel,
        }
    }
}

/// Profile of the sender as stored on first contact.
fn profile(user: &User, chat_id: ChatId) -> NewSubscriber {
    NewSubscriber {
        telegram_id: TelegramId(user.id.0 as i64),
        chat_id: anitrack_models::ChatId(chat_id.0),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
        language_code: user.language_code.clone(),
        is_bot: user.is_bot,
    }
}

/// Runs one event through the conversation and sends the replies.
///
/// Failures are logged and answered with an apology; they never reach the
/// dispatcher.
async fn respond(bot: &Bot, state: &BotState, chat_id: ChatId, inbound: Inbound) -> ResponseResult<()> {
    match state.conversation.handle(inbound).await {
        Ok(replies) => {
            for reply in &replies {
                if let Err(e) = state.delivery.deliver(reply).await {
                    warn!(chat_id = %chat_id, error = %e, "Failed to send reply");
                    break;
                }
            }
        }
        Err(e) => {
            error!(chat_id = %chat_id, error = %e, "Failed to handle update");
            bot.send_message(chat_id, APOLOGY).await?;
        }
    }
    Ok(())
}

/// Handle a recognized slash command.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let inbound = Inbound::new(profile(user, msg.chat.id), Input::Command(cmd.into()));
    respond(&bot, &state, msg.chat.id, inbound).await
}

/// Handle a plain text message.
pub async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return Ok(());
    };
    let inbound = Inbound::new(profile(user, msg.chat.id), Input::Text(text.to_string()));
    respond(&bot, &state, msg.chat.id, inbound).await
}

/// Handle an inline button press.
pub async fn handle_callback(bot: Bot, q: CallbackQuery, state: Arc<BotState>) -> ResponseResult<()> {
    // Stop the client-side spinner first; the reply comes as a new message.
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(data) = q.data.clone() else {
        return Ok(());
    };
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(q.from.id.0 as i64));
    debug!(chat_id = %chat_id, data = %data, "Callback received");

    let inbound = Inbound::new(profile(&q.from, chat_id), Input::Button(data));
    respond(&bot, &state, chat_id, inbound).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_parse() {
        assert_eq!(Command::parse("/subscriptions", "anitrack_bot").unwrap(), Command::Subscriptions);
        assert_eq!(Command::parse("/cancel@anitrack_bot", "anitrack_bot").unwrap(), Command::Cancel);
        assert!(Command::parse("/connect x", "anitrack_bot").is_err());
    }

    #[test]
    fn test_commands_map_to_core() {
        assert_eq!(anitrack_core::Command::from(Command::Search), anitrack_core::Command::Search);
        assert_eq!(anitrack_core::Command::from(Command::Disable), anitrack_core::Command::Disable);
    }

    #[test]
    fn test_descriptions_list_every_command() {
        let help = Command::descriptions().to_string();
        for word in ["/start", "/help", "/enable", "/disable", "/subscriptions", "/search", "/remove", "/cancel"] {
            assert!(help.contains(word), "missing {}", word);
        }
    }
}
