//! [`Delivery`] over the Telegram Bot API.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, LinkPreviewOptions};

use anitrack_core::{Delivery, DeliveryError, Keyboard, Outbound};

/// Sends [`Outbound`] messages as Telegram messages with inline keyboards.
#[derive(Clone)]
pub struct TelegramDelivery {
    bot: Bot,
}

impl TelegramDelivery {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Preview settings for an outbound message, `None` keeps Telegram's default.
pub fn link_preview(message: &Outbound) -> Option<LinkPreviewOptions> {
    if message.link_preview {
        return None;
    }
    Some(LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    })
}

/// Converts a keyboard to callback buttons; tokens become callback data.
pub fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.token.clone()))
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl Delivery for TelegramDelivery {
    async fn deliver(&self, message: &Outbound) -> Result<(), DeliveryError> {
        let mut req = self.bot.send_message(ChatId(message.chat.get()), message.text.clone());
        if let Some(ref keyboard) = message.keyboard {
            req = req.reply_markup(inline_keyboard(keyboard));
        }
        if let Some(options) = link_preview(message) {
            req = req.link_preview_options(options);
        }
        req.await.map(|_| ()).map_err(|e| DeliveryError::Failed {
            chat: message.chat,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anitrack_core::Button;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_inline_keyboard_keeps_layout() {
        let keyboard = Keyboard {
            rows: vec![
                vec![Button::new("1", "sel:3:0"), Button::new("2", "sel:3:1")],
                vec![Button::new("Cancel", "cancel")],
            ],
        };

        let markup = inline_keyboard(&keyboard);

        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "Cancel");
        match &markup.inline_keyboard[0][1].kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "sel:3:1"),
            other => panic!("unexpected button kind: {:?}", other),
        }
    }

    #[test]
    fn test_link_preview_disabled_only_when_asked() {
        let plain = Outbound::text(anitrack_models::ChatId(1), "https://shikimori.one/animes/1");
        assert!(link_preview(&plain).is_none());

        let listing = plain.without_link_preview();
        let options = link_preview(&listing).unwrap();
        assert!(options.is_disabled);
        assert!(options.url.is_none());
    }
}
