//! Chat transport seam: the wizard only knows "send a prompt", "edit a
//! previous prompt", "acknowledge a selection". The Telegram implementation
//! lives here; tests use a mock.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId};
use tracing::warn;

/// Transport failures are reported as plain messages; the engine logs them
/// and carries on without touching the draft.
pub type TransportError = String;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a prompt, optionally with a fixed set of selectable options.
    /// Returns the message id of the sent prompt.
    async fn prompt(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[String],
    ) -> Result<i64, TransportError>;

    /// Replace a previous prompt's text and strip its options, leaving a
    /// progress line in the chat history.
    async fn edit_prompt(
        &self,
        chat_id: i64,
        message_id: i64,
        new_text: &str,
    ) -> Result<(), TransportError>;

    /// Answer a callback query with a short toast.
    async fn ack_selection(&self, callback_id: &str, text: &str) -> Result<(), TransportError>;
}

/// Build an inline keyboard from choice labels; each label doubles as its
/// callback data. Labels are wide, so two buttons per row.
fn choice_keyboard(choices: &[String]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = choices
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|label| InlineKeyboardButton::callback(label.clone(), label.clone()))
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(rows)
}

/// Teloxide-backed transport.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn prompt(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[String],
    ) -> Result<i64, TransportError> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if !choices.is_empty() {
            request = request.reply_markup(choice_keyboard(choices));
        }

        request.await.map(|msg| msg.id.0 as i64).map_err(|e| {
            let msg = format!("Failed to send prompt: {e}");
            warn!("{}", msg);
            msg
        })
    }

    async fn edit_prompt(
        &self,
        chat_id: i64,
        message_id: i64,
        new_text: &str,
    ) -> Result<(), TransportError> {
        // editMessageText without reply_markup drops the inline keyboard
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id as i32), new_text)
            .await
            .map_err(|e| {
                let msg = format!("Failed to edit prompt {message_id}: {e}");
                warn!("{}", msg);
                msg
            })?;

        Ok(())
    }

    async fn ack_selection(&self, callback_id: &str, text: &str) -> Result<(), TransportError> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .text(text)
            .await
            .map_err(|e| {
                let msg = format!("Failed to answer callback: {e}");
                warn!("{}", msg);
                msg
            })?;

        Ok(())
    }
}
