//! Delivers gate feedback back to Telegram.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode, ReplyParameters};
use warden_core::{Request as WardenRequest, Responder, WardenError};

/// Replies to the command message, or raises an alert for button presses.
#[derive(Clone)]
pub struct TelegramResponder {
    bot: Bot,
}

impl TelegramResponder {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Responder for TelegramResponder {
    async fn reply(&self, request: &WardenRequest, text: &str) -> warden_core::Result<()> {
        match request {
            WardenRequest::Message(m) => {
                self.bot
                    .send_message(ChatId(m.chat.id), text)
                    .parse_mode(ParseMode::Html)
                    .reply_parameters(ReplyParameters::new(MessageId(m.message_id)))
                    .await
                    .map_err(|e| WardenError::Reply(e.to_string()))?;
            }
            WardenRequest::Callback(c) => {
                self.bot
                    .answer_callback_query(c.query_id.clone())
                    .text(text)
                    .show_alert(true)
                    .await
                    .map_err(|e| WardenError::Reply(e.to_string()))?;
            }
        }
        Ok(())
    }
}
