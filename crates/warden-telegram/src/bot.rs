//! Main Telegram bot implementation.

use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, CallbackQuery, ChatMemberUpdated};
use teloxide::update_listeners::Polling;
use tracing::{debug, info};
use warden_core::BotConfig;

use crate::error::{Result, TelegramError};
use crate::handlers::{handle_callback, handle_chat_member, handle_command, Command};
use crate::membership::from_user_id;
use crate::state::create_shared_state;

/// Update kinds the bot subscribes to. `chat_member` is opt-in on the Bot API.
pub fn allowed_updates() -> Vec<AllowedUpdate> {
    vec![
        AllowedUpdate::Message,
        AllowedUpdate::CallbackQuery,
        AllowedUpdate::ChatMember,
    ]
}

/// The Warden moderation bot.
pub struct WardenBot {
    bot: Bot,
    config: BotConfig,
}

impl WardenBot {
    pub fn new(config: BotConfig) -> Self {
        let bot = Bot::new(config.token.clone());
        Self { bot, config }
    }

    /// Get the bot's username and user id.
    pub async fn get_me(&self) -> Result<(String, i64)> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok((me.username().to_string(), from_user_id(me.id)))
    }

    /// Run the long-polling dispatcher until Ctrl+C.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Telegram bot in polling mode...");

        let (username, bot_id) = self.get_me().await?;
        let bot = self.bot.clone();
        let state = create_shared_state(bot.clone(), &self.config, bot_id);

        let state_for_commands = Arc::clone(&state);
        let state_for_callbacks = Arc::clone(&state);
        let state_for_members = Arc::clone(&state);

        let handler = dptree::entry()
            .branch(
                Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
                    let state = Arc::clone(&state_for_callbacks);
                    async move { handle_callback(bot, q, state).await }
                }),
            )
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        debug!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            )
            .branch(
                Update::filter_chat_member().endpoint(move |upd: ChatMemberUpdated| {
                    let state = Arc::clone(&state_for_members);
                    async move { handle_chat_member(upd, state).await }
                }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        // Groups see commands meant for other bots; only answer in private.
                        msg.chat.is_private()
                            && msg.text().map(|t| t.starts_with('/')).unwrap_or(false)
                    })
                    .endpoint(|bot: Bot, msg: Message| async move {
                        if let Some(text) = msg.text() {
                            debug!(cmd = %text, "Unrecognized command");
                            bot.send_message(
                                msg.chat.id,
                                format!(
                                    "Unknown command: {}\n\nUse /help to see available commands.",
                                    text.split_whitespace().next().unwrap_or(text)
                                ),
                            )
                            .await?;
                        }
                        Ok(())
                    }),
            );

        let listener = Polling::builder(bot.clone())
            .allowed_updates(allowed_updates())
            .build();

        info!(username = %username, bot_id = %bot_id, "Bot is running");

        Dispatcher::builder(bot, handler)
            .default_handler(|upd| async move {
                debug!("Unhandled update: {:?}", upd.kind);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;

        info!("Dispatcher stopped");
        Ok(())
    }
}
