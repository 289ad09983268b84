//! Error types for the Telegram front end.

use thiserror::Error;
use warden_core::WardenError;

/// Errors that can occur while serving Telegram updates.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// A Bot API call failed.
    #[error("{0}")]
    Api(String),

    /// The command needs a message it did not get.
    #[error("Missing {0}")]
    MissingContext(&'static str),

    /// Core error (configuration, language store, durations).
    #[error(transparent)]
    Core(#[from] WardenError),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;

impl From<teloxide::RequestError> for TelegramError {
    fn from(e: teloxide::RequestError) -> Self {
        TelegramError::Api(e.to_string())
    }
}
