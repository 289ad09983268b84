//! Error types for Warden core operations.

use thiserror::Error;

/// Errors that can occur in the authorization and moderation core.
#[derive(Debug, Error)]
pub enum WardenError {
    /// The membership service could not answer a query.
    #[error("Membership lookup failed: {0}")]
    Membership(String),

    /// A user is not a member of the chat (or never was).
    #[error("User {user_id} not found in chat {chat_id}")]
    MemberNotFound { chat_id: i64, user_id: i64 },

    /// Capability name outside the fixed vocabulary.
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    /// Language code with no catalog.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Reply could not be delivered.
    #[error("Failed to send reply: {0}")]
    Reply(String),

    /// Bad or missing configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Duration string could not be parsed.
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for Warden core operations.
pub type Result<T> = std::result::Result<T, WardenError>;
