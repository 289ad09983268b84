//! Telegram front end for the Warden moderation bot.
//!
//! Wires the permission gate from `warden-core` to the Bot API: member
//! lookups go through [`membership::TelegramMembership`], refusals through
//! [`responder::TelegramResponder`], and `chat_member` updates keep the
//! admin cache current.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//!
//! Optional:
//! - `WARDEN_SUDO`: Privileged user ids
//! - `WARDEN_ADMIN_CACHE_TTL_SECS`: Admin list lifetime (default: 3600)
//! - `WARDEN_COOLDOWN_SECS`: Per-user command cooldown (default: 3)
//! - `WARDEN_DEFAULT_LANG`: Fallback language (default: en-US)
//! - `WARDEN_STATE_DIR`: State directory (default: ~/.warden)
//!
//! # Example
//!
//! ```no_run
//! use warden_core::BotConfig;
//! use warden_telegram::WardenBot;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bot = WardenBot::new(BotConfig::from_env()?);
//!     bot.start_polling().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Commands
//!
//! - `/ban`, `/dban`, `/tban`, `/unban` - Ban management (restrict members)
//! - `/kick`, `/dkick` - Remove a user who may rejoin (restrict members)
//! - `/mute`, `/tmute`, `/unmute` - Silence a user (restrict members)
//! - `/warn`, `/dwarn`, `/rmwarn` - Warnings, ban at three (restrict members)
//! - `/warns` - Show a user's warnings, open to everyone
//! - `/purge [n]`, `/del` - Delete messages (delete messages)
//! - `/pin`, `/unpin` - Pin management (pin messages)
//! - `/promote`, `/fullpromote`, `/demote` - Admin rights (promote members)
//! - `/report` - Alert the admins, open to everyone
//! - `/setlang` - Chat language, any admin

pub mod bot;
pub mod error;
pub mod handlers;
pub mod membership;
pub mod request;
pub mod responder;
pub mod state;

pub use bot::WardenBot;
pub use error::{Result, TelegramError};
pub use handlers::{policy_for, CallbackAction, Command};
pub use membership::TelegramMembership;
pub use responder::TelegramResponder;
pub use state::{create_shared_state, BotState};
