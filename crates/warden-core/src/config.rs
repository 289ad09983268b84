//! Runtime configuration.
//!
//! Everything is read from the environment, after the binary has loaded
//! `.env.local` / `.env`.
//!
//! # Environment Variables
//!
//! - `TELEGRAM_BOT_TOKEN`: Bot API token (required)
//! - `WARDEN_SUDO`: Privileged user ids, separated by spaces or commas
//! - `WARDEN_ADMIN_CACHE_TTL_SECS`: Admin list lifetime (default 3600)
//! - `WARDEN_COOLDOWN_SECS`: Per-user command cooldown (default 3)
//! - `WARDEN_DEFAULT_LANG`: Language for chats without a preference (default `en-US`)
//! - `WARDEN_STATE_DIR`: Where persistent state lives (default `~/.warden`)

use std::path::PathBuf;

use crate::cache::DEFAULT_ADMIN_CACHE_TTL_SECS;
use crate::cooldown::DEFAULT_COOLDOWN_SECS;
use crate::error::{Result, WardenError};
use crate::gate::PrivilegedIds;
use crate::language::LANGUAGES_FILE;
use crate::locale::DEFAULT_LANGUAGE;
use crate::warns::WARNS_FILE;

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const SUDO_ENV: &str = "WARDEN_SUDO";
pub const ADMIN_CACHE_TTL_ENV: &str = "WARDEN_ADMIN_CACHE_TTL_SECS";
pub const COOLDOWN_ENV: &str = "WARDEN_COOLDOWN_SECS";
pub const DEFAULT_LANG_ENV: &str = "WARDEN_DEFAULT_LANG";
pub const STATE_DIR_ENV: &str = "WARDEN_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".warden";

/// Bot settings.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub privileged: PrivilegedIds,
    pub admin_cache_ttl_secs: i64,
    pub cooldown_secs: i64,
    pub default_language: String,
    pub state_dir: PathBuf,
}

impl BotConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns `None` for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_ENV)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| WardenError::Config(format!("{} is not set", TOKEN_ENV)))?;

        let privileged = match lookup(SUDO_ENV) {
            Some(raw) => parse_id_list(&raw)?,
            None => PrivilegedIds::new(),
        };

        let admin_cache_ttl_secs =
            parse_secs(&lookup, ADMIN_CACHE_TTL_ENV, DEFAULT_ADMIN_CACHE_TTL_SECS)?;
        let cooldown_secs = parse_secs(&lookup, COOLDOWN_ENV, DEFAULT_COOLDOWN_SECS)?;

        let default_language = lookup(DEFAULT_LANG_ENV)
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let state_dir = lookup(STATE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_state_dir);

        Ok(Self {
            token,
            privileged,
            admin_cache_ttl_secs,
            cooldown_secs,
            default_language,
            state_dir,
        })
    }

    /// Location of the per-chat language table.
    pub fn languages_file(&self) -> PathBuf {
        self.state_dir.join(LANGUAGES_FILE)
    }

    /// Location of the warning counts.
    pub fn warns_file(&self) -> PathBuf {
        self.state_dir.join(WARNS_FILE)
    }
}

/// `~/.warden`, or `.warden` in the working directory without a home.
pub fn default_state_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(DEFAULT_STATE_DIR))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
}

fn parse_secs<F>(lookup: &F, key: &str, default: i64) -> Result<i64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(secs) if secs >= 0 => Ok(secs),
            _ => Err(WardenError::Config(format!(
                "{} must be a non-negative number of seconds, got {:?}",
                key, raw
            ))),
        },
    }
}

fn parse_id_list(raw: &str) -> Result<PrivilegedIds> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| WardenError::Config(format!("{} has a bad user id: {:?}", SUDO_ENV, s)))
        })
        .collect()
}
