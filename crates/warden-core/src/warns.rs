//! Per-chat warning counts.
//!
//! A user who collects [`MAX_WARNS`] warnings in a chat is banned and the
//! count starts over.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockWriteGuard};

use tracing::{debug, error, info};

use crate::error::{Result, WardenError};

/// File name used under the state directory.
pub const WARNS_FILE: &str = "warns.json";

/// Warnings that trigger a ban.
pub const MAX_WARNS: u32 = 3;

type WarnTable = HashMap<i64, HashMap<i64, u32>>;

/// Result of adding a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarnOutcome {
    /// The user now has `total` warnings, below the limit.
    Warned { total: u32 },
    /// The limit was reached; the count was reset and the user should be banned.
    LimitReached,
}

/// Warning counts keyed by chat, then user.
pub struct WarnStore {
    warns: RwLock<WarnTable>,
    path: Option<PathBuf>,
}

impl WarnStore {
    pub fn new() -> Self {
        Self {
            warns: RwLock::new(HashMap::new()),
            path: None,
        }
    }

    /// Persist counts to `path`, loading whatever is already there.
    pub fn with_persistence(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let loaded = load_warns(&path);
        if let Ok(mut warns) = self.warns.write() {
            *warns = loaded;
        }
        self.path = Some(path);
        self
    }

    /// Current warnings for the user in the chat.
    pub fn count(&self, chat_id: i64, user_id: i64) -> u32 {
        self.warns
            .read()
            .ok()
            .and_then(|w| w.get(&chat_id).and_then(|users| users.get(&user_id)).copied())
            .unwrap_or(0)
    }

    /// Add one warning.
    pub fn warn(&self, chat_id: i64, user_id: i64) -> Result<WarnOutcome> {
        let mut warns = self.table()?;
        let total = warns
            .get(&chat_id)
            .and_then(|users| users.get(&user_id))
            .copied()
            .unwrap_or(0)
            + 1;

        let outcome = if total >= MAX_WARNS {
            remove_entry(&mut warns, chat_id, user_id);
            WarnOutcome::LimitReached
        } else {
            warns.entry(chat_id).or_default().insert(user_id, total);
            WarnOutcome::Warned { total }
        };
        info!(chat_id = %chat_id, user_id = %user_id, outcome = ?outcome, "User warned");

        self.save(&warns);
        Ok(outcome)
    }

    /// Take back one warning. `None` when the user had none.
    pub fn remove_one(&self, chat_id: i64, user_id: i64) -> Result<Option<u32>> {
        let mut warns = self.table()?;
        let Some(current) = warns.get(&chat_id).and_then(|users| users.get(&user_id)).copied() else {
            return Ok(None);
        };

        let left = current.saturating_sub(1);
        if left == 0 {
            remove_entry(&mut warns, chat_id, user_id);
        } else {
            warns.entry(chat_id).or_default().insert(user_id, left);
        }

        self.save(&warns);
        Ok(Some(left))
    }

    /// Drop every warning. Returns whether there were any.
    pub fn clear(&self, chat_id: i64, user_id: i64) -> Result<bool> {
        let mut warns = self.table()?;
        let removed = remove_entry(&mut warns, chat_id, user_id);
        if removed {
            self.save(&warns);
        }
        Ok(removed)
    }

    fn table(&self) -> Result<RwLockWriteGuard<'_, WarnTable>> {
        self.warns
            .write()
            .map_err(|e| WardenError::Config(format!("warn table poisoned: {}", e)))
    }

    fn save(&self, warns: &WarnTable) {
        if let Some(path) = &self.path {
            save_warns(path, warns);
        }
    }
}

impl Default for WarnStore {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_entry(warns: &mut WarnTable, chat_id: i64, user_id: i64) -> bool {
    let Some(users) = warns.get_mut(&chat_id) else {
        return false;
    };
    let removed = users.remove(&user_id).is_some();
    if users.is_empty() {
        warns.remove(&chat_id);
    }
    removed
}

fn load_warns(path: &Path) -> WarnTable {
    if !path.exists() {
        return HashMap::new();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<WarnTable>(&content) {
            Ok(warns) => {
                info!(chats = warns.len(), "Loaded warnings from disk");
                warns
            }
            Err(e) => {
                error!(error = %e, path = %path.display(), "Failed to parse warnings file");
                HashMap::new()
            }
        },
        Err(e) => {
            error!(error = %e, path = %path.display(), "Failed to read warnings file");
            HashMap::new()
        }
    }
}

fn save_warns(path: &Path, warns: &WarnTable) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            error!(error = %e, "Failed to create state directory");
            return;
        }
    }

    match serde_json::to_string_pretty(warns) {
        Ok(json) => {
            if let Err(e) = std::fs::write(path, json) {
                error!(error = %e, path = %path.display(), "Failed to write warnings file");
            } else {
                debug!(chats = warns.len(), "Saved warnings to disk");
            }
        }
        Err(e) => error!(error = %e, "Failed to serialize warnings"),
    }
}
