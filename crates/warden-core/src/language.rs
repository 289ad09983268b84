//! Per-chat language preference.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, error, info};

use crate::error::{Result, WardenError};

/// File name used under the state directory.
pub const LANGUAGES_FILE: &str = "chat_languages.json";

/// Remembers which language each chat picked with `/setlang`.
pub struct LanguageStore {
    languages: RwLock<HashMap<i64, String>>,
    supported: Vec<String>,
    default_language: String,
    path: Option<PathBuf>,
}

impl LanguageStore {
    /// In-memory store; nothing survives a restart.
    pub fn new(default_language: &str, supported: Vec<String>) -> Self {
        Self {
            languages: RwLock::new(HashMap::new()),
            supported,
            default_language: default_language.to_string(),
            path: None,
        }
    }

    /// Persist preferences to `path`, loading whatever is already there.
    pub fn with_persistence(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let loaded = load_languages(&path);
        if let Ok(mut languages) = self.languages.write() {
            *languages = loaded;
        }
        self.path = Some(path);
        self
    }

    /// The chat's language, or the default when none was chosen.
    pub fn get(&self, chat_id: i64) -> String {
        self.languages
            .read()
            .ok()
            .and_then(|l| l.get(&chat_id).cloned())
            .unwrap_or_else(|| self.default_language.clone())
    }

    /// Record `lang` for the chat and persist the table.
    pub fn set(&self, chat_id: i64, lang: &str) -> Result<()> {
        if !self.supported.iter().any(|s| s == lang) {
            return Err(WardenError::UnsupportedLanguage(lang.to_string()));
        }

        let mut languages = self
            .languages
            .write()
            .map_err(|e| WardenError::Config(format!("language table poisoned: {}", e)))?;
        languages.insert(chat_id, lang.to_string());
        info!(chat_id = %chat_id, lang = %lang, "Chat language changed");

        if let Some(path) = &self.path {
            save_languages(path, &languages);
        }
        Ok(())
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }
}

/// Load chat languages from disk. Missing or unreadable files yield an empty table.
fn load_languages(path: &Path) -> HashMap<i64, String> {
    if !path.exists() {
        return HashMap::new();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<HashMap<i64, String>>(&content) {
            Ok(languages) => {
                info!(count = languages.len(), "Loaded chat languages from disk");
                languages
            }
            Err(e) => {
                error!(error = %e, path = %path.display(), "Failed to parse chat languages file");
                HashMap::new()
            }
        },
        Err(e) => {
            error!(error = %e, path = %path.display(), "Failed to read chat languages file");
            HashMap::new()
        }
    }
}

/// Save chat languages to disk. Failures are logged, never fatal.
fn save_languages(path: &Path, languages: &HashMap<i64, String>) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            error!(error = %e, "Failed to create state directory");
            return;
        }
    }

    match serde_json::to_string_pretty(languages) {
        Ok(json) => {
            if let Err(e) = std::fs::write(path, json) {
                error!(error = %e, path = %path.display(), "Failed to write chat languages file");
            } else {
                debug!(count = languages.len(), path = %path.display(), "Saved chat languages to disk");
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to serialize chat languages");
        }
    }
}
