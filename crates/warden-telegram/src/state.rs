//! Shared state for the Telegram bot.

use std::sync::Arc;

use chrono::Duration;
use teloxide::prelude::*;
use tracing::info;
use warden_core::{
    AdminCache, AuthorizationGate, BotConfig, Catalog, Cooldown, LanguageStore, Localizer,
    PermissionResolver, WarnStore,
};

use crate::membership::TelegramMembership;
use crate::responder::TelegramResponder;

/// Everything the handlers share, built once at startup.
pub struct BotState {
    /// The bot's own user id, for self-targeting checks.
    pub bot_id: i64,
    pub gate: AuthorizationGate,
    pub resolver: Arc<PermissionResolver>,
    pub catalog: Arc<Catalog>,
    pub languages: Arc<LanguageStore>,
    pub cooldown: Cooldown,
    pub warns: WarnStore,
}

impl BotState {
    /// Localized template for `key` in the chat's language.
    pub fn text(&self, chat_id: i64, key: &str) -> String {
        self.catalog.text(&self.languages.get(chat_id), key)
    }

    /// Localized template with placeholders filled in.
    pub fn format(&self, chat_id: i64, key: &str, args: &[(&str, &str)]) -> String {
        self.catalog.format(&self.languages.get(chat_id), key, args)
    }
}

/// Wire the gate, cache and stores to the Bot API.
pub fn create_shared_state(bot: Bot, config: &BotConfig, bot_id: i64) -> Arc<BotState> {
    let catalog = Arc::new(Catalog::builtin().with_default_language(&config.default_language));
    let supported = catalog
        .languages()
        .iter()
        .map(|l| l.code.to_string())
        .collect();
    let languages = Arc::new(
        LanguageStore::new(catalog.default_language(), supported)
            .with_persistence(config.languages_file()),
    );

    let cache = Arc::new(AdminCache::new().with_ttl(Duration::seconds(config.admin_cache_ttl_secs)));
    let resolver = Arc::new(PermissionResolver::new(
        Arc::new(TelegramMembership::new(bot.clone())),
        cache,
    ));

    let gate = AuthorizationGate::new(
        Arc::clone(&resolver),
        Arc::new(TelegramResponder::new(bot)),
        catalog.clone(),
        Arc::clone(&languages),
    )
    .with_privileged(config.privileged.clone());

    info!(
        privileged = config.privileged.len(),
        admin_cache_ttl_secs = config.admin_cache_ttl_secs,
        cooldown_secs = config.cooldown_secs,
        stages = ?gate.stage_names(),
        "Bot state ready"
    );

    Arc::new(BotState {
        bot_id,
        gate,
        resolver,
        catalog,
        languages,
        cooldown: Cooldown::new(config.cooldown_secs),
        warns: WarnStore::new().with_persistence(config.warns_file()),
    })
}
