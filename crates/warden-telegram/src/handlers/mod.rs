//! Command and callback handlers for the Telegram bot.
//!
//! Every moderation command runs behind the authorization gate with the
//! policy returned by [`policy_for`]. Commands also pass through the per-user
//! cooldown before the gate sees them.

pub mod admin;
pub mod language;
pub mod members;
pub mod warns;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters, User};
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;
use tracing::{debug, info, warn};
use warden_core::{Capability, CooldownVerdict, GatePolicy, GuardOutcome};

use crate::error::Result;
use crate::membership::from_user_id;
use crate::request;
use crate::state::BotState;

pub use members::handle_chat_member;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Ban a user: reply or /ban <id> [reason]")]
    Ban(String),

    #[command(description = "Ban a user and delete the replied message")]
    Dban(String),

    #[command(description = "Ban for a while: /tban <id> <30m|2h|7d|1w> [reason]")]
    Tban(String),

    #[command(description = "Unban a user: reply or /unban <id>")]
    Unban(String),

    #[command(description = "Kick a user: reply or /kick <id> [reason]")]
    Kick(String),

    #[command(description = "Kick a user and delete the replied message")]
    Dkick(String),

    #[command(description = "Mute a user: reply or /mute <id> [reason]")]
    Mute(String),

    #[command(description = "Mute for a while: /tmute <id> <30m|2h|7d|1w> [reason]")]
    Tmute(String),

    #[command(description = "Unmute a user: reply or /unmute <id>")]
    Unmute(String),

    #[command(description = "Delete messages from the replied one: /purge [n]")]
    Purge(String),

    #[command(description = "Delete the replied message")]
    Del,

    #[command(description = "Pin the replied message")]
    Pin,

    #[command(description = "Unpin the replied message")]
    Unpin,

    #[command(description = "Promote a user with limited rights")]
    Promote(String),

    #[command(description = "Promote a user with the bot's own rights")]
    Fullpromote(String),

    #[command(description = "Demote an admin")]
    Demote(String),

    #[command(description = "Warn a user: reply or /warn <id> [reason]")]
    Warn(String),

    #[command(description = "Warn a user and delete the replied message")]
    Dwarn(String),

    #[command(description = "Clear the warnings of the replied user")]
    Rmwarn,

    #[command(description = "Show a user's warnings: reply or /warns <id>")]
    Warns(String),

    #[command(description = "Report the replied message to the admins")]
    Report,

    #[command(description = "Change the chat language")]
    Setlang,
}

/// Gate policy for a command; `None` for commands anyone may run.
pub fn policy_for(cmd: &Command) -> Option<GatePolicy> {
    let policy = match cmd {
        Command::Start | Command::Help | Command::Report | Command::Warns(_) => return None,
        Command::Ban(_)
        | Command::Dban(_)
        | Command::Tban(_)
        | Command::Unban(_)
        | Command::Kick(_)
        | Command::Dkick(_)
        | Command::Mute(_)
        | Command::Tmute(_)
        | Command::Unmute(_)
        | Command::Warn(_)
        | Command::Dwarn(_)
        | Command::Rmwarn => GatePolicy::require(Capability::RestrictMembers),
        Command::Purge(_) => GatePolicy::require(Capability::DeleteMessages).allow_in_private(true),
        Command::Del => GatePolicy::require(Capability::DeleteMessages),
        Command::Pin | Command::Unpin => GatePolicy::require(Capability::PinMessages),
        Command::Promote(_) | Command::Fullpromote(_) | Command::Demote(_) => {
            GatePolicy::require(Capability::PromoteMembers)
        }
        Command::Setlang => GatePolicy::admin().allow_in_private(true),
    };
    Some(policy)
}

/// Route a parsed command through cooldown and gate to its handler.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    // Anonymous admins share one placeholder account; they are not rate limited.
    let sender = request::sender_user(&msg).and_then(|id| msg.from.as_ref().map(|u| (id, u)));
    if let Some((user_id, user)) = sender {
        match state.cooldown.check(user_id) {
            CooldownVerdict::Allowed => {}
            CooldownVerdict::Warn { remaining_secs } => {
                let text = state.format(
                    msg.chat.id.0,
                    "cooldown_warning",
                    &[
                        ("mention", mention(user).as_str()),
                        ("seconds", remaining_secs.to_string().as_str()),
                    ],
                );
                reply_html(&bot, &msg, text).await?;
                return Ok(());
            }
            CooldownVerdict::Suppress => {
                debug!(user_id = %user_id, "Command suppressed by cooldown");
                return Ok(());
            }
        }
    }

    let Some(policy) = policy_for(&cmd) else {
        return run_open_command(&bot, &msg, &cmd, &state).await;
    };

    let request = request::from_message(&msg);
    let outcome = state
        .gate
        .guard(&request, &policy, || run_gated_command(&bot, &msg, &cmd, &state))
        .await;
    log_outcome(&outcome, &format!("{:?}", cmd));
    Ok(())
}

async fn run_open_command(bot: &Bot, msg: &Message, cmd: &Command, state: &BotState) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            let chat_id = msg.chat.id.0;
            bot.send_message(msg.chat.id, state.text(chat_id, "start_msg"))
                .parse_mode(ParseMode::Html)
                .reply_markup(language::start_keyboard(&state.text(chat_id, "language_btn")))
                .await?;
            info!(chat_id = %msg.chat.id, user = ?msg.from.as_ref().map(|u| &u.username), "User started bot");
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Report => {
            if let Err(e) = admin::report(bot, msg, state).await {
                warn!(chat_id = %msg.chat.id, error = %e, "Report failed");
            }
        }
        Command::Warns(args) => {
            if let Err(e) = warns::show_warns(bot, msg, state, args).await {
                warn!(chat_id = %msg.chat.id, error = %e, "Warn lookup failed");
            }
        }
        other => warn!(command = ?other, "Gated command reached the open path"),
    }
    Ok(())
}

async fn run_gated_command(bot: &Bot, msg: &Message, cmd: &Command, state: &BotState) -> Result<()> {
    match cmd {
        Command::Ban(args) => admin::ban(bot, msg, state, args, admin::BanMode::Plain).await,
        Command::Dban(args) => admin::ban(bot, msg, state, args, admin::BanMode::DeleteReplied).await,
        Command::Tban(args) => admin::ban(bot, msg, state, args, admin::BanMode::Timed).await,
        Command::Unban(args) => admin::unban(bot, msg, state, args).await,
        Command::Kick(args) => admin::kick(bot, msg, state, args, false).await,
        Command::Dkick(args) => admin::kick(bot, msg, state, args, true).await,
        Command::Mute(args) => admin::mute(bot, msg, state, args, false).await,
        Command::Tmute(args) => admin::mute(bot, msg, state, args, true).await,
        Command::Unmute(args) => admin::unmute(bot, msg, state, args).await,
        Command::Purge(args) => admin::purge(bot, msg, state, args).await,
        Command::Del => admin::delete(bot, msg, state).await,
        Command::Pin => admin::pin(bot, msg, state, true).await,
        Command::Unpin => admin::pin(bot, msg, state, false).await,
        Command::Promote(args) => admin::promote(bot, msg, state, args, false).await,
        Command::Fullpromote(args) => admin::promote(bot, msg, state, args, true).await,
        Command::Demote(args) => admin::demote(bot, msg, state, args).await,
        Command::Warn(args) => warns::warn(bot, msg, state, args, false).await,
        Command::Dwarn(args) => warns::warn(bot, msg, state, args, true).await,
        Command::Rmwarn => warns::clear_warns(bot, msg, state).await,
        Command::Setlang => language::show_language_menu(bot, msg, state).await,
        Command::Start | Command::Help | Command::Report | Command::Warns(_) => Ok(()),
    }
}

/// Handle inline keyboard presses.
pub async fn handle_callback(bot: Bot, q: CallbackQuery, state: Arc<BotState>) -> ResponseResult<()> {
    let data = q.data.clone().unwrap_or_default();
    let Some(request) = request::from_callback(&q) else {
        debug!(data = %data, "Callback without a message ignored");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let Some(action) = CallbackAction::parse(&data) else {
        debug!(data = %data, "Unknown callback data");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let outcome = state
        .gate
        .guard(&request, &action.policy(), || run_callback(&bot, &q, &state, &action))
        .await;

    // Denials and faults were already answered with an alert.
    if outcome.is_completed() {
        bot.answer_callback_query(q.id.clone()).await?;
    }
    log_outcome(&outcome, &data);
    Ok(())
}

async fn run_callback(bot: &Bot, q: &CallbackQuery, state: &BotState, action: &CallbackAction) -> Result<()> {
    match action {
        CallbackAction::Unmute(user_id) => admin::unmute_button(bot, q, state, *user_id).await,
        CallbackAction::Unban(user_id) => admin::unban_button(bot, q, state, *user_id).await,
        CallbackAction::Unwarn(user_id) => warns::unwarn_button(bot, q, state, *user_id).await,
        CallbackAction::ShowLanguages => language::edit_language_menu(bot, q, state).await,
        CallbackAction::SetLanguage(code) => language::set_language(bot, q, state, code).await,
        CallbackAction::Back => language::back_to_start(bot, q, state).await,
    }
}

/// Inline button payloads the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Unmute(i64),
    Unban(i64),
    Unwarn(i64),
    ShowLanguages,
    SetLanguage(String),
    Back,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        if data == "chlang" {
            return Some(CallbackAction::ShowLanguages);
        }
        if data == "start_back" {
            return Some(CallbackAction::Back);
        }
        if let Some(code) = data.strip_prefix("set_lang ") {
            let code = code.trim();
            return (!code.is_empty()).then(|| CallbackAction::SetLanguage(code.to_string()));
        }
        if let Some(id) = data.strip_prefix("unmute_") {
            return id.parse().ok().map(CallbackAction::Unmute);
        }
        if let Some(id) = data.strip_prefix("unban_") {
            return id.parse().ok().map(CallbackAction::Unban);
        }
        if let Some(id) = data.strip_prefix("unwarn_") {
            return id.parse().ok().map(CallbackAction::Unwarn);
        }
        None
    }

    pub fn data(&self) -> String {
        match self {
            CallbackAction::Unmute(id) => format!("unmute_{}", id),
            CallbackAction::Unban(id) => format!("unban_{}", id),
            CallbackAction::Unwarn(id) => format!("unwarn_{}", id),
            CallbackAction::ShowLanguages => "chlang".to_string(),
            CallbackAction::SetLanguage(code) => format!("set_lang {}", code),
            CallbackAction::Back => "start_back".to_string(),
        }
    }

    pub fn policy(&self) -> GatePolicy {
        match self {
            CallbackAction::Unmute(_) | CallbackAction::Unban(_) | CallbackAction::Unwarn(_) => {
                GatePolicy::require(Capability::RestrictMembers)
            }
            CallbackAction::ShowLanguages | CallbackAction::SetLanguage(_) | CallbackAction::Back => {
                GatePolicy::admin().allow_in_private(true)
            }
        }
    }
}

fn log_outcome(outcome: &GuardOutcome, what: &str) {
    match outcome {
        GuardOutcome::Completed => debug!(what = %what, "Handled"),
        GuardOutcome::Denied(decision) => {
            debug!(what = %what, verdict = decision.verdict.as_str(), "Refused by gate")
        }
        GuardOutcome::Faulted(e) => warn!(what = %what, error = %e, "Handler faulted"),
    }
}

/// HTML link that mentions `user` by name.
pub fn mention(user: &User) -> String {
    mention_id(from_user_id(user.id), &user.full_name())
}

/// HTML link that mentions a user id with the given label.
pub fn mention_id(user_id: i64, label: &str) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user_id,
        html::escape(label)
    )
}

/// Reply to `msg` with HTML text.
pub async fn reply_html(bot: &Bot, msg: &Message, text: String) -> ResponseResult<Message> {
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await
}
