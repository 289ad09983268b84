//! Moderation commands. Each one runs only after the gate has allowed it.

use std::time::Duration as StdDuration;

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{
    ChatPermissions, InlineKeyboardButton, InlineKeyboardMarkup, Message, MessageId, ParseMode,
    ReplyParameters,
};
use teloxide::utils::html;
use tracing::{info, warn};
use warden_core::moderation::split_target;
use warden_core::{check_target, parse_duration, purge_batches, purge_end};

use super::{mention, mention_id, reply_html, CallbackAction};
use crate::error::{Result, TelegramError};
use crate::membership::{from_user_id, to_user_id, ChatMemberKindExt};
use crate::request;
use crate::state::BotState;

/// Variants of `/ban`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanMode {
    Plain,
    /// Also delete the replied-to message.
    DeleteReplied,
    /// First argument is a duration.
    Timed,
}

/// A resolved command target.
pub(super) struct Target {
    pub(super) id: i64,
    pub(super) mention: String,
}

/// Pick the target id and the free text that follows it.
///
/// A reply targets the replied-to author and leaves all arguments as text.
/// Otherwise the first argument must be a numeric user id.
pub fn target_and_reason(args: &str, replied_user: Option<i64>) -> (Option<i64>, Option<String>) {
    let args = args.trim();
    if let Some(user_id) = replied_user {
        return (Some(user_id), (!args.is_empty()).then(|| args.to_string()));
    }
    let (target, rest) = split_target(args);
    (
        target.and_then(|t| t.parse().ok()),
        rest.map(|r| r.to_string()),
    )
}

/// Split `<duration> [reason]`.
pub fn duration_and_reason(text: &str) -> (&str, Option<&str>) {
    match split_target(text) {
        (Some(duration), reason) => (duration, reason),
        (None, _) => ("", None),
    }
}

pub(super) async fn resolve_target(bot: &Bot, msg: &Message, args: &str) -> (Option<Target>, Option<String>) {
    let replied = msg.reply_to_message().and_then(|r| r.from.as_ref());
    let (user_id, reason) = target_and_reason(args, replied.map(|u| from_user_id(u.id)));

    let target = match (user_id, replied) {
        (Some(_), Some(user)) => Some(Target {
            id: from_user_id(user.id),
            mention: mention(user),
        }),
        (Some(id), None) => {
            let label = match bot.get_chat_member(msg.chat.id, to_user_id(id)).await {
                Ok(member) => mention(&member.user),
                Err(_) => mention_id(id, &id.to_string()),
            };
            Some(Target { id, mention: label })
        }
        (None, _) => None,
    };
    (target, reason)
}

/// Refusal text when the target is the bot, privileged or an admin.
pub(super) async fn refuse_target(state: &BotState, chat_id: i64, target: i64, action: &str) -> Result<Option<String>> {
    let admins = state.resolver.list_admin_ids(chat_id).await?;
    Ok(check_target(target, state.bot_id, state.gate.privileged(), &admins)
        .err()
        .map(|refusal| state.text(chat_id, &refusal.message_key(action))))
}

pub(super) fn actor_mention(msg: &Message) -> String {
    request::sender_user(msg)
        .and(msg.from.as_ref())
        .map(mention)
        .unwrap_or_else(|| "Anon".to_string())
}

/// Lift a ban. A target who is still in the chat is left alone.
fn lift_ban(bot: &Bot, chat: ChatId, user_id: i64) -> <Bot as Requester>::UnbanChatMember {
    bot.unban_chat_member(chat, to_user_id(user_id))
        .only_if_banned(true)
}

pub(super) fn single_button(label: String, action: CallbackAction) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        format!("🚨 {} 🚨", label),
        action.data(),
    )]])
}

pub(super) async fn delete_replied(bot: &Bot, msg: &Message) -> Result<()> {
    if let Some(replied) = msg.reply_to_message() {
        bot.delete_message(msg.chat.id, replied.id).await?;
    }
    Ok(())
}

pub async fn ban(bot: &Bot, msg: &Message, state: &BotState, args: &str, mode: BanMode) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let (target, reason) = resolve_target(bot, msg, args).await;
    let Some(target) = target else {
        reply_html(bot, msg, state.text(chat_id, "user_not_found")).await?;
        return Ok(());
    };
    if let Some(refusal) = refuse_target(state, chat_id, target.id, "ban").await? {
        reply_html(bot, msg, refusal).await?;
        return Ok(());
    }

    let id = target.id.to_string();
    let banner = actor_mention(msg);
    let mut text = state.format(
        chat_id,
        "ban_msg",
        &[
            ("mention", target.mention.as_str()),
            ("id", id.as_str()),
            ("banner", banner.as_str()),
        ],
    );

    if mode == BanMode::DeleteReplied {
        delete_replied(bot, msg).await?;
    }

    if mode == BanMode::Timed {
        let (value, temp_reason) = duration_and_reason(reason.as_deref().unwrap_or_default());
        let Ok(duration) = parse_duration(value) else {
            reply_html(bot, msg, state.text(chat_id, "invalid_duration")).await?;
            return Ok(());
        };
        text += &state.format(chat_id, "banner_time", &[("val", value)]);
        if let Some(r) = temp_reason {
            text += &state.format(chat_id, "banned_reason", &[("reas", html::escape(r).as_str())]);
        }
        bot.ban_chat_member(msg.chat.id, to_user_id(target.id))
            .until_date(Utc::now() + duration)
            .await?;
        reply_html(bot, msg, text).await?;
        info!(chat_id = %chat_id, target = %target.id, duration = %value, "Temporarily banned user");
        return Ok(());
    }

    if let Some(r) = reason.as_deref() {
        text += &state.format(chat_id, "banned_reason", &[("reas", html::escape(r).as_str())]);
    }
    bot.ban_chat_member(msg.chat.id, to_user_id(target.id)).await?;
    let keyboard = single_button(state.text(chat_id, "unban_btn"), CallbackAction::Unban(target.id));
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .reply_markup(keyboard)
        .await?;
    info!(chat_id = %chat_id, target = %target.id, "Banned user");
    Ok(())
}

pub async fn unban(bot: &Bot, msg: &Message, state: &BotState, args: &str) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let (target, _) = resolve_target(bot, msg, args).await;
    let Some(target) = target else {
        reply_html(bot, msg, state.text(chat_id, "user_not_found")).await?;
        return Ok(());
    };
    lift_ban(bot, msg.chat.id, target.id).await?;
    reply_html(
        bot,
        msg,
        state.format(chat_id, "unban_success", &[("umention", target.mention.as_str())]),
    )
    .await?;
    Ok(())
}

pub async fn kick(bot: &Bot, msg: &Message, state: &BotState, args: &str, delete: bool) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let (target, reason) = resolve_target(bot, msg, args).await;
    let Some(target) = target else {
        reply_html(bot, msg, state.text(chat_id, "user_not_found")).await?;
        return Ok(());
    };
    if let Some(refusal) = refuse_target(state, chat_id, target.id, "kick").await? {
        reply_html(bot, msg, refusal).await?;
        return Ok(());
    }

    let id = target.id.to_string();
    let kicker = actor_mention(msg);
    let reason = reason.map(|r| html::escape(&r)).unwrap_or_else(|| "-".to_string());
    let text = state.format(
        chat_id,
        "kick_msg",
        &[
            ("mention", target.mention.as_str()),
            ("id", id.as_str()),
            ("kicker", kicker.as_str()),
            ("reasonmsg", reason.as_str()),
        ],
    );
    if delete {
        delete_replied(bot, msg).await?;
    }

    if let Err(e) = bot.ban_chat_member(msg.chat.id, to_user_id(target.id)).await {
        warn!(chat_id = %chat_id, error = %e, "Kick failed");
        reply_html(bot, msg, state.text(chat_id, "no_ban_permission")).await?;
        return Ok(());
    }
    reply_html(bot, msg, text).await?;
    tokio::time::sleep(StdDuration::from_secs(1)).await;
    bot.unban_chat_member(msg.chat.id, to_user_id(target.id)).await?;
    info!(chat_id = %chat_id, target = %target.id, "Kicked user");
    Ok(())
}

pub async fn mute(bot: &Bot, msg: &Message, state: &BotState, args: &str, timed: bool) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let (target, reason) = resolve_target(bot, msg, args).await;
    let Some(target) = target else {
        reply_html(bot, msg, state.text(chat_id, "user_not_found")).await?;
        return Ok(());
    };
    if let Some(refusal) = refuse_target(state, chat_id, target.id, "mute").await? {
        reply_html(bot, msg, refusal).await?;
        return Ok(());
    }

    let muter = actor_mention(msg);
    let mut text = state.format(
        chat_id,
        "muted_msg",
        &[
            ("mention", target.mention.as_str()),
            ("muter", muter.as_str()),
        ],
    );
    let keyboard = single_button(state.text(chat_id, "unmute_btn"), CallbackAction::Unmute(target.id));

    let restrict = bot.restrict_chat_member(msg.chat.id, to_user_id(target.id), ChatPermissions::empty());
    if timed {
        let (value, temp_reason) = duration_and_reason(reason.as_deref().unwrap_or_default());
        let Ok(duration) = parse_duration(value) else {
            reply_html(bot, msg, state.text(chat_id, "invalid_duration")).await?;
            return Ok(());
        };
        text += &state.format(chat_id, "muted_time", &[("val", value)]);
        if let Some(r) = temp_reason {
            text += &state.format(chat_id, "banned_reason", &[("reas", html::escape(r).as_str())]);
        }
        restrict.until_date(Utc::now() + duration).await?;
    } else {
        if let Some(r) = reason.as_deref() {
            text += &state.format(chat_id, "banned_reason", &[("reas", html::escape(r).as_str())]);
        }
        restrict.await?;
    }

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    info!(chat_id = %chat_id, target = %target.id, timed = timed, "Muted user");
    Ok(())
}

pub async fn unmute(bot: &Bot, msg: &Message, state: &BotState, args: &str) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let (target, _) = resolve_target(bot, msg, args).await;
    let Some(target) = target else {
        reply_html(bot, msg, state.text(chat_id, "user_not_found")).await?;
        return Ok(());
    };
    bot.restrict_chat_member(msg.chat.id, to_user_id(target.id), ChatPermissions::all())
        .await?;
    reply_html(
        bot,
        msg,
        state.format(chat_id, "unmute_msg", &[("umention", target.mention.as_str())]),
    )
    .await?;
    Ok(())
}

pub async fn purge(bot: &Bot, msg: &Message, state: &BotState, args: &str) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let Some(replied) = msg.reply_to_message() else {
        reply_html(bot, msg, state.text(chat_id, "purge_no_reply")).await?;
        return Ok(());
    };
    bot.delete_message(msg.chat.id, msg.id).await?;

    let count = args.trim().parse::<u32>().ok();
    let end = purge_end(replied.id.0, msg.id.0, count);

    let mut total = 0usize;
    for batch in purge_batches(replied.id.0, end) {
        let size = batch.len();
        bot.delete_messages(msg.chat.id, batch.into_iter().map(MessageId).collect::<Vec<_>>())
            .await?;
        total += size;
    }

    bot.send_message(
        msg.chat.id,
        state.format(chat_id, "purge_success", &[("del_total", total.to_string().as_str())]),
    )
    .await?;
    info!(chat_id = %chat_id, deleted = total, "Purged messages");
    Ok(())
}

pub async fn delete(bot: &Bot, msg: &Message, state: &BotState) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let Some(replied) = msg.reply_to_message() else {
        reply_html(bot, msg, state.text(chat_id, "delete_no_reply")).await?;
        return Ok(());
    };
    let deleted = async {
        bot.delete_message(msg.chat.id, replied.id).await?;
        bot.delete_message(msg.chat.id, msg.id).await
    };
    if let Err(e) = deleted.await {
        warn!(chat_id = %chat_id, error = %e, "Delete failed");
        reply_html(bot, msg, state.text(chat_id, "no_delete_perm")).await?;
    }
    Ok(())
}

pub async fn pin(bot: &Bot, msg: &Message, state: &BotState, pin: bool) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let Some(replied) = msg.reply_to_message() else {
        reply_html(bot, msg, state.text(chat_id, "pin_no_reply")).await?;
        return Ok(());
    };

    let result = if pin {
        bot.pin_chat_message(msg.chat.id, replied.id)
            .disable_notification(true)
            .await
    } else {
        bot.unpin_chat_message(msg.chat.id)
            .message_id(replied.id)
            .await
    };

    let key = match result {
        Ok(_) if pin => "pin_success",
        Ok(_) => "unpin_success",
        Err(e) => {
            warn!(chat_id = %chat_id, error = %e, "Pin change failed");
            "pin_no_perm"
        }
    };
    reply_html(bot, msg, state.text(chat_id, key)).await?;
    Ok(())
}

pub async fn promote(bot: &Bot, msg: &Message, state: &BotState, args: &str, full: bool) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let (target, _) = resolve_target(bot, msg, args).await;
    let Some(target) = target else {
        reply_html(bot, msg, state.text(chat_id, "user_not_found")).await?;
        return Ok(());
    };
    if target.id == state.bot_id {
        reply_html(bot, msg, state.text(chat_id, "promote_self_err")).await?;
        return Ok(());
    }

    let me = bot
        .get_chat_member(msg.chat.id, to_user_id(state.bot_id))
        .await?
        .kind;
    if !me.can_promote_members() {
        reply_html(bot, msg, state.text(chat_id, "no_promote_perm")).await?;
        return Ok(());
    }

    // A normal promotion never hands out info or promotion rights.
    bot.promote_chat_member(msg.chat.id, to_user_id(target.id))
        .can_change_info(full && me.can_change_info())
        .can_invite_users(me.can_invite_users())
        .can_delete_messages(me.can_delete_messages())
        .can_restrict_members(me.can_restrict_members())
        .can_pin_messages(me.can_pin_messages())
        .can_promote_members(full && me.can_promote_members())
        .can_manage_chat(me.can_manage_chat())
        .can_manage_video_chats(me.can_manage_video_chats())
        .await?;

    let key = if full { "full_promote" } else { "normal_promote" };
    reply_html(
        bot,
        msg,
        state.format(chat_id, key, &[("umention", target.mention.as_str())]),
    )
    .await?;
    info!(chat_id = %chat_id, target = %target.id, full = full, "Promoted user");
    Ok(())
}

pub async fn demote(bot: &Bot, msg: &Message, state: &BotState, args: &str) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let (target, _) = resolve_target(bot, msg, args).await;
    let Some(target) = target else {
        reply_html(bot, msg, state.text(chat_id, "user_not_found")).await?;
        return Ok(());
    };
    if target.id == state.bot_id {
        reply_html(bot, msg, state.text(chat_id, "demote_self_err")).await?;
        return Ok(());
    }
    if state.gate.privileged().contains(target.id) {
        reply_html(bot, msg, state.text(chat_id, "demote_sudo_err")).await?;
        return Ok(());
    }

    bot.promote_chat_member(msg.chat.id, to_user_id(target.id))
        .can_change_info(false)
        .can_invite_users(false)
        .can_delete_messages(false)
        .can_restrict_members(false)
        .can_pin_messages(false)
        .can_promote_members(false)
        .can_manage_chat(false)
        .can_manage_video_chats(false)
        .await?;

    reply_html(
        bot,
        msg,
        state.format(chat_id, "demote_msg", &[("umention", target.mention.as_str())]),
    )
    .await?;
    info!(chat_id = %chat_id, target = %target.id, "Demoted user");
    Ok(())
}

/// `/report`: ping every admin about the replied-to message.
pub async fn report(bot: &Bot, msg: &Message, state: &BotState) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let Some(reporter) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(reported) = msg.reply_to_message().and_then(|r| r.from.as_ref()) else {
        reply_html(bot, msg, state.text(chat_id, "report_no_reply")).await?;
        return Ok(());
    };
    if reported.id == reporter.id {
        reply_html(bot, msg, state.text(chat_id, "report_self_err")).await?;
        return Ok(());
    }

    let admins = state.resolver.list_admin_ids(chat_id).await?;
    if admins.contains(&from_user_id(reported.id)) {
        reply_html(bot, msg, state.text(chat_id, "reported_is_admin")).await?;
        return Ok(());
    }

    let mut text = state.format(chat_id, "report_msg", &[("user_mention", mention(reported).as_str())]);
    for admin in admins.iter().filter(|id| **id != state.bot_id) {
        text += &format!("<a href=\"tg://user?id={}\">\u{200b}</a>", admin);
    }
    reply_html(bot, msg, text).await?;
    info!(chat_id = %chat_id, reported = %reported.id, admins = admins.len(), "Report sent");
    Ok(())
}

/// The message carrying a pressed button.
pub(super) fn button_message(q: &CallbackQuery) -> Result<(ChatId, MessageId, String)> {
    let message = q
        .message
        .as_ref()
        .ok_or(TelegramError::MissingContext("callback message"))?;
    let old_text = message
        .regular_message()
        .and_then(|m| m.text())
        .unwrap_or_default()
        .to_string();
    Ok((message.chat().id, message.id(), old_text))
}

pub(super) async fn strike_through(bot: &Bot, chat: ChatId, message_id: MessageId, old_text: &str, footer: String) -> Result<()> {
    let text = format!("<s>{}</s>\n\n{}", html::escape(old_text), footer);
    bot.edit_message_text(chat, message_id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn unmute_button(bot: &Bot, q: &CallbackQuery, state: &BotState, user_id: i64) -> Result<()> {
    let (chat, message_id, old_text) = button_message(q)?;
    bot.restrict_chat_member(chat, to_user_id(user_id), ChatPermissions::all())
        .await?;
    let footer = state.format(chat.0, "rmmute_msg", &[("mention", mention(&q.from).as_str())]);
    strike_through(bot, chat, message_id, &old_text, footer).await
}

pub async fn unban_button(bot: &Bot, q: &CallbackQuery, state: &BotState, user_id: i64) -> Result<()> {
    let (chat, message_id, old_text) = button_message(q)?;
    lift_ban(bot, chat, user_id).await?;
    let footer = state.format(chat.0, "unban_msg", &[("mention", mention(&q.from).as_str())]);
    strike_through(bot, chat, message_id, &old_text, footer).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::requests::HasPayload;

    #[test]
    fn test_lift_ban_spares_current_members() {
        let bot = Bot::new("0:test");
        let request = lift_ban(&bot, ChatId(-100), 42);
        let payload = request.payload_ref();
        assert_eq!(payload.user_id, UserId(42));
        assert_eq!(payload.only_if_banned, Some(true));
    }

    #[test]
    fn test_reply_targets_author() {
        assert_eq!(
            target_and_reason("flooding the chat", Some(42)),
            (Some(42), Some("flooding the chat".to_string()))
        );
        assert_eq!(target_and_reason("  ", Some(42)), (Some(42), None));
    }

    #[test]
    fn test_numeric_argument_targets_id() {
        assert_eq!(
            target_and_reason("12345 spam", None),
            (Some(12345), Some("spam".to_string()))
        );
        assert_eq!(target_and_reason("12345", None), (Some(12345), None));
    }

    #[test]
    fn test_missing_or_bad_target() {
        assert_eq!(target_and_reason("", None), (None, None));
        assert_eq!(
            target_and_reason("@someone rude", None),
            (None, Some("rude".to_string()))
        );
    }

    #[test]
    fn test_duration_and_reason() {
        assert_eq!(duration_and_reason("2h cool off"), ("2h", Some("cool off")));
        assert_eq!(duration_and_reason("30m"), ("30m", None));
        assert_eq!(duration_and_reason(""), ("", None));
    }
}
