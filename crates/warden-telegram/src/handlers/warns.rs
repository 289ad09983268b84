//! Warnings: `/warn`, `/dwarn`, `/rmwarn`, `/warns` and the remove button.

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};
use teloxide::utils::html;
use tracing::info;
use warden_core::{WarnOutcome, MAX_WARNS};

use super::admin::{
    actor_mention, button_message, delete_replied, refuse_target, resolve_target, single_button,
    strike_through,
};
use super::{mention, mention_id, reply_html, CallbackAction};
use crate::error::Result;
use crate::membership::{from_user_id, to_user_id};
use crate::state::BotState;

/// Add a warning, banning the target once the limit is reached.
pub async fn warn(bot: &Bot, msg: &Message, state: &BotState, args: &str, delete: bool) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let (target, reason) = resolve_target(bot, msg, args).await;
    let Some(target) = target else {
        reply_html(bot, msg, state.text(chat_id, "user_not_found")).await?;
        return Ok(());
    };
    if let Some(refusal) = refuse_target(state, chat_id, target.id, "warn").await? {
        reply_html(bot, msg, refusal).await?;
        return Ok(());
    }
    if delete {
        delete_replied(bot, msg).await?;
    }

    match state.warns.warn(chat_id, target.id)? {
        WarnOutcome::LimitReached => {
            bot.ban_chat_member(msg.chat.id, to_user_id(target.id)).await?;
            reply_html(
                bot,
                msg,
                state.format(chat_id, "exceed_warn_msg", &[("mention", target.mention.as_str())]),
            )
            .await?;
            info!(chat_id = %chat_id, target = %target.id, limit = MAX_WARNS, "Banned user after warnings");
        }
        WarnOutcome::Warned { total } => {
            let warner = actor_mention(msg);
            let reason = reason
                .map(|r| html::escape(&r))
                .unwrap_or_else(|| state.text(chat_id, "no_reason"));
            let total = total.to_string();
            let text = state.format(
                chat_id,
                "warn_msg",
                &[
                    ("mention", target.mention.as_str()),
                    ("warner", warner.as_str()),
                    ("reas", reason.as_str()),
                    ("twarn", total.as_str()),
                ],
            );
            let keyboard = single_button(state.text(chat_id, "rmwarn_btn"), CallbackAction::Unwarn(target.id));
            bot.send_message(msg.chat.id, text)
                .parse_mode(ParseMode::Html)
                .reply_parameters(ReplyParameters::new(msg.id))
                .reply_markup(keyboard)
                .await?;
            info!(chat_id = %chat_id, target = %target.id, total = %total, "Warned user");
        }
    }
    Ok(())
}

/// `/rmwarn`: clear every warning of the replied-to user.
pub async fn clear_warns(bot: &Bot, msg: &Message, state: &BotState) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let Some(user) = msg.reply_to_message().and_then(|r| r.from.as_ref()) else {
        reply_html(bot, msg, state.text(chat_id, "reply_to_rm_warn")).await?;
        return Ok(());
    };

    let label = mention(user);
    let key = if state.warns.clear(chat_id, from_user_id(user.id))? {
        "rmwarn_msg"
    } else {
        "user_no_warn"
    };
    reply_html(bot, msg, state.format(chat_id, key, &[("mention", label.as_str())])).await?;
    Ok(())
}

/// `/warns`: show how many warnings a user has.
pub async fn show_warns(bot: &Bot, msg: &Message, state: &BotState, args: &str) -> Result<()> {
    let chat_id = msg.chat.id.0;
    let (target, _) = resolve_target(bot, msg, args).await;
    let Some(target) = target else {
        reply_html(bot, msg, state.text(chat_id, "user_not_found")).await?;
        return Ok(());
    };

    let count = state.warns.count(chat_id, target.id);
    let text = if count == 0 {
        state.format(chat_id, "user_no_warn", &[("mention", target.mention.as_str())])
    } else {
        let warns = count.to_string();
        state.format(
            chat_id,
            "ch_warn_msg",
            &[("mention", target.mention.as_str()), ("warns", warns.as_str())],
        )
    };
    reply_html(bot, msg, text).await?;
    Ok(())
}

/// The remove-warning button under a warn message.
pub async fn unwarn_button(bot: &Bot, q: &CallbackQuery, state: &BotState, user_id: i64) -> Result<()> {
    let (chat, message_id, old_text) = button_message(q)?;
    let footer = match state.warns.remove_one(chat.0, user_id)? {
        Some(_) => state.format(chat.0, "unwarn_msg", &[("mention", mention(&q.from).as_str())]),
        None => {
            let target = mention_id(user_id, &user_id.to_string());
            state.format(chat.0, "user_no_warn", &[("mention", target.as_str())])
        }
    };
    strike_through(bot, chat, message_id, &old_text, footer).await
}
