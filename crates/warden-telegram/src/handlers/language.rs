//! Language selection menu.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, ReplyParameters};
use warden_core::{Language, Localizer};

use super::CallbackAction;
use crate::error::{Result, TelegramError};
use crate::state::BotState;

const BUTTONS_PER_ROW: usize = 2;

/// One button per language, two to a row, followed by a back button.
pub fn language_keyboard(languages: &[Language], back_label: &str) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = languages
        .chunks(BUTTONS_PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(|lang| {
                    InlineKeyboardButton::callback(
                        format!("{} {}", lang.flag, lang.name),
                        CallbackAction::SetLanguage(lang.code.to_string()).data(),
                    )
                })
                .collect()
        })
        .collect();
    rows.push(vec![back_button(back_label)]);
    InlineKeyboardMarkup::new(rows)
}

/// Keyboard shown under the start message.
pub fn start_keyboard(language_label: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        language_label.to_string(),
        CallbackAction::ShowLanguages.data(),
    )]])
}

fn back_button(label: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label.to_string(), CallbackAction::Back.data())
}

fn menu_prompt_key(private: bool) -> &'static str {
    if private {
        "language_changer_private"
    } else {
        "language_changer_chat"
    }
}

fn menu(state: &BotState, chat_id: i64) -> InlineKeyboardMarkup {
    language_keyboard(&state.catalog.languages(), &state.text(chat_id, "back_btn"))
}

/// `/setlang`: reply with the language picker.
pub async fn show_language_menu(bot: &Bot, msg: &Message, state: &BotState) -> Result<()> {
    let chat_id = msg.chat.id.0;
    bot.send_message(msg.chat.id, state.text(chat_id, menu_prompt_key(msg.chat.is_private())))
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .reply_markup(menu(state, chat_id))
        .await?;
    Ok(())
}

/// The "language" button under the start message.
pub async fn edit_language_menu(bot: &Bot, q: &CallbackQuery, state: &BotState) -> Result<()> {
    let message = q
        .message
        .as_ref()
        .ok_or(TelegramError::MissingContext("callback message"))?;
    let chat = message.chat();
    bot.edit_message_text(chat.id, message.id(), state.text(chat.id.0, menu_prompt_key(chat.is_private())))
        .parse_mode(ParseMode::Html)
        .reply_markup(menu(state, chat.id.0))
        .await?;
    Ok(())
}

/// A language button: store the choice and confirm in the new language.
pub async fn set_language(bot: &Bot, q: &CallbackQuery, state: &BotState, code: &str) -> Result<()> {
    let message = q
        .message
        .as_ref()
        .ok_or(TelegramError::MissingContext("callback message"))?;
    let chat = message.chat();

    if !state.catalog.supports(code) {
        bot.edit_message_text(chat.id, message.id(), state.text(chat.id.0, "language_unknown"))
            .reply_markup(menu(state, chat.id.0))
            .await?;
        return Ok(());
    }

    state.languages.set(chat.id.0, code)?;

    let confirm = bot.edit_message_text(
        chat.id,
        message.id(),
        state.text(chat.id.0, "language_changed_successfully"),
    );
    if chat.is_private() {
        let back = InlineKeyboardMarkup::new(vec![vec![back_button(&state.text(chat.id.0, "back_btn"))]]);
        confirm.reply_markup(back).await?;
    } else {
        confirm.await?;
    }
    Ok(())
}

/// The back button: return to the start message.
pub async fn back_to_start(bot: &Bot, q: &CallbackQuery, state: &BotState) -> Result<()> {
    let message = q
        .message
        .as_ref()
        .ok_or(TelegramError::MissingContext("callback message"))?;
    let chat_id = message.chat().id;
    bot.edit_message_text(chat_id, message.id(), state.text(chat_id.0, "start_msg"))
        .parse_mode(ParseMode::Html)
        .reply_markup(start_keyboard(&state.text(chat_id.0, "language_btn")))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;
    use warden_core::Catalog;

    fn callback_data(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("unexpected button kind: {:?}", other),
        }
    }

    #[test]
    fn test_language_keyboard_layout() {
        let kb = language_keyboard(&Catalog::builtin().languages(), "Back");

        assert_eq!(kb.inline_keyboard.len(), 2);
        let langs = &kb.inline_keyboard[0];
        assert_eq!(langs.len(), 2);
        assert_eq!(langs[0].text, "🇺🇸 English");
        assert_eq!(callback_data(&langs[0]), "set_lang en-US");
        assert_eq!(callback_data(&langs[1]), "set_lang id-ID");

        let back = &kb.inline_keyboard[1];
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].text, "Back");
        assert_eq!(callback_data(&back[0]), "start_back");
    }

    #[test]
    fn test_language_keyboard_wraps_rows() {
        let lang = Language {
            code: "xx",
            name: "X",
            flag: "🏳",
        };
        let kb = language_keyboard(&[lang, lang, lang], "Back");
        let sizes: Vec<usize> = kb.inline_keyboard.iter().map(|row| row.len()).collect();
        assert_eq!(sizes, vec![2, 1, 1]);
    }

    #[test]
    fn test_start_keyboard_opens_menu() {
        let kb = start_keyboard("🌐 Language");
        assert_eq!(callback_data(&kb.inline_keyboard[0][0]), "chlang");
    }

    #[test]
    fn test_menu_prompt_depends_on_chat() {
        assert_eq!(menu_prompt_key(true), "language_changer_private");
        assert_eq!(menu_prompt_key(false), "language_changer_chat");
    }
}
