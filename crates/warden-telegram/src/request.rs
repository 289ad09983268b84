//! Conversion of Telegram updates into gate requests.

use teloxide::types::{CallbackQuery, Chat, Message};
use warden_core::{CallbackRequest, ChatKind, ChatRef, MessageRequest, Request as WardenRequest};

use crate::membership::from_user_id;

pub fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_channel() {
        ChatKind::Channel
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else {
        ChatKind::Group
    }
}

pub fn chat_ref(chat: &Chat) -> ChatRef {
    ChatRef::new(chat.id.0, chat_kind(chat))
}

/// The user who wrote `msg`.
///
/// `None` for messages posted under a chat's identity. Telegram fills `from`
/// with a placeholder account for those (`GroupAnonymousBot` for anonymous
/// admins, the Telegram service account for linked channels) and sets
/// `sender_chat`.
pub fn sender_user(msg: &Message) -> Option<i64> {
    if msg.sender_chat.is_some() {
        return None;
    }
    msg.from
        .as_ref()
        .filter(|u| !u.is_anonymous() && !u.is_channel())
        .map(|u| from_user_id(u.id))
}

pub fn from_message(msg: &Message) -> WardenRequest {
    WardenRequest::Message(MessageRequest {
        chat: chat_ref(&msg.chat),
        message_id: msg.id.0,
        from_user: sender_user(msg),
        sender_chat: msg.sender_chat.as_ref().map(|c| c.id.0),
    })
}

/// `None` for callbacks that carry no message, such as buttons on inline-mode results.
pub fn from_callback(q: &CallbackQuery) -> Option<WardenRequest> {
    let message = q.message.as_ref()?;
    Some(WardenRequest::Callback(CallbackRequest {
        chat: chat_ref(message.chat()),
        query_id: q.id.clone(),
        from_user: from_user_id(q.from.id),
        data: q.data.clone(),
        message_id: Some(message.id().0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GROUP: i64 = -1001234;

    fn message(from: serde_json::Value, sender_chat: Option<serde_json::Value>) -> Message {
        let mut raw = json!({
            "message_id": 10,
            "date": 1700000000,
            "chat": {"id": GROUP, "title": "Group", "type": "supergroup"},
            "from": from,
            "text": "/ban",
        });
        if let Some(sender_chat) = sender_chat {
            raw["sender_chat"] = sender_chat;
        }
        serde_json::from_value(raw).unwrap()
    }

    fn group_chat() -> serde_json::Value {
        json!({"id": GROUP, "title": "Group", "type": "supergroup"})
    }

    #[test]
    fn test_anonymous_admin_message() {
        let msg = message(
            json!({"id": 1087968824, "is_bot": true, "first_name": "Group", "username": "GroupAnonymousBot"}),
            Some(group_chat()),
        );

        let request = from_message(&msg);
        assert_eq!(request.sender(), None);
        assert!(request.is_anonymous_admin());
    }

    #[test]
    fn test_regular_user_message() {
        let msg = message(json!({"id": 42, "is_bot": false, "first_name": "Alice"}), None);

        let request = from_message(&msg);
        assert_eq!(request.sender(), Some(42));
        assert!(!request.is_anonymous_admin());
    }

    #[test]
    fn test_linked_channel_post_has_no_sender() {
        let msg = message(
            json!({"id": 777000, "is_bot": false, "first_name": "Telegram"}),
            Some(json!({"id": -1009999, "title": "News", "type": "channel"})),
        );

        let request = from_message(&msg);
        assert_eq!(request.sender(), None);
        assert!(!request.is_anonymous_admin());
    }
}
