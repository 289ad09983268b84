//! Inbound requests the gate can authorize.
//!
//! A command arrives either as a message or as a button press (callback
//! query). Both expose the same chat, optional sender and reply capability.

use async_trait::async_trait;

use crate::error::Result;

/// The kind of chat a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn is_private(&self) -> bool {
        matches!(self, ChatKind::Private)
    }

    pub fn is_channel(&self) -> bool {
        matches!(self, ChatKind::Channel)
    }

    pub fn is_group_like(&self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// Chat identity and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatRef {
    pub id: i64,
    pub kind: ChatKind,
}

impl ChatRef {
    pub fn new(id: i64, kind: ChatKind) -> Self {
        Self { id, kind }
    }
}

/// A command sent as a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRequest {
    pub chat: ChatRef,
    pub message_id: i32,
    /// The user who wrote the message, absent for anonymous senders.
    pub from_user: Option<i64>,
    /// Set when the message was sent on behalf of a chat.
    pub sender_chat: Option<i64>,
}

/// A button press on one of the bot's inline keyboards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackRequest {
    pub chat: ChatRef,
    pub query_id: String,
    pub from_user: i64,
    pub data: Option<String>,
    /// The message carrying the keyboard, when still accessible.
    pub message_id: Option<i32>,
}

/// Either origin of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Message(MessageRequest),
    Callback(CallbackRequest),
}

impl Request {
    pub fn chat(&self) -> ChatRef {
        match self {
            Request::Message(m) => m.chat,
            Request::Callback(c) => c.chat,
        }
    }

    /// The identifiable user behind the request, if any.
    pub fn sender(&self) -> Option<i64> {
        match self {
            Request::Message(m) => m.from_user,
            Request::Callback(c) => Some(c.from_user),
        }
    }

    /// Message posted by an admin hiding behind the chat's own identity.
    pub fn is_anonymous_admin(&self) -> bool {
        match self {
            Request::Message(m) => m.from_user.is_none() && m.sender_chat == Some(m.chat.id),
            Request::Callback(_) => false,
        }
    }

    pub fn is_callback(&self) -> bool {
        matches!(self, Request::Callback(_))
    }
}

/// Delivers text back to whoever issued a request.
///
/// Message requests get a reply to the message; callback requests get an
/// alert on the pressed button.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, request: &Request, text: &str) -> Result<()>;
}
