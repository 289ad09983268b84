//! Bot API implementation of the membership seam.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{Administrator, ChatMemberKind, Restricted};
use tracing::debug;
use warden_core::{ChatMember, MemberStatus, MembershipService, PrivilegeFlags, WardenError};

/// Answers membership queries with `getChatMember` / `getChatAdministrators`.
#[derive(Clone)]
pub struct TelegramMembership {
    bot: Bot,
}

impl TelegramMembership {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MembershipService for TelegramMembership {
    async fn get_member(&self, chat_id: i64, user_id: i64) -> warden_core::Result<ChatMember> {
        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), to_user_id(user_id))
            .await
            .map_err(|e| WardenError::Membership(e.to_string()))?;
        Ok(ChatMember::new(
            user_id,
            status_of(&member.kind),
            privileges_of(&member.kind),
        ))
    }

    async fn list_administrators(&self, chat_id: i64) -> warden_core::Result<Vec<i64>> {
        let admins = self
            .bot
            .get_chat_administrators(ChatId(chat_id))
            .await
            .map_err(|e| WardenError::Membership(e.to_string()))?;
        debug!(chat_id = %chat_id, count = admins.len(), "Fetched administrators");
        Ok(admins.iter().map(|m| from_user_id(m.user.id)).collect())
    }
}

/// Map a Bot API member kind onto a [`MemberStatus`].
pub fn status_of(kind: &ChatMemberKind) -> MemberStatus {
    if kind.is_owner() {
        MemberStatus::Owner
    } else if kind.is_administrator() {
        MemberStatus::Administrator
    } else if kind.is_restricted() {
        MemberStatus::Restricted
    } else if kind.is_left() {
        MemberStatus::Left
    } else if kind.is_banned() {
        MemberStatus::Banned
    } else {
        MemberStatus::Member
    }
}

/// Privilege flags as reported for administrators. Empty for everyone else.
pub fn privileges_of(kind: &ChatMemberKind) -> PrivilegeFlags {
    if !kind.is_administrator() {
        return PrivilegeFlags::default();
    }
    PrivilegeFlags {
        can_post_messages: kind.can_post_messages(),
        can_edit_messages: kind.can_edit_messages(),
        can_delete_messages: kind.can_delete_messages(),
        can_restrict_members: kind.can_restrict_members(),
        can_promote_members: kind.can_promote_members(),
        can_change_info: kind.can_change_info(),
        can_invite_users: kind.can_invite_users(),
        can_pin_messages: kind.can_pin_messages(),
        can_manage_video_chats: kind.can_manage_video_chats(),
    }
}

/// Privilege accessors that teloxide-core 0.10 dropped from `ChatMemberKind`,
/// with the same semantics as the 0.9 versions.
pub trait ChatMemberKindExt {
    fn can_change_info(&self) -> bool;
    fn can_invite_users(&self) -> bool;
    fn can_pin_messages(&self) -> bool;
}

impl ChatMemberKindExt for ChatMemberKind {
    fn can_change_info(&self) -> bool {
        match self {
            Self::Owner(_) => true,
            Self::Administrator(Administrator { can_change_info, .. })
            | Self::Restricted(Restricted { can_change_info, .. }) => *can_change_info,
            Self::Member | Self::Left | Self::Banned(_) => false,
        }
    }

    fn can_invite_users(&self) -> bool {
        match self {
            Self::Owner(_) => true,
            Self::Administrator(Administrator { can_invite_users, .. })
            | Self::Restricted(Restricted { can_invite_users, .. }) => *can_invite_users,
            Self::Member | Self::Left | Self::Banned(_) => false,
        }
    }

    fn can_pin_messages(&self) -> bool {
        match self {
            Self::Owner(_) => true,
            Self::Administrator(Administrator { can_pin_messages, .. })
            | Self::Restricted(Restricted { can_pin_messages, .. }) => *can_pin_messages,
            Self::Member | Self::Left | Self::Banned(_) => false,
        }
    }
}

pub fn to_user_id(user_id: i64) -> UserId {
    UserId(user_id as u64)
}

pub fn from_user_id(user_id: UserId) -> i64 {
    user_id.0 as i64
}
