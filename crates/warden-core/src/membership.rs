//! Chat membership abstraction.
//!
//! The gate never talks to a chat platform directly. It asks a
//! [`MembershipService`] for one member's status and privileges, or for the
//! ids of every administrator in a chat. The Telegram crate implements this
//! trait on top of the Bot API; tests implement it in memory.

use async_trait::async_trait;

use crate::capability::PrivilegeFlags;
use crate::error::Result;

/// A member's role in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    /// Owner or administrator.
    pub fn is_admin(&self) -> bool {
        matches!(self, MemberStatus::Owner | MemberStatus::Administrator)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Owner => "owner",
            MemberStatus::Administrator => "administrator",
            MemberStatus::Member => "member",
            MemberStatus::Restricted => "restricted",
            MemberStatus::Left => "left",
            MemberStatus::Banned => "banned",
        }
    }
}

/// One user's membership in one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMember {
    pub user_id: i64,
    pub status: MemberStatus,
    pub privileges: PrivilegeFlags,
}

impl ChatMember {
    pub fn new(user_id: i64, status: MemberStatus, privileges: PrivilegeFlags) -> Self {
        Self {
            user_id,
            status,
            privileges,
        }
    }

    /// A regular member with no privileges.
    pub fn plain(user_id: i64) -> Self {
        Self::new(user_id, MemberStatus::Member, PrivilegeFlags::default())
    }
}

/// Membership queries against the chat platform.
#[async_trait]
pub trait MembershipService: Send + Sync {
    /// Look up a single member's status and privilege flags.
    async fn get_member(&self, chat_id: i64, user_id: i64) -> Result<ChatMember>;

    /// Enumerate the user ids of every administrator (owner included).
    async fn list_administrators(&self, chat_id: i64) -> Result<Vec<i64>>;
}

/// A promotion, demotion or other status change observed in a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipChange {
    pub chat_id: i64,
    pub user_id: i64,
    pub old_status: MemberStatus,
    pub new_status: MemberStatus,
}

impl MembershipChange {
    /// Whether the change can alter the chat's administrator list.
    ///
    /// Admin-to-admin transitions count too: they carry privilege edits.
    pub fn affects_admins(&self) -> bool {
        let old_admin = self.old_status.is_admin();
        let new_admin = self.new_status.is_admin();
        (old_admin || new_admin) && (self.old_status != self.new_status || old_admin)
    }
}
