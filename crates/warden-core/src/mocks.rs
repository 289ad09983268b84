//! In-memory doubles for the membership service and responder.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::capability::PrivilegeFlags;
use crate::error::{Result, WardenError};
use crate::membership::{ChatMember, MemberStatus, MembershipService};
use crate::request::{Request, Responder};

/// Membership table keyed by `(chat_id, user_id)`.
#[derive(Default)]
pub struct MockMembership {
    members: Mutex<HashMap<(i64, i64), ChatMember>>,
    failing: AtomicBool,
    member_calls: AtomicUsize,
    admin_list_calls: AtomicUsize,
}

impl MockMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, chat_id: i64, member: ChatMember) {
        if let Ok(mut members) = self.members.lock() {
            members.insert((chat_id, member.user_id), member);
        }
    }

    pub fn add_owner(&self, chat_id: i64, user_id: i64) {
        self.add_member(
            chat_id,
            ChatMember::new(user_id, MemberStatus::Owner, PrivilegeFlags::all()),
        );
    }

    pub fn add_admin(&self, chat_id: i64, user_id: i64, privileges: PrivilegeFlags) {
        self.add_member(
            chat_id,
            ChatMember::new(user_id, MemberStatus::Administrator, privileges),
        );
    }

    pub fn add_plain(&self, chat_id: i64, user_id: i64) {
        self.add_member(chat_id, ChatMember::plain(user_id));
    }

    /// Make every call fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn member_calls(&self) -> usize {
        self.member_calls.load(Ordering::SeqCst)
    }

    pub fn admin_list_calls(&self) -> usize {
        self.admin_list_calls.load(Ordering::SeqCst)
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(WardenError::Membership("service unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipService for MockMembership {
    async fn get_member(&self, chat_id: i64, user_id: i64) -> Result<ChatMember> {
        self.member_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        self.members
            .lock()
            .ok()
            .and_then(|m| m.get(&(chat_id, user_id)).cloned())
            .ok_or(WardenError::MemberNotFound { chat_id, user_id })
    }

    async fn list_administrators(&self, chat_id: i64) -> Result<Vec<i64>> {
        self.admin_list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        let members = self
            .members
            .lock()
            .map_err(|e| WardenError::Membership(e.to_string()))?;
        let mut ids: Vec<i64> = members
            .iter()
            .filter(|((chat, _), m)| *chat == chat_id && m.status.is_admin())
            .map(|((_, user), _)| *user)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

/// Records every reply instead of sending it.
#[derive(Default)]
pub struct RecordingResponder {
    sent: Mutex<Vec<(Request, String)>>,
    failing: AtomicBool,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every reply; attempts are still recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|s| s.iter().map(|(_, t)| t.clone()).collect())
            .unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<(Request, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn reply(&self, request: &Request, text: &str) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((request.clone(), text.to_string()));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(WardenError::Reply("chat unavailable".to_string()));
        }
        Ok(())
    }
}
