//! End-to-end authorization flow through the public API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;
use warden_core::{
    AdminCache, AuthorizationGate, Capability, Catalog, ChatKind, ChatMember, ChatRef, Clock,
    GatePolicy, GuardOutcome, LanguageStore, Localizer, MemberStatus, MembershipChange,
    MembershipService, MessageRequest, PermissionResolver, PrivilegeFlags, Request, Responder,
    Verdict, WardenError,
};

const CHAT: i64 = -1001;

/// A chat whose roster can be edited mid-test.
#[derive(Default)]
struct Roster {
    members: Mutex<HashMap<i64, ChatMember>>,
    admin_queries: AtomicUsize,
}

impl Roster {
    fn set(&self, member: ChatMember) {
        self.members.lock().unwrap().insert(member.user_id, member);
    }
}

#[async_trait]
impl MembershipService for Roster {
    async fn get_member(&self, chat_id: i64, user_id: i64) -> warden_core::Result<ChatMember> {
        self.members
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or(WardenError::MemberNotFound { chat_id, user_id })
    }

    async fn list_administrators(&self, _chat_id: i64) -> warden_core::Result<Vec<i64>> {
        self.admin_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .members
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.status.is_admin())
            .map(|m| m.user_id)
            .collect())
    }
}

#[derive(Default)]
struct Outbox(Mutex<Vec<String>>);

#[async_trait]
impl Responder for Outbox {
    async fn reply(&self, _request: &Request, text: &str) -> warden_core::Result<()> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    fn new() -> Self {
        Self(Mutex::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()))
    }

    fn advance(&self, secs: i64) {
        *self.0.lock().unwrap() += Duration::seconds(secs);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn message_from(user_id: i64) -> Request {
    Request::Message(MessageRequest {
        chat: ChatRef::new(CHAT, ChatKind::Supergroup),
        message_id: 42,
        from_user: Some(user_id),
        sender_chat: None,
    })
}

fn restricting_admin(user_id: i64) -> ChatMember {
    ChatMember::new(
        user_id,
        MemberStatus::Administrator,
        PrivilegeFlags {
            can_restrict_members: true,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_ban_flow_for_admin_and_member() {
    let roster = Arc::new(Roster::default());
    roster.set(restricting_admin(10));
    roster.set(ChatMember::plain(20));

    let outbox = Arc::new(Outbox::default());
    let catalog = Arc::new(Catalog::builtin());
    let languages = Arc::new(LanguageStore::new("en-US", vec!["en-US".to_string()]));
    let resolver = Arc::new(PermissionResolver::new(roster.clone(), Arc::new(AdminCache::new())));
    let gate = AuthorizationGate::new(resolver, outbox.clone(), catalog, languages);

    let ban = GatePolicy::require(Capability::RestrictMembers);
    let banned = Arc::new(AtomicUsize::new(0));

    let counter = banned.clone();
    let by_admin = gate
        .guard(&message_from(10), &ban, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), WardenError>(())
        })
        .await;
    assert_eq!(by_admin, GuardOutcome::Completed);

    let counter = banned.clone();
    let by_member = gate
        .guard(&message_from(20), &ban, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), WardenError>(())
        })
        .await;
    match by_member {
        GuardOutcome::Denied(decision) => assert_eq!(decision.verdict, Verdict::NotAdministrator),
        other => panic!("expected denial, got {:?}", other),
    }

    assert_eq!(banned.load(Ordering::SeqCst), 1);
    assert_eq!(*outbox.0.lock().unwrap(), vec!["You need to be an admin to do this."]);
}

#[tokio::test]
async fn test_admin_cache_lifecycle() {
    let roster = Arc::new(Roster::default());
    roster.set(restricting_admin(10));
    let clock = Arc::new(FixedClock::new());
    let cache = Arc::new(AdminCache::with_clock(clock.clone()));
    let resolver = PermissionResolver::new(roster.clone(), cache);

    // Within the hour the first answer is reused.
    assert_eq!(resolver.list_admin_ids(CHAT).await.unwrap().len(), 1);
    roster.set(restricting_admin(11));
    clock.advance(1800);
    assert_eq!(resolver.list_admin_ids(CHAT).await.unwrap().len(), 1);
    assert_eq!(roster.admin_queries.load(Ordering::SeqCst), 1);

    // A promotion refreshes eagerly.
    resolver
        .on_membership_change(&MembershipChange {
            chat_id: CHAT,
            user_id: 11,
            old_status: MemberStatus::Member,
            new_status: MemberStatus::Administrator,
        })
        .await;
    assert_eq!(resolver.list_admin_ids(CHAT).await.unwrap().len(), 2);
    assert_eq!(roster.admin_queries.load(Ordering::SeqCst), 2);

    // After the hour the list is fetched again.
    roster.set(ChatMember::plain(11));
    clock.advance(3600);
    assert_eq!(resolver.list_admin_ids(CHAT).await.unwrap().len(), 1);
    assert_eq!(roster.admin_queries.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_refusal_language_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chat_languages.json");
    let catalog = Catalog::builtin();
    let supported: Vec<String> = catalog.languages().iter().map(|l| l.code.to_string()).collect();

    LanguageStore::new("en-US", supported.clone())
        .with_persistence(&path)
        .set(CHAT, "id-ID")
        .unwrap();

    let roster = Arc::new(Roster::default());
    roster.set(ChatMember::plain(20));
    let outbox = Arc::new(Outbox::default());
    let languages = Arc::new(LanguageStore::new("en-US", supported).with_persistence(&path));
    let resolver = Arc::new(PermissionResolver::new(roster, Arc::new(AdminCache::new())));
    let gate = AuthorizationGate::new(resolver, outbox.clone(), Arc::new(catalog), languages);

    gate.authorize(&message_from(20), &GatePolicy::admin()).await;

    let sent = outbox.0.lock().unwrap().clone();
    assert_eq!(sent, vec![Catalog::builtin().text("id-ID", "no_admin_error")]);
}
