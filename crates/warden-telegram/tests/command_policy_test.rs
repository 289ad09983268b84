//! Command policies exercised against the gate with an in-memory chat.

use std::sync::Arc;

use teloxide::utils::command::BotCommands;
use warden_core::mocks::{MockMembership, RecordingResponder};
use warden_core::{
    AdminCache, AuthorizationGate, Catalog, ChatKind, ChatRef, LanguageStore, Localizer,
    MessageRequest, PermissionResolver, PrivilegeFlags, Request, Verdict,
};
use warden_telegram::{policy_for, CallbackAction, Command};

const CHAT: i64 = -100555;
const OWNER: i64 = 1;
const MODERATOR: i64 = 2;
const PINNER: i64 = 3;
const MEMBER: i64 = 4;

fn gate() -> (AuthorizationGate, Arc<RecordingResponder>) {
    let membership = Arc::new(MockMembership::new());
    membership.add_owner(CHAT, OWNER);
    membership.add_admin(
        CHAT,
        MODERATOR,
        PrivilegeFlags {
            can_restrict_members: true,
            can_delete_messages: true,
            ..Default::default()
        },
    );
    membership.add_admin(
        CHAT,
        PINNER,
        PrivilegeFlags {
            can_pin_messages: true,
            ..Default::default()
        },
    );
    membership.add_plain(CHAT, MEMBER);

    let catalog = Arc::new(Catalog::builtin());
    let supported = catalog.languages().iter().map(|l| l.code.to_string()).collect();
    let languages = Arc::new(LanguageStore::new(catalog.default_language(), supported));
    let resolver = Arc::new(PermissionResolver::new(membership, Arc::new(AdminCache::new())));
    let responder = Arc::new(RecordingResponder::new());
    let gate = AuthorizationGate::new(resolver, responder.clone(), catalog, languages);
    (gate, responder)
}

fn command_from(user: i64, kind: ChatKind) -> Request {
    Request::Message(MessageRequest {
        chat: ChatRef::new(if kind == ChatKind::Private { user } else { CHAT }, kind),
        message_id: 10,
        from_user: Some(user),
        sender_chat: None,
    })
}

fn parse(text: &str) -> Command {
    Command::parse(text, "warden_bot").unwrap()
}

#[tokio::test]
async fn test_moderator_can_ban_but_not_pin() {
    let (gate, _) = gate();
    let request = command_from(MODERATOR, ChatKind::Supergroup);

    let ban = policy_for(&parse("/ban 4 spam")).unwrap();
    assert!(gate.authorize(&request, &ban).await.allowed);

    let pin = gate.authorize(&request, &policy_for(&parse("/pin")).unwrap()).await;
    assert!(!pin.allowed);
    assert_eq!(pin.verdict, Verdict::MissingCapabilities);
}

#[tokio::test]
async fn test_owner_passes_every_gated_command() {
    let (gate, _) = gate();
    let request = command_from(OWNER, ChatKind::Supergroup);

    for text in ["/ban", "/purge 5", "/del", "/pin", "/promote", "/demote", "/setlang"] {
        let policy = policy_for(&parse(text)).unwrap();
        assert!(gate.authorize(&request, &policy).await.allowed, "{} refused", text);
    }
}

#[tokio::test]
async fn test_plain_member_is_told_to_be_admin() {
    let (gate, responder) = gate();
    let request = command_from(MEMBER, ChatKind::Supergroup);

    let decision = gate
        .authorize(&request, &policy_for(&parse("/mute")).unwrap())
        .await;

    assert!(!decision.allowed);
    assert_eq!(decision.verdict, Verdict::NotAdministrator);
    assert_eq!(responder.texts(), vec!["You need to be an admin to do this."]);
}

#[tokio::test]
async fn test_group_only_commands_refused_in_private() {
    let (gate, responder) = gate();
    let request = command_from(OWNER, ChatKind::Private);

    let ban = gate.authorize(&request, &policy_for(&parse("/ban")).unwrap()).await;
    assert_eq!(ban.verdict, Verdict::PrivateChat);
    assert_eq!(responder.texts(), vec!["This command can only be used in groups."]);

    let setlang = gate
        .authorize(&request, &policy_for(&parse("/setlang")).unwrap())
        .await;
    assert!(setlang.allowed);
}

#[tokio::test]
async fn test_unmute_button_needs_restrict_rights() {
    let (gate, _) = gate();
    let policy = CallbackAction::parse("unmute_4").unwrap().policy();

    let moderator = command_from(MODERATOR, ChatKind::Supergroup);
    assert!(gate.authorize(&moderator, &policy).await.allowed);

    let pinner = command_from(PINNER, ChatKind::Supergroup);
    assert!(!gate.authorize(&pinner, &policy).await.allowed);
}

#[tokio::test]
async fn test_warn_flow_needs_restrict_rights() {
    let (gate, _) = gate();
    let moderator = command_from(MODERATOR, ChatKind::Supergroup);
    let pinner = command_from(PINNER, ChatKind::Supergroup);

    for text in ["/warn 4 flood", "/dwarn", "/rmwarn"] {
        let policy = policy_for(&parse(text)).unwrap();
        assert!(gate.authorize(&moderator, &policy).await.allowed, "{} refused", text);
        assert!(!gate.authorize(&pinner, &policy).await.allowed, "{} allowed", text);
    }

    let unwarn = CallbackAction::parse("unwarn_4").unwrap().policy();
    assert!(gate.authorize(&moderator, &unwarn).await.allowed);
    assert!(!gate.authorize(&pinner, &unwarn).await.allowed);

    assert!(policy_for(&parse("/warns 4")).is_none());
}
