//! Named authorization stages.
//!
//! The gate runs its stages in order. Each stage either decides the request
//! or passes it on; the first decision wins.

use async_trait::async_trait;
use tracing::debug;

use crate::gate::decision::{AuthorizationDecision, Verdict};
use crate::gate::policy::{GatePolicy, PrivilegedIds};
use crate::membership::MemberStatus;
use crate::request::Request;
use crate::resolver::{capabilities_of, PermissionResolver};

/// Everything a stage may look at.
pub struct StageContext<'a> {
    pub request: &'a Request,
    pub policy: &'a GatePolicy,
    pub resolver: &'a PermissionResolver,
    pub privileged: &'a PrivilegedIds,
}

/// A stage's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Not this stage's call.
    Continue,
    Decide(AuthorizationDecision),
}

/// One step of the authorization pipeline.
#[async_trait]
pub trait AuthStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn evaluate(&self, ctx: &StageContext<'_>) -> StageOutcome;
}

/// Private chats per policy; channels always pass.
pub struct ChatTypeStage;

#[async_trait]
impl AuthStage for ChatTypeStage {
    fn name(&self) -> &'static str {
        "chat-type"
    }

    async fn evaluate(&self, ctx: &StageContext<'_>) -> StageOutcome {
        let kind = ctx.request.chat().kind;
        if kind.is_private() {
            let decision = if ctx.policy.allow_in_private {
                AuthorizationDecision::allow(Verdict::PrivateAllowed)
            } else {
                AuthorizationDecision::deny(Verdict::PrivateChat)
            };
            return StageOutcome::Decide(decision);
        }
        if kind.is_channel() {
            return StageOutcome::Decide(AuthorizationDecision::allow(Verdict::Channel));
        }
        StageOutcome::Continue
    }
}

/// Anonymous admins pass; requests with no addressable sender are dropped.
pub struct SenderStage;

#[async_trait]
impl AuthStage for SenderStage {
    fn name(&self) -> &'static str {
        "sender"
    }

    async fn evaluate(&self, ctx: &StageContext<'_>) -> StageOutcome {
        if ctx.request.is_anonymous_admin() {
            return StageOutcome::Decide(AuthorizationDecision::allow(Verdict::AnonymousAdmin));
        }
        if ctx.request.sender().is_none() {
            return StageOutcome::Decide(AuthorizationDecision::deny(Verdict::NoSender));
        }
        StageOutcome::Continue
    }
}

/// Owner, administrator status and capability checks.
pub struct MembershipStage;

#[async_trait]
impl AuthStage for MembershipStage {
    fn name(&self) -> &'static str {
        "membership"
    }

    async fn evaluate(&self, ctx: &StageContext<'_>) -> StageOutcome {
        let Some(user_id) = ctx.request.sender() else {
            return StageOutcome::Decide(AuthorizationDecision::deny(Verdict::NoSender));
        };
        let chat_id = ctx.request.chat().id;

        let member = ctx.resolver.member(chat_id, user_id).await;
        let status = member.as_ref().map(|m| m.status);

        if status == Some(MemberStatus::Owner) {
            return StageOutcome::Decide(AuthorizationDecision::allow(Verdict::Owner));
        }

        let is_admin = status == Some(MemberStatus::Administrator);
        let is_privileged = ctx.privileged.contains(user_id);
        if !is_admin && !is_privileged {
            return StageOutcome::Decide(AuthorizationDecision::deny(Verdict::NotAdministrator));
        }

        let allowed_as = if is_admin {
            Verdict::Administrator
        } else {
            Verdict::Privileged
        };

        if ctx.policy.required.is_empty() {
            return StageOutcome::Decide(AuthorizationDecision::allow(allowed_as));
        }

        let held = member.as_ref().map(capabilities_of).unwrap_or_default();
        let missing = held.missing(&ctx.policy.required);
        debug!(
            chat_id = %chat_id,
            user_id = %user_id,
            held = held.len(),
            missing = missing.len(),
            "Capability check"
        );

        if missing.is_empty() {
            StageOutcome::Decide(AuthorizationDecision::allow(allowed_as))
        } else {
            StageOutcome::Decide(AuthorizationDecision::deny_missing(missing))
        }
    }
}

/// The standard pipeline: chat type, then sender, then membership.
pub fn default_stages() -> Vec<Box<dyn AuthStage>> {
    vec![
        Box::new(ChatTypeStage),
        Box::new(SenderStage),
        Box::new(MembershipStage),
    ]
}
