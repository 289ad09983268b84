//! Authorization gate.
//!
//! Sits between the dispatcher and a command handler:
//!
//! ```text
//! update -> gate -> [chat-type] -> [sender] -> [membership] -> handler
//!                        |             |             |
//!                        +-------------+-------------+--> refusal reply
//! ```
//!
//! Refusals are localized and sent through the [`Responder`]. A handler that
//! fails or panics after authorization is reported to the user and logged;
//! the fault never reaches the dispatcher.

mod decision;
mod policy;
mod stages;


pub use decision::{AuthorizationDecision, GuardOutcome, Verdict};
pub use policy::{GatePolicy, PrivilegedIds};
pub use stages::{
    default_stages, AuthStage, ChatTypeStage, MembershipStage, SenderStage, StageContext,
    StageOutcome,
};

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::capability::join_names;
use crate::language::LanguageStore;
use crate::locale::Localizer;
use crate::request::{Request, Responder};
use crate::resolver::PermissionResolver;

/// Decides whether a request may reach its handler.
pub struct AuthorizationGate {
    resolver: Arc<PermissionResolver>,
    responder: Arc<dyn Responder>,
    localizer: Arc<dyn Localizer>,
    languages: Arc<LanguageStore>,
    privileged: PrivilegedIds,
    stages: Vec<Box<dyn AuthStage>>,
}

impl AuthorizationGate {
    pub fn new(
        resolver: Arc<PermissionResolver>,
        responder: Arc<dyn Responder>,
        localizer: Arc<dyn Localizer>,
        languages: Arc<LanguageStore>,
    ) -> Self {
        Self {
            resolver,
            responder,
            localizer,
            languages,
            privileged: PrivilegedIds::new(),
            stages: default_stages(),
        }
    }

    pub fn with_privileged(mut self, privileged: PrivilegedIds) -> Self {
        self.privileged = privileged;
        self
    }

    /// Replace the stage pipeline.
    pub fn with_stages(mut self, stages: Vec<Box<dyn AuthStage>>) -> Self {
        self.stages = stages;
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn resolver(&self) -> &Arc<PermissionResolver> {
        &self.resolver
    }

    pub fn privileged(&self) -> &PrivilegedIds {
        &self.privileged
    }

    /// Run the pipeline and deliver refusal feedback.
    pub async fn authorize(&self, request: &Request, policy: &GatePolicy) -> AuthorizationDecision {
        let ctx = StageContext {
            request,
            policy,
            resolver: &self.resolver,
            privileged: &self.privileged,
        };

        let mut decision = None;
        for stage in &self.stages {
            if let StageOutcome::Decide(d) = stage.evaluate(&ctx).await {
                debug!(
                    stage = stage.name(),
                    chat_id = %request.chat().id,
                    verdict = d.verdict.as_str(),
                    "Authorization decided"
                );
                decision = Some(d);
                break;
            }
        }

        // A pipeline that never decides refuses silently.
        let mut decision = decision.unwrap_or_else(|| AuthorizationDecision::deny(Verdict::NoSender));

        if !decision.allowed {
            info!(
                chat_id = %request.chat().id,
                user_id = ?request.sender(),
                verdict = decision.verdict.as_str(),
                missing = %join_names(&decision.missing_capabilities),
                "Request denied"
            );
            decision.feedback = self.deliver_refusal(request, policy, &decision).await;
        }

        decision
    }

    /// Authorize, then run `handler`, containing any fault it raises.
    pub async fn guard<F, Fut, E>(&self, request: &Request, policy: &GatePolicy, handler: F) -> GuardOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        let decision = self.authorize(request, policy).await;
        if !decision.allowed {
            return GuardOutcome::Denied(decision);
        }

        let fault = match AssertUnwindSafe(handler()).catch_unwind().await {
            Ok(Ok(())) => return GuardOutcome::Completed,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };

        error!(
            chat_id = %request.chat().id,
            user_id = ?request.sender(),
            error = %fault,
            "Handler failed"
        );
        let lang = self.languages.get(request.chat().id);
        let text = self
            .localizer
            .format(&lang, "handler_error", &[("error", fault.as_str())]);
        if let Err(e) = self.responder.reply(request, &text).await {
            warn!(chat_id = %request.chat().id, error = %e, "Could not report handler failure");
        }
        GuardOutcome::Faulted(fault)
    }

    /// Send the refusal message the verdict calls for, if any.
    async fn deliver_refusal(
        &self,
        request: &Request,
        policy: &GatePolicy,
        decision: &AuthorizationDecision,
    ) -> Option<String> {
        let lang = self.languages.get(request.chat().id);
        let text = match decision.verdict {
            Verdict::PrivateChat => self.localizer.text(&lang, "private_not_allowed"),
            Verdict::NotAdministrator if policy.complain => {
                self.localizer.text(&lang, "no_admin_error")
            }
            Verdict::MissingCapabilities if policy.complain => self.localizer.format(
                &lang,
                "no_permission_error",
                &[("permissions", join_names(&decision.missing_capabilities).as_str())],
            ),
            _ => return None,
        };

        if let Err(e) = self.responder.reply(request, &text).await {
            warn!(chat_id = %request.chat().id, error = %e, "Could not deliver refusal");
        }
        Some(text)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
