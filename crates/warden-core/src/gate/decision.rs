//! Gate outputs. Never persisted.

use crate::capability::Capability;

/// Why the gate allowed or refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Owner,
    Administrator,
    Privileged,
    AnonymousAdmin,
    Channel,
    PrivateAllowed,
    PrivateChat,
    NoSender,
    NotAdministrator,
    MissingCapabilities,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(
            self,
            Verdict::Owner
                | Verdict::Administrator
                | Verdict::Privileged
                | Verdict::AnonymousAdmin
                | Verdict::Channel
                | Verdict::PrivateAllowed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Owner => "owner",
            Verdict::Administrator => "administrator",
            Verdict::Privileged => "privileged",
            Verdict::AnonymousAdmin => "anonymous_admin",
            Verdict::Channel => "channel",
            Verdict::PrivateAllowed => "private_allowed",
            Verdict::PrivateChat => "private_chat",
            Verdict::NoSender => "no_sender",
            Verdict::NotAdministrator => "not_administrator",
            Verdict::MissingCapabilities => "missing_capabilities",
        }
    }
}

/// Result of running the gate over one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    /// Required capabilities the actor lacks, in the policy's order.
    pub missing_capabilities: Vec<Capability>,
    pub verdict: Verdict,
    /// Text delivered to the actor on denial, if any was sent.
    pub feedback: Option<String>,
}

impl AuthorizationDecision {
    pub fn allow(verdict: Verdict) -> Self {
        Self {
            allowed: true,
            missing_capabilities: Vec::new(),
            verdict,
            feedback: None,
        }
    }

    pub fn deny(verdict: Verdict) -> Self {
        Self {
            allowed: false,
            missing_capabilities: Vec::new(),
            verdict,
            feedback: None,
        }
    }

    pub fn deny_missing(missing: Vec<Capability>) -> Self {
        Self {
            allowed: false,
            missing_capabilities: missing,
            verdict: Verdict::MissingCapabilities,
            feedback: None,
        }
    }
}

/// What happened to a guarded handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The gate refused; the handler never ran.
    Denied(AuthorizationDecision),
    /// The handler ran to completion.
    Completed,
    /// The handler failed or panicked; the fault was reported and swallowed.
    Faulted(String),
}

impl GuardOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, GuardOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_verdicts() {
        assert!(Verdict::Owner.is_allowed());
        assert!(Verdict::AnonymousAdmin.is_allowed());
        assert!(!Verdict::NoSender.is_allowed());
        assert!(!Verdict::MissingCapabilities.is_allowed());
    }

    #[test]
    fn test_constructors_agree_with_verdict() {
        assert!(AuthorizationDecision::allow(Verdict::Channel).allowed);
        assert!(!AuthorizationDecision::deny(Verdict::PrivateChat).allowed);

        let denied = AuthorizationDecision::deny_missing(vec![Capability::PinMessages]);
        assert_eq!(denied.verdict, Verdict::MissingCapabilities);
        assert_eq!(denied.missing_capabilities, vec![Capability::PinMessages]);
    }
}
