//! Per-handler authorization requirements.

use std::collections::HashSet;

use crate::capability::Capability;

/// What a handler demands of the actor before it may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePolicy {
    /// Capabilities the actor must hold, checked in this order.
    pub required: Vec<Capability>,
    /// Run in private chats instead of refusing.
    pub allow_in_private: bool,
    /// Tell the actor why they were refused.
    pub complain: bool,
}

impl GatePolicy {
    /// Any administrator, group chats only, complain on denial.
    pub fn admin() -> Self {
        Self {
            required: Vec::new(),
            allow_in_private: false,
            complain: true,
        }
    }

    /// Administrators holding `capability`.
    pub fn require(capability: Capability) -> Self {
        Self::admin().with_capability(capability)
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.required.push(capability);
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.required.extend(capabilities);
        self
    }

    pub fn allow_in_private(mut self, allow: bool) -> Self {
        self.allow_in_private = allow;
        self
    }

    pub fn complain(mut self, complain: bool) -> Self {
        self.complain = complain;
        self
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::admin()
    }
}

/// Operator-configured identities that skip the administrator-status check.
///
/// Privileged ids still need every capability a policy names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegedIds {
    ids: HashSet<i64>,
}

impl PrivilegedIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.ids.contains(&user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl FromIterator<i64> for PrivilegedIds {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
