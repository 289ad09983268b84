//! Administrative capability vocabulary and per-call permission sets.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WardenError;

/// A single named administrative permission.
///
/// Variant order follows the order in which a membership lookup reports
/// privilege flags, so iterating a [`PermissionSet`] yields a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "can_post_messages")]
    PostMessages,
    #[serde(rename = "can_edit_messages")]
    EditMessages,
    #[serde(rename = "can_delete_messages")]
    DeleteMessages,
    #[serde(rename = "can_restrict_members")]
    RestrictMembers,
    #[serde(rename = "can_promote_members")]
    PromoteMembers,
    #[serde(rename = "can_change_info")]
    ChangeInfo,
    #[serde(rename = "can_invite_users")]
    InviteUsers,
    #[serde(rename = "can_pin_messages")]
    PinMessages,
    #[serde(rename = "can_manage_video_chats")]
    ManageVideoChats,
}

impl Capability {
    /// Every capability, in vocabulary order.
    pub const ALL: [Capability; 9] = [
        Capability::PostMessages,
        Capability::EditMessages,
        Capability::DeleteMessages,
        Capability::RestrictMembers,
        Capability::PromoteMembers,
        Capability::ChangeInfo,
        Capability::InviteUsers,
        Capability::PinMessages,
        Capability::ManageVideoChats,
    ];

    /// Wire name of the capability, as shown to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::PostMessages => "can_post_messages",
            Capability::EditMessages => "can_edit_messages",
            Capability::DeleteMessages => "can_delete_messages",
            Capability::RestrictMembers => "can_restrict_members",
            Capability::PromoteMembers => "can_promote_members",
            Capability::ChangeInfo => "can_change_info",
            Capability::InviteUsers => "can_invite_users",
            Capability::PinMessages => "can_pin_messages",
            Capability::ManageVideoChats => "can_manage_video_chats",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| WardenError::UnknownCapability(s.to_string()))
    }
}

/// Raw privilege flags reported by a membership lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeFlags {
    pub can_post_messages: bool,
    pub can_edit_messages: bool,
    pub can_delete_messages: bool,
    pub can_restrict_members: bool,
    pub can_promote_members: bool,
    pub can_change_info: bool,
    pub can_invite_users: bool,
    pub can_pin_messages: bool,
    pub can_manage_video_chats: bool,
}

impl PrivilegeFlags {
    /// Flags with every privilege granted (chat owners).
    pub fn all() -> Self {
        Self {
            can_post_messages: true,
            can_edit_messages: true,
            can_delete_messages: true,
            can_restrict_members: true,
            can_promote_members: true,
            can_change_info: true,
            can_invite_users: true,
            can_pin_messages: true,
            can_manage_video_chats: true,
        }
    }

    /// Whether the flag for `capability` is set.
    pub fn grants(&self, capability: Capability) -> bool {
        match capability {
            Capability::PostMessages => self.can_post_messages,
            Capability::EditMessages => self.can_edit_messages,
            Capability::DeleteMessages => self.can_delete_messages,
            Capability::RestrictMembers => self.can_restrict_members,
            Capability::PromoteMembers => self.can_promote_members,
            Capability::ChangeInfo => self.can_change_info,
            Capability::InviteUsers => self.can_invite_users,
            Capability::PinMessages => self.can_pin_messages,
            Capability::ManageVideoChats => self.can_manage_video_chats,
        }
    }
}

/// The set of capabilities an actor holds in one chat.
///
/// Derived per call from a live membership query and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    capabilities: BTreeSet<Capability>,
}

impl PermissionSet {
    /// An empty set ("no capabilities").
    pub fn empty() -> Self {
        Self::default()
    }

    /// Map each granted flag to its capability token.
    pub fn from_flags(flags: &PrivilegeFlags) -> Self {
        Capability::ALL
            .iter()
            .copied()
            .filter(|c| flags.grants(*c))
            .collect()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn insert(&mut self, capability: Capability) -> bool {
        self.capabilities.insert(capability)
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Iterate in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.iter().copied()
    }

    /// Capabilities from `required` that this set lacks, in the order given.
    pub fn missing(&self, required: &[Capability]) -> Vec<Capability> {
        required
            .iter()
            .copied()
            .filter(|c| !self.contains(*c))
            .collect()
    }
}

impl FromIterator<Capability> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self {
            capabilities: iter.into_iter().collect(),
        }
    }
}

/// Comma-join capability names for user-facing messages.
pub fn join_names(capabilities: &[Capability]) -> String {
    capabilities
        .iter()
        .map(Capability::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_round_trips_through_name() {
        for cap in Capability::ALL {
            assert_eq!(cap.as_str().parse::<Capability>().unwrap(), cap);
        }
    }

    #[test]
    fn test_unknown_capability_is_rejected() {
        let err = "can_fly".parse::<Capability>().unwrap_err();
        assert!(matches!(err, WardenError::UnknownCapability(name) if name == "can_fly"));
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Capability::PinMessages).unwrap();
        assert_eq!(json, "\"can_pin_messages\"");
    }

    #[test]
    fn test_from_flags_maps_only_granted() {
        let flags = PrivilegeFlags {
            can_delete_messages: true,
            can_pin_messages: true,
            ..Default::default()
        };
        let set = PermissionSet::from_flags(&flags);

        assert_eq!(set.len(), 2);
        assert!(set.contains(Capability::DeleteMessages));
        assert!(set.contains(Capability::PinMessages));
        assert!(!set.contains(Capability::RestrictMembers));
    }

    #[test]
    fn test_owner_flags_grant_everything() {
        let set = PermissionSet::from_flags(&PrivilegeFlags::all());
        assert_eq!(set.len(), Capability::ALL.len());
    }

    #[test]
    fn test_missing_preserves_input_order() {
        let set: PermissionSet = [Capability::InviteUsers].into_iter().collect();
        let required = [
            Capability::PinMessages,
            Capability::InviteUsers,
            Capability::DeleteMessages,
        ];

        assert_eq!(
            set.missing(&required),
            vec![Capability::PinMessages, Capability::DeleteMessages]
        );
    }

    #[test]
    fn test_join_names() {
        let names = join_names(&[Capability::PinMessages, Capability::RestrictMembers]);
        assert_eq!(names, "can_pin_messages, can_restrict_members");
        assert_eq!(join_names(&[]), "");
    }
}
