//! Permission resolver: capability lookup plus the cached admin list.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::AdminCache;
use crate::capability::{PermissionSet, PrivilegeFlags};
use crate::error::Result;
use crate::membership::{ChatMember, MemberStatus, MembershipChange, MembershipService};

/// Answers "what may this user do here" and "who administers this chat".
pub struct PermissionResolver {
    membership: Arc<dyn MembershipService>,
    cache: Arc<AdminCache>,
}

impl PermissionResolver {
    pub fn new(membership: Arc<dyn MembershipService>, cache: Arc<AdminCache>) -> Self {
        Self { membership, cache }
    }

    pub fn cache(&self) -> &Arc<AdminCache> {
        &self.cache
    }

    /// Live membership lookup. Failures are logged and mapped to `None`.
    pub async fn member(&self, chat_id: i64, user_id: i64) -> Option<ChatMember> {
        match self.membership.get_member(chat_id, user_id).await {
            Ok(member) => Some(member),
            Err(e) => {
                warn!(chat_id = %chat_id, user_id = %user_id, error = %e, "Membership lookup failed");
                None
            }
        }
    }

    /// The capabilities `user_id` holds in `chat_id`.
    ///
    /// Lookup failures resolve to the empty set, never to an error.
    pub async fn resolve_capabilities(&self, chat_id: i64, user_id: i64) -> PermissionSet {
        self.member(chat_id, user_id)
            .await
            .map(|m| capabilities_of(&m))
            .unwrap_or_default()
    }

    /// Admin ids for the chat, served from cache while fresh.
    pub async fn list_admin_ids(&self, chat_id: i64) -> Result<HashSet<i64>> {
        if let Some(ids) = self.cache.fresh(chat_id) {
            debug!(chat_id = %chat_id, "Admin list served from cache");
            return Ok(ids);
        }
        self.refresh_admins(chat_id).await
    }

    /// Query the admin list live and overwrite the cache entry.
    pub async fn refresh_admins(&self, chat_id: i64) -> Result<HashSet<i64>> {
        let ids: HashSet<i64> = self
            .membership
            .list_administrators(chat_id)
            .await?
            .into_iter()
            .collect();
        let entry = self.cache.store(chat_id, ids);
        Ok(entry.member_ids)
    }

    /// Eagerly refresh the cache after a promotion or demotion.
    pub async fn on_membership_change(&self, change: &MembershipChange) {
        if !change.affects_admins() {
            return;
        }

        match self.refresh_admins(change.chat_id).await {
            Ok(ids) => info!(
                chat_id = %change.chat_id,
                user_id = %change.user_id,
                admins = ids.len(),
                "Updated admin cache after membership change"
            ),
            Err(e) => warn!(
                chat_id = %change.chat_id,
                error = %e,
                "Could not refresh admin cache after membership change"
            ),
        }
    }
}

/// Capabilities granted by a membership record.
pub fn capabilities_of(member: &ChatMember) -> PermissionSet {
    match member.status {
        MemberStatus::Owner => PermissionSet::from_flags(&PrivilegeFlags::all()),
        MemberStatus::Administrator => PermissionSet::from_flags(&member.privileges),
        _ => PermissionSet::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use crate::clock::{Clock, ManualClock};
    use crate::mocks::MockMembership;

    fn setup() -> (Arc<MockMembership>, PermissionResolver, ManualClock) {
        let clock = ManualClock::new();
        let membership = Arc::new(MockMembership::new());
        let cache = Arc::new(AdminCache::with_clock(Arc::new(clock.clone())));
        let resolver = PermissionResolver::new(membership.clone(), cache);
        (membership, resolver, clock)
    }

    #[tokio::test]
    async fn test_resolve_capabilities_for_admin() {
        let (membership, resolver, _) = setup();
        membership.add_admin(
            -100,
            5,
            PrivilegeFlags {
                can_restrict_members: true,
                ..Default::default()
            },
        );

        let set = resolver.resolve_capabilities(-100, 5).await;
        assert!(set.contains(Capability::RestrictMembers));
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_capabilities_unknown_user_is_empty() {
        let (_, resolver, _) = setup();
        assert!(resolver.resolve_capabilities(-100, 404).await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_capabilities_service_error_is_empty() {
        let (membership, resolver, _) = setup();
        membership.add_owner(-100, 1);
        membership.set_failing(true);
        assert!(resolver.resolve_capabilities(-100, 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_plain_member_has_no_capabilities_even_with_flags() {
        let (membership, resolver, _) = setup();
        membership.add_member(
            -100,
            ChatMember::new(6, MemberStatus::Restricted, PrivilegeFlags::all()),
        );
        assert!(resolver.resolve_capabilities(-100, 6).await.is_empty());
    }

    #[tokio::test]
    async fn test_list_admin_ids_cached_within_ttl() {
        let (membership, resolver, clock) = setup();
        membership.add_owner(-100, 1);
        membership.add_admin(-100, 2, PrivilegeFlags::default());

        let first = resolver.list_admin_ids(-100).await.unwrap();
        clock.advance_secs(3599);
        let second = resolver.list_admin_ids(-100).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(membership.admin_list_calls(), 1);
    }

    #[tokio::test]
    async fn test_list_admin_ids_refreshes_after_ttl() {
        let (membership, resolver, clock) = setup();
        membership.add_owner(-100, 1);
        resolver.list_admin_ids(-100).await.unwrap();

        clock.advance_secs(3600);
        membership.add_admin(-100, 9, PrivilegeFlags::default());
        let ids = resolver.list_admin_ids(-100).await.unwrap();

        assert!(ids.contains(&9));
        assert_eq!(membership.admin_list_calls(), 2);
        let entry = resolver.cache().entry(-100).unwrap();
        assert_eq!(entry.last_refreshed, clock.now());
    }

    #[tokio::test]
    async fn test_list_admin_ids_propagates_live_failure() {
        let (membership, resolver, _) = setup();
        membership.set_failing(true);
        assert!(resolver.list_admin_ids(-100).await.is_err());
        assert!(resolver.cache().entry(-100).is_none());
    }

    #[tokio::test]
    async fn test_membership_change_refreshes_eagerly() {
        let (membership, resolver, _) = setup();
        membership.add_owner(-100, 1);
        resolver.list_admin_ids(-100).await.unwrap();

        membership.add_admin(-100, 3, PrivilegeFlags::default());
        resolver
            .on_membership_change(&MembershipChange {
                chat_id: -100,
                user_id: 3,
                old_status: MemberStatus::Member,
                new_status: MemberStatus::Administrator,
            })
            .await;

        assert_eq!(membership.admin_list_calls(), 2);
        assert!(resolver.cache().fresh(-100).unwrap().contains(&3));
    }

    #[tokio::test]
    async fn test_irrelevant_membership_change_is_ignored() {
        let (membership, resolver, _) = setup();
        resolver
            .on_membership_change(&MembershipChange {
                chat_id: -100,
                user_id: 3,
                old_status: MemberStatus::Left,
                new_status: MemberStatus::Member,
            })
            .await;
        assert_eq!(membership.admin_list_calls(), 0);
    }
}
