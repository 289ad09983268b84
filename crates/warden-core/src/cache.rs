//! Per-chat administrator id cache.
//!
//! Entries are refreshed wholesale: either lazily when a lookup finds them
//! older than the TTL, or eagerly when a membership change is observed.
//! Concurrent refreshes of the same chat are tolerated; the last write wins.
//!
//! Entries are never evicted. Memory grows with the number of chats the bot
//! has moderated during the process lifetime.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::clock::{Clock, SystemClock};

/// Default freshness bound for a cache entry (one hour).
pub const DEFAULT_ADMIN_CACHE_TTL_SECS: i64 = 3600;

/// Cached administrator ids for one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCacheEntry {
    pub chat_id: i64,
    pub member_ids: HashSet<i64>,
    pub last_refreshed: DateTime<Utc>,
}

impl AdminCacheEntry {
    /// Stale once `ttl` or more has elapsed since the last refresh.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_refreshed >= ttl
    }
}

/// Administrator-id cache owned by the bot runtime.
pub struct AdminCache {
    entries: RwLock<HashMap<i64, AdminCacheEntry>>,
    ttl: RwLock<Duration>,
    clock: Arc<dyn Clock>,
}

impl AdminCache {
    /// Cache with the default TTL and the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Cache with the default TTL and a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: RwLock::new(Duration::seconds(DEFAULT_ADMIN_CACHE_TTL_SECS)),
            clock,
        }
    }

    /// Override the TTL at construction.
    pub fn with_ttl(self, ttl: Duration) -> Self {
        self.set_ttl(ttl);
        self
    }

    /// Override the TTL at runtime. Applies to existing entries too.
    pub fn set_ttl(&self, ttl: Duration) {
        if let Ok(mut current) = self.ttl.write() {
            *current = ttl;
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
            .read()
            .map(|t| *t)
            .unwrap_or_else(|_| Duration::seconds(DEFAULT_ADMIN_CACHE_TTL_SECS))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Admin ids for `chat_id` if an entry exists and is still fresh.
    pub fn fresh(&self, chat_id: i64) -> Option<HashSet<i64>> {
        let now = self.clock.now();
        let ttl = self.ttl();
        let entries = self.entries.read().ok()?;
        entries
            .get(&chat_id)
            .filter(|entry| !entry.is_stale(now, ttl))
            .map(|entry| entry.member_ids.clone())
    }

    /// Replace the entry for `chat_id`, stamping it with the current time.
    pub fn store(&self, chat_id: i64, member_ids: HashSet<i64>) -> AdminCacheEntry {
        let entry = AdminCacheEntry {
            chat_id,
            member_ids,
            last_refreshed: self.clock.now(),
        };

        if let Ok(mut entries) = self.entries.write() {
            entries.insert(chat_id, entry.clone());
        }
        debug!(chat_id = %chat_id, admins = entry.member_ids.len(), "Admin cache entry stored");
        entry
    }

    /// The raw entry regardless of freshness.
    pub fn entry(&self, chat_id: i64) -> Option<AdminCacheEntry> {
        self.entries.read().ok()?.get(&chat_id).cloned()
    }

    /// Drop the entry so the next lookup goes live.
    pub fn invalidate(&self, chat_id: i64) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(&chat_id).is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AdminCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn ids(values: &[i64]) -> HashSet<i64> {
        values.iter().copied().collect()
    }

    fn cache_with_clock() -> (AdminCache, ManualClock) {
        let clock = ManualClock::new();
        (AdminCache::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_missing_entry_is_not_fresh() {
        let (cache, _) = cache_with_clock();
        assert!(cache.fresh(-100).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_fresh_until_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.store(-100, ids(&[1, 2]));

        clock.advance_secs(3599);
        assert_eq!(cache.fresh(-100), Some(ids(&[1, 2])));

        clock.advance_secs(1);
        assert!(cache.fresh(-100).is_none());
        // Stale entries are kept until overwritten.
        assert!(cache.entry(-100).is_some());
    }

    #[test]
    fn test_store_overwrites_wholesale() {
        let (cache, clock) = cache_with_clock();
        cache.store(-100, ids(&[1, 2]));
        clock.advance_secs(10);
        let entry = cache.store(-100, ids(&[3]));

        assert_eq!(cache.fresh(-100), Some(ids(&[3])));
        assert_eq!(entry.last_refreshed, clock.now());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_override() {
        let (cache, clock) = cache_with_clock();
        let cache = cache.with_ttl(Duration::seconds(60));
        cache.store(-100, ids(&[1]));

        clock.advance_secs(60);
        assert!(cache.fresh(-100).is_none());

        cache.set_ttl(Duration::seconds(120));
        assert!(cache.fresh(-100).is_some());
        assert_eq!(cache.ttl(), Duration::seconds(120));
    }

    #[test]
    fn test_invalidate() {
        let (cache, _) = cache_with_clock();
        cache.store(-100, ids(&[1]));
        assert!(cache.invalidate(-100));
        assert!(!cache.invalidate(-100));
        assert!(cache.entry(-100).is_none());
    }

    #[test]
    fn test_entry_staleness_boundary() {
        let clock = ManualClock::new();
        let entry = AdminCacheEntry {
            chat_id: 1,
            member_ids: HashSet::new(),
            last_refreshed: clock.now(),
        };
        let ttl = Duration::seconds(3600);
        assert!(!entry.is_stale(clock.now() + Duration::seconds(3599), ttl));
        assert!(entry.is_stale(clock.now() + Duration::seconds(3600), ttl));
    }
}
