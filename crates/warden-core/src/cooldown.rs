//! Per-user command rate limiting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::clock::{Clock, SystemClock};

/// Seconds a user must wait between commands.
pub const DEFAULT_COOLDOWN_SECS: i64 = 3;

/// Tracked users above which expired entries are dropped on the next check.
const PRUNE_AT: usize = 1024;

/// What to do with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownVerdict {
    Allowed,
    /// First hit inside the window: tell the user how long to wait.
    Warn { remaining_secs: i64 },
    /// Already warned this window: drop silently.
    Suppress,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    started: DateTime<Utc>,
    warned: bool,
}

/// Tracks the last accepted command per user.
pub struct Cooldown {
    window: Duration,
    slots: Mutex<HashMap<i64, Slot>>,
    clock: Arc<dyn Clock>,
}

impl Cooldown {
    pub fn new(window_secs: i64) -> Self {
        Self::with_clock(window_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(window_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            window: Duration::seconds(window_secs.max(0)),
            slots: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a command from `user_id` and decide whether it may proceed.
    pub fn check(&self, user_id: i64) -> CooldownVerdict {
        let now = self.clock.now();
        let mut slots = match self.slots.lock() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };

        if slots.len() >= PRUNE_AT {
            let window = self.window;
            slots.retain(|_, slot| now - slot.started < window);
        }

        match slots.get_mut(&user_id) {
            Some(slot) if now - slot.started < self.window => {
                if slot.warned {
                    CooldownVerdict::Suppress
                } else {
                    slot.warned = true;
                    let remaining = self.window - (now - slot.started);
                    // Round up so "0s" is never shown.
                    let remaining_secs = (remaining.num_milliseconds() + 999) / 1000;
                    CooldownVerdict::Warn {
                        remaining_secs: remaining_secs.max(1),
                    }
                }
            }
            _ => {
                slots.insert(
                    user_id,
                    Slot {
                        started: now,
                        warned: false,
                    },
                );
                CooldownVerdict::Allowed
            }
        }
    }

    pub fn tracked(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_SECS)
    }
}
