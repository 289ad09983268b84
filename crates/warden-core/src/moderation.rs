//! Transport-independent pieces of the moderation commands.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::Duration;
use regex::Regex;

use crate::error::{Result, WardenError};
use crate::gate::PrivilegedIds;

/// Telegram refuses to delete more than this many messages in one call.
pub const MAX_DELETE_BATCH: usize = 100;

/// Where a purge stops (exclusive).
///
/// With a count the purge covers `count` messages from `start`, but never
/// reaches past the command message itself.
pub fn purge_end(start: i32, command_id: i32, count: Option<u32>) -> i32 {
    match count {
        Some(n) => {
            let n = i32::try_from(n).unwrap_or(i32::MAX);
            start.saturating_add(n).min(command_id)
        }
        None => command_id,
    }
}

/// Split `start..end` into deletion batches of at most [`MAX_DELETE_BATCH`] ids.
pub fn purge_batches(start: i32, end: i32) -> Vec<Vec<i32>> {
    if end <= start {
        return Vec::new();
    }
    (start..end)
        .collect::<Vec<_>>()
        .chunks(MAX_DELETE_BATCH)
        .map(|c| c.to_vec())
        .collect()
}

fn duration_re() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)([mhdw])$"))
        .as_ref()
        .map_err(|e| WardenError::InvalidDuration(e.to_string()))
}

/// Parse a restriction length such as `30m`, `2h`, `7d` or `1w`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let caps = duration_re()?
        .captures(input)
        .ok_or_else(|| WardenError::InvalidDuration(input.to_string()))?;

    let value: i64 = caps[1]
        .parse()
        .map_err(|_| WardenError::InvalidDuration(input.to_string()))?;
    if value == 0 {
        return Err(WardenError::InvalidDuration(input.to_string()));
    }

    let duration = match &caps[2] {
        "m" => Duration::try_minutes(value),
        "h" => Duration::try_hours(value),
        "d" => Duration::try_days(value),
        "w" => Duration::try_weeks(value),
        _ => None,
    };
    duration.ok_or_else(|| WardenError::InvalidDuration(input.to_string()))
}

/// Why a moderation action may not touch its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRefusal {
    /// The target is the bot itself.
    Bot,
    /// The target is a configured privileged id.
    Privileged,
    /// The target administers the chat.
    Admin,
}

impl TargetRefusal {
    /// Catalog key for the refusal, given the action's key prefix (`ban`, `kick`, `mute`, `warn`).
    pub fn message_key(&self, action: &str) -> String {
        let suffix = match self {
            TargetRefusal::Bot => "self_err",
            TargetRefusal::Privileged => "sudo_err",
            TargetRefusal::Admin => "admin_err",
        };
        format!("{}_{}", action, suffix)
    }
}

/// Check a restriction target in the order bot, privileged, admin.
pub fn check_target(
    target: i64,
    bot_id: i64,
    privileged: &PrivilegedIds,
    admin_ids: &HashSet<i64>,
) -> std::result::Result<(), TargetRefusal> {
    if target == bot_id {
        return Err(TargetRefusal::Bot);
    }
    if privileged.contains(target) {
        return Err(TargetRefusal::Privileged);
    }
    if admin_ids.contains(&target) {
        return Err(TargetRefusal::Admin);
    }
    Ok(())
}

/// Split `/cmd target rest...` arguments into the target token and the rest.
pub fn split_target(args: &str) -> (Option<&str>, Option<&str>) {
    let args = args.trim();
    if args.is_empty() {
        return (None, None);
    }
    match args.split_once(char::is_whitespace) {
        Some((target, rest)) => {
            let rest = rest.trim();
            (Some(target), (!rest.is_empty()).then_some(rest))
        }
        None => (Some(args), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purge_end_defaults_to_command() {
        assert_eq!(purge_end(10, 50, None), 50);
    }

    #[test]
    fn test_purge_end_clamps_to_command() {
        assert_eq!(purge_end(10, 50, Some(5)), 15);
        assert_eq!(purge_end(10, 50, Some(500)), 50);
        assert_eq!(purge_end(10, 50, Some(u32::MAX)), 50);
    }

    #[test]
    fn test_purge_batches_split_at_limit() {
        let batches = purge_batches(1, 251);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 100);
        assert_eq!(batches[1].len(), 100);
        assert_eq!(batches[2].len(), 50);
        assert_eq!(batches[0][0], 1);
        assert_eq!(batches[2][49], 250);
    }

    #[test]
    fn test_purge_batches_empty_range() {
        assert!(purge_batches(5, 5).is_empty());
        assert!(purge_batches(6, 5).is_empty());
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("2h").unwrap(), Duration::hours(2));
        assert_eq!(parse_duration(" 7d ").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("1w").unwrap(), Duration::weeks(1));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for bad in ["", "0m", "10", "m", "5s", "-3h", "1.5h"] {
            assert!(
                matches!(parse_duration(bad), Err(WardenError::InvalidDuration(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_check_target_order() {
        let privileged: PrivilegedIds = [7].into_iter().collect();
        let admins: HashSet<i64> = [7, 8].into_iter().collect();

        assert_eq!(check_target(1, 1, &privileged, &admins), Err(TargetRefusal::Bot));
        assert_eq!(
            check_target(7, 1, &privileged, &admins),
            Err(TargetRefusal::Privileged)
        );
        assert_eq!(check_target(8, 1, &privileged, &admins), Err(TargetRefusal::Admin));
        assert_eq!(check_target(9, 1, &privileged, &admins), Ok(()));
    }

    #[test]
    fn test_refusal_message_keys() {
        assert_eq!(TargetRefusal::Bot.message_key("ban"), "ban_self_err");
        assert_eq!(TargetRefusal::Admin.message_key("kick"), "kick_admin_err");
        assert_eq!(TargetRefusal::Privileged.message_key("mute"), "mute_sudo_err");
    }

    #[test]
    fn test_split_target() {
        assert_eq!(split_target(""), (None, None));
        assert_eq!(split_target("123"), (Some("123"), None));
        assert_eq!(split_target("123  spamming links "), (Some("123"), Some("spamming links")));
    }
}
