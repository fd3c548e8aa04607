//! Cache and local-store key builders.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

use uuid::Uuid;

/// Prefix applied to all BookSwap cache keys.
const PREFIX: &str = "bookswap";

// ── Notification keys ──────────────────────────────────────

/// Cache key for the full notification list of a user.
pub fn notification_list(user_id: Uuid) -> String {
    format!("{PREFIX}:notif:list:{user_id}")
}

/// Cache key for the unread notification count of a user.
pub fn unread_notification_count(user_id: Uuid) -> String {
    format!("{PREFIX}:notif:unread:{user_id}")
}

/// Pattern matching every notification cache entry.
pub fn notification_pattern() -> String {
    format!("{PREFIX}:notif:*")
}

// ── Local store keys ───────────────────────────────────────

/// Local-store key holding the broadcast IDs a guest has dismissed.
pub const DISMISSED_BROADCASTS: &str = "dismissed_broadcasts";

/// Local-store key set when the broadcasts table is missing.
pub const BROADCASTS_DISABLED: &str = "broadcasts_disabled";
