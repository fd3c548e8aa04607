//! Observable state of the synchroniser.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use bookswap_entity::notification::Notification;

/// What a UI renders: the list, its counts, and loading/error flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncSnapshot {
    /// Unread notifications in `notifications`.
    pub unread_count: usize,
    /// Length of `notifications`.
    pub total_count: usize,
    /// Deduplicated list, newest first.
    pub notifications: Vec<Notification>,
    /// A fetch is in flight.
    pub is_loading: bool,
    /// The last fetch failed and no retry is left.
    pub has_error: bool,
    /// Message of the surfaced error.
    pub last_error: Option<String>,
}

/// Drop repeated IDs, keeping the first occurrence and the original order.
pub fn dedup_by_id(notifications: Vec<Notification>) -> Vec<Notification> {
    let mut seen = HashSet::with_capacity(notifications.len());
    notifications
        .into_iter()
        .filter(|n| seen.insert(n.id))
        .collect()
}

/// Whether two lists hold the same IDs with the same read flags.
pub fn same_contents(current: &[Notification], fetched: &[Notification]) -> bool {
    if current.len() != fetched.len() {
        return false;
    }
    let current: HashSet<(Uuid, bool)> = current.iter().map(|n| (n.id, n.read)).collect();
    fetched.iter().all(|n| current.contains(&(n.id, n.read)))
}
