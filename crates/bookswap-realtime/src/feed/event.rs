//! Row-level change events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// A notification was created.
    Insert,
    /// A notification changed (typically `read` flipped).
    Update,
    /// A notification was deleted.
    Delete,
}

/// One change on a user's notification rows, as emitted by the
/// `notifications_change_feed` trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened.
    #[serde(rename = "event")]
    pub kind: ChangeKind,
    /// Owner of the changed row.
    pub user_id: Uuid,
    /// The changed row, when known.
    #[serde(default)]
    pub id: Option<Uuid>,
}

impl ChangeEvent {
    /// Build an event.
    pub fn new(kind: ChangeKind, user_id: Uuid, id: Option<Uuid>) -> Self {
        Self { kind, user_id, id }
    }

    /// An event telling the subscriber to reload everything.
    pub fn resync(user_id: Uuid) -> Self {
        Self::new(ChangeKind::Update, user_id, None)
    }

    /// Whether this event reports a new row.
    pub fn is_insert(&self) -> bool {
        self.kind == ChangeKind::Insert
    }

    /// Parse a `pg_notify` payload.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
