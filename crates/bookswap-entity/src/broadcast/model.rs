//! Broadcast entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::audience::{BroadcastPriority, TargetAudience};
use crate::notification::NotificationType;

/// An admin announcement shown to a target audience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Broadcast {
    /// Unique broadcast identifier.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Stored notification type value.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub broadcast_type: String,
    /// Stored priority value.
    pub priority: String,
    /// Stored audience value.
    pub target_audience: String,
    /// Whether the broadcast is switched on.
    pub active: bool,
    /// Admin who created the broadcast.
    pub created_by: Option<Uuid>,
    /// When the broadcast was created.
    pub created_at: DateTime<Utc>,
    /// When the broadcast stops being shown.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Broadcast {
    /// Parsed priority.
    pub fn priority(&self) -> BroadcastPriority {
        BroadcastPriority::from_str_value(&self.priority)
    }

    /// Parsed audience.
    pub fn audience(&self) -> TargetAudience {
        TargetAudience::from_str_value(&self.target_audience)
    }

    /// Parsed notification type.
    pub fn kind(&self) -> NotificationType {
        NotificationType::from_str_value(&self.broadcast_type)
    }

    /// Whether the broadcast is logically expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp < now).unwrap_or(false)
    }

    /// Whether the broadcast should be shown at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired_at(now)
    }
}

/// Input for creating a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewBroadcast {
    /// Title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Body text.
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    /// Type used when the broadcast is materialised.
    pub broadcast_type: NotificationType,
    /// Priority.
    pub priority: BroadcastPriority,
    /// Audience.
    pub target_audience: TargetAudience,
    /// Admin creating the broadcast.
    pub created_by: Option<Uuid>,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update of a broadcast; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BroadcastPatch {
    /// New title.
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    /// New body text.
    #[validate(length(min = 1, max = 2000))]
    pub message: Option<String>,
    /// New priority.
    pub priority: Option<BroadcastPriority>,
    /// New audience.
    pub target_audience: Option<TargetAudience>,
    /// Switch on/off.
    pub active: Option<bool>,
    /// New expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Remove the expiry so the broadcast stays up until deactivated.
    #[serde(default)]
    pub clear_expiry: bool,
}

/// Durable record that a signed-in user has seen a broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BroadcastView {
    /// The broadcast seen.
    pub broadcast_id: Uuid,
    /// The viewer.
    pub user_id: Uuid,
    /// When it was seen.
    pub viewed_at: DateTime<Utc>,
}
