//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::kind::NotificationType;

/// A notification delivered to a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The recipient profile.
    pub user_id: Uuid,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Stored type value (see [`NotificationType`]).
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: String,
    /// Whether the user has read this notification.
    pub read: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Parsed notification type.
    pub fn kind(&self) -> NotificationType {
        NotificationType::from_str_value(&self.notification_type)
    }

    /// Check if the notification has not been read yet.
    pub fn is_unread(&self) -> bool {
        !self.read
    }
}

/// Input for creating a notification.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewNotification {
    /// The recipient profile.
    pub user_id: Uuid,
    /// Title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Body text.
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    /// Type.
    pub notification_type: NotificationType,
}

impl NewNotification {
    /// Build a notification input.
    pub fn new(
        user_id: Uuid,
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            notification_type,
        }
    }
}
