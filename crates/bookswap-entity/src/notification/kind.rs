//! Notification type enumeration.

use serde::{Deserialize, Serialize};

/// Visual/semantic type of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Neutral information.
    Info,
    /// A completed action (order placed, payment received).
    Success,
    /// Something needs attention.
    Warning,
    /// Something failed.
    Error,
    /// A materialised admin broadcast.
    Broadcast,
}

impl NotificationType {
    /// Return the type as stored in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Broadcast => "broadcast",
        }
    }

    /// Parse a stored value; unknown values fall back to `Info`.
    pub fn from_str_value(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "success" => Self::Success,
            "warning" => Self::Warning,
            "error" => Self::Error,
            "broadcast" => Self::Broadcast,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
