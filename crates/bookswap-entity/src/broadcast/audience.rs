//! Broadcast priority and audience enumerations.

use serde::{Deserialize, Serialize};

/// Broadcast priority, ordered from least to most important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastPriority {
    /// Background announcements.
    Low,
    /// Standard announcements.
    Normal,
    /// Important announcements.
    High,
    /// Must be seen immediately (outages, policy changes).
    Urgent,
}

impl BroadcastPriority {
    /// Parse from string; unknown values are `Normal`.
    pub fn from_str_value(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Normal,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// Who a broadcast is shown to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetAudience {
    /// Everyone, including guests.
    All,
    /// Regular (non-admin) users and guests.
    Users,
    /// Administrators only.
    Admin,
}

impl TargetAudience {
    /// Parse from string; unknown values are `All`.
    pub fn from_str_value(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "users" => Self::Users,
            "admin" => Self::Admin,
            _ => Self::All,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Users => "users",
            Self::Admin => "admin",
        }
    }

    /// Whether a viewer with the given admin flag is part of this audience.
    pub fn includes(&self, is_admin: bool) -> bool {
        match self {
            Self::All => true,
            Self::Users => !is_admin,
            Self::Admin => is_admin,
        }
    }
}

impl std::fmt::Display for TargetAudience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
