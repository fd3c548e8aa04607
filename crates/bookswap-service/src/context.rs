//! Identity of the user an operation acts for.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookswap_core::error::{AppError, ErrorKind};

/// The signed-in user, passed explicitly into every per-user operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Profile ID.
    pub user_id: Uuid,
    /// Whether the user is an administrator.
    pub is_admin: bool,
}

impl UserIdentity {
    /// A regular user.
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    /// An administrator.
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// Fail with an authorization error unless the user is an admin.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::authorization("Administrator privileges required"))
        }
    }
}

/// Parse an identifier string, failing with a validation error.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|e| {
        AppError::with_source(ErrorKind::Validation, format!("Invalid identifier '{raw}'"), e)
    })
}
