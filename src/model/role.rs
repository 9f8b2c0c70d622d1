use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;

/// Account type stored in `users.role`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Hr,
    Employee,
}

/// An authenticated caller whose role has already been resolved at the HTTP
/// boundary. The leave desk only ever sees this, never the session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Actor {
    Hr { user_id: u64, is_admin: bool },
    Employee { user_id: u64, employee_id: u64 },
}

impl Actor {
    pub fn user_id(&self) -> u64 {
        match self {
            Actor::Hr { user_id, .. } | Actor::Employee { user_id, .. } => *user_id,
        }
    }

    pub fn require_hr(&self, action: &'static str) -> Result<u64, AppError> {
        match self {
            Actor::Hr { user_id, .. } => Ok(*user_id),
            Actor::Employee { .. } => Err(AppError::Forbidden { action }),
        }
    }

    pub fn require_admin(&self, action: &'static str) -> Result<u64, AppError> {
        match self {
            Actor::Hr {
                user_id,
                is_admin: true,
            } => Ok(*user_id),
            _ => Err(AppError::Forbidden { action }),
        }
    }

    /// Returns the caller's employee profile id.
    pub fn require_employee(&self, action: &'static str) -> Result<u64, AppError> {
        match self {
            Actor::Employee { employee_id, .. } => Ok(*employee_id),
            Actor::Hr { .. } => Err(AppError::Forbidden { action }),
        }
    }

    /// HR sees every employee; an employee sees only their own profile.
    pub fn can_view_employee(&self, employee_id: u64) -> bool {
        match self {
            Actor::Hr { .. } => true,
            Actor::Employee {
                employee_id: own, ..
            } => *own == employee_id,
        }
    }
}
