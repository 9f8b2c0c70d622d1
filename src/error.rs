use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;

use crate::model::application::ApplicationStatus;

/// Every failure the service reports to a caller.
///
/// Ledger and state-machine failures are recoverable validation outcomes and
/// map to 4xx responses; `Storage` is the only system fault.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("start_date {start} is after end_date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("start_date {start} is before the joining date {joining_date}")]
    BeforeJoining {
        start: NaiveDate,
        joining_date: NaiveDate,
    },

    #[error("requested dates overlap leave application {conflicting_id}")]
    Overlap { conflicting_id: u64 },

    #[error("requested {requested} day(s) but only {available} day(s) available")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("leave application {id} is already {status}")]
    AlreadyProcessed { id: u64, status: ApplicationStatus },

    #[error("leave application {id} is {status} and can no longer be edited")]
    Immutable { id: u64, status: ApplicationStatus },

    #[error("a rejection reason is required to reject a leave application")]
    MissingRejectionReason,

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: u64 },

    #[error("not allowed to {action}")]
    Forbidden { action: &'static str },

    #[error("{message}")]
    InvalidInput { field: &'static str, message: String },

    #[error("{message}")]
    Conflict { field: &'static str, message: String },

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AppError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Stable machine-readable tag for the failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRange { .. } => "invalid_range",
            Self::BeforeJoining { .. } => "before_joining",
            Self::Overlap { .. } => "overlap",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::AlreadyProcessed { .. } => "already_processed",
            Self::Immutable { .. } => "immutable",
            Self::MissingRejectionReason => "missing_rejection_reason",
            Self::NotFound { .. } => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Conflict { .. } => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Request field the failure is attributed to, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidRange { .. } => Some("end_date"),
            Self::BeforeJoining { .. } | Self::Overlap { .. } => Some("start_date"),
            Self::InsufficientBalance { .. } => Some("leave_balance"),
            Self::AlreadyProcessed { .. } | Self::Immutable { .. } => Some("status"),
            Self::MissingRejectionReason => Some("rejection_reason"),
            Self::InvalidInput { field, .. } | Self::Conflict { field, .. } => Some(field),
            Self::NotFound { .. }
            | Self::Forbidden { .. }
            | Self::Unauthorized(_)
            | Self::Storage(_) => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRange { .. }
            | Self::BeforeJoining { .. }
            | Self::InsufficientBalance { .. }
            | Self::MissingRejectionReason
            | Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Overlap { .. }
            | Self::AlreadyProcessed { .. }
            | Self::Immutable { .. }
            | Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "field": self.field(),
            "message": message,
        }))
    }
}
