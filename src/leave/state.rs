//! Leave application status transitions.
//!
//! ```text
//! pending ──approve──▶ approved
//!    └─────reject────▶ rejected
//! ```
//!
//! Both outcomes are terminal.

use crate::error::AppError;
use crate::model::application::{Application, ApplicationStatus};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transition {
    Approve,
    Reject,
}

impl ApplicationStatus {
    /// Approved and rejected applications are processed.
    pub fn is_processed(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    pub fn apply(self, transition: Transition) -> Option<ApplicationStatus> {
        match (self, transition) {
            (ApplicationStatus::Pending, Transition::Approve) => Some(ApplicationStatus::Approved),
            (ApplicationStatus::Pending, Transition::Reject) => Some(ApplicationStatus::Rejected),
            (ApplicationStatus::Approved | ApplicationStatus::Rejected, _) => None,
        }
    }
}

/// Status `application` moves to under `transition`.
pub fn next_status(
    application: &Application,
    transition: Transition,
) -> Result<ApplicationStatus, AppError> {
    application
        .status
        .apply(transition)
        .ok_or(AppError::AlreadyProcessed {
            id: application.id,
            status: application.status,
        })
}

/// Request fields may only change while the application is pending.
pub fn ensure_editable(application: &Application) -> Result<(), AppError> {
    if application.status.is_processed() {
        return Err(AppError::Immutable {
            id: application.id,
            status: application.status,
        });
    }
    Ok(())
}
