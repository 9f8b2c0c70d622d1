//! Leave balance accounting.
//!
//! Everything here is pure: callers load the employee and their in-flight
//! applications inside a locked transaction, run these checks, then persist
//! whatever was mutated.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppError;
use crate::leave::state::{self, Transition};
use crate::model::application::{Application, ApplicationStatus};
use crate::model::employee::EmployeeProfile;

/// Inclusive calendar-day range with `start <= end`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days, counting both endpoints.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Inclusive day count of a stored application.
pub fn application_days(app: &Application) -> i64 {
    (app.end_date - app.start_date).num_days() + 1
}

/// Days held by the employee's pending applications, skipping `exclude`.
pub fn reserved_days(applications: &[Application], employee_id: u64, exclude: Option<u64>) -> i64 {
    applications
        .iter()
        .filter(|app| app.employee_id == employee_id)
        .filter(|app| app.status == ApplicationStatus::Pending)
        .filter(|app| Some(app.id) != exclude)
        .map(application_days)
        .sum()
}

/// Checks whether `[start, end]` may be requested by `employee`.
///
/// `in_flight` is every pending or approved application of the employee;
/// `exclude` names the application being edited so it does not collide with
/// itself. Returns the requested day count.
pub fn validate_application(
    employee: &EmployeeProfile,
    start: NaiveDate,
    end: NaiveDate,
    in_flight: &[Application],
    exclude: Option<u64>,
) -> Result<i64, AppError> {
    let range = DateRange::new(start, end)?;

    if range.start() < employee.joining_date {
        return Err(AppError::BeforeJoining {
            start,
            joining_date: employee.joining_date,
        });
    }

    let conflict = in_flight
        .iter()
        .filter(|app| app.employee_id == employee.id && app.is_in_flight())
        .filter(|app| Some(app.id) != exclude)
        .find(|app| {
            DateRange::new(app.start_date, app.end_date)
                .map(|other| other.overlaps(&range))
                .unwrap_or(false)
        });
    if let Some(app) = conflict {
        return Err(AppError::Overlap {
            conflicting_id: app.id,
        });
    }

    let requested = range.days();
    let reserved = reserved_days(in_flight, employee.id, exclude);
    let available = i64::from(employee.leave_balance) - reserved;
    if requested > available {
        return Err(AppError::InsufficientBalance {
            requested,
            available: available.max(0),
        });
    }

    Ok(requested)
}

/// Approves a pending application and deducts its days from the balance.
///
/// Nothing is mutated unless every check passes. Returns the new balance.
pub fn apply_approval(
    employee: &mut EmployeeProfile,
    application: &mut Application,
    in_flight: &[Application],
    now: DateTime<Utc>,
) -> Result<u32, AppError> {
    let next = state::next_status(application, Transition::Approve)?;

    let days = application_days(application);
    let pending_others = reserved_days(in_flight, employee.id, Some(application.id));
    let available = i64::from(employee.leave_balance) - pending_others;
    if days > available {
        return Err(AppError::InsufficientBalance {
            requested: days,
            available: available.max(0),
        });
    }

    let new_balance = u32::try_from(days)
        .ok()
        .and_then(|days| employee.leave_balance.checked_sub(days))
        .ok_or(AppError::InsufficientBalance {
            requested: days,
            available: i64::from(employee.leave_balance),
        })?;

    employee.leave_balance = new_balance;
    employee.updated_at = now;

    application.status = next;
    application.rejection_reason = None;
    application.updated_at = now;

    Ok(new_balance)
}

/// Rejects a pending application. The balance is untouched.
pub fn apply_rejection(
    application: &mut Application,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let next = state::next_status(application, Transition::Reject)?;

    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::MissingRejectionReason);
    }

    application.status = next;
    application.rejection_reason = Some(reason.to_string());
    application.updated_at = now;
    Ok(())
}
