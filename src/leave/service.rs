use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::leave::{ledger, state};
use crate::model::application::{
    Application, ApplicationDraft, ApplicationEdit, ApplicationFilter, ApplicationPage,
    ApplicationStatus, Approval, NewApplication,
};
use crate::model::employee::{EmployeeProfile, LeaveBalance};
use crate::model::role::Actor;
use crate::store::{Gateway, IN_FLIGHT, Transaction};

/// Longest reason text accepted, in characters.
pub const REASON_MAX: usize = 1000;

fn bounded_reason(field: &'static str, reason: &str) -> Result<(), AppError> {
    if reason.trim().chars().count() > REASON_MAX {
        return Err(AppError::invalid(
            field,
            format!("must be at most {REASON_MAX} characters"),
        ));
    }
    Ok(())
}

/// Runs ledger decisions inside gateway transactions.
///
/// Every mutating operation locks the employee row before reading any
/// application, so checks and writes for one employee never interleave.
pub struct LeaveDesk<G> {
    gateway: G,
}

impl<G: Gateway> LeaveDesk<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Dry run of a leave request for the calling employee. Returns the day
    /// count it would consume.
    pub async fn validate(
        &self,
        actor: &Actor,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, AppError> {
        let employee_id = actor.require_employee("validate a leave application")?;

        let mut tx = self.gateway.begin().await?;
        let employee = lock_employee(&mut tx, employee_id).await?;
        let in_flight = tx.list_applications(employee_id, &IN_FLIGHT).await?;

        ledger::validate_application(&employee, start, end, &in_flight, None)
    }

    #[instrument(name = "leave_create", skip(self, req), fields(actor = actor.user_id()))]
    pub async fn create_application(
        &self,
        actor: &Actor,
        req: NewApplication,
    ) -> Result<Application, AppError> {
        let employee_id = actor.require_employee("apply for leave")?;
        if let Some(reason) = &req.reason_description {
            bounded_reason("reason_description", reason)?;
        }

        let mut tx = self.gateway.begin().await?;
        let employee = lock_employee(&mut tx, employee_id).await?;
        let in_flight = tx.list_applications(employee_id, &IN_FLIGHT).await?;

        let days =
            ledger::validate_application(&employee, req.start_date, req.end_date, &in_flight, None)?;

        let application = tx
            .insert_application(&ApplicationDraft {
                employee_id,
                leave_type: req.leave_type,
                start_date: req.start_date,
                end_date: req.end_date,
                reason_description: req.reason_description,
            })
            .await?;
        tx.commit().await?;

        info!(application_id = application.id, employee_id, days, "Leave application submitted");
        Ok(application)
    }

    #[instrument(name = "leave_amend", skip(self, edit), fields(actor = actor.user_id()))]
    pub async fn amend_application(
        &self,
        actor: &Actor,
        application_id: u64,
        edit: ApplicationEdit,
    ) -> Result<Application, AppError> {
        actor.require_hr("amend a leave application")?;
        if let Some(reason) = &edit.reason_description {
            bounded_reason("reason_description", reason)?;
        }

        let mut tx = self.gateway.begin().await?;
        let (employee, mut application) = lock_pair(&mut tx, application_id).await?;
        state::ensure_editable(&application)?;

        let start = edit.start_date.unwrap_or(application.start_date);
        let end = edit.end_date.unwrap_or(application.end_date);
        let in_flight = tx.list_applications(employee.id, &IN_FLIGHT).await?;
        ledger::validate_application(&employee, start, end, &in_flight, Some(application.id))?;

        application.start_date = start;
        application.end_date = end;
        if let Some(leave_type) = edit.leave_type {
            application.leave_type = leave_type;
        }
        if let Some(reason) = edit.reason_description {
            application.reason_description = Some(reason);
        }
        application.updated_at = Utc::now();

        tx.save_application(&application).await?;
        tx.commit().await?;

        info!(application_id, "Leave application amended");
        Ok(application)
    }

    #[instrument(name = "leave_approve", skip(self), fields(actor = actor.user_id()))]
    pub async fn approve(&self, actor: &Actor, application_id: u64) -> Result<Approval, AppError> {
        actor.require_hr("approve leave")?;

        let mut tx = self.gateway.begin().await?;
        let (mut employee, mut application) = lock_pair(&mut tx, application_id).await?;
        let pending = tx
            .list_applications(employee.id, &[ApplicationStatus::Pending])
            .await?;

        let leave_balance =
            ledger::apply_approval(&mut employee, &mut application, &pending, Utc::now())?;

        tx.save_employee(&employee).await?;
        tx.save_application(&application).await?;
        tx.commit().await?;

        info!(
            application_id,
            employee_id = employee.id,
            leave_balance,
            "Leave approved"
        );
        Ok(Approval {
            application,
            leave_balance,
        })
    }

    #[instrument(name = "leave_reject", skip(self, reason), fields(actor = actor.user_id()))]
    pub async fn reject(
        &self,
        actor: &Actor,
        application_id: u64,
        reason: Option<&str>,
    ) -> Result<Application, AppError> {
        actor.require_hr("reject leave")?;
        let reason = reason.unwrap_or_default();
        bounded_reason("rejection_reason", reason)?;

        let mut tx = self.gateway.begin().await?;
        let (_, mut application) = lock_pair(&mut tx, application_id).await?;

        ledger::apply_rejection(&mut application, reason, Utc::now())?;

        tx.save_application(&application).await?;
        tx.commit().await?;

        info!(application_id, "Leave rejected");
        Ok(application)
    }

    pub async fn application(
        &self,
        actor: &Actor,
        application_id: u64,
    ) -> Result<Application, AppError> {
        let application = self
            .gateway
            .fetch_application(application_id)
            .await?
            .ok_or(AppError::NotFound {
                resource: "leave application",
                id: application_id,
            })?;

        if !actor.can_view_employee(application.employee_id) {
            return Err(AppError::Forbidden {
                action: "view this leave application",
            });
        }
        Ok(application)
    }

    pub async fn list_applications(
        &self,
        actor: &Actor,
        filter: &ApplicationFilter,
    ) -> Result<ApplicationPage, AppError> {
        actor.require_hr("list leave applications")?;
        self.gateway.search_applications(filter).await
    }

    pub async fn balance(&self, actor: &Actor, employee_id: u64) -> Result<LeaveBalance, AppError> {
        if !actor.can_view_employee(employee_id) {
            return Err(AppError::Forbidden {
                action: "view this leave balance",
            });
        }

        let employee = self
            .gateway
            .fetch_employee(employee_id)
            .await?
            .ok_or(AppError::NotFound {
                resource: "employee",
                id: employee_id,
            })?;
        let pending = self
            .gateway
            .employee_applications(employee_id, &[ApplicationStatus::Pending])
            .await?;

        let reserved_days = ledger::reserved_days(&pending, employee_id, None);
        Ok(LeaveBalance {
            employee_id,
            leave_balance: employee.leave_balance,
            reserved_days,
            available_days: (i64::from(employee.leave_balance) - reserved_days).max(0),
        })
    }
}

async fn lock_employee<T: Transaction>(
    tx: &mut T,
    employee_id: u64,
) -> Result<EmployeeProfile, AppError> {
    tx.lock_employee(employee_id)
        .await?
        .ok_or(AppError::NotFound {
            resource: "employee",
            id: employee_id,
        })
}

/// Locks the owning employee, then the application itself.
async fn lock_pair<T: Transaction>(
    tx: &mut T,
    application_id: u64,
) -> Result<(EmployeeProfile, Application), AppError> {
    let not_found = AppError::NotFound {
        resource: "leave application",
        id: application_id,
    };

    let Some(employee_id) = tx.application_owner(application_id).await? else {
        return Err(not_found);
    };
    let employee = lock_employee(tx, employee_id).await?;
    let application = tx.lock_application(application_id).await?.ok_or(not_found)?;
    Ok((employee, application))
}
