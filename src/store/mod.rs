//! Persistence gateway.
//!
//! The leave desk talks to storage only through these traits. A
//! [`Transaction`] holds row locks until it is committed; dropping it rolls
//! back every write made through it.

pub mod accounts;
#[cfg(test)]
pub mod memory;
pub mod mysql;

use crate::error::AppError;
use crate::model::application::{
    Application, ApplicationDraft, ApplicationFilter, ApplicationPage, ApplicationStatus,
};
use crate::model::employee::EmployeeProfile;

/// Statuses that hold dates and balance.
pub const IN_FLIGHT: [ApplicationStatus; 2] =
    [ApplicationStatus::Pending, ApplicationStatus::Approved];

#[allow(async_fn_in_trait)]
pub trait Gateway {
    type Tx: Transaction;

    async fn begin(&self) -> Result<Self::Tx, AppError>;

    async fn fetch_employee(&self, employee_id: u64) -> Result<Option<EmployeeProfile>, AppError>;

    async fn fetch_application(&self, application_id: u64) -> Result<Option<Application>, AppError>;

    async fn employee_applications(
        &self,
        employee_id: u64,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, AppError>;

    async fn search_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<ApplicationPage, AppError>;
}

/// One atomic unit of work.
///
/// Lock order is employee row first, then application rows. Every read after
/// the employee lock observes the latest committed data.
#[allow(async_fn_in_trait)]
pub trait Transaction {
    /// Resolves which employee owns an application without locking it.
    async fn application_owner(&mut self, application_id: u64) -> Result<Option<u64>, AppError>;

    async fn lock_employee(&mut self, employee_id: u64)
    -> Result<Option<EmployeeProfile>, AppError>;

    async fn lock_application(
        &mut self,
        application_id: u64,
    ) -> Result<Option<Application>, AppError>;

    async fn list_applications(
        &mut self,
        employee_id: u64,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, AppError>;

    async fn insert_application(
        &mut self,
        draft: &ApplicationDraft,
    ) -> Result<Application, AppError>;

    async fn save_application(&mut self, application: &Application) -> Result<(), AppError>;

    async fn save_employee(&mut self, employee: &EmployeeProfile) -> Result<(), AppError>;

    async fn commit(self) -> Result<(), AppError>;
}
