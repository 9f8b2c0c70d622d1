//! In-memory gateway used by the leave desk tests.
//!
//! Transactions behave like InnoDB rows under `FOR UPDATE`: `lock_employee`
//! takes a per-employee row lock held until commit or drop, and writes stay
//! private to the transaction until commit. Nothing else is serialized, and
//! every read yields to the executor, so concurrent desk calls interleave
//! exactly as far as the desk's own locking allows.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use crate::error::AppError;
use crate::model::application::{
    Application, ApplicationDraft, ApplicationFilter, ApplicationPage, ApplicationStatus,
};
use crate::model::employee::EmployeeProfile;
use crate::store::{Gateway, Transaction};

#[derive(Debug, Default)]
struct MemoryState {
    employees: BTreeMap<u64, EmployeeProfile>,
    applications: BTreeMap<u64, Application>,
    next_application_id: u64,
}

#[derive(Clone, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
    row_locks: Arc<Mutex<HashMap<u64, Arc<RowLock<()>>>>>,
    fail_commits: Arc<AtomicBool>,
}

/// Stands in for the network round trip of a real query.
async fn round_trip() {
    tokio::task::yield_now().await;
}

fn sorted(mut apps: Vec<Application>) -> Vec<Application> {
    apps.sort_by_key(|app| app.start_date);
    apps
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn row_lock(&self, employee_id: u64) -> Arc<RowLock<()>> {
        self.row_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(employee_id)
            .or_default()
            .clone()
    }

    pub async fn add_employee(&self, employee: EmployeeProfile) {
        self.state().employees.insert(employee.id, employee);
    }

    pub async fn add_application(&self, application: Application) {
        let mut state = self.state();
        state.next_application_id = state.next_application_id.max(application.id);
        state.applications.insert(application.id, application);
    }

    pub async fn employee(&self, employee_id: u64) -> Option<EmployeeProfile> {
        self.state().employees.get(&employee_id).cloned()
    }

    fn committed_application(&self, application_id: u64) -> Option<Application> {
        self.state().applications.get(&application_id).cloned()
    }

    pub async fn stored_application(&self, application_id: u64) -> Option<Application> {
        self.committed_application(application_id)
    }

    /// Makes every later commit fail as if the connection dropped.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

pub struct MemoryTx {
    gateway: MemoryGateway,
    held: HashMap<u64, OwnedMutexGuard<()>>,
    employees: BTreeMap<u64, EmployeeProfile>,
    applications: BTreeMap<u64, Application>,
    fail_commit: bool,
}

impl MemoryTx {
    fn application(&self, application_id: u64) -> Option<Application> {
        self.applications
            .get(&application_id)
            .cloned()
            .or_else(|| self.gateway.committed_application(application_id))
    }
}

impl Gateway for MemoryGateway {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, AppError> {
        Ok(MemoryTx {
            gateway: self.clone(),
            held: HashMap::new(),
            employees: BTreeMap::new(),
            applications: BTreeMap::new(),
            fail_commit: self.fail_commits.load(Ordering::SeqCst),
        })
    }

    async fn fetch_employee(&self, employee_id: u64) -> Result<Option<EmployeeProfile>, AppError> {
        Ok(self.employee(employee_id).await)
    }

    async fn fetch_application(&self, application_id: u64) -> Result<Option<Application>, AppError> {
        Ok(self.stored_application(application_id).await)
    }

    async fn employee_applications(
        &self,
        employee_id: u64,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, AppError> {
        let apps = self
            .state()
            .applications
            .values()
            .filter(|app| app.employee_id == employee_id && statuses.contains(&app.status))
            .cloned()
            .collect();
        Ok(sorted(apps))
    }

    async fn search_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<ApplicationPage, AppError> {
        let state = self.state();
        let mut matching: Vec<&Application> = state
            .applications
            .values()
            .filter(|app| filter.employee_id.is_none_or(|id| app.employee_id == id))
            .filter(|app| filter.status.is_none_or(|status| app.status == status))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let data = matching
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(filter.per_page() as usize)
            .cloned()
            .collect();

        Ok(ApplicationPage {
            data,
            page: filter.page(),
            per_page: filter.per_page(),
            total,
        })
    }
}

impl Transaction for MemoryTx {
    async fn application_owner(&mut self, application_id: u64) -> Result<Option<u64>, AppError> {
        round_trip().await;
        Ok(self.application(application_id).map(|app| app.employee_id))
    }

    async fn lock_employee(
        &mut self,
        employee_id: u64,
    ) -> Result<Option<EmployeeProfile>, AppError> {
        if !self.held.contains_key(&employee_id) {
            let guard = self.gateway.row_lock(employee_id).lock_owned().await;
            self.held.insert(employee_id, guard);
        }
        round_trip().await;

        let employee = match self.employees.get(&employee_id) {
            Some(written) => Some(written.clone()),
            None => self.gateway.state().employees.get(&employee_id).cloned(),
        };
        Ok(employee)
    }

    async fn lock_application(
        &mut self,
        application_id: u64,
    ) -> Result<Option<Application>, AppError> {
        round_trip().await;
        Ok(self.application(application_id))
    }

    async fn list_applications(
        &mut self,
        employee_id: u64,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, AppError> {
        round_trip().await;

        let mut visible: BTreeMap<u64, Application> = self
            .gateway
            .state()
            .applications
            .values()
            .filter(|app| app.employee_id == employee_id)
            .map(|app| (app.id, app.clone()))
            .collect();
        for app in self.applications.values() {
            if app.employee_id == employee_id {
                visible.insert(app.id, app.clone());
            }
        }

        let apps = visible
            .into_values()
            .filter(|app| statuses.contains(&app.status))
            .collect();
        Ok(sorted(apps))
    }

    async fn insert_application(
        &mut self,
        draft: &ApplicationDraft,
    ) -> Result<Application, AppError> {
        let id = {
            let mut state = self.gateway.state();
            state.next_application_id += 1;
            state.next_application_id
        };
        let now = Utc::now();
        let application = Application {
            id,
            employee_id: draft.employee_id,
            status: ApplicationStatus::Pending,
            leave_type: draft.leave_type,
            start_date: draft.start_date,
            end_date: draft.end_date,
            reason_description: draft.reason_description.clone(),
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.applications.insert(id, application.clone());
        Ok(application)
    }

    async fn save_application(&mut self, application: &Application) -> Result<(), AppError> {
        self.applications
            .insert(application.id, application.clone());
        Ok(())
    }

    async fn save_employee(&mut self, employee: &EmployeeProfile) -> Result<(), AppError> {
        self.employees.insert(employee.id, employee.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), AppError> {
        round_trip().await;
        if self.fail_commit {
            return Err(AppError::Storage(sqlx::Error::PoolTimedOut));
        }

        let mut state = self.gateway.state();
        state.employees.extend(self.employees);
        state.applications.extend(self.applications);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[actix_web::test]
    async fn employee_row_lock_is_held_until_commit() {
        let gateway = MemoryGateway::new();
        let events = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let (gateway, events) = (gateway.clone(), events.clone());
            async move {
                let mut tx = gateway.begin().await.unwrap();
                tx.lock_employee(1).await.unwrap();
                for _ in 0..3 {
                    round_trip().await;
                }
                events.borrow_mut().push("first committed");
                tx.commit().await.unwrap();
            }
        };
        let second = {
            let (gateway, events) = (gateway.clone(), events.clone());
            async move {
                round_trip().await;
                let mut tx = gateway.begin().await.unwrap();
                tx.lock_employee(1).await.unwrap();
                events.borrow_mut().push("second locked");
            }
        };

        futures::join!(first, second);
        assert_eq!(*events.borrow(), ["first committed", "second locked"]);
    }

    #[actix_web::test]
    async fn other_employees_do_not_wait() {
        let gateway = MemoryGateway::new();
        let mut held = gateway.begin().await.unwrap();
        held.lock_employee(1).await.unwrap();

        let mut other = gateway.begin().await.unwrap();
        assert_eq!(other.lock_employee(2).await.unwrap(), None);
    }

    #[actix_web::test]
    async fn dropped_transaction_discards_writes() {
        let gateway = MemoryGateway::new();
        let draft = ApplicationDraft {
            employee_id: 1,
            leave_type: Default::default(),
            start_date: chrono::NaiveDate::MIN,
            end_date: chrono::NaiveDate::MIN,
            reason_description: None,
        };

        let mut tx = gateway.begin().await.unwrap();
        let inserted = tx.insert_application(&draft).await.unwrap();
        drop(tx);

        assert_eq!(gateway.stored_application(inserted.id).await, None);
        let mut tx = gateway.begin().await.unwrap();
        assert!(tx.lock_employee(1).await.is_ok());
    }
}
