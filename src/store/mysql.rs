use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{MySql, MySqlPool};
use tracing::debug;

use crate::error::AppError;
use crate::model::application::{
    Application, ApplicationDraft, ApplicationFilter, ApplicationPage, ApplicationStatus,
};
use crate::model::employee::EmployeeProfile;
use crate::store::{Gateway, Transaction};

pub(crate) const EMPLOYEE_COLUMNS: &str =
    "id, user_id, phone_number, department, joining_date, leave_balance, created_at, updated_at";

const APPLICATION_COLUMNS: &str = "id, employee_id, status, leave_type, start_date, end_date, \
     reason_description, rejection_reason, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: u64,
    employee_id: u64,
    status: String,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason_description: Option<String>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = sqlx::Error;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let decode = |e: strum::ParseError| sqlx::Error::Decode(Box::new(e));
        Ok(Application {
            id: row.id,
            employee_id: row.employee_id,
            status: row.status.parse().map_err(decode)?,
            leave_type: row.leave_type.parse().map_err(decode)?,
            start_date: row.start_date,
            end_date: row.end_date,
            reason_description: row.reason_description,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_applications(rows: Vec<ApplicationRow>) -> Result<Vec<Application>, AppError> {
    rows.into_iter()
        .map(|row| Application::try_from(row).map_err(AppError::from))
        .collect()
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Gateway over the MySQL pool.
#[derive(Clone)]
pub struct MySqlGateway {
    pool: MySqlPool,
}

impl MySqlGateway {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

pub struct MySqlTx {
    tx: sqlx::Transaction<'static, MySql>,
}

impl Gateway for MySqlGateway {
    type Tx = MySqlTx;

    async fn begin(&self) -> Result<MySqlTx, AppError> {
        Ok(MySqlTx {
            tx: self.pool.begin().await?,
        })
    }

    async fn fetch_employee(&self, employee_id: u64) -> Result<Option<EmployeeProfile>, AppError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employee_profiles WHERE id = ?");
        let employee = sqlx::query_as::<_, EmployeeProfile>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn fetch_application(&self, application_id: u64) -> Result<Option<Application>, AppError> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?");
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Application::try_from).transpose()?)
    }

    async fn employee_applications(
        &self,
        employee_id: u64,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, AppError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE employee_id = ? AND status IN ({}) ORDER BY start_date",
            placeholders(statuses.len())
        );
        let mut query = sqlx::query_as::<_, ApplicationRow>(&sql).bind(employee_id);
        for status in statuses {
            query = query.bind(status.as_ref());
        }
        into_applications(query.fetch_all(&self.pool).await?)
    }

    async fn search_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<ApplicationPage, AppError> {
        let per_page = filter.per_page();
        let page = filter.page();
        let offset = filter.offset();

        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }

        if let Some(status) = filter.status.as_ref() {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.as_ref()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM applications{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        debug!(sql = %data_sql, page, per_page, "Fetching leave applications");

        let mut data_q = sqlx::query_as::<_, ApplicationRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }
        let rows = data_q
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(ApplicationPage {
            data: into_applications(rows)?,
            page,
            per_page,
            total,
        })
    }
}

impl Transaction for MySqlTx {
    async fn application_owner(&mut self, application_id: u64) -> Result<Option<u64>, AppError> {
        let owner = sqlx::query_scalar::<_, u64>("SELECT employee_id FROM applications WHERE id = ?")
            .bind(application_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(owner)
    }

    async fn lock_employee(
        &mut self,
        employee_id: u64,
    ) -> Result<Option<EmployeeProfile>, AppError> {
        let sql =
            format!("SELECT {EMPLOYEE_COLUMNS} FROM employee_profiles WHERE id = ? FOR UPDATE");
        let employee = sqlx::query_as::<_, EmployeeProfile>(&sql)
            .bind(employee_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(employee)
    }

    async fn lock_application(
        &mut self,
        application_id: u64,
    ) -> Result<Option<Application>, AppError> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ? FOR UPDATE");
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(application_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Application::try_from).transpose()?)
    }

    async fn list_applications(
        &mut self,
        employee_id: u64,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, AppError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE employee_id = ? AND status IN ({}) ORDER BY start_date FOR UPDATE",
            placeholders(statuses.len())
        );
        let mut query = sqlx::query_as::<_, ApplicationRow>(&sql).bind(employee_id);
        for status in statuses {
            query = query.bind(status.as_ref());
        }
        into_applications(query.fetch_all(&mut *self.tx).await?)
    }

    async fn insert_application(
        &mut self,
        draft: &ApplicationDraft,
    ) -> Result<Application, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO applications
                (employee_id, status, leave_type, start_date, end_date, reason_description)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.employee_id)
        .bind(ApplicationStatus::Pending.as_ref())
        .bind(draft.leave_type.as_ref())
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.reason_description.as_deref())
        .execute(&mut *self.tx)
        .await?;

        let id = result.last_insert_id();
        debug!(application_id = id, employee_id = draft.employee_id, "Inserted leave application");

        self.lock_application(id)
            .await?
            .ok_or(AppError::Storage(sqlx::Error::RowNotFound))
    }

    async fn save_application(&mut self, application: &Application) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE applications
            SET status = ?, leave_type = ?, start_date = ?, end_date = ?,
                reason_description = ?, rejection_reason = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(application.status.as_ref())
        .bind(application.leave_type.as_ref())
        .bind(application.start_date)
        .bind(application.end_date)
        .bind(application.reason_description.as_deref())
        .bind(application.rejection_reason.as_deref())
        .bind(application.updated_at)
        .bind(application.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn save_employee(&mut self, employee: &EmployeeProfile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE employee_profiles
            SET phone_number = ?, department = ?, leave_balance = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&employee.phone_number)
        .bind(&employee.department)
        .bind(employee.leave_balance)
        .bind(employee.updated_at)
        .bind(employee.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
