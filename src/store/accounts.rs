//! Account provisioning: users and their role profiles.

use chrono::{NaiveDate, Utc};
use sqlx::MySqlPool;
use tracing::{debug, info};

use crate::error::AppError;
use crate::model::employee::{
    CreateEmployee, EmployeeListResponse, EmployeeProfile, EmployeeQuery, EmployeeView,
    ProvisionedEmployee, UpdateEmployee,
};
use crate::model::hr::{HrProfile, ProvisionedHr};
use crate::model::role::Role;
use crate::model::user::User;
use crate::models::LoginUser;
use crate::store::mysql::EMPLOYEE_COLUMNS;

const EMPLOYEE_VIEW_COLUMNS: &str = "e.id, e.user_id, u.email, e.phone_number, e.department, \
     e.joining_date, e.leave_balance";

/// Maps MySQL's integrity violation on `users.email` to a conflict.
fn email_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23000") {
            return AppError::Conflict {
                field: "email",
                message: "Email already exists".to_string(),
            };
        }
    }
    AppError::Storage(e)
}

pub async fn email_exists(pool: &MySqlPool, email: &str) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(exists != 0)
}

pub async fn find_login(pool: &MySqlPool, email: &str) -> Result<Option<LoginUser>, AppError> {
    let user = sqlx::query_as::<_, LoginUser>(
        r#"
        SELECT u.id, u.email, u.password, u.role, u.is_admin,
               e.id AS employee_id, h.id AS hr_id
        FROM users u
        LEFT JOIN employee_profiles e ON e.user_id = u.id
        LEFT JOIN hr_profiles h ON h.user_id = u.id
        WHERE u.email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn touch_last_login(pool: &MySqlPool, user_id: u64) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Creates the user row and its employee profile in one transaction.
pub async fn create_employee(
    pool: &MySqlPool,
    req: &CreateEmployee,
    password_hash: &str,
    leave_balance: u32,
) -> Result<ProvisionedEmployee, AppError> {
    let mut tx = pool.begin().await?;

    let user_id = sqlx::query(
        "INSERT INTO users (email, password, role, is_admin) VALUES (?, ?, ?, FALSE)",
    )
    .bind(&req.email)
    .bind(password_hash)
    .bind(Role::Employee.as_ref())
    .execute(&mut *tx)
    .await
    .map_err(email_conflict)?
    .last_insert_id();

    let employee_id = sqlx::query(
        r#"
        INSERT INTO employee_profiles
            (user_id, phone_number, department, joining_date, leave_balance)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(&req.phone_number)
    .bind(&req.department)
    .bind(req.joining_date)
    .bind(leave_balance)
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employee_profiles WHERE id = ?");
    let profile = sqlx::query_as::<_, EmployeeProfile>(&sql)
        .bind(employee_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(user_id, employee_id, "Employee provisioned");

    Ok(ProvisionedEmployee {
        user: User {
            id: user_id,
            email: req.email.clone(),
            role: Role::Employee,
            is_admin: false,
        },
        profile,
    })
}

/// Creates an HR user and profile in one transaction.
pub async fn create_hr(
    pool: &MySqlPool,
    email: &str,
    password_hash: &str,
    join_date: Option<NaiveDate>,
    is_admin: bool,
) -> Result<ProvisionedHr, AppError> {
    let mut tx = pool.begin().await?;

    let user_id = sqlx::query(
        "INSERT INTO users (email, password, role, is_admin) VALUES (?, ?, ?, ?)",
    )
    .bind(email)
    .bind(password_hash)
    .bind(Role::Hr.as_ref())
    .bind(is_admin)
    .execute(&mut *tx)
    .await
    .map_err(email_conflict)?
    .last_insert_id();

    let hr_id = sqlx::query("INSERT INTO hr_profiles (user_id, join_date) VALUES (?, ?)")
        .bind(user_id)
        .bind(join_date)
        .execute(&mut *tx)
        .await?
        .last_insert_id();

    let profile = sqlx::query_as::<_, HrProfile>(
        "SELECT id, user_id, join_date, created_at, updated_at FROM hr_profiles WHERE id = ?",
    )
    .bind(hr_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(user_id, hr_id, is_admin, "HR account provisioned");

    Ok(ProvisionedHr {
        user: User {
            id: user_id,
            email: email.to_string(),
            role: Role::Hr,
            is_admin,
        },
        profile,
    })
}

pub async fn get_employee(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Option<EmployeeView>, AppError> {
    let sql = format!(
        "SELECT {EMPLOYEE_VIEW_COLUMNS} FROM employee_profiles e \
         JOIN users u ON u.id = e.user_id WHERE e.id = ?"
    );
    let employee = sqlx::query_as::<_, EmployeeView>(&sql)
        .bind(employee_id)
        .fetch_optional(pool)
        .await?;
    Ok(employee)
}

pub async fn list_employees(
    pool: &MySqlPool,
    query: &EmployeeQuery,
) -> Result<EmployeeListResponse, AppError> {
    let page = query.page();
    let per_page = query.per_page();
    let offset = query.offset();

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(department) = &query.department {
        conditions.push("e.department = ?");
        bindings.push(department.clone());
    }

    if let Some(search) = &query.search {
        conditions.push("(u.email LIKE ? OR e.phone_number LIKE ?)");
        let like = format!("%{search}%");
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!(
        "SELECT COUNT(*) FROM employee_profiles e JOIN users u ON u.id = e.user_id {where_clause}"
    );
    debug!(sql = %count_sql, bindings = ?bindings, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query.fetch_one(pool).await?;

    let data_sql = format!(
        "SELECT {EMPLOYEE_VIEW_COLUMNS} FROM employee_profiles e \
         JOIN users u ON u.id = e.user_id {where_clause} ORDER BY e.id DESC LIMIT ? OFFSET ?"
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, EmployeeView>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    let employees = data_query
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    })
}

/// Applies an HR profile edit. Returns `None` when the employee is unknown.
pub async fn update_employee(
    pool: &MySqlPool,
    employee_id: u64,
    edit: &UpdateEmployee,
) -> Result<Option<EmployeeView>, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE employee_profiles
        SET phone_number = COALESCE(?, phone_number),
            department = COALESCE(?, department),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(edit.phone_number.as_deref())
    .bind(edit.department.as_deref())
    .bind(Utc::now())
    .bind(employee_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_employee(pool, employee_id).await
}

/// Deletes an employee together with their applications, refresh tokens and
/// user row. Returns the removed login email, or `None` if nothing matched.
pub async fn delete_employee(pool: &MySqlPool, employee_id: u64) -> Result<Option<String>, AppError> {
    let mut tx = pool.begin().await?;

    let owner = sqlx::query_as::<_, (u64, String)>(
        r#"
        SELECT e.user_id, u.email
        FROM employee_profiles e
        JOIN users u ON u.id = e.user_id
        WHERE e.id = ?
        FOR UPDATE
        "#,
    )
    .bind(employee_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((user_id, email)) = owner else {
        return Ok(None);
    };

    let removed = sqlx::query("DELETE FROM applications WHERE employee_id = ?")
        .bind(employee_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM employee_profiles WHERE id = ?")
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(employee_id, user_id, applications = removed, "Employee deleted");

    Ok(Some(email))
}

/// Creates the administrator account if no user owns `email` yet.
pub async fn ensure_admin(
    pool: &MySqlPool,
    email: &str,
    password_hash: &str,
) -> Result<bool, AppError> {
    if email_exists(pool, email).await? {
        return Ok(false);
    }
    create_hr(pool, email, password_hash, None, true).await?;
    Ok(true)
}
