use actix_web::{HttpResponse, error::ErrorInternalServerError, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};

use crate::api::{credentials, ensure_email_available, remember_email};
use crate::auth::{auth::AuthUser, password::hash_password};
use crate::config::Config;
use crate::error::AppError;
use crate::model::employee::{
    CreateEmployee, EmployeeListResponse, EmployeeQuery, EmployeeView, ProvisionedEmployee,
    UpdateEmployee,
};
use crate::store::accounts;
use crate::utils::{email_cache, email_filter};

fn not_found(employee_id: u64) -> AppError {
    AppError::NotFound {
        resource: "employee",
        id: employee_id,
    }
}

const PHONE_MAX: usize = 12;
const DEPARTMENT_MAX: usize = 30;

fn required_text(field: &'static str, value: &str, max: usize) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::invalid(field, "must not be empty"));
    }
    if value.chars().count() > max {
        return Err(AppError::invalid(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub(crate) fn hash(password: &str) -> actix_web::Result<String> {
    hash_password(password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ErrorInternalServerError("Internal Server Error")
    })
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee account and profile created", body = ProvisionedEmployee),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "HR only"),
        (status = 409, description = "Email already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<HttpResponse> {
    auth.actor()?.require_hr("create employees")?;

    let mut req = payload.into_inner();
    req.email = credentials(&req.email, &req.password)?;
    req.phone_number = req.phone_number.trim().to_string();
    req.department = req.department.trim().to_string();
    required_text("phone_number", &req.phone_number, PHONE_MAX)?;
    required_text("department", &req.department, DEPARTMENT_MAX)?;

    ensure_email_available(&req.email, &pool).await?;

    let password_hash = hash(&req.password)?;
    let leave_balance = req.leave_balance.unwrap_or(config.default_leave_balance);
    let created = accounts::create_employee(&pool, &req, &password_hash, leave_balance).await?;
    remember_email(&req.email).await;

    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "HR only")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.actor()?.require_hr("list employees")?;

    let employees = accounts::list_employees(&pool, &query).await?;
    Ok(HttpResponse::Ok().json(employees))
}

#[utoipa::path(
    get,
    path = "/api/employee/{id}",
    params(
        ("id" = u64, Path, description = "Employee profile ID")
    ),
    responses(
        (status = 200, description = "Employee profile", body = EmployeeView),
        (status = 403, description = "Not the owner and not HR"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    if !auth.actor()?.can_view_employee(employee_id) {
        return Err(AppError::Forbidden {
            action: "view this employee",
        }
        .into());
    }

    let employee = accounts::get_employee(&pool, employee_id)
        .await?
        .ok_or_else(|| not_found(employee_id))?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Edit contact details. The leave balance cannot be set here.
#[utoipa::path(
    put,
    path = "/api/employee/{id}",
    params(
        ("id" = u64, Path, description = "Employee profile ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeView),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "HR only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEmployee>,
) -> actix_web::Result<HttpResponse> {
    auth.actor()?.require_hr("update employees")?;

    let employee_id = path.into_inner();
    let mut edit = payload.into_inner();
    if let Some(phone_number) = edit.phone_number.as_mut() {
        *phone_number = phone_number.trim().to_string();
        required_text("phone_number", phone_number, PHONE_MAX)?;
    }
    if let Some(department) = edit.department.as_mut() {
        *department = department.trim().to_string();
        required_text("department", department, DEPARTMENT_MAX)?;
    }

    let employee = accounts::update_employee(&pool, employee_id, &edit)
        .await?
        .ok_or_else(|| not_found(employee_id))?;

    info!(employee_id, "Employee updated");
    Ok(HttpResponse::Ok().json(employee))
}

/// Delete an employee along with their leave history and login
#[utoipa::path(
    delete,
    path = "/api/employee/{id}",
    params(
        ("id" = u64, Path, description = "Employee profile ID")
    ),
    responses(
        (status = 200, description = "Employee deleted", body = Object,
         example = json!({ "message": "Employee deleted" })
        ),
        (status = 403, description = "HR only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.actor()?.require_hr("delete employees")?;

    let employee_id = path.into_inner();
    let email = accounts::delete_employee(&pool, employee_id)
        .await?
        .ok_or_else(|| not_found(employee_id))?;

    email_filter::remove(&email);
    email_cache::forget(&email).await;

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee deleted" })))
}
