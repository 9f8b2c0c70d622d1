use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::api::Desk;
use crate::auth::auth::AuthUser;
use crate::model::application::{
    Application, ApplicationEdit, ApplicationFilter, ApplicationPage, Approval, NewApplication,
    RejectLeave, ValidateLeave,
};
use crate::model::employee::LeaveBalance;

/* =========================
Create leave request
========================= */
/// Submit a leave application for the calling employee
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = NewApplication,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted, status pending", body = Application),
        (status = 400, description = "Invalid range, before joining date or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only employees may apply"),
        (status = 409, description = "Overlaps an existing application")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_leave(
    auth: AuthUser,
    desk: web::Data<Desk>,
    payload: web::Json<NewApplication>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor()?;
    let application = desk.create_application(&actor, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(application))
}

/* =========================
Validate (dry run)
========================= */
/// Check a date range against the ledger without creating an application
#[utoipa::path(
    post,
    path = "/api/leave/validate",
    request_body = ValidateLeave,
    responses(
        (status = 200, description = "Range is acceptable", body = Object,
         example = json!({ "days": 3 })
        ),
        (status = 400, description = "Range rejected by the ledger"),
        (status = 403, description = "Only employees may validate"),
        (status = 409, description = "Overlaps an existing application")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn validate_leave(
    auth: AuthUser,
    desk: web::Data<Desk>,
    payload: web::Json<ValidateLeave>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor()?;
    let days = desk
        .validate(&actor, payload.start_date, payload.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "days": days })))
}

/* =========================
Paginated leave list
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(ApplicationFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = ApplicationPage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR only")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn leave_list(
    auth: AuthUser,
    desk: web::Data<Desk>,
    query: web::Query<ApplicationFilter>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor()?;
    let page = desk.list_applications(&actor, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/* =========================
Single leave request
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/{id}",
    params(
        ("id" = u64, Path, description = "Leave application ID")
    ),
    responses(
        (status = 200, description = "Leave application", body = Application),
        (status = 403, description = "Not the owner and not HR"),
        (status = 404, description = "Leave application not found")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_leave(
    auth: AuthUser,
    desk: web::Data<Desk>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor()?;
    let application = desk.application(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(application))
}

/* =========================
Amend a pending request
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}",
    params(
        ("id" = u64, Path, description = "Leave application ID")
    ),
    request_body = ApplicationEdit,
    responses(
        (status = 200, description = "Leave application amended", body = Application),
        (status = 400, description = "Edited range rejected by the ledger"),
        (status = 403, description = "HR only"),
        (status = 404, description = "Leave application not found"),
        (status = 409, description = "Application already processed or overlapping")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn amend_leave(
    auth: AuthUser,
    desk: web::Data<Desk>,
    path: web::Path<u64>,
    payload: web::Json<ApplicationEdit>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor()?;
    let application = desk
        .amend_application(&actor, path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(application))
}

/* =========================
Approve leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}/approve",
    params(
        ("id" = u64, Path, description = "Leave application ID")
    ),
    responses(
        (status = 200, description = "Leave approved, balance deducted", body = Approval),
        (status = 400, description = "Insufficient balance"),
        (status = 403, description = "HR only"),
        (status = 404, description = "Leave application not found"),
        (status = 409, description = "Application already processed")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn approve_leave(
    auth: AuthUser,
    desk: web::Data<Desk>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor()?;
    let approval = desk.approve(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(approval))
}

/* =========================
Reject leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}/reject",
    params(
        ("id" = u64, Path, description = "Leave application ID")
    ),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected", body = Application),
        (status = 400, description = "Rejection reason missing"),
        (status = 403, description = "HR only"),
        (status = 404, description = "Leave application not found"),
        (status = 409, description = "Application already processed")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reject_leave(
    auth: AuthUser,
    desk: web::Data<Desk>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor()?;
    let application = desk
        .reject(&actor, path.into_inner(), payload.rejection_reason.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(application))
}

/* =========================
Leave balance
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee profile ID")
    ),
    responses(
        (status = 200, description = "Current balance and pending reservation", body = LeaveBalance),
        (status = 403, description = "Not the owner and not HR"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn leave_balance(
    auth: AuthUser,
    desk: web::Data<Desk>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor()?;
    let balance = desk.balance(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(balance))
}
