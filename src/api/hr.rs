use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;

use crate::api::{credentials, employee::hash, ensure_email_available, remember_email};
use crate::auth::auth::AuthUser;
use crate::model::hr::{CreateHr, ProvisionedHr};
use crate::store::accounts;

/// Provision an HR account (administrators only)
#[utoipa::path(
    post,
    path = "/api/hr",
    request_body = CreateHr,
    responses(
        (status = 201, description = "HR account created", body = ProvisionedHr),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Administrators only"),
        (status = 409, description = "Email already exists")
    ),
    tag = "HR",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_hr(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateHr>,
) -> actix_web::Result<HttpResponse> {
    auth.actor()?.require_admin("provision HR accounts")?;

    let req = payload.into_inner();
    let email = credentials(&req.email, &req.password)?;
    ensure_email_available(&email, &pool).await?;

    let password_hash = hash(&req.password)?;
    let created =
        accounts::create_hr(&pool, &email, &password_hash, req.join_date, req.is_admin).await?;
    remember_email(&email).await;

    Ok(HttpResponse::Created().json(created))
}
