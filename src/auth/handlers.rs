use crate::{
    auth::{
        jwt::{Identity, generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::AppError,
    model::role::Role,
    models::{Claims, LoginReqDto, LoginResponse, TokenType},
    store::accounts,
};
use actix_web::{HttpRequest, HttpResponse, error::ErrorInternalServerError, web};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn signing_failed(e: jsonwebtoken::errors::Error) -> actix_web::Error {
    error!(error = %e, "Failed to sign token");
    ErrorInternalServerError("Internal Server Error")
}

async fn store_refresh_token(
    pool: &MySqlPool,
    user_id: u64,
    claims: &Claims,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(&claims.jti)
    .bind(claims.exp as i64)
    .execute(pool)
    .await?;
    Ok(())
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Email and password required"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<HttpResponse> {
    info!("Login request received");

    // 1️⃣ Basic validation
    let email = user.email.trim().to_lowercase();
    if email.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::invalid("email", "Email and password required").into());
    }

    // 2️⃣ Fetch user
    debug!("Fetching user from database");
    let Some(db_user) = accounts::find_login(pool.get_ref(), &email).await? else {
        info!("Invalid credentials: user not found");
        return Err(AppError::Unauthorized("Invalid credentials").into());
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials").into());
    }
    debug!(user_id = db_user.id, "Password verified");

    let role: Role = db_user.role.parse().map_err(|e: strum::ParseError| {
        error!(error = %e, role = %db_user.role, "Unknown role stored for user");
        AppError::Storage(sqlx::Error::Decode(Box::new(e)))
    })?;

    let identity = Identity {
        user_id: db_user.id,
        email: db_user.email,
        role,
        is_admin: db_user.is_admin,
        employee_id: db_user.employee_id,
    };
    debug!(
        hr_profile = ?db_user.hr_id,
        employee_profile = ?identity.employee_id,
        "Issuing tokens"
    );

    // 4️⃣ Generate tokens
    let access_token =
        generate_access_token(&identity, &config.jwt_secret, config.access_token_ttl)
            .map_err(signing_failed)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(&identity, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(signing_failed)?;

    // 5️⃣ Store refresh token
    store_refresh_token(pool.get_ref(), identity.user_id, &refresh_claims).await?;

    // 6️⃣ Update last_login_at (non-fatal)
    if let Err(e) = accounts::touch_last_login(pool.get_ref(), identity.user_id).await {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = identity.user_id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
        role,
    }))
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New access and refresh tokens", body = Object, example = json!({
            "access_token": "eyJ...",
            "refresh_token": "eyJ..."
        })),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<HttpResponse> {
    let Some(token) = bearer(&req) else {
        return Err(AppError::Unauthorized("No token").into());
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return Err(AppError::Unauthorized("Invalid token").into()),
    };

    // 🔍 find refresh token in DB
    let record = sqlx::query_as::<_, (u64, u64, bool)>(
        "SELECT id, user_id, revoked FROM refresh_tokens WHERE jti = ?",
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    let (record_id, user_id) = match record {
        Some((id, user_id, false)) => (id, user_id),
        _ => return Err(AppError::Unauthorized("Refresh token revoked").into()),
    };

    // 🔥 revoke old refresh token
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    // 🔄 issue new refresh token
    let identity = claims.identity();
    let (new_refresh_token, new_claims) =
        generate_refresh_token(&identity, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(signing_failed)?;
    store_refresh_token(pool.get_ref(), user_id, &new_claims).await?;

    // 🎫 new access token
    let access_token =
        generate_access_token(&identity, &config.jwt_secret, config.access_token_ttl)
            .map_err(signing_failed)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token
    })))
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logged out (idempotent)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Some(token) = bearer(&req) else {
        return HttpResponse::NoContent().finish();
    };

    // only refresh tokens can logout
    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    // revoke refresh token (idempotent)
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}
