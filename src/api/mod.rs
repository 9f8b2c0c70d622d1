pub mod employee;
pub mod hr;
pub mod leave_request;

use sqlx::MySqlPool;

use crate::error::AppError;
use crate::leave::LeaveDesk;
use crate::store::{accounts, mysql::MySqlGateway};
use crate::utils::{email_cache, email_filter};

pub type Desk = LeaveDesk<MySqlGateway>;

/// Validates login credentials for a new account and returns the normalized
/// email.
pub(crate) fn credentials(email: &str, password: &str) -> Result<String, AppError> {
    let email = email_filter::normalize(email);
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed || email.len() > 254 {
        return Err(AppError::invalid("email", "A valid email address is required"));
    }
    if password.len() < 8 {
        return Err(AppError::invalid(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    Ok(email)
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> Result<bool, AppError> {
    // 1️⃣ Cuckoo filter: fast negative
    if !email_filter::might_exist(email) {
        return Ok(true);
    }

    // 2️⃣ Moka cache: fast positive
    if email_cache::is_taken(email).await {
        return Ok(false);
    }

    // 3️⃣ Database fallback
    Ok(!accounts::email_exists(pool, email).await?)
}

pub(crate) async fn ensure_email_available(email: &str, pool: &MySqlPool) -> Result<(), AppError> {
    if is_email_available(email, pool).await? {
        return Ok(());
    }
    Err(AppError::Conflict {
        field: "email",
        message: "Email already exists".to_string(),
    })
}

pub(crate) async fn remember_email(email: &str) {
    email_filter::insert(email);
    email_cache::mark_taken(email).await;
}
