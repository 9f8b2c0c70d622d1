use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "john@email.com")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
}

/// Login lookup row: the user plus whichever profile it owns.
#[derive(FromRow)]
pub struct LoginUser {
    pub id: u64, // 👈 matches BIGINT UNSIGNED
    pub email: String,
    pub password: String,
    pub role: String,
    pub is_admin: bool,
    pub employee_id: Option<u64>,
    pub hr_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: Role,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user owns an employee profile
    pub employee_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
