use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::user::User;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct HrProfile {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 2)]
    pub user_id: u64,
    #[schema(example = "2024-01-01", value_type = Option<String>, format = "date")]
    pub join_date: Option<NaiveDate>,
    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateHr {
    #[schema(example = "hr@company.com", format = "email")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
    #[schema(example = "2024-01-01", value_type = Option<String>, format = "date")]
    pub join_date: Option<NaiveDate>,
    /// administrators may provision further HR accounts
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProvisionedHr {
    pub user: User,
    pub profile: HrProfile,
}
