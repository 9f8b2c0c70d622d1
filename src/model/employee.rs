use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::model::user::User;

/// Employee profile as the ledger sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "user_id": 3,
        "phone_number": "01712345678",
        "department": "Engineering",
        "joining_date": "2024-01-01",
        "leave_balance": 5
    })
)]
pub struct EmployeeProfile {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 3)]
    pub user_id: u64,

    #[schema(example = "01712345678")]
    pub phone_number: String,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub joining_date: NaiveDate,

    /// remaining leave days
    #[schema(example = 5)]
    pub leave_balance: u32,

    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,

    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

/// Employee listing row, joined with the owning user's email.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeView {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 3)]
    pub user_id: u64,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    #[schema(example = "01712345678")]
    pub phone_number: String,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub joining_date: NaiveDate,
    #[schema(example = 5)]
    pub leave_balance: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
    #[schema(example = "01712345678")]
    pub phone_number: String,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub joining_date: NaiveDate,
    /// defaults to the configured starting balance
    #[schema(example = 5)]
    pub leave_balance: Option<u32>,
}

/// Profile fields HR may edit. The leave balance only changes through
/// approvals.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateEmployee {
    #[schema(example = "01712345678")]
    pub phone_number: Option<String>,
    #[schema(example = "Finance")]
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Items per page (max 100)
    pub per_page: Option<u64>,
    /// Filter by department
    pub department: Option<String>,
    /// Search by email or phone number
    pub search: Option<String>,
}

impl EmployeeQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<EmployeeView>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 20)]
    pub per_page: u64,
    #[schema(example = 10)]
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProvisionedEmployee {
    pub user: User,
    pub profile: EmployeeProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveBalance {
    #[schema(example = 1)]
    pub employee_id: u64,
    /// days not yet deducted by an approval
    #[schema(example = 5)]
    pub leave_balance: u32,
    /// days held by pending applications
    #[schema(example = 3)]
    pub reserved_days: i64,
    #[schema(example = 2)]
    pub available_days: i64,
}
