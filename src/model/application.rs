use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Emergency,
    #[default]
    Annual,
}

/// A leave application, fully loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Application {
    #[schema(example = 1)]
    pub id: u64,
    /// employee profile the application belongs to
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub status: ApplicationStatus,
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub reason_description: Option<String>,
    /// present exactly when status is rejected
    pub rejection_reason: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self.status,
            ApplicationStatus::Pending | ApplicationStatus::Approved
        )
    }
}

/// Leave request body submitted by an employee.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewApplication {
    #[serde(default)]
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family event")]
    pub reason_description: Option<String>,
}

/// Changes HR may make to a pending application.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ApplicationEdit {
    pub leave_type: Option<LeaveType>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-03", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    pub reason_description: Option<String>,
}

/// Row the gateway inserts for a validated request.
#[derive(Debug, Clone)]
pub struct ApplicationDraft {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ApplicationFilter {
    /// Filter by employee ID
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<ApplicationStatus>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Items per page (max 100)
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

impl ApplicationFilter {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(10).clamp(1, 100)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationPage {
    pub data: Vec<Application>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

/// Result of an approval: the application plus the balance left afterwards.
#[derive(Debug, Serialize, ToSchema)]
pub struct Approval {
    pub application: Application,
    #[schema(example = 2)]
    pub leave_balance: u32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "Team is understaffed that week")]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ValidateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}
