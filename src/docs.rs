use crate::model::application::{
    Application, ApplicationEdit, ApplicationFilter, ApplicationPage, ApplicationStatus, Approval,
    LeaveType, NewApplication, RejectLeave, ValidateLeave,
};
use crate::model::employee::{
    CreateEmployee, EmployeeListResponse, EmployeeProfile, EmployeeQuery, EmployeeView,
    LeaveBalance, ProvisionedEmployee, UpdateEmployee,
};
use crate::model::hr::{CreateHr, HrProfile, ProvisionedHr};
use crate::model::role::Role;
use crate::model::user::User;
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management Service

Employees apply for leave; HR approves or rejects. Every decision goes through
a ledger that keeps each employee's balance consistent.

### 🔹 Key Features
- **Leave Applications**
  - Apply, validate a date range before applying, view history and balance
- **Approval Workflow**
  - `pending` → `approved` | `rejected`; processed applications are final
- **Employee Management**
  - HR provisions, lists, edits and deletes employee profiles
- **HR Accounts**
  - Administrators provision further HR accounts

### 🔐 Security
All `/api` endpoints require a **JWT Bearer** access token from `/auth/login`.

### 📦 Errors
Failures respond with `{ "error": <code>, "field": <field|null>, "message": <text> }`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::hr::add_hr,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::validate_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::amend_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::leave_balance
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            Role,
            User,
            CreateHr,
            HrProfile,
            ProvisionedHr,
            CreateEmployee,
            UpdateEmployee,
            EmployeeQuery,
            EmployeeProfile,
            EmployeeView,
            EmployeeListResponse,
            ProvisionedEmployee,
            LeaveBalance,
            ApplicationStatus,
            LeaveType,
            Application,
            NewApplication,
            ApplicationEdit,
            ApplicationFilter,
            ApplicationPage,
            Approval,
            RejectLeave,
            ValidateLeave
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Login and token APIs"),
        (name = "HR", description = "HR account APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Leave", description = "Leave management APIs"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
