use chrono::{NaiveDate, Utc};

use crate::error::AppError;
use crate::leave::LeaveDesk;
use crate::leave::service::REASON_MAX;
use crate::model::application::{
    Application, ApplicationEdit, ApplicationFilter, ApplicationStatus, LeaveType, NewApplication,
};
use crate::model::employee::EmployeeProfile;
use crate::model::role::Actor;
use crate::store::memory::MemoryGateway;

const EMPLOYEE_ID: u64 = 1;

const HR: Actor = Actor::Hr {
    user_id: 100,
    is_admin: false,
};

const EMPLOYEE: Actor = Actor::Employee {
    user_id: 10,
    employee_id: EMPLOYEE_ID,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn profile(id: u64, balance: u32) -> EmployeeProfile {
    let now = Utc::now();
    EmployeeProfile {
        id,
        user_id: id * 10,
        phone_number: "01700000000".to_string(),
        department: "Engineering".to_string(),
        joining_date: date("2024-01-01"),
        leave_balance: balance,
        created_at: now,
        updated_at: now,
    }
}

fn request(start: &str, end: &str) -> NewApplication {
    NewApplication {
        leave_type: LeaveType::Annual,
        start_date: date(start),
        end_date: date(end),
        reason_description: Some("family trip".to_string()),
    }
}

fn seeded(id: u64, employee_id: u64, start: &str, end: &str) -> Application {
    let now = Utc::now();
    Application {
        id,
        employee_id,
        status: ApplicationStatus::Pending,
        leave_type: LeaveType::Sick,
        start_date: date(start),
        end_date: date(end),
        reason_description: None,
        rejection_reason: None,
        created_at: now,
        updated_at: now,
    }
}

async fn desk_with_balance(balance: u32) -> (LeaveDesk<MemoryGateway>, MemoryGateway) {
    let gateway = MemoryGateway::new();
    gateway.add_employee(profile(EMPLOYEE_ID, balance)).await;
    (LeaveDesk::new(gateway.clone()), gateway)
}

async fn balance_of(gateway: &MemoryGateway, employee_id: u64) -> u32 {
    gateway.employee(employee_id).await.unwrap().leave_balance
}

#[actix_web::test]
async fn apply_approve_then_approve_again() {
    let (desk, gateway) = desk_with_balance(5).await;

    let app = desk
        .create_application(&EMPLOYEE, request("2024-02-01", "2024-02-03"))
        .await
        .unwrap();
    assert_eq!(app.status, ApplicationStatus::Pending);
    assert_eq!(balance_of(&gateway, EMPLOYEE_ID).await, 5);

    let approval = desk.approve(&HR, app.id).await.unwrap();
    assert_eq!(approval.leave_balance, 2);
    assert_eq!(approval.application.status, ApplicationStatus::Approved);
    assert_eq!(balance_of(&gateway, EMPLOYEE_ID).await, 2);

    let again = desk.approve(&HR, app.id).await;
    assert!(matches!(again, Err(AppError::AlreadyProcessed { .. })));
    assert_eq!(balance_of(&gateway, EMPLOYEE_ID).await, 2);

    let next = desk
        .create_application(&EMPLOYEE, request("2024-02-05", "2024-02-07"))
        .await;
    assert!(matches!(
        next,
        Err(AppError::InsufficientBalance {
            requested: 3,
            available: 2
        })
    ));
}

#[actix_web::test]
async fn overlapping_pending_request_is_refused() {
    let (desk, _) = desk_with_balance(10).await;

    desk.create_application(&EMPLOYEE, request("2024-03-01", "2024-03-02"))
        .await
        .unwrap();
    let second = desk
        .create_application(&EMPLOYEE, request("2024-03-02", "2024-03-03"))
        .await;
    assert!(matches!(second, Err(AppError::Overlap { .. })));
}

#[actix_web::test]
async fn request_before_joining_is_refused() {
    let (desk, _) = desk_with_balance(5).await;
    let result = desk
        .create_application(&EMPLOYEE, request("2023-12-31", "2024-01-01"))
        .await;
    assert!(matches!(result, Err(AppError::BeforeJoining { .. })));
}

#[actix_web::test]
async fn inverted_range_is_refused() {
    let (desk, _) = desk_with_balance(5).await;
    let result = desk
        .create_application(&EMPLOYEE, request("2024-02-03", "2024-02-01"))
        .await;
    assert!(matches!(result, Err(AppError::InvalidRange { .. })));
}

#[actix_web::test]
async fn pending_requests_share_one_balance() {
    let (desk, _) = desk_with_balance(5).await;

    desk.create_application(&EMPLOYEE, request("2024-03-01", "2024-03-03"))
        .await
        .unwrap();
    let second = desk
        .create_application(&EMPLOYEE, request("2024-04-01", "2024-04-03"))
        .await;
    assert!(matches!(second, Err(AppError::InsufficientBalance { .. })));

    let days = desk
        .validate(&EMPLOYEE, date("2024-04-01"), date("2024-04-02"))
        .await
        .unwrap();
    assert_eq!(days, 2);
}

#[actix_web::test]
async fn validate_does_not_persist_anything() {
    let (desk, _) = desk_with_balance(5).await;
    desk.validate(&EMPLOYEE, date("2024-02-01"), date("2024-02-03"))
        .await
        .unwrap();

    let page = desk
        .list_applications(&HR, &ApplicationFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[actix_web::test]
async fn reject_requires_reason_and_keeps_balance() {
    let (desk, gateway) = desk_with_balance(5).await;
    let app = desk
        .create_application(&EMPLOYEE, request("2024-02-01", "2024-02-03"))
        .await
        .unwrap();

    let missing = desk.reject(&HR, app.id, None).await;
    assert!(matches!(missing, Err(AppError::MissingRejectionReason)));
    let blank = desk.reject(&HR, app.id, Some("  ")).await;
    assert!(matches!(blank, Err(AppError::MissingRejectionReason)));

    let rejected = desk
        .reject(&HR, app.id, Some("Release week"))
        .await
        .unwrap();
    assert_eq!(rejected.status, ApplicationStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Release week"));
    assert_eq!(balance_of(&gateway, EMPLOYEE_ID).await, 5);

    let approve = desk.approve(&HR, app.id).await;
    assert!(matches!(approve, Err(AppError::AlreadyProcessed { .. })));
}

#[actix_web::test]
async fn rejected_dates_can_be_requested_again() {
    let (desk, _) = desk_with_balance(5).await;
    let app = desk
        .create_application(&EMPLOYEE, request("2024-02-01", "2024-02-03"))
        .await
        .unwrap();
    desk.reject(&HR, app.id, Some("overlaps audit"))
        .await
        .unwrap();

    assert!(
        desk.create_application(&EMPLOYEE, request("2024-02-01", "2024-02-03"))
            .await
            .is_ok()
    );
}

#[actix_web::test]
async fn roles_are_enforced() {
    let (desk, _) = desk_with_balance(5).await;

    let by_hr = desk
        .create_application(&HR, request("2024-02-01", "2024-02-01"))
        .await;
    assert!(matches!(by_hr, Err(AppError::Forbidden { .. })));

    let app = desk
        .create_application(&EMPLOYEE, request("2024-02-01", "2024-02-01"))
        .await
        .unwrap();
    let self_approval = desk.approve(&EMPLOYEE, app.id).await;
    assert!(matches!(self_approval, Err(AppError::Forbidden { .. })));

    let listing = desk
        .list_applications(&EMPLOYEE, &ApplicationFilter::default())
        .await;
    assert!(matches!(listing, Err(AppError::Forbidden { .. })));

    let stranger = Actor::Employee {
        user_id: 20,
        employee_id: 2,
    };
    assert!(matches!(
        desk.application(&stranger, app.id).await,
        Err(AppError::Forbidden { .. })
    ));
    assert!(matches!(
        desk.balance(&stranger, EMPLOYEE_ID).await,
        Err(AppError::Forbidden { .. })
    ));
    assert_eq!(desk.application(&EMPLOYEE, app.id).await.unwrap().id, app.id);
}

#[actix_web::test]
async fn unknown_ids_are_not_found() {
    let (desk, _) = desk_with_balance(5).await;

    assert!(matches!(
        desk.approve(&HR, 404).await,
        Err(AppError::NotFound {
            resource: "leave application",
            id: 404
        })
    ));
    assert!(matches!(
        desk.balance(&HR, 404).await,
        Err(AppError::NotFound {
            resource: "employee",
            ..
        })
    ));

    let orphan = Actor::Employee {
        user_id: 30,
        employee_id: 3,
    };
    assert!(matches!(
        desk.create_application(&orphan, request("2024-02-01", "2024-02-01"))
            .await,
        Err(AppError::NotFound { .. })
    ));
}

#[actix_web::test]
async fn balance_reports_reservations() {
    let (desk, _) = desk_with_balance(5).await;
    desk.create_application(&EMPLOYEE, request("2024-02-01", "2024-02-03"))
        .await
        .unwrap();

    let balance = desk.balance(&EMPLOYEE, EMPLOYEE_ID).await.unwrap();
    assert_eq!(balance.leave_balance, 5);
    assert_eq!(balance.reserved_days, 3);
    assert_eq!(balance.available_days, 2);
}

#[actix_web::test]
async fn amend_revalidates_and_locks_after_processing() {
    let (desk, _) = desk_with_balance(5).await;
    let first = desk
        .create_application(&EMPLOYEE, request("2024-02-01", "2024-02-02"))
        .await
        .unwrap();
    desk.create_application(&EMPLOYEE, request("2024-03-01", "2024-03-01"))
        .await
        .unwrap();

    let shifted = desk
        .amend_application(
            &HR,
            first.id,
            ApplicationEdit {
                start_date: Some(date("2024-02-02")),
                end_date: Some(date("2024-02-05")),
                leave_type: Some(LeaveType::Emergency),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(shifted.start_date, date("2024-02-02"));
    assert_eq!(shifted.leave_type, LeaveType::Emergency);

    let clash = desk
        .amend_application(
            &HR,
            first.id,
            ApplicationEdit {
                end_date: Some(date("2024-03-01")),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(clash, Err(AppError::Overlap { .. })));

    desk.approve(&HR, first.id).await.unwrap();
    let frozen = desk
        .amend_application(
            &HR,
            first.id,
            ApplicationEdit {
                reason_description: Some("changed my mind".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        frozen,
        Err(AppError::Immutable {
            status: ApplicationStatus::Approved,
            ..
        })
    ));
}

#[actix_web::test]
async fn failed_commit_rolls_back_balance_and_status() {
    let (desk, gateway) = desk_with_balance(5).await;
    let app = desk
        .create_application(&EMPLOYEE, request("2024-02-01", "2024-02-03"))
        .await
        .unwrap();

    gateway.fail_commits(true);
    let result = desk.approve(&HR, app.id).await;
    assert!(matches!(result, Err(AppError::Storage(_))));

    assert_eq!(balance_of(&gateway, EMPLOYEE_ID).await, 5);
    let stored = gateway.stored_application(app.id).await.unwrap();
    assert_eq!(stored.status, ApplicationStatus::Pending);

    gateway.fail_commits(false);
    assert_eq!(desk.approve(&HR, app.id).await.unwrap().leave_balance, 2);
}

#[actix_web::test]
async fn concurrent_approvals_never_over_deduct() {
    let (desk, gateway) = desk_with_balance(5).await;
    gateway
        .add_application(seeded(1, EMPLOYEE_ID, "2024-05-01", "2024-05-03"))
        .await;
    gateway
        .add_application(seeded(2, EMPLOYEE_ID, "2024-06-01", "2024-06-02"))
        .await;

    let (first, second) = futures::join!(desk.approve(&HR, 1), desk.approve(&HR, 2));
    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(balance_of(&gateway, EMPLOYEE_ID).await, 0);

    let (again_first, again_second) = futures::join!(desk.approve(&HR, 1), desk.approve(&HR, 2));
    assert!(matches!(again_first, Err(AppError::AlreadyProcessed { .. })));
    assert!(matches!(again_second, Err(AppError::AlreadyProcessed { .. })));
    assert_eq!(balance_of(&gateway, EMPLOYEE_ID).await, 0);
}

#[actix_web::test]
async fn concurrent_requests_share_one_balance() {
    let (desk, gateway) = desk_with_balance(5).await;

    let (first, second) = futures::join!(
        desk.create_application(&EMPLOYEE, request("2024-05-01", "2024-05-03")),
        desk.create_application(&EMPLOYEE, request("2024-06-01", "2024-06-03")),
    );
    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(AppError::InsufficientBalance {
            requested: 3,
            available: 2
        })
    ));

    let balance = desk.balance(&EMPLOYEE, EMPLOYEE_ID).await.unwrap();
    assert_eq!(balance.reserved_days, 3);
    assert_eq!(balance_of(&gateway, EMPLOYEE_ID).await, 5);
}

#[actix_web::test]
async fn oversized_reasons_are_refused() {
    let (desk, gateway) = desk_with_balance(5).await;
    let long = "x".repeat(REASON_MAX + 1);

    let mut req = request("2024-02-01", "2024-02-03");
    req.reason_description = Some(long.clone());
    let refused = desk.create_application(&EMPLOYEE, req).await;
    assert!(matches!(
        refused,
        Err(AppError::InvalidInput {
            field: "reason_description",
            ..
        })
    ));
    assert_eq!(gateway.stored_application(1).await, None);

    let mut req = request("2024-02-01", "2024-02-03");
    req.reason_description = Some("y".repeat(REASON_MAX));
    let app = desk.create_application(&EMPLOYEE, req).await.unwrap();

    let amended = desk
        .amend_application(
            &HR,
            app.id,
            ApplicationEdit {
                reason_description: Some(long.clone()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        amended,
        Err(AppError::InvalidInput {
            field: "reason_description",
            ..
        })
    ));

    let rejected = desk.reject(&HR, app.id, Some(&long)).await;
    assert!(matches!(
        rejected,
        Err(AppError::InvalidInput {
            field: "rejection_reason",
            ..
        })
    ));
    let stored = gateway.stored_application(app.id).await.unwrap();
    assert_eq!(stored.status, ApplicationStatus::Pending);
    assert_eq!(stored.reason_description, Some("y".repeat(REASON_MAX)));
}

#[actix_web::test]
async fn listing_past_the_last_page_is_empty() {
    let (desk, _) = desk_with_balance(5).await;
    desk.create_application(&EMPLOYEE, request("2024-02-01", "2024-02-01"))
        .await
        .unwrap();

    let page = desk
        .list_applications(
            &HR,
            &ApplicationFilter {
                page: Some(u64::MAX),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.page, u64::MAX);
    assert!(page.data.is_empty());
}

#[actix_web::test]
async fn employees_do_not_share_balance() {
    let (desk, gateway) = desk_with_balance(3).await;
    gateway.add_employee(profile(2, 3)).await;
    let other = Actor::Employee {
        user_id: 20,
        employee_id: 2,
    };

    desk.create_application(&EMPLOYEE, request("2024-02-01", "2024-02-03"))
        .await
        .unwrap();
    let theirs = desk
        .create_application(&other, request("2024-02-01", "2024-02-03"))
        .await
        .unwrap();
    assert_eq!(theirs.employee_id, 2);
}

#[actix_web::test]
async fn listing_filters_by_status_and_employee() {
    let (desk, gateway) = desk_with_balance(10).await;
    gateway.add_employee(profile(2, 10)).await;
    let other = Actor::Employee {
        user_id: 20,
        employee_id: 2,
    };

    let mine = desk
        .create_application(&EMPLOYEE, request("2024-02-01", "2024-02-01"))
        .await
        .unwrap();
    desk.create_application(&EMPLOYEE, request("2024-02-05", "2024-02-05"))
        .await
        .unwrap();
    desk.create_application(&other, request("2024-02-01", "2024-02-01"))
        .await
        .unwrap();
    desk.approve(&HR, mine.id).await.unwrap();

    let approved = desk
        .list_applications(
            &HR,
            &ApplicationFilter {
                status: Some(ApplicationStatus::Approved),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(approved.total, 1);
    assert_eq!(approved.data[0].id, mine.id);

    let for_employee = desk
        .list_applications(
            &HR,
            &ApplicationFilter {
                employee_id: Some(EMPLOYEE_ID),
                per_page: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(for_employee.total, 2);
    assert_eq!(for_employee.data.len(), 1);
}
