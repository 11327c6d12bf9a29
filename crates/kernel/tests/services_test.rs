#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Entity service integration tests.

mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::{FlakyProfiles, TestApp, input, rules};
use maat_kernel::error::ServiceError;
use maat_kernel::filter::{HousesCupPointsCriteria, PageRequest, UserCriteria};
use maat_kernel::models::{
    HouseChangeRequestInput, HouseInput, HousesCupPointsInput, RequestStatus, StudentInput,
    StudentStatus, UserInput,
};
use maat_kernel::services::StudentService;
use maat_kernel::store::{Store, schema};
use maat_kernel::validate::ValidationError;
use maat_test_utils::{complete_student, date, house, house_change_request, points, student, user};

// -------------------------------------------------------------------------
// Students
// -------------------------------------------------------------------------

#[tokio::test]
async fn student_with_only_a_house_is_in_house() {
    let app = TestApp::new();
    let payload = student(1, "Nefer", "Titi")
        .without("firstName")
        .without("lastName")
        .with("house", "Horus");
    let created = app.students().create(input(&payload)).await.unwrap();
    assert_eq!(created.status, Some(StudentStatus::InHouse));
    assert!(created.enabled);
    assert_eq!(created.roles, vec!["ROLE_STUDENT".to_string()]);
    assert!(created.date_assigned_to_house.is_some());
}

#[tokio::test]
async fn student_status_follows_updates() {
    let app = TestApp::new();
    let students = app.students();
    let created = students
        .create(input(&complete_student(1, "Nefer", "Titi")))
        .await
        .unwrap();
    assert_eq!(created.status, None);

    let grouped: StudentInput = input(&complete_student(1, "Nefer", "Titi").with("doGroup", "G4"));
    let updated = students.update(1, grouped).await.unwrap();
    assert_eq!(updated.status, Some(StudentStatus::ReadyForHouse));

    let no_email: StudentInput = input(&complete_student(1, "Nefer", "Titi").without("email"));
    let updated = students.update(1, no_email).await.unwrap();
    assert_eq!(updated.status, Some(StudentStatus::MissingCanvasInfo));
    assert_eq!(students.get(1).await.unwrap().status, updated.status);
}

#[tokio::test]
async fn blank_strings_count_as_missing() {
    let app = TestApp::new();
    let payload = complete_student(1, "Nefer", "Titi")
        .with("gender", "  ")
        .with("house", "");
    let created = app.students().create(input(&payload)).await.unwrap();
    assert_eq!(created.gender, None);
    assert_eq!(created.house, None);
    assert_eq!(created.status, Some(StudentStatus::MissingOsirisInfo));
}

#[tokio::test]
async fn student_writes_land_in_both_tables() {
    let app = TestApp::new();
    app.enroll(complete_student(1, "Nefer", "Titi")).await;
    assert_eq!(app.store.len(schema::PEOPLE), 1);
    assert_eq!(app.store.len(schema::STUDENT_PROFILES), 1);

    let message = app.students().delete(1).await.unwrap();
    assert_eq!(message, "Deleted student 1");
    assert_eq!(app.store.len(schema::PEOPLE), 0);
    assert_eq!(app.store.len(schema::STUDENT_PROFILES), 0);
}

#[tokio::test]
async fn student_validation_runs_before_persistence() {
    let app = TestApp::new();
    let students = app.students();

    let bad_email = complete_student(1, "Nefer", "Titi").with("email", "nefer@maat.local");
    let err = students.create(input(&bad_email)).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidEmail { .. })
    ));

    let bad_name = complete_student(1, "Nefer", "Titi").with("lastName", "T1t1");
    assert_eq!(
        students.create(input(&bad_name)).await.unwrap_err().to_string(),
        "Last name T1t1 for student 1 is not a valid name."
    );

    let bad_id = complete_student(0, "Nefer", "Titi");
    assert!(students.create(input(&bad_id)).await.is_err());

    let bad_birthday = complete_student(1, "Nefer", "Titi").with("birthday", "2001/02/03");
    assert!(matches!(
        students.create(input(&bad_birthday)).await.unwrap_err(),
        ServiceError::Validation(ValidationError::InvalidDate(_))
    ));

    assert_eq!(app.store.len(schema::PEOPLE), 0);
}

#[tokio::test]
async fn duplicate_id_numbers_are_rejected() {
    let app = TestApp::new();
    app.enroll(student(1, "Nefer", "Titi")).await;
    let err = app
        .students()
        .create(input(&student(1, "Other", "Person")))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateKey { entity: "student", .. }));

    let staff: UserInput = input(&user(1, "Ptah", "Men", &["ROLE_TA"]));
    assert!(matches!(
        app.users().create(staff).await.unwrap_err(),
        ServiceError::DuplicateKey { .. }
    ));
}

#[tokio::test]
async fn missing_student_is_not_found() {
    let app = TestApp::new();
    let update: StudentInput = input(&student(9, "Nefer", "Titi"));
    assert!(matches!(
        app.students().update(9, update).await.unwrap_err(),
        ServiceError::NotFound { entity: "student", .. }
    ));
    assert!(matches!(
        app.students().delete(9).await.unwrap_err(),
        ServiceError::NotFound { .. }
    ));
}

#[tokio::test]
async fn student_with_house_resolves_the_housekeeper() {
    let app = TestApp::new();
    let keeper: UserInput = input(
        &user(50, "Imhotep", "Ra", &["ROLE_HOUSE_KEEPER"]).with("email", "imhotep@maat.local"),
    );
    app.users().create(keeper).await.unwrap();
    let horus: HouseInput = input(&house("Horus").with("housekeeper", 50));
    app.houses().create(horus).await.unwrap();
    app.enroll(complete_student(1, "Nefer", "Titi").with("house", "Horus"))
        .await;

    let student = app.students().get_with_house(1).await.unwrap();
    let house = student.house.unwrap();
    assert_eq!(house.name, "Horus");
    assert_eq!(house.house_keeper_name.as_deref(), Some("Imhotep Ra"));
    assert_eq!(house.house_keeper_email.as_deref(), Some("imhotep@maat.local"));
}

#[tokio::test]
async fn failed_profile_insert_leaves_no_person() {
    let store = Arc::new(FlakyProfiles::new());
    let students = StudentService::new(store.clone() as Arc<dyn Store>, rules());
    store.fail_profile_writes(true);

    let err = students
        .create(input(&complete_student(1, "Nefer", "Titi")))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(_)));
    assert_eq!(store.inner.len(schema::PEOPLE), 0);
    assert_eq!(store.inner.len(schema::STUDENT_PROFILES), 0);
}

#[tokio::test]
async fn failed_profile_update_restores_the_person() {
    let store = Arc::new(FlakyProfiles::new());
    let students = StudentService::new(store.clone() as Arc<dyn Store>, rules());
    students
        .create(input(&complete_student(1, "Nefer", "Titi")))
        .await
        .unwrap();

    store.fail_profile_writes(true);
    let moved: StudentInput = input(&complete_student(1, "Nefer", "Titi").with("house", "Horus"));
    let err = students.update(1, moved).await.unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(_)));

    store.fail_profile_writes(false);
    let stored = students.get(1).await.unwrap();
    assert_eq!(stored.house, None);
    assert_eq!(stored.date_assigned_to_house, None);
    assert_eq!(stored.status, None);
}

// -------------------------------------------------------------------------
// Users
// -------------------------------------------------------------------------

#[tokio::test]
async fn students_cannot_be_rewritten_as_users() {
    let app = TestApp::new();
    app.enroll(complete_student(1, "Nefer", "Titi")).await;

    let moved: UserInput = input(&user(1, "Nefer", "Titi", &["ROLE_STUDENT"]).with("house", "Horus"));
    let err = app.users().update(1, moved).await.unwrap_err();
    assert!(matches!(err, ServiceError::StudentAccount { id_number: 1 }));
    assert!(err.is_client_error());

    let stored = app.students().get(1).await.unwrap();
    assert_eq!(stored.house, None);
    assert_eq!(stored.email.as_deref(), Some("nefer@student.maat.local"));
    assert_eq!(stored.roles, vec!["ROLE_STUDENT".to_string()]);
}

#[tokio::test]
async fn user_listing_defaults_to_staff_roles() {
    let app = TestApp::new();
    app.enroll(student(1, "Nefer", "Titi")).await;
    let teacher: UserInput = input(&user(2, "Ptah", "Men", &["ROLE_TEACHER"]));
    app.users().create(teacher).await.unwrap();

    let page = app
        .users()
        .list(&UserCriteria::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].id_number, 2);
}

#[tokio::test]
async fn user_roles_are_checked() {
    let app = TestApp::new();
    let bad: UserInput = input(&user(2, "Ptah", "Men", &["teacher"]));
    assert!(matches!(
        app.users().create(bad).await.unwrap_err(),
        ServiceError::Validation(ValidationError::InvalidRole(_))
    ));
}

#[tokio::test]
async fn user_house_change_stamps_the_date() {
    let app = TestApp::new();
    let users = app.users();
    let created = users
        .create(input(&user(2, "Ptah", "Men", &["ROLE_PREFECT"])))
        .await
        .unwrap();
    assert_eq!(created.date_assigned_to_house, None);

    let moved: UserInput = input(&user(2, "Ptah", "Men", &["ROLE_PREFECT"]).with("house", "Apis"));
    let updated = users.update(2, moved).await.unwrap();
    assert_eq!(updated.house.as_deref(), Some("Apis"));
    assert!(updated.date_assigned_to_house.is_some());
}

// -------------------------------------------------------------------------
// House change requests
// -------------------------------------------------------------------------

async fn with_student() -> TestApp {
    let app = TestApp::new();
    app.enroll(complete_student(1, "Nefer", "Titi").with("house", "Sphinx"))
        .await;
    app
}

fn request(explanation: &str) -> HouseChangeRequestInput {
    input(&house_change_request(1, "Horus").with("explanation", explanation))
}

#[tokio::test]
async fn identical_request_is_rejected() {
    let app = with_student().await;
    let requests = app.requests();
    let created = requests.create(request("friends")).await.unwrap();
    assert_eq!(created.old_house.as_deref(), Some("Sphinx"));
    assert_eq!(created.student_name.as_deref(), Some("Nefer Titi"));
    assert_eq!(created.status, RequestStatus::Undecided);

    let err = requests.create(request("friends")).await.unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateRequest { student: 1 }));

    // A different explanation is a different request.
    requests.create(request("sports")).await.unwrap();
}

#[tokio::test]
async fn requests_without_explanation_are_still_unique() {
    let app = with_student().await;
    let requests = app.requests();
    let bare: HouseChangeRequestInput = input(&house_change_request(1, "Horus"));
    requests.create(bare.clone()).await.unwrap();
    assert!(matches!(
        requests.create(bare).await.unwrap_err(),
        ServiceError::DuplicateRequest { .. }
    ));
}

#[tokio::test]
async fn deciding_stamps_the_decision_date_once() {
    let app = with_student().await;
    let requests = app.requests();
    let created = requests.create(request("friends")).await.unwrap();
    assert_eq!(created.decided_date, None);

    let approve = HouseChangeRequestInput {
        status: Some("APPROVED".to_string()),
        ..request("friends")
    };
    let approved = requests.update(created.id, approve.clone()).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    let decided = approved.decided_date;
    assert!(decided.is_some());

    let again = requests.update(created.id, approve).await.unwrap();
    assert_eq!(again.decided_date, decided);
}

#[tokio::test]
async fn deciding_keeps_the_filed_origin_house() {
    let app = with_student().await;
    let requests = app.requests();
    let created = requests
        .create(input(&house_change_request(1, "Horus").with("requestDate", date(2024, 10, 1))))
        .await
        .unwrap();
    assert_eq!(created.old_house.as_deref(), Some("Sphinx"));

    let moved: StudentInput = input(&complete_student(1, "Nefer", "Titi").with("house", "Horus"));
    app.students().update(1, moved).await.unwrap();

    let approve: HouseChangeRequestInput =
        input(&house_change_request(1, "Horus").with("status", "APPROVED"));
    let approved = requests.update(created.id, approve).await.unwrap();
    assert_eq!(approved.old_house.as_deref(), Some("Sphinx"));
    assert_eq!(approved.request_date.to_string(), "2024-10-01");
    assert_eq!(approved.status, RequestStatus::Approved);
}

#[tokio::test]
async fn closed_submissions_refuse_new_requests() {
    let app = with_student().await;
    let requests = app.requests();
    assert!(requests.settings().await.unwrap().enabled);

    requests.set_enabled(false).await.unwrap();
    assert!(matches!(
        requests.create(request("friends")).await.unwrap_err(),
        ServiceError::SubmissionsClosed
    ));

    requests.set_enabled(true).await.unwrap();
    requests.create(request("friends")).await.unwrap();
}

#[tokio::test]
async fn requests_need_an_existing_student() {
    let app = TestApp::new();
    let orphan: HouseChangeRequestInput = input(&house_change_request(77, "Horus"));
    assert!(matches!(
        app.requests().create(orphan).await.unwrap_err(),
        ServiceError::NotFound { entity: "student", .. }
    ));
}

#[tokio::test]
async fn requests_listed_per_student() {
    let app = with_student().await;
    app.enroll(complete_student(2, "Kiya", "Amun")).await;
    let requests = app.requests();
    requests.create(request("friends")).await.unwrap();
    let other: HouseChangeRequestInput = input(
        &house_change_request(2, "Apis").with("requestDate", date(2024, 10, 1)),
    );
    let other = requests.create(other).await.unwrap();
    assert_eq!(other.request_date.to_string(), "2024-10-01");

    let page = requests
        .list_for_student(2, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].id, other.id);

    requests.delete(other.id).await.unwrap();
    assert!(requests.get(other.id).await.is_err());
}

// -------------------------------------------------------------------------
// Houses cup points
// -------------------------------------------------------------------------

#[tokio::test]
async fn point_listings_filter_by_points_and_date() {
    let app = TestApp::new();
    app.enroll(complete_student(1, "Nefer", "Titi")).await;
    let service = app.points();
    for (day, pts) in [(1, 5), (2, 10), (3, 15)] {
        let at = Utc.with_ymd_and_hms(2024, 10, day, 14, 30, 0).unwrap();
        let award: HousesCupPointsInput =
            input(&points(at, "Horus", pts).with("student", 1).with("explanation", "quiz"));
        service.create(award).await.unwrap();
    }

    let criteria = HousesCupPointsCriteria {
        start_points: Some(6),
        end_date: chrono::NaiveDate::from_ymd_opt(2024, 10, 2),
        ..Default::default()
    };
    let page = service
        .list(&criteria, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].points, 10);
    assert_eq!(page.rows[0].student.as_deref(), Some("Nefer Titi"));
    assert_eq!(page.rows[0].academic_year, 2024);
}
