#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Pagination and sorting integration tests.

mod common;

use common::TestApp;
use maat_kernel::error::ServiceError;
use maat_kernel::filter::{PageRequest, PagingError, StudentCriteria};
use maat_test_utils::student;

/// 35 students with id numbers 1..=35 whose last names sort in id order.
async fn seeded() -> TestApp {
    let app = TestApp::new();
    for id in 1..=35 {
        app.enroll(student(id, "Test", &last_name(id))).await;
    }
    app
}

/// Two-letter base-26 suffix: 1 -> "Studentab", 26 -> "Studentba".
fn last_name(id: i32) -> String {
    let letter = |n: i32| char::from(b'a' + u8::try_from(n).unwrap());
    format!("Student{}{}", letter(id / 26), letter(id % 26))
}

async fn page_ids(app: &TestApp, request: PageRequest) -> (Vec<i32>, u64, bool) {
    let page = app
        .students()
        .list(&StudentCriteria::default(), &request)
        .await
        .unwrap();
    let ids = page.rows.iter().map(|s| s.id_number).collect();
    (ids, page.total, page.empty)
}

#[tokio::test]
async fn unpaginated_returns_everything_sorted() {
    let app = seeded().await;
    let (ids, total, empty) = page_ids(&app, PageRequest::default()).await;
    assert_eq!(ids, (1..=35).collect::<Vec<_>>());
    assert_eq!(total, 35);
    assert!(!empty);
}

#[tokio::test]
async fn unpaginated_empty_table() {
    let app = TestApp::new();
    let (ids, total, empty) = page_ids(&app, PageRequest::default()).await;
    assert!(ids.is_empty());
    assert_eq!(total, 0);
    assert!(empty);
}

#[tokio::test]
async fn third_page_of_ten() {
    let app = seeded().await;
    let (ids, total, empty) = page_ids(&app, PageRequest::page(2, 10)).await;
    assert_eq!(ids, (21..=30).collect::<Vec<_>>());
    assert_eq!(total, 35);
    assert!(!empty);
}

#[tokio::test]
async fn last_partial_page() {
    let app = seeded().await;
    let (ids, _, _) = page_ids(&app, PageRequest::page(3, 10)).await;
    assert_eq!(ids, (31..=35).collect::<Vec<_>>());
}

#[tokio::test]
async fn page_past_the_end_is_empty_not_an_error() {
    let app = seeded().await;
    let (ids, total, empty) = page_ids(&app, PageRequest::page(9, 10)).await;
    assert!(ids.is_empty());
    assert_eq!(total, 35);
    assert!(empty);
}

#[tokio::test]
async fn descending_sort() {
    let app = seeded().await;
    let request = PageRequest::page(0, 3).sorted("lastName", false);
    let (ids, _, _) = page_ids(&app, request).await;
    assert_eq!(ids, vec![35, 34, 33]);
}

#[tokio::test]
async fn ties_break_on_the_key() {
    let app = seeded().await;
    // Every student shares a first name.
    let request = PageRequest::page(1, 5).sorted("firstName", true);
    let (ids, _, _) = page_ids(&app, request).await;
    assert_eq!(ids, vec![6, 7, 8, 9, 10]);
}

#[tokio::test]
async fn unknown_sort_column_is_rejected() {
    let app = seeded().await;
    let err = app
        .students()
        .list(
            &StudentCriteria::default(),
            &PageRequest::default().sorted("last_name; DROP TABLE people", true),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Paging(PagingError::InvalidSortColumn { .. })
    ));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn non_positive_page_sizes_are_rejected() {
    let app = seeded().await;
    for size in [0, -2] {
        let err = app
            .students()
            .list(&StudentCriteria::default(), &PageRequest::page(0, size))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Paging(PagingError::InvalidPageSpec { .. })
        ));
    }
}

#[tokio::test]
async fn page_request_reads_client_json() {
    let request: PageRequest = serde_json::from_value(serde_json::json!({
        "pageNum": 2,
        "pageSize": 10,
        "sortOn": "firstName",
        "asc": false
    }))
    .unwrap();
    assert_eq!(request, PageRequest::page(2, 10).sorted("firstName", false));
}
