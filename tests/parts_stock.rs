//! Integration tests for part stock movements.

mod common;

use axum::http::StatusCode;
use rstest::rstest;
use serde_json::json;

use common::{create_test_app, get, part_payload, post};

#[rstest]
#[tokio::test]
async fn test_entry_then_exit() {
    let (application, _store) = create_test_app();
    let (status, _) = post(&application, "/parts", part_payload("P001", 5)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(
        &application,
        "/parts/P001/entry",
        json!({"quantity": 3, "entry_date": "2024-11-04"}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["quantity"], json!(8));
    assert_eq!(body["last_entry_date"], json!("2024-11-04"));

    let (status, body) = post(
        &application,
        "/parts/P001/exit",
        json!({"quantity": 8, "exit_date": "2024-11-05"}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["quantity"], json!(0));
    assert_eq!(body["last_exit_date"], json!("2024-11-05"));

    let (_, body) = get(&application, "/parts/P001").await;
    assert_eq!(body["quantity"], json!(0));
    assert_eq!(body["last_entry_date"], json!("2024-11-04"));
}

#[rstest]
#[tokio::test]
async fn test_exit_beyond_stock_is_rejected() {
    let (application, _store) = create_test_app();
    post(&application, "/parts", part_payload("P001", 2)).await;

    let (status, body) = post(&application, "/parts/P001/exit", json!({"quantity": 3})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"detail": "Insufficient stock for part P001: 2 available, 3 requested"})
    );
    let (_, body) = get(&application, "/parts/P001").await;
    assert_eq!(body["quantity"], json!(2));
    assert!(body.get("last_exit_date").is_none());
}

#[rstest]
#[tokio::test]
async fn test_entry_without_date_uses_today() {
    let (application, _store) = create_test_app();
    post(&application, "/parts", part_payload("P001", 0)).await;

    let (status, body) = post(&application, "/parts/P001/entry", json!({"quantity": 1})).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body["last_entry_date"].is_string());
}

#[rstest]
#[case("/parts/P404/entry")]
#[case("/parts/P404/exit")]
#[tokio::test]
async fn test_movement_on_unknown_part_is_not_found(#[case] uri: &str) {
    let (application, _store) = create_test_app();

    let (status, _) = post(&application, uri, json!({"quantity": 1})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[rstest]
#[case(json!({"quantity": 0}), StatusCode::BAD_REQUEST)]
#[case(json!({"quantity": -1}), StatusCode::UNPROCESSABLE_ENTITY)]
#[case(json!({}), StatusCode::UNPROCESSABLE_ENTITY)]
#[tokio::test]
async fn test_invalid_quantity(#[case] payload: serde_json::Value, #[case] expected: StatusCode) {
    let (application, _store) = create_test_app();
    post(&application, "/parts", part_payload("P001", 5)).await;

    let (status, _) = post(&application, "/parts/P001/entry", payload).await;

    assert_eq!(status, expected);
}

#[rstest]
#[tokio::test]
async fn test_negative_price_is_unprocessable() {
    let (application, _store) = create_test_app();
    let mut payload = part_payload("P001", 1);
    payload["unit_price"] = json!(-3.5);

    let (status, _) = post(&application, "/parts", payload).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
