//! Common test helpers for integration tests.
//!
//! Each integration test drives the full router in-process with
//! `tower::ServiceExt::oneshot`; no socket is opened.
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate, and not every file uses every helper.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use maintenance_management_api::api::{AppState, router};
use maintenance_management_api::infrastructure::InMemoryStore;

// =============================================================================
// Application Helpers
// =============================================================================

/// A router over a fresh in-memory store, plus a handle on that store for
/// direct inspection and corruption.
pub fn create_test_app() -> (Router, InMemoryStore) {
    let store = InMemoryStore::new();
    let application = router(AppState::new(Arc::new(store.clone())));
    (application, store)
}

/// Sends one request and returns the status and the decoded JSON body
/// (`Value::Null` for an empty body).
pub async fn send(
    application: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = application.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub async fn get(application: &Router, uri: &str) -> (StatusCode, Value) {
    send(application, Method::GET, uri, None).await
}

pub async fn post(application: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(application, Method::POST, uri, Some(body)).await
}

pub async fn put(application: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(application, Method::PUT, uri, Some(body)).await
}

pub async fn delete(application: &Router, uri: &str) -> (StatusCode, Value) {
    send(application, Method::DELETE, uri, None).await
}

// =============================================================================
// Payloads
// =============================================================================

pub fn machine_payload(serial_number: &str, status: &str) -> Value {
    json!({
        "serial_number": serial_number,
        "name": "Torno CNC",
        "type": "Torno",
        "model": "T-800",
        "location": "Galpão 2",
        "maintenance_history": [],
        "status": status
    })
}

pub fn team_payload(name: &str) -> Value {
    json!({
        "name": name,
        "members": ["Ana", 42],
        "specialites": ["Hidráulica"]
    })
}

pub fn ticket_payload(team: &str, machine: &str, request_date: &str) -> Value {
    json!({
        "problem_description": "Vazamento de óleo",
        "request_date": request_date,
        "priority": "Alta",
        "assigned_team": team,
        "status": "Aberta",
        "machine_id": machine
    })
}

pub fn part_payload(code: &str, quantity: u32) -> Value {
    json!({
        "code": code,
        "name": "Rolamento 6204",
        "supplier": "SKF",
        "quantity": quantity,
        "unit_price": 25.9
    })
}

/// Creates a team and a machine so that tickets referencing them are valid.
pub async fn seed_team_and_machine(application: &Router, team: &str, machine: &str) {
    let (status, _) = post(application, "/teams", team_payload(team)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post(application, "/machines", machine_payload(machine, "Operando")).await;
    assert_eq!(status, StatusCode::CREATED);
}
