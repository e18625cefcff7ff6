//! HTTP API integration tests
//!
//! Drives the full router with in-process requests: auth extraction,
//! handler validation, manager mutations and the JSON envelope.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use comanda_server::core::{Config, ServerState};
use comanda_server::orders::LifecycleStorage;

const TENANT: &str = "tenant-a";

fn test_state() -> ServerState {
    let config = Config::with_overrides("/tmp/comanda-test", 0);
    ServerState::with_storage(config, LifecycleStorage::open_in_memory().unwrap())
}

fn token_for(state: &ServerState, tenant_id: &str) -> String {
    state
        .jwt
        .issue_token("user-1", tenant_id, "Ana", "waiter", 60)
        .unwrap()
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_table(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/tables",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn create_order(app: &Router, token: &str, table_id: &str) -> Value {
    let (status, body) = request(
        app,
        "POST",
        "/api/orders",
        Some(token),
        Some(json!({
            "table_id": table_id,
            "items": [{ "name": "Paella", "quantity": 2, "unit_price": 1450 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}

#[tokio::test]
async fn test_order_settlement_flow() {
    let state = test_state();
    let token = token_for(&state, TENANT);
    let app = comanda_server::api::router(state);

    let table_id = create_table(&app, &token, "Mesa 1").await;
    let order = create_order(&app, &token, &table_id).await;
    let order_id = order["id"].as_str().unwrap();

    assert_eq!(order["status"], "active");
    assert_eq!(order["order_number"], 1);
    assert_eq!(order["total"], 2900);
    assert_eq!(order["amount_due"], 2900);

    // Table is now occupied by the order
    let (status, table) = request(
        &app,
        "GET",
        &format!("/api/tables/{table_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["status"], "occupied");
    assert_eq!(table["current_order_id"], order["id"]);

    // Flag for payment, then settle in cash
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/orders/{order_id}"),
        Some(&token),
        Some(json!({ "status": "pending_payment" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, order) = request(
        &app,
        "POST",
        &format!("/api/orders/{order_id}/settle"),
        Some(&token),
        Some(json!({ "payment_method": "Cash" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "closed");
    assert_eq!(order["payment_method"], "Cash");
    assert_eq!(order["amount_due"], 0);

    // Table released atomically with closure
    let (_, table) = request(
        &app,
        "GET",
        &format!("/api/tables/{table_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(table["status"], "available");
    assert!(table.get("current_order_id").is_none());
}

#[tokio::test]
async fn test_create_order_requires_items() {
    let state = test_state();
    let token = token_for(&state, TENANT);
    let app = comanda_server::api::router(state);

    let table_id = create_table(&app, &token, "Mesa 1").await;
    let (status, body) = request(
        &app,
        "POST",
        "/api/orders",
        Some(&token),
        Some(json!({ "table_id": table_id, "items": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("At least one item required"),
        "unexpected body: {body}"
    );
}

#[tokio::test]
async fn test_illegal_transition_rejected() {
    let state = test_state();
    let token = token_for(&state, TENANT);
    let app = comanda_server::api::router(state);

    let table_id = create_table(&app, &token, "Mesa 1").await;
    let order = create_order(&app, &token, &table_id).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/orders/{order_id}"),
        Some(&token),
        Some(json!({ "status": "closed" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Cannot transition from 'active' to 'closed'"),
        "unexpected body: {body}"
    );
}

#[tokio::test]
async fn test_cancel_soft_deletes_and_frees_table() {
    let state = test_state();
    let token = token_for(&state, TENANT);
    let app = comanda_server::api::router(state);

    let table_id = create_table(&app, &token, "Mesa 1").await;
    let order = create_order(&app, &token, &table_id).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, order) = request(
        &app,
        "DELETE",
        &format!("/api/orders/{order_id}"),
        Some(&token),
        Some(json!({ "reason": "guest left" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "cancelled");
    assert_eq!(order["deleted"], true);

    let (_, table) = request(
        &app,
        "GET",
        &format!("/api/tables/{table_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(table["status"], "available");
}

#[tokio::test]
async fn test_missing_auth_is_unauthorized() {
    let state = test_state();
    let app = comanda_server::api::router(state);

    let (status, _) = request(&app, "GET", "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tenant_mismatch_is_unauthorized() {
    let state = test_state();
    let token = token_for(&state, TENANT);
    let app = comanda_server::api::router(state);

    let table_id = create_table(&app, &token, "Mesa 1").await;
    let (status, _) = request(
        &app,
        "POST",
        "/api/orders",
        Some(&token),
        Some(json!({
            "tenant_id": "tenant-b",
            "table_id": table_id,
            "items": [{ "name": "Paella", "quantity": 1, "unit_price": 1450 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cross_tenant_order_is_not_found() {
    let state = test_state();
    let token_a = token_for(&state, TENANT);
    let token_b = token_for(&state, "tenant-b");
    let app = comanda_server::api::router(state);

    let table_id = create_table(&app, &token_a, "Mesa 1").await;
    let order = create_order(&app, &token_a, &table_id).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/orders/{order_id}"),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_qr_submission_and_approval() {
    let state = test_state();
    let token = token_for(&state, TENANT);
    let app = comanda_server::api::router(state);

    let table_id = create_table(&app, &token, "Mesa 1").await;

    // Customer submits without any session
    let (status, qr) = request(
        &app,
        "POST",
        "/api/qr/orders",
        None,
        Some(json!({
            "tenant_id": TENANT,
            "table_id": table_id,
            "customer_name": "Carlos",
            "items": [{ "name": "Tortilla", "quantity": 2, "unit_price": 600 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(qr["status"], "pending_approval");
    let qr_id = qr["id"].as_str().unwrap();

    // Staff see it in the pending list
    let (status, pending) = request(
        &app,
        "GET",
        "/api/qr/orders?status=pending_approval",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    // Approval creates the real order and occupies the table
    let (status, order) = request(
        &app,
        "POST",
        &format!("/api/qr/orders/{qr_id}/approve"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["channel"], "qr");
    assert_eq!(order["status"], "active");
    assert_eq!(order["total"], 1200);

    let (_, table) = request(
        &app,
        "GET",
        &format!("/api/tables/{table_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(table["status"], "occupied");
}

#[tokio::test]
async fn test_partial_payments_via_api() {
    let state = test_state();
    let token = token_for(&state, TENANT);
    let app = comanda_server::api::router(state);

    let table_id = create_table(&app, &token, "Mesa 1").await;
    let order = create_order(&app, &token, &table_id).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, order) = request(
        &app,
        "POST",
        &format!("/api/orders/{order_id}/payments"),
        Some(&token),
        Some(json!({ "method": "Cash", "amount": 900 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["amount_paid"], 900);
    assert_eq!(order["amount_due"], 2000);
    assert_eq!(order["status"], "active");

    // Zero or negative amounts never reach the ledger
    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/orders/{order_id}/payments"),
        Some(&token),
        Some(json!({ "method": "Cash", "amount": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_orders_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("comanda.redb");
    let config = Config::with_overrides(dir.path().to_str().unwrap(), 0);

    let order_id;
    {
        let state = ServerState::with_storage(
            config.clone(),
            LifecycleStorage::open(&db_path).unwrap(),
        );
        let token = token_for(&state, TENANT);
        let app = comanda_server::api::router(state);
        let table_id = create_table(&app, &token, "Mesa 1").await;
        let order = create_order(&app, &token, &table_id).await;
        order_id = order["id"].as_str().unwrap().to_string();
    }

    // Reopen the same database file
    let state = ServerState::with_storage(config, LifecycleStorage::open(&db_path).unwrap());
    let token = token_for(&state, TENANT);
    let app = comanda_server::api::router(state);

    let (status, order) = request(
        &app,
        "GET",
        &format!("/api/orders/{order_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "active");
    assert_eq!(order["order_number"], 1);
}
