//! QR Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::{Order, OrderItem, QrOrder, QrOrderStatus};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::NewQrOrder;
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "qr_order";

/// Customer submission. The tenant and table come from the scanned QR
/// payload; there is no session.
#[derive(Debug, Deserialize)]
pub struct SubmitQrOrderRequest {
    pub tenant_id: String,
    pub table_id: String,
    pub customer_name: String,
    pub customer_mobile: Option<String>,
    pub items: Vec<OrderItem>,
}

/// Submit a QR proposal (unauthenticated customer scan)
pub async fn submit(
    State(state): State<ServerState>,
    Json(payload): Json<SubmitQrOrderRequest>,
) -> AppResult<(StatusCode, Json<QrOrder>)> {
    if payload.customer_name.trim().is_empty() {
        return Err(AppError::validation("Customer name required"));
    }

    let qr = state.manager.submit_qr_order(
        &payload.tenant_id,
        NewQrOrder {
            table_id: payload.table_id,
            customer_name: payload.customer_name.trim().to_string(),
            customer_mobile: payload.customer_mobile,
            items: payload.items,
        },
    )?;

    state.notify(&payload.tenant_id, RESOURCE);

    Ok((StatusCode::CREATED, Json(qr)))
}

/// Listing filter
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<QrOrderStatus>,
}

/// List the tenant's QR proposals
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<QrOrder>>> {
    let proposals = state.manager.list_qr_orders(&user.tenant_id, query.status)?;
    Ok(Json(proposals))
}

/// Approve a pending proposal, creating or augmenting the table's order
pub async fn approve(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state
        .manager
        .approve_qr_order(&user.tenant_id, &id, &user.actor_name)?;

    state.notify(&user.tenant_id, RESOURCE);
    state.notify(&user.tenant_id, "order");
    state.notify(&user.tenant_id, "table");

    Ok(Json(order))
}

/// Reject a pending proposal
pub async fn reject(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<QrOrder>> {
    let qr = state
        .manager
        .reject_qr_order(&user.tenant_id, &id, &user.actor_name)?;

    state.notify(&user.tenant_id, RESOURCE);

    Ok(Json(qr))
}
