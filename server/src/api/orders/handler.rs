//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::{Channel, Order, OrderItem, OrderStatus};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::{NewOrder, OrderPatch};
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "order";

/// Reject negative monetary inputs before they reach the manager
fn validate_amounts(amounts: &[Option<i64>]) -> AppResult<()> {
    if amounts.iter().flatten().any(|&a| a < 0) {
        return Err(AppError::validation("Amounts must be non-negative"));
    }
    Ok(())
}

/// Create order request
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Optional; must match the caller's tenant when present
    pub tenant_id: Option<String>,
    pub table_id: String,
    pub items: Vec<OrderItem>,
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,
    pub channel: Option<Channel>,
    pub sub_total: Option<i64>,
    pub tax: Option<i64>,
    pub discount: Option<i64>,
    pub total: Option<i64>,
}

/// Create an order on a table
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    if let Some(tenant_id) = &payload.tenant_id
        && tenant_id != &user.tenant_id
    {
        return Err(AppError::unauthorized());
    }
    validate_amounts(&[payload.sub_total, payload.tax, payload.discount, payload.total])?;
    if let (Some(sub_total), Some(total)) = (payload.sub_total, payload.total)
        && total != sub_total + payload.tax.unwrap_or(0) - payload.discount.unwrap_or(0)
    {
        return Err(AppError::validation(
            "total must equal sub_total + tax - discount",
        ));
    }

    let order = state.manager.create_order(
        &user.tenant_id,
        &user.actor_name,
        NewOrder {
            table_id: payload.table_id,
            channel: payload.channel.unwrap_or_default(),
            items: payload.items,
            customer_name: payload.customer_name,
            customer_mobile: payload.customer_mobile,
            sub_total: payload.sub_total,
            tax: payload.tax.unwrap_or(0),
            discount: payload.discount.unwrap_or(0),
            total: payload.total,
        },
    )?;

    state.notify(&user.tenant_id, RESOURCE);
    state.notify(&user.tenant_id, "table");

    Ok((StatusCode::CREATED, Json(order)))
}

/// List the tenant's open orders
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.manager.list_open_orders(&user.tenant_id)?;
    Ok(Json(orders))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.manager.get_order(&user.tenant_id, &id)?;
    Ok(Json(order))
}

/// Update order request: a status transition and/or a field patch
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub items: Option<Vec<OrderItem>>,
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,
    pub sub_total: Option<i64>,
    pub tax: Option<i64>,
    pub discount: Option<i64>,
    pub total: Option<i64>,
}

/// Transition and/or patch an order
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<Json<Order>> {
    validate_amounts(&[payload.sub_total, payload.tax, payload.discount, payload.total])?;

    let order = state.manager.update_order(
        &user.tenant_id,
        &id,
        &user.actor_name,
        OrderPatch {
            status: payload.status,
            items: payload.items,
            customer_name: payload.customer_name,
            customer_mobile: payload.customer_mobile,
            sub_total: payload.sub_total,
            tax: payload.tax,
            discount: payload.discount,
            total: payload.total,
        },
    )?;

    state.notify(&user.tenant_id, RESOURCE);
    if order.status.is_terminal() {
        state.notify(&user.tenant_id, "table");
    }

    Ok(Json(order))
}

/// Cancel order request
#[derive(Debug, Deserialize, Default)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

/// Cancel (soft-delete) an order
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Option<Json<CancelOrderRequest>>,
) -> AppResult<Json<Order>> {
    let reason = payload.and_then(|Json(p)| p.reason);
    let order = state
        .manager
        .cancel_order(&user.tenant_id, &id, &user.actor_name, reason.as_deref())?;

    state.notify(&user.tenant_id, RESOURCE);
    state.notify(&user.tenant_id, "table");

    Ok(Json(order))
}

/// Settle request
#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    pub payment_method: String,
    /// Defaults to the order's due balance
    pub amount: Option<i64>,
}

/// Settle the outstanding balance and close the order
pub async fn settle(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<SettleRequest>,
) -> AppResult<Json<Order>> {
    validate_amounts(&[payload.amount])?;

    let order = state.manager.settle_payment(
        &user.tenant_id,
        &id,
        &user.actor_name,
        &payload.payment_method,
        payload.amount,
    )?;

    state.notify(&user.tenant_id, RESOURCE);
    state.notify(&user.tenant_id, "table");

    Ok(Json(order))
}

/// Partial payment request
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub method: String,
    pub amount: i64,
}

/// Record a partial payment without changing the order status
pub async fn record_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<RecordPaymentRequest>,
) -> AppResult<Json<Order>> {
    if payload.amount <= 0 {
        return Err(AppError::validation("Payment amount must be positive"));
    }

    let order = state.manager.record_partial_payment(
        &user.tenant_id,
        &id,
        &user.actor_name,
        &payload.method,
        payload.amount,
    )?;

    state.notify(&user.tenant_id, RESOURCE);

    Ok(Json(order))
}
