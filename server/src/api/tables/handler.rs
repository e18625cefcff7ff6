//! Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::DiningTable;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "table";

/// Create table request
#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    pub name: String,
}

/// Register a new table
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateTableRequest>,
) -> AppResult<(StatusCode, Json<DiningTable>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Table name required"));
    }

    let table = state.manager.register_table(&user.tenant_id, payload.name.trim())?;
    state.notify(&user.tenant_id, RESOURCE);

    Ok((StatusCode::CREATED, Json(table)))
}

/// List the tenant's tables
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<DiningTable>>> {
    let tables = state.manager.list_tables(&user.tenant_id)?;
    Ok(Json(tables))
}

/// Get table by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<DiningTable>> {
    let table = state.manager.get_table(&user.tenant_id, &id)?;
    Ok(Json(table))
}

/// Reservation request
#[derive(Debug, Deserialize)]
pub struct ReservationRequest {
    pub reserved: bool,
}

/// Flip the reservation flag on a free table
pub async fn set_reservation(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ReservationRequest>,
) -> AppResult<Json<DiningTable>> {
    let table = state
        .manager
        .set_table_reserved(&user.tenant_id, &id, payload.reserved)?;
    state.notify(&user.tenant_id, RESOURCE);

    Ok(Json(table))
}
