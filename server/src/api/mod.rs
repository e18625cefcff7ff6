//! API route modules
//!
//! # Structure
//!
//! - [`health`] - liveness check
//! - [`orders`] - order lifecycle: create, transition, settle, cancel
//! - [`tables`] - table registration, listing, reservation flag
//! - [`qr_orders`] - QR proposal submission and staff review

pub mod health;
pub mod orders;
pub mod qr_orders;
pub mod tables;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

use crate::core::ServerState;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Assemble the application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(tables::router())
        .merge(qr_orders::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
