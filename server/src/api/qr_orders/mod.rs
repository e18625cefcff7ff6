//! QR Order API Module
//!
//! Submission is the one unauthenticated route (the customer only has the
//! scanned table context). Review routes are staff-only; approval is the
//! only bridge from proposal to order.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

/// QR order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/qr/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::submit).get(handler::list))
        .route("/{id}/approve", post(handler::approve))
        .route("/{id}/reject", post(handler::reject))
}
