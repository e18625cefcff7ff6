//! Table API Module
//!
//! Registration, listing and the reservation flag. Occupancy itself is
//! never mutated here; it belongs to the order lifecycle.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

/// Table router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/reservation", put(handler::set_reservation))
}
