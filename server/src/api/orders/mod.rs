//! Order API Module
//!
//! All mutations go through the [`OrderManager`](crate::orders::OrderManager);
//! handlers only authenticate, validate input shape, and fire the
//! change notification afterwards.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::cancel),
        )
        .route("/{id}/settle", post(handler::settle))
        .route("/{id}/payments", post(handler::record_payment))
}
