//! Shared data model for the Comanda restaurant platform
//!
//! This crate holds the serde types exchanged between the server and its
//! clients (floor terminals, kitchen displays, QR self-order pages):
//!
//! - **models**: orders, dining tables and QR order proposals
//! - **util**: timestamp helpers
//!
//! The order status transition table lives here ([`OrderStatus`]) so that
//! every consumer validates lifecycle moves against the same source of truth.

pub mod models;
pub mod util;

// Re-export the model types at the crate root for convenience
pub use models::{
    AuditAction, AuditEntry, Channel, DiningTable, Order, OrderItem, OrderStatus, PaymentEntry,
    PrepStatus, QrOrder, QrOrderStatus, TableStatus,
};
