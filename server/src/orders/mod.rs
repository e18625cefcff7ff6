//! Order lifecycle module
//!
//! This module owns the order status state machine and the side effects that
//! must stay consistent with it:
//!
//! - **manager**: the [`OrderManager`] — validates transitions, records the
//!   audit trail, coordinates occupancy and settlement
//! - **storage**: redb persistence with atomic multi-table transactions
//! - **occupancy**: the table occupancy tracker (manager-only caller)
//! - **ledger**: partial-payment arithmetic
//!
//! # Data Flow
//!
//! ```text
//! HTTP handler → OrderManager → redb write transaction
//!                     │            ├─ order row
//!                     │            ├─ table row (occupy / release)
//!                     │            └─ per-tenant counter
//!                     └─ returns the updated Order; the handler fires the
//!                        best-effort sync notification afterwards
//! ```

pub mod ledger;
pub mod manager;
pub mod occupancy;
pub mod storage;

// Re-exports
pub use manager::{LifecycleError, NewOrder, NewQrOrder, OrderManager, OrderPatch};
pub use storage::{LifecycleStorage, StorageError};
