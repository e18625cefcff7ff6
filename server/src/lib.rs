//! Comanda Server - multi-tenant restaurant order lifecycle service
//!
//! # Architecture
//!
//! The service owns the order status state machine and the two resources
//! that must stay consistent with it: table occupancy and the payment
//! ledger. Everything is persisted in an embedded redb database; every
//! mutation is a single write transaction so the order and its table can
//! never disagree about occupancy.
//!
//! # Module structure
//!
//! ```text
//! server/src/
//! ├── core/          # Config, state, HTTP server
//! ├── auth/          # JWT validation and CurrentUser extractor
//! ├── orders/        # Order lifecycle: manager, storage, occupancy, ledger
//! ├── api/           # HTTP routes and handlers
//! ├── sync/          # Best-effort change notification broadcast
//! └── utils/         # Errors, logging
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod orders;
pub mod sync;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{LifecycleStorage, OrderManager};
pub use sync::SyncBroadcaster;
pub use utils::{AppError, AppResponse, AppResult};
pub use utils::logger::{init_logger, init_logger_with_file};
