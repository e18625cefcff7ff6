//! Data models shared between server and clients

pub mod dining_table;
pub mod order;
pub mod qr_order;

pub use dining_table::{DiningTable, TableStatus};
pub use order::{
    AuditAction, AuditEntry, Channel, Order, OrderItem, OrderStatus, PaymentEntry, PrepStatus,
};
pub use qr_order::{QrOrder, QrOrderStatus};
