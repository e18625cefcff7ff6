//! Order model and the status transition table
//!
//! The transition table ([`OrderStatus::allowed_transitions`]) is the single
//! source of truth for the order lifecycle. Every mutation path on the server
//! validates against it; nothing else is allowed to decide whether a status
//! move is legal.

use crate::util::now_millis;
use serde::{Deserialize, Serialize};

// ============================================================================
// Status
// ============================================================================

/// Order status
///
/// `Closed` and `Cancelled` are terminal: no outgoing transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Active,
    Preparing,
    Ready,
    Served,
    PendingPayment,
    Closed,
    Cancelled,
}

impl OrderStatus {
    /// Allowed target statuses from this status.
    ///
    /// Payment can be deferred from any pre-terminal state, but `Closed` is
    /// only reachable through `Served` or `PendingPayment` — never straight
    /// from the kitchen states. `PendingPayment -> Active` reverts a
    /// mistaken pay-later flag; the kitchen states themselves cannot be
    /// walked backwards.
    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Active => &[Preparing, PendingPayment, Cancelled],
            Preparing => &[Ready, PendingPayment, Cancelled],
            Ready => &[Served, PendingPayment, Cancelled],
            Served => &[PendingPayment, Closed, Cancelled],
            PendingPayment => &[Closed, Active, Cancelled],
            Closed | Cancelled => &[],
        }
    }

    /// Whether `target` is a legal next status.
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Terminal statuses have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Closed | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Active => "active",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Closed => "closed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Channel
// ============================================================================

/// Where the order originated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    DineIn,
    Takeaway,
    Delivery,
    Aggregator,
    /// QR self-order, created through proposal approval
    Qr,
    Other,
}

// ============================================================================
// Items
// ============================================================================

/// Per-item preparation status (kitchen display granularity)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrepStatus {
    Pending,
    Preparing,
    Ready,
    Served,
}

/// A single line item on an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Item name snapshot (menu CRUD is a separate concern)
    pub name: String,
    pub quantity: u32,
    /// Unit price in minor units (cents)
    pub unit_price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_status: Option<PrepStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

// ============================================================================
// Payments
// ============================================================================

/// One recorded payment against an order's balance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentEntry {
    pub method: String,
    /// Amount in minor units (cents)
    pub amount: i64,
    pub timestamp: i64,
}

// ============================================================================
// Audit
// ============================================================================

/// Audit log action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    OrderCreated,
    StatusChanged,
    ItemsAppended,
    OrderUpdated,
    PaymentRecorded,
    PaymentSettled,
    OrderCancelled,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::OrderCreated => "ORDER_CREATED",
            AuditAction::StatusChanged => "STATUS_CHANGED",
            AuditAction::ItemsAppended => "ITEMS_APPENDED",
            AuditAction::OrderUpdated => "ORDER_UPDATED",
            AuditAction::PaymentRecorded => "PAYMENT_RECORDED",
            AuditAction::PaymentSettled => "PAYMENT_SETTLED",
            AuditAction::OrderCancelled => "ORDER_CANCELLED",
        };
        f.write_str(s)
    }
}

/// One entry in an order's append-only audit log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub action: AuditAction,
    /// Operator name snapshot (or "customer" for QR submissions)
    pub actor: String,
    pub timestamp: i64,
    pub detail: String,
}

// ============================================================================
// Order
// ============================================================================

/// The central order record
///
/// Monetary invariants: `total = sub_total + tax - discount` and
/// `amount_due = max(0, total - amount_paid)`; all amounts are non-negative
/// minor units. The audit log is append-only and never reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order ID (assigned by server)
    pub id: String,
    /// Per-tenant sequential number, human facing. Never reused; gaps from
    /// failed creates are acceptable.
    pub order_number: u64,
    pub tenant_id: String,
    pub table_id: String,
    #[serde(default)]
    pub channel: Channel,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_mobile: Option<String>,
    /// Minor units
    pub sub_total: i64,
    #[serde(default)]
    pub tax: i64,
    #[serde(default)]
    pub discount: i64,
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub amount_paid: i64,
    pub amount_due: i64,
    /// Partial payments, in recording order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payments: Vec<PaymentEntry>,
    /// QR proposals folded into this running bill
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consolidated_qr_ids: Vec<String>,
    /// Append-only audit trail
    pub audit_log: Vec<AuditEntry>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<i64>,
    /// Soft-delete marker, set on cancellation. Kept for audit retention.
    #[serde(default)]
    pub deleted: bool,
}

impl Order {
    /// Create a new order in `Active` status with empty totals.
    pub fn new(
        id: String,
        order_number: u64,
        tenant_id: String,
        table_id: String,
        channel: Channel,
    ) -> Self {
        let now = now_millis();
        Self {
            id,
            order_number,
            tenant_id,
            table_id,
            channel,
            status: OrderStatus::Active,
            items: Vec::new(),
            customer_name: None,
            customer_mobile: None,
            sub_total: 0,
            tax: 0,
            discount: 0,
            total: 0,
            payment_method: None,
            amount_paid: 0,
            amount_due: 0,
            payments: Vec::new(),
            consolidated_qr_ids: Vec::new(),
            audit_log: Vec::new(),
            created_at: now,
            closed_at: None,
            deleted: false,
        }
    }

    /// Append an audit entry. The log is append-only; there is no API to
    /// remove or reorder entries.
    pub fn push_audit(&mut self, action: AuditAction, actor: &str, detail: impl Into<String>) {
        self.audit_log.push(AuditEntry {
            action,
            actor: actor.to_string(),
            timestamp: now_millis(),
            detail: detail.into(),
        });
    }

    /// Sum of line totals.
    pub fn items_sub_total(&self) -> i64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
