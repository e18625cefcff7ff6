//! OrderManager - order lifecycle mutations
//!
//! Every mutation follows the same shape:
//!
//! ```text
//! operation(tenant, ...)
//!     ├─ 1. Begin write transaction
//!     ├─ 2. Load the order, tenant-scoped (cross-tenant => not found)
//!     ├─ 3. Validate against the status transition table
//!     ├─ 4. Mutate the order, append audit entries
//!     ├─ 5. Apply coupled side effects (table occupy/release, counters)
//!     ├─ 6. Commit — all rows move together or not at all
//!     └─ 7. Return the updated order
//! ```
//!
//! The transition table itself lives on [`OrderStatus`]; this module never
//! re-encodes it. Reaching `closed` or `cancelled` releases the table inside
//! the same transaction, so a crash between the two writes cannot leave a
//! table occupied by a finished order.

mod error;
pub use error::*;

use super::storage::LifecycleStorage;
use super::{ledger, occupancy};
use shared::models::{
    AuditAction, Channel, DiningTable, Order, OrderItem, OrderStatus, QrOrder, QrOrderStatus,
    TableStatus,
};
use shared::util::now_millis;
use tracing::info;
use uuid::Uuid;

/// Input for creating an order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub table_id: String,
    pub channel: Channel,
    pub items: Vec<OrderItem>,
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,
    /// Omitted monetary fields are derived: `sub_total` from the line items,
    /// `total` from `sub_total + tax - discount`.
    pub sub_total: Option<i64>,
    pub tax: i64,
    pub discount: i64,
    pub total: Option<i64>,
}

/// Patch for mutating an order without (or alongside) a status transition
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub items: Option<Vec<OrderItem>>,
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,
    pub sub_total: Option<i64>,
    pub tax: Option<i64>,
    pub discount: Option<i64>,
    pub total: Option<i64>,
}

impl OrderPatch {
    /// Whether anything besides the status is being changed
    pub fn has_field_changes(&self) -> bool {
        self.items.is_some()
            || self.customer_name.is_some()
            || self.customer_mobile.is_some()
            || self.sub_total.is_some()
            || self.tax.is_some()
            || self.discount.is_some()
            || self.total.is_some()
    }
}

/// Input for a customer-submitted QR proposal
#[derive(Debug, Clone)]
pub struct NewQrOrder {
    pub table_id: String,
    pub customer_name: String,
    pub customer_mobile: Option<String>,
    pub items: Vec<OrderItem>,
}

/// Order lifecycle manager
///
/// Holds the storage handle; clone is cheap (the handle is an `Arc`).
#[derive(Clone)]
pub struct OrderManager {
    storage: LifecycleStorage,
}

impl OrderManager {
    pub fn new(storage: LifecycleStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &LifecycleStorage {
        &self.storage
    }

    // ========== Order Mutations ==========

    /// Create an order on a table.
    ///
    /// The per-tenant order number is incremented inside the same
    /// transaction as the order insert, so two concurrent creates can never
    /// receive the same number. The table is marked occupied in that same
    /// transaction.
    pub fn create_order(
        &self,
        tenant_id: &str,
        actor: &str,
        input: NewOrder,
    ) -> LifecycleResult<Order> {
        if input.items.is_empty() {
            return Err(LifecycleError::EmptyItems);
        }

        let txn = self.storage.begin_write()?;

        let table = self
            .storage
            .get_table_txn(&txn, &input.table_id)?
            .filter(|t| t.tenant_id == tenant_id)
            .ok_or_else(|| {
                LifecycleError::NotFound(format!("Table {} not found", input.table_id))
            })?;

        let number = self.storage.next_order_number(&txn, tenant_id)?;

        let mut order = Order::new(
            Uuid::new_v4().to_string(),
            number,
            tenant_id.to_string(),
            input.table_id.clone(),
            input.channel,
        );
        order.items = input.items;
        order.customer_name = input.customer_name;
        order.customer_mobile = input.customer_mobile;
        let derived_sub_total = order.items_sub_total();
        order.sub_total = input.sub_total.unwrap_or(derived_sub_total);
        order.tax = input.tax;
        order.discount = input.discount;
        order.total = input
            .total
            .unwrap_or(order.sub_total + order.tax - order.discount);
        if order.total < 0 {
            return Err(LifecycleError::InvalidState(
                "Order total cannot be negative".to_string(),
            ));
        }
        ledger::recompute(&mut order);
        order.push_audit(
            AuditAction::OrderCreated,
            actor,
            format!("order #{} created on table {}", number, table.name),
        );

        occupancy::occupy(&self.storage, &txn, &input.table_id, &order.id)?;
        self.storage.store_order(&txn, &order)?;
        self.storage.mark_order_open(&txn, &order.id)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        info!(
            order_id = %order.id,
            order_number = number,
            tenant_id = %tenant_id,
            table_id = %order.table_id,
            "Order created"
        );
        Ok(order)
    }

    /// Apply a status transition and/or a field patch, atomically.
    ///
    /// An illegal transition aborts the whole request: nothing from the
    /// patch is persisted. Reaching a terminal status releases the table in
    /// the same transaction; kitchen-visible statuses have no table side
    /// effect. Field patches never touch occupancy.
    pub fn update_order(
        &self,
        tenant_id: &str,
        order_id: &str,
        actor: &str,
        patch: OrderPatch,
    ) -> LifecycleResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_order_txn(&txn, tenant_id, order_id)?;

        if patch.has_field_changes() {
            if order.is_terminal() {
                return Err(LifecycleError::InvalidState(format!(
                    "Cannot modify order in '{}' status",
                    order.status
                )));
            }
            apply_field_patch(&mut order, &patch)?;
            order.push_audit(AuditAction::OrderUpdated, actor, "order fields updated");
        }

        if let Some(target) = patch.status {
            self.apply_transition(&txn, &mut order, target, actor)?;
        }

        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        info!(order_id = %order.id, status = %order.status, "Order updated");
        Ok(order)
    }

    /// Request a bare status transition.
    pub fn request_transition(
        &self,
        tenant_id: &str,
        order_id: &str,
        actor: &str,
        target: OrderStatus,
    ) -> LifecycleResult<Order> {
        self.update_order(
            tenant_id,
            order_id,
            actor,
            OrderPatch {
                status: Some(target),
                ..Default::default()
            },
        )
    }

    /// Settle the outstanding balance and close the order.
    ///
    /// Only valid while the order is `pending_payment`; partial payments on
    /// other statuses go through [`record_partial_payment`](Self::record_partial_payment).
    /// `amount` defaults to the current due balance. Closure and table
    /// release commit in one transaction.
    pub fn settle_payment(
        &self,
        tenant_id: &str,
        order_id: &str,
        actor: &str,
        method: &str,
        amount: Option<i64>,
    ) -> LifecycleResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_order_txn(&txn, tenant_id, order_id)?;

        if order.status != OrderStatus::PendingPayment {
            return Err(LifecycleError::InvalidState(format!(
                "Cannot settle order in '{}' status",
                order.status
            )));
        }

        let amount = amount.unwrap_or(order.amount_due);
        ledger::record_payment(&mut order, method, amount);
        order.payment_method = Some(method.to_string());
        order.status = OrderStatus::Closed;
        order.closed_at = Some(now_millis());
        order.push_audit(
            AuditAction::PaymentSettled,
            actor,
            format!("{} payment of {} settled, order closed", method, amount),
        );

        occupancy::release(&self.storage, &txn, &order.table_id)?;
        self.storage.mark_order_closed(&txn, &order.id)?;
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        info!(
            order_id = %order.id,
            method = %method,
            amount,
            "Payment settled, order closed"
        );
        Ok(order)
    }

    /// Cancel an order from any non-terminal status.
    ///
    /// The order is soft-deleted (kept for audit retention) and its table
    /// released, all in one transaction.
    pub fn cancel_order(
        &self,
        tenant_id: &str,
        order_id: &str,
        actor: &str,
        reason: Option<&str>,
    ) -> LifecycleResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_order_txn(&txn, tenant_id, order_id)?;

        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(LifecycleError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        order.status = OrderStatus::Cancelled;
        order.deleted = true;
        order.push_audit(
            AuditAction::OrderCancelled,
            actor,
            reason.unwrap_or("cancelled").to_string(),
        );

        occupancy::release(&self.storage, &txn, &order.table_id)?;
        self.storage.mark_order_closed(&txn, &order.id)?;
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        info!(order_id = %order.id, reason = ?reason, "Order cancelled");
        Ok(order)
    }

    /// Record a partial payment without changing the order status.
    pub fn record_partial_payment(
        &self,
        tenant_id: &str,
        order_id: &str,
        actor: &str,
        method: &str,
        amount: i64,
    ) -> LifecycleResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_order_txn(&txn, tenant_id, order_id)?;

        if order.is_terminal() {
            return Err(LifecycleError::InvalidState(format!(
                "Cannot record payment on order in '{}' status",
                order.status
            )));
        }

        ledger::record_payment(&mut order, method, amount);
        order.push_audit(
            AuditAction::PaymentRecorded,
            actor,
            format!("{} partial payment of {}", method, amount),
        );
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        info!(order_id = %order.id, method = %method, amount, "Partial payment recorded");
        Ok(order)
    }

    // ========== Tables ==========

    /// Register a new table for a tenant.
    pub fn register_table(&self, tenant_id: &str, name: &str) -> LifecycleResult<DiningTable> {
        let txn = self.storage.begin_write()?;
        let table = DiningTable::new(
            Uuid::new_v4().to_string(),
            tenant_id.to_string(),
            name.to_string(),
        );
        self.storage.store_table(&txn, &table)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        info!(table_id = %table.id, tenant_id = %tenant_id, name = %name, "Table registered");
        Ok(table)
    }

    /// Flip a table between `Available` and `Reserved`.
    ///
    /// Occupied tables cannot be reserved or unreserved; occupancy belongs
    /// to the order holding the table.
    pub fn set_table_reserved(
        &self,
        tenant_id: &str,
        table_id: &str,
        reserved: bool,
    ) -> LifecycleResult<DiningTable> {
        let txn = self.storage.begin_write()?;
        let mut table = self
            .storage
            .get_table_txn(&txn, table_id)?
            .filter(|t| t.tenant_id == tenant_id)
            .ok_or_else(|| LifecycleError::NotFound(format!("Table {table_id} not found")))?;

        if table.is_occupied() {
            return Err(LifecycleError::TableConflict(format!(
                "Table {} is occupied (order: {})",
                table.name,
                table.current_order_id.as_deref().unwrap_or("?")
            )));
        }

        table.status = if reserved {
            TableStatus::Reserved
        } else {
            TableStatus::Available
        };
        self.storage.store_table(&txn, &table)?;
        txn.commit().map_err(super::storage::StorageError::from)?;
        Ok(table)
    }

    // ========== QR Proposals ==========

    /// Record a customer-submitted QR proposal for staff review.
    ///
    /// This is the unauthenticated path; the proposal never touches any
    /// order until staff approve it.
    pub fn submit_qr_order(&self, tenant_id: &str, input: NewQrOrder) -> LifecycleResult<QrOrder> {
        if input.items.is_empty() {
            return Err(LifecycleError::EmptyItems);
        }

        let txn = self.storage.begin_write()?;
        self.storage
            .get_table_txn(&txn, &input.table_id)?
            .filter(|t| t.tenant_id == tenant_id)
            .ok_or_else(|| {
                LifecycleError::NotFound(format!("Table {} not found", input.table_id))
            })?;

        let qr = QrOrder::new(
            Uuid::new_v4().to_string(),
            tenant_id.to_string(),
            input.table_id,
            input.customer_name,
            input.customer_mobile,
            input.items,
        );
        self.storage.store_qr_order(&txn, &qr)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        info!(qr_order_id = %qr.id, table_id = %qr.table_id, "QR proposal submitted");
        Ok(qr)
    }

    /// Approve a pending QR proposal.
    ///
    /// If the table already has an open order, the proposal's items are
    /// folded into that running bill; otherwise a fresh order is created on
    /// the `qr` channel. Either way the proposal id is recorded on the
    /// order, and the whole bridge commits in one transaction.
    pub fn approve_qr_order(
        &self,
        tenant_id: &str,
        qr_id: &str,
        actor: &str,
    ) -> LifecycleResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut qr = self
            .storage
            .get_qr_order_txn(&txn, qr_id)?
            .filter(|q| q.tenant_id == tenant_id)
            .ok_or_else(|| LifecycleError::NotFound(format!("QR order {qr_id} not found")))?;

        if !qr.is_pending() {
            return Err(LifecycleError::InvalidState(format!(
                "QR order {} has already been resolved",
                qr_id
            )));
        }

        let order = match self.storage.find_open_order_for_table_txn(&txn, &qr.table_id)? {
            Some(open_id) => {
                // Fold into the table's running bill
                let mut order = self
                    .storage
                    .get_order_txn(&txn, &open_id)?
                    .ok_or_else(|| LifecycleError::NotFound(format!("Order {open_id} not found")))?;
                order.items.extend(qr.items.iter().cloned());
                order.sub_total += qr.total;
                order.total += qr.total;
                ledger::recompute(&mut order);
                order.consolidated_qr_ids.push(qr.id.clone());
                order.push_audit(
                    AuditAction::ItemsAppended,
                    actor,
                    format!("{} item(s) appended from QR order {}", qr.items.len(), qr.id),
                );
                self.storage.store_order(&txn, &order)?;
                order
            }
            None => {
                // Fresh order on the qr channel
                let number = self.storage.next_order_number(&txn, tenant_id)?;
                let mut order = Order::new(
                    Uuid::new_v4().to_string(),
                    number,
                    tenant_id.to_string(),
                    qr.table_id.clone(),
                    Channel::Qr,
                );
                order.items = qr.items.clone();
                order.customer_name = Some(qr.customer_name.clone());
                order.customer_mobile = qr.customer_mobile.clone();
                order.sub_total = qr.total;
                order.total = qr.total;
                ledger::recompute(&mut order);
                order.consolidated_qr_ids.push(qr.id.clone());
                order.push_audit(
                    AuditAction::OrderCreated,
                    actor,
                    format!("order #{} created from QR order {}", number, qr.id),
                );
                occupancy::occupy(&self.storage, &txn, &qr.table_id, &order.id)?;
                self.storage.store_order(&txn, &order)?;
                self.storage.mark_order_open(&txn, &order.id)?;
                order
            }
        };

        qr.status = QrOrderStatus::Approved;
        qr.resolved_at = Some(now_millis());
        qr.order_id = Some(order.id.clone());
        self.storage.store_qr_order(&txn, &qr)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        info!(qr_order_id = %qr.id, order_id = %order.id, "QR proposal approved");
        Ok(order)
    }

    /// Reject a pending QR proposal.
    pub fn reject_qr_order(
        &self,
        tenant_id: &str,
        qr_id: &str,
        actor: &str,
    ) -> LifecycleResult<QrOrder> {
        let txn = self.storage.begin_write()?;
        let mut qr = self
            .storage
            .get_qr_order_txn(&txn, qr_id)?
            .filter(|q| q.tenant_id == tenant_id)
            .ok_or_else(|| LifecycleError::NotFound(format!("QR order {qr_id} not found")))?;

        if !qr.is_pending() {
            return Err(LifecycleError::InvalidState(format!(
                "QR order {} has already been resolved",
                qr_id
            )));
        }

        qr.status = QrOrderStatus::Rejected;
        qr.resolved_at = Some(now_millis());
        self.storage.store_qr_order(&txn, &qr)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        info!(qr_order_id = %qr.id, rejected_by = %actor, "QR proposal rejected");
        Ok(qr)
    }

    // ========== Queries ==========

    /// Get an order, tenant-scoped.
    pub fn get_order(&self, tenant_id: &str, order_id: &str) -> LifecycleResult<Order> {
        self.storage
            .get_order(order_id)?
            .filter(|o| o.tenant_id == tenant_id)
            .ok_or_else(|| LifecycleError::NotFound(format!("Order {order_id} not found")))
    }

    /// All open (non-terminal) orders for a tenant.
    pub fn list_open_orders(&self, tenant_id: &str) -> LifecycleResult<Vec<Order>> {
        Ok(self.storage.get_open_orders_for_tenant(tenant_id)?)
    }

    /// Get a table, tenant-scoped.
    pub fn get_table(&self, tenant_id: &str, table_id: &str) -> LifecycleResult<DiningTable> {
        self.storage
            .get_table(table_id)?
            .filter(|t| t.tenant_id == tenant_id)
            .ok_or_else(|| LifecycleError::NotFound(format!("Table {table_id} not found")))
    }

    /// All tables for a tenant.
    pub fn list_tables(&self, tenant_id: &str) -> LifecycleResult<Vec<DiningTable>> {
        Ok(self.storage.get_tables_for_tenant(tenant_id)?)
    }

    /// A tenant's QR proposals, optionally filtered by status.
    pub fn list_qr_orders(
        &self,
        tenant_id: &str,
        status: Option<QrOrderStatus>,
    ) -> LifecycleResult<Vec<QrOrder>> {
        Ok(self.storage.get_qr_orders_for_tenant(tenant_id, status)?)
    }

    // ========== Internal ==========

    /// Load an order within a transaction, tenant-scoped.
    fn load_order_txn(
        &self,
        txn: &redb::WriteTransaction,
        tenant_id: &str,
        order_id: &str,
    ) -> LifecycleResult<Order> {
        self.storage
            .get_order_txn(txn, order_id)?
            .filter(|o| o.tenant_id == tenant_id)
            .ok_or_else(|| LifecycleError::NotFound(format!("Order {order_id} not found")))
    }

    /// Apply a status transition to a loaded order.
    ///
    /// Validates against the transition table, appends the audit entry and
    /// performs the terminal side effects (soft delete, closure timestamp,
    /// table release, open-index removal) within the caller's transaction.
    fn apply_transition(
        &self,
        txn: &redb::WriteTransaction,
        order: &mut Order,
        target: OrderStatus,
        actor: &str,
    ) -> LifecycleResult<()> {
        if !order.status.can_transition_to(target) {
            return Err(LifecycleError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }

        let from = order.status;
        order.status = target;
        order.push_audit(
            AuditAction::StatusChanged,
            actor,
            format!("{from} -> {target}"),
        );

        if target.is_terminal() {
            if target == OrderStatus::Cancelled {
                order.deleted = true;
            }
            if target == OrderStatus::Closed {
                order.closed_at = Some(now_millis());
            }
            occupancy::release(&self.storage, txn, &order.table_id)?;
            self.storage.mark_order_closed(txn, &order.id)?;
        }
        Ok(())
    }
}

/// Apply non-status field changes to an order and rederive its totals.
///
/// Replacing the items recomputes `sub_total` unless an explicit value is
/// part of the same patch; `total` is rederived from the components unless
/// given explicitly. The result must respect the monetary invariants.
fn apply_field_patch(order: &mut Order, patch: &OrderPatch) -> LifecycleResult<()> {
    let monetary_change = patch.items.is_some()
        || patch.sub_total.is_some()
        || patch.tax.is_some()
        || patch.discount.is_some()
        || patch.total.is_some();

    if let Some(items) = &patch.items {
        order.items = items.clone();
        if patch.sub_total.is_none() {
            order.sub_total = order.items_sub_total();
        }
    }
    if let Some(sub_total) = patch.sub_total {
        order.sub_total = sub_total;
    }
    if let Some(tax) = patch.tax {
        order.tax = tax;
    }
    if let Some(discount) = patch.discount {
        order.discount = discount;
    }
    if monetary_change {
        order.total = patch
            .total
            .unwrap_or(order.sub_total + order.tax - order.discount);
        if order.total < 0 {
            return Err(LifecycleError::InvalidState(
                "Order total cannot be negative".to_string(),
            ));
        }
        ledger::recompute(order);
    }
    if let Some(name) = &patch.customer_name {
        order.customer_name = Some(name.clone());
    }
    if let Some(mobile) = &patch.customer_mobile {
        order.customer_mobile = Some(mobile.clone());
    }
    Ok(())
}
