//! Table occupancy tracker
//!
//! The binding between a table and the single non-terminal order using it.
//! [`OrderManager`](super::OrderManager) is the only caller; no other
//! component may mutate occupancy, which keeps order state and table state
//! from diverging. Both operations run inside the caller's write
//! transaction so occupancy commits (or rolls back) together with the order
//! change that caused it.

use super::manager::LifecycleError;
use super::storage::LifecycleStorage;
use redb::WriteTransaction;
use shared::models::{DiningTable, TableStatus};

/// Mark a table as occupied by an order.
///
/// Fails with [`LifecycleError::TableConflict`] if the table is already held
/// by a different order. Occupying a reserved table is allowed (the guests
/// arrived); occupying with the same order again is a no-op.
pub fn occupy(
    storage: &LifecycleStorage,
    txn: &WriteTransaction,
    table_id: &str,
    order_id: &str,
) -> Result<DiningTable, LifecycleError> {
    let mut table = storage
        .get_table_txn(txn, table_id)?
        .ok_or_else(|| LifecycleError::NotFound(format!("Table {table_id} not found")))?;

    if let Some(existing) = table.current_order_id.as_deref()
        && existing != order_id
    {
        return Err(LifecycleError::TableConflict(format!(
            "Table {} is already occupied (order: {})",
            table.name, existing
        )));
    }

    table.status = TableStatus::Occupied;
    table.current_order_id = Some(order_id.to_string());
    storage.store_table(txn, &table)?;
    Ok(table)
}

/// Release a table back to `Available`.
///
/// Idempotent: releasing an already-available table is a no-op, not an
/// error. A missing table is also a no-op (nothing left to release).
pub fn release(
    storage: &LifecycleStorage,
    txn: &WriteTransaction,
    table_id: &str,
) -> Result<(), LifecycleError> {
    let Some(mut table) = storage.get_table_txn(txn, table_id)? else {
        return Ok(());
    };

    if table.status == TableStatus::Available && table.current_order_id.is_none() {
        return Ok(());
    }

    table.status = TableStatus::Available;
    table.current_order_id = None;
    storage.store_table(txn, &table)?;
    Ok(())
}
