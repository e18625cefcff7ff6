//! redb-based storage layer for the order lifecycle
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Order records |
//! | `open_orders` | `order_id` | `()` | Non-terminal order index |
//! | `tables` | `table_id` | `DiningTable` | Table records and occupancy |
//! | `qr_orders` | `qr_order_id` | `QrOrder` | QR proposals |
//! | `order_counters` | `tenant_id` | `u64` | Per-tenant order numbering |
//!
//! # Atomicity
//!
//! Every mutating operation on the manager runs inside one redb write
//! transaction spanning all affected tables, so an order and its table can
//! never disagree about occupancy, and two concurrent creates for the same
//! tenant can never observe the same counter value. redb commits are
//! durable as soon as `commit()` returns (copy-on-write with atomic pointer
//! swap), which keeps the database consistent across crashes.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::{DiningTable, Order, QrOrder, QrOrderStatus};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Order records: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Non-terminal order index: key = order_id, value = empty (existence check)
const OPEN_ORDERS_TABLE: TableDefinition<&str, ()> = TableDefinition::new("open_orders");

/// Table records: key = table_id, value = JSON-serialized DiningTable
const TABLES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tables");

/// QR proposals: key = qr_order_id, value = JSON-serialized QrOrder
const QR_ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("qr_orders");

/// Per-tenant order number counters: key = tenant_id, value = last issued number
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("order_counters");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Lifecycle storage backed by redb
#[derive(Clone)]
pub struct LifecycleStorage {
    db: Arc<Database>,
}

impl LifecycleStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Create all tables if they don't exist
    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(OPEN_ORDERS_TABLE)?;
            let _ = write_txn.open_table(TABLES_TABLE)?;
            let _ = write_txn.open_table(QR_ORDERS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Order Numbering ==========

    /// Increment and return the per-tenant order number, within the caller's
    /// transaction.
    ///
    /// The increment commits or rolls back together with the order insert,
    /// so concurrent creates can never observe the same number. Numbers are
    /// never reused; a rolled-back create leaves a gap, which is acceptable.
    pub fn next_order_number(&self, txn: &WriteTransaction, tenant_id: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(tenant_id)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(tenant_id, next)?;
        Ok(next)
    }

    /// Last issued order number for a tenant (read-only)
    pub fn current_order_number(&self, tenant_id: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table.get(tenant_id)?.map(|g| g.value()).unwrap_or(0))
    }

    // ========== Order Operations ==========

    /// Store an order (insert or overwrite)
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an order by ID
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by ID (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Mark an order as open (non-terminal)
    pub fn mark_order_open(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(OPEN_ORDERS_TABLE)?;
        table.insert(order_id, ())?;
        Ok(())
    }

    /// Remove an order from the open index (terminal status reached)
    pub fn mark_order_closed(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(OPEN_ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    /// Get all open order IDs
    pub fn get_open_order_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OPEN_ORDERS_TABLE)?;

        let mut order_ids = Vec::new();
        for result in table.iter()? {
            let (key, _value) = result?;
            order_ids.push(key.value().to_string());
        }
        Ok(order_ids)
    }

    /// Get open orders belonging to a tenant
    pub fn get_open_orders_for_tenant(&self, tenant_id: &str) -> StorageResult<Vec<Order>> {
        let mut orders = Vec::new();
        for order_id in self.get_open_order_ids()? {
            if let Some(order) = self.get_order(&order_id)?
                && order.tenant_id == tenant_id
            {
                orders.push(order);
            }
        }
        orders.sort_by_key(|o| o.order_number);
        Ok(orders)
    }

    /// Find the open order holding a table, if any (within transaction)
    pub fn find_open_order_for_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Option<String>> {
        let open_table = txn.open_table(OPEN_ORDERS_TABLE)?;
        let orders_table = txn.open_table(ORDERS_TABLE)?;

        for result in open_table.iter()? {
            let (key, _) = result?;
            let order_id = key.value();

            if let Some(value) = orders_table.get(order_id)? {
                let order: Order = serde_json::from_slice(value.value())?;
                if order.table_id == table_id {
                    return Ok(Some(order_id.to_string()));
                }
            }
        }
        Ok(None)
    }

    // ========== Table Operations ==========

    /// Store a table (insert or overwrite)
    pub fn store_table(&self, txn: &WriteTransaction, table: &DiningTable) -> StorageResult<()> {
        let mut t = txn.open_table(TABLES_TABLE)?;
        let value = serde_json::to_vec(table)?;
        t.insert(table.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a table by ID
    pub fn get_table(&self, table_id: &str) -> StorageResult<Option<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLES_TABLE)?;
        match table.get(table_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a table by ID (within transaction)
    pub fn get_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Option<DiningTable>> {
        let table = txn.open_table(TABLES_TABLE)?;
        match table.get(table_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all tables belonging to a tenant
    pub fn get_tables_for_tenant(&self, tenant_id: &str) -> StorageResult<Vec<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLES_TABLE)?;

        let mut tables = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let t: DiningTable = serde_json::from_slice(value.value())?;
            if t.tenant_id == tenant_id {
                tables.push(t);
            }
        }
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tables)
    }

    // ========== QR Proposal Operations ==========

    /// Store a QR proposal (insert or overwrite)
    pub fn store_qr_order(&self, txn: &WriteTransaction, qr: &QrOrder) -> StorageResult<()> {
        let mut table = txn.open_table(QR_ORDERS_TABLE)?;
        let value = serde_json::to_vec(qr)?;
        table.insert(qr.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a QR proposal by ID
    pub fn get_qr_order(&self, qr_id: &str) -> StorageResult<Option<QrOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QR_ORDERS_TABLE)?;
        match table.get(qr_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a QR proposal by ID (within transaction)
    pub fn get_qr_order_txn(
        &self,
        txn: &WriteTransaction,
        qr_id: &str,
    ) -> StorageResult<Option<QrOrder>> {
        let table = txn.open_table(QR_ORDERS_TABLE)?;
        match table.get(qr_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a tenant's QR proposals, optionally filtered by status
    pub fn get_qr_orders_for_tenant(
        &self,
        tenant_id: &str,
        status: Option<QrOrderStatus>,
    ) -> StorageResult<Vec<QrOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QR_ORDERS_TABLE)?;

        let mut proposals = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let qr: QrOrder = serde_json::from_slice(value.value())?;
            if qr.tenant_id == tenant_id && status.is_none_or(|s| qr.status == s) {
                proposals.push(qr);
            }
        }
        proposals.sort_by_key(|q| q.created_at);
        Ok(proposals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Channel, OrderItem};

    fn create_test_order(order_id: &str, tenant_id: &str, table_id: &str, number: u64) -> Order {
        let mut order = Order::new(
            order_id.to_string(),
            number,
            tenant_id.to_string(),
            table_id.to_string(),
            Channel::DineIn,
        );
        order.items.push(OrderItem {
            name: "Test Item".to_string(),
            quantity: 1,
            unit_price: 500,
            prep_status: None,
            modifiers: vec![],
            note: None,
        });
        order
    }

    #[test]
    fn test_counter_increments_per_tenant() {
        let storage = LifecycleStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_order_number(&txn, "tenant-a").unwrap(), 1);
        assert_eq!(storage.next_order_number(&txn, "tenant-a").unwrap(), 2);
        assert_eq!(storage.next_order_number(&txn, "tenant-b").unwrap(), 1);
        txn.commit().unwrap();

        assert_eq!(storage.current_order_number("tenant-a").unwrap(), 2);
        assert_eq!(storage.current_order_number("tenant-b").unwrap(), 1);
    }

    #[test]
    fn test_counter_rolls_back_with_transaction() {
        let storage = LifecycleStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_order_number(&txn, "tenant-a").unwrap(), 1);
        drop(txn); // abort

        // The aborted increment is not visible
        assert_eq!(storage.current_order_number("tenant-a").unwrap(), 0);
    }

    #[test]
    fn test_order_store_and_get() {
        let storage = LifecycleStorage::open_in_memory().unwrap();
        let order = create_test_order("order-1", "tenant-a", "tbl-1", 1);

        let txn = storage.begin_write().unwrap();
        storage.store_order(&txn, &order).unwrap();
        txn.commit().unwrap();

        let retrieved = storage.get_order("order-1").unwrap();
        assert_eq!(retrieved, Some(order));
        assert!(storage.get_order("missing").unwrap().is_none());
    }

    #[test]
    fn test_open_order_index() {
        let storage = LifecycleStorage::open_in_memory().unwrap();
        let order = create_test_order("order-1", "tenant-a", "tbl-1", 1);

        let txn = storage.begin_write().unwrap();
        storage.store_order(&txn, &order).unwrap();
        storage.mark_order_open(&txn, "order-1").unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.get_open_order_ids().unwrap(), vec!["order-1"]);
        let open = storage.get_open_orders_for_tenant("tenant-a").unwrap();
        assert_eq!(open.len(), 1);
        assert!(storage.get_open_orders_for_tenant("tenant-b").unwrap().is_empty());

        let txn = storage.begin_write().unwrap();
        storage.mark_order_closed(&txn, "order-1").unwrap();
        txn.commit().unwrap();

        assert!(storage.get_open_order_ids().unwrap().is_empty());
    }

    #[test]
    fn test_find_open_order_for_table() {
        let storage = LifecycleStorage::open_in_memory().unwrap();
        let order = create_test_order("order-1", "tenant-a", "tbl-7", 1);

        let txn = storage.begin_write().unwrap();
        storage.store_order(&txn, &order).unwrap();
        storage.mark_order_open(&txn, "order-1").unwrap();

        let found = storage.find_open_order_for_table_txn(&txn, "tbl-7").unwrap();
        assert_eq!(found, Some("order-1".to_string()));
        let not_found = storage.find_open_order_for_table_txn(&txn, "tbl-8").unwrap();
        assert!(not_found.is_none());
    }

    #[test]
    fn test_table_store_and_list() {
        let storage = LifecycleStorage::open_in_memory().unwrap();
        let t1 = DiningTable::new("tbl-1".to_string(), "tenant-a".to_string(), "Mesa 1".to_string());
        let t2 = DiningTable::new("tbl-2".to_string(), "tenant-b".to_string(), "Mesa 2".to_string());

        let txn = storage.begin_write().unwrap();
        storage.store_table(&txn, &t1).unwrap();
        storage.store_table(&txn, &t2).unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.get_table("tbl-1").unwrap(), Some(t1));
        let tenant_a = storage.get_tables_for_tenant("tenant-a").unwrap();
        assert_eq!(tenant_a.len(), 1);
        assert_eq!(tenant_a[0].id, "tbl-1");
    }

    #[test]
    fn test_qr_order_store_and_filter() {
        let storage = LifecycleStorage::open_in_memory().unwrap();
        let mut qr = QrOrder::new(
            "qr-1".to_string(),
            "tenant-a".to_string(),
            "tbl-1".to_string(),
            "Carlos".to_string(),
            None,
            vec![],
        );

        let txn = storage.begin_write().unwrap();
        storage.store_qr_order(&txn, &qr).unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.get_qr_order("qr-1").unwrap(), Some(qr.clone()));
        let pending = storage
            .get_qr_orders_for_tenant("tenant-a", Some(QrOrderStatus::PendingApproval))
            .unwrap();
        assert_eq!(pending.len(), 1);

        qr.status = QrOrderStatus::Rejected;
        let txn = storage.begin_write().unwrap();
        storage.store_qr_order(&txn, &qr).unwrap();
        txn.commit().unwrap();

        let pending = storage
            .get_qr_orders_for_tenant("tenant-a", Some(QrOrderStatus::PendingApproval))
            .unwrap();
        assert!(pending.is_empty());
        let all = storage.get_qr_orders_for_tenant("tenant-a", None).unwrap();
        assert_eq!(all.len(), 1);
    }
}
