//! Dining table model
//!
//! A table is `Occupied` if and only if it references a non-terminal order.
//! Occupancy is mutated exclusively by the server's order manager, in the
//! same transaction as the order change it mirrors.

use crate::util::now_millis;
use serde::{Deserialize, Serialize};

/// Table status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TableStatus::Available => "available",
            TableStatus::Occupied => "occupied",
            TableStatus::Reserved => "reserved",
        };
        f.write_str(s)
    }
}

/// A physical table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiningTable {
    /// Table ID (assigned by server)
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub status: TableStatus,
    /// The non-terminal order currently holding this table, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_order_id: Option<String>,
    pub created_at: i64,
}

impl DiningTable {
    pub fn new(id: String, tenant_id: String, name: String) -> Self {
        Self {
            id,
            tenant_id,
            name,
            status: TableStatus::Available,
            current_order_id: None,
            created_at: now_millis(),
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.status == TableStatus::Occupied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_is_available() {
        let table = DiningTable::new("tbl-1".to_string(), "t-1".to_string(), "Mesa 1".to_string());
        assert_eq!(table.status, TableStatus::Available);
        assert!(table.current_order_id.is_none());
        assert!(!table.is_occupied());
    }
}
