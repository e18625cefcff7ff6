//! QR self-order proposal
//!
//! A customer scan submits a proposal; it never touches a real order until
//! staff approve it. Approval is the only bridge: it either creates a new
//! order or folds the items into the table's open order. Rejection leaves
//! the proposal as a dead record.

use crate::models::order::OrderItem;
use crate::util::now_millis;
use serde::{Deserialize, Serialize};

/// Proposal status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QrOrderStatus {
    #[default]
    PendingApproval,
    Approved,
    Rejected,
}

/// A customer-submitted order proposal, pre staff approval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QrOrder {
    pub id: String,
    pub tenant_id: String,
    pub table_id: String,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_mobile: Option<String>,
    pub items: Vec<OrderItem>,
    /// Sum of line totals in minor units
    pub total: i64,
    pub status: QrOrderStatus,
    pub created_at: i64,
    /// When staff approved or rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
    /// Order the proposal was folded into on approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl QrOrder {
    pub fn new(
        id: String,
        tenant_id: String,
        table_id: String,
        customer_name: String,
        customer_mobile: Option<String>,
        items: Vec<OrderItem>,
    ) -> Self {
        let total = items.iter().map(OrderItem::line_total).sum();
        Self {
            id,
            tenant_id,
            table_id,
            customer_name,
            customer_mobile,
            items,
            total,
            status: QrOrderStatus::PendingApproval,
            created_at: now_millis(),
            resolved_at: None,
            order_id: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == QrOrderStatus::PendingApproval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_sum_of_line_totals() {
        let qr = QrOrder::new(
            "qr-1".to_string(),
            "t-1".to_string(),
            "tbl-1".to_string(),
            "Carlos".to_string(),
            None,
            vec![
                OrderItem {
                    name: "Tortilla".to_string(),
                    quantity: 2,
                    unit_price: 600,
                    prep_status: None,
                    modifiers: vec![],
                    note: None,
                },
                OrderItem {
                    name: "Caña".to_string(),
                    quantity: 3,
                    unit_price: 250,
                    prep_status: None,
                    modifiers: vec![],
                    note: None,
                },
            ],
        );
        assert_eq!(qr.total, 1950);
        assert!(qr.is_pending());
    }
}
