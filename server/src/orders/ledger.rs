//! Payment settlement ledger
//!
//! Tracks partial payments against an order's balance and derives the two
//! computed fields: `amount_paid` (sum of payments) and
//! `amount_due = max(0, total - amount_paid)`. Recording a payment never
//! changes order status; full settlement is the manager's job and is the
//! only path to `closed`.

use shared::models::{Order, PaymentEntry};
use shared::util::now_millis;

/// Sum of recorded payments, in minor units.
pub fn amount_paid(payments: &[PaymentEntry]) -> i64 {
    payments.iter().map(|p| p.amount).sum()
}

/// Due balance, floored at zero.
pub fn amount_due(total: i64, paid: i64) -> i64 {
    (total - paid).max(0)
}

/// Append a payment and recompute the derived balances.
pub fn record_payment(order: &mut Order, method: &str, amount: i64) {
    order.payments.push(PaymentEntry {
        method: method.to_string(),
        amount,
        timestamp: now_millis(),
    });
    recompute(order);
}

/// Recompute `amount_paid` / `amount_due` after any change to the total or
/// the payment list.
pub fn recompute(order: &mut Order) {
    order.amount_paid = amount_paid(&order.payments);
    order.amount_due = amount_due(order.total, order.amount_paid);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Channel;

    fn order_with_total(total: i64) -> Order {
        let mut order = Order::new(
            "o-1".to_string(),
            1,
            "t-1".to_string(),
            "tbl-1".to_string(),
            Channel::DineIn,
        );
        order.sub_total = total;
        order.total = total;
        order.amount_due = total;
        order
    }

    #[test]
    fn test_partial_payments_reduce_due_balance() {
        let mut order = order_with_total(1000);

        record_payment(&mut order, "Cash", 400);
        assert_eq!(order.amount_paid, 400);
        assert_eq!(order.amount_due, 600);

        record_payment(&mut order, "Card", 600);
        assert_eq!(order.amount_paid, 1000);
        assert_eq!(order.amount_due, 0);
        assert_eq!(order.payments.len(), 2);
    }

    #[test]
    fn test_due_balance_floors_at_zero() {
        let mut order = order_with_total(500);
        record_payment(&mut order, "Cash", 800);
        assert_eq!(order.amount_paid, 800);
        assert_eq!(order.amount_due, 0);
    }

    #[test]
    fn test_recompute_after_total_change() {
        let mut order = order_with_total(1000);
        record_payment(&mut order, "Cash", 400);

        // Items added mid-meal raise the total; the ledger keeps up
        order.total = 1500;
        recompute(&mut order);
        assert_eq!(order.amount_due, 1100);
    }

    #[test]
    fn test_payments_keep_recording_order() {
        let mut order = order_with_total(1000);
        record_payment(&mut order, "Cash", 100);
        record_payment(&mut order, "Card", 200);
        assert_eq!(order.payments[0].method, "Cash");
        assert_eq!(order.payments[1].method, "Card");
    }
}
