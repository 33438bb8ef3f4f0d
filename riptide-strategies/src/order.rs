//! Client-side order tracking shared by the quoting engine and the hedger.
//!
//! An [`Order`] mirrors what the venue last told us about one of our own
//! orders. It is owned by whichever ladder slot or hedge slice created it;
//! status reports are applied in arrival order by that single owner, never
//! raced across threads.

use riptide_core::core::{ClientOrderId, OrderStatus, OrderType, Price, Quantity, Side, TimeInForce};
use riptide_core::gateway::OrderStatusReport;

/// Which engine created this order, for metrics labeling and ledger
/// attribution; fills from `Quoting` orders feed the hedger, fills from
/// `Hedging` orders do not recurse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSource {
    Quoting,
    Hedging,
}

/// A locally tracked order. Updated only by `apply_status_report`; nothing
/// else mutates `status`/`filled_quantity` once the order is live.
#[derive(Debug, Clone)]
pub struct Order {
    pub client_order_id: ClientOrderId,
    pub instrument_id: i32,
    pub source: OrderSource,
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub price: Price,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub status: OrderStatus,
}

impl Order {
    pub fn new(
        client_order_id: ClientOrderId,
        instrument_id: i32,
        source: OrderSource,
        side: Side,
        order_type: OrderType,
        time_in_force: TimeInForce,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            client_order_id,
            instrument_id,
            source,
            side,
            order_type,
            time_in_force,
            price,
            quantity,
            filled_quantity: Quantity::zero(),
            status: OrderStatus::Pending,
        }
    }

    #[inline]
    pub fn leaves_quantity(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    #[inline]
    pub fn is_resting(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Applies a status report from the gateway. Reports are delivered to
    /// the owning order in arrival order (§5), so this never needs to
    /// reconcile out-of-order updates.
    pub fn apply_status_report(&mut self, report: &OrderStatusReport) {
        self.status = report.status;
        self.filled_quantity = report.filled_quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_order() -> Order {
        Order::new(
            ClientOrderId::new(1),
            1,
            OrderSource::Quoting,
            Side::Buy,
            OrderType::Limit,
            TimeInForce::Gtc,
            Price::from_decimal(dec!(100)),
            Quantity::from_decimal(dec!(10)),
        )
    }

    #[test]
    fn new_order_is_pending_and_fully_unfilled() {
        let order = sample_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.leaves_quantity(), Quantity::from_decimal(dec!(10)));
        assert!(order.is_resting());
    }

    #[test]
    fn applying_report_updates_fill_state() {
        let mut order = sample_order();
        order.apply_status_report(&OrderStatusReport {
            client_order_id: order.client_order_id,
            status: OrderStatus::PartiallyFilled,
            filled_quantity: Quantity::from_decimal(dec!(4)),
            avg_fill_price: Price::from_decimal(dec!(100)),
        });
        assert_eq!(order.leaves_quantity(), Quantity::from_decimal(dec!(6)));
        assert!(order.is_resting());
    }

    #[test]
    fn terminal_status_stops_resting() {
        let mut order = sample_order();
        order.apply_status_report(&OrderStatusReport {
            client_order_id: order.client_order_id,
            status: OrderStatus::Filled,
            filled_quantity: Quantity::from_decimal(dec!(10)),
            avg_fill_price: Price::from_decimal(dec!(100)),
        });
        assert!(!order.is_resting());
    }
}
