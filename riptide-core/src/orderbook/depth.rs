//! Book-level depth analysis: order flow imbalance across the top N levels
//! of each side. Top-of-book and spread/mid accessors live as inherent
//! methods on [`OrderBook`] itself; this module holds the one piece of
//! book analytics that needs both sides at once.

use super::OrderBook;
use rust_decimal::prelude::ToPrimitive;

/// Order flow imbalance across the top `levels` of each side, in
/// `[-1.0, 1.0]`. Positive values mean bid-side pressure. `0.0` when there
/// is no liquidity on either side.
pub fn calculate_order_flow_imbalance(book: &OrderBook, levels: usize) -> f64 {
    let bid_volume = book.bid_side().total_quantity(levels).to_decimal();
    let ask_volume = book.ask_side().total_quantity(levels).to_decimal();
    let total = bid_volume + ask_volume;
    if total.is_zero() {
        return 0.0;
    }
    let imbalance = (bid_volume - ask_volume) / total;
    imbalance.to_f64().unwrap_or(0.0)
}
