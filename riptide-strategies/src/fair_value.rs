//! Fair-value models (§4.4): the closed set of ways a quoting engine turns
//! a source order book into a single reference price.

use riptide_core::config::FvModel;
use riptide_core::core::Price;
use riptide_core::orderbook::OrderBook;
use rust_decimal::Decimal;

/// Derives a fair value from a source book. Returns `None` when the book
/// has no liquidity on one side; callers treat that the same as a stale or
/// crossed book: hold, don't quote.
pub trait FvProvider: Send + Sync {
    fn fair_value(&self, book: &OrderBook) -> Option<Price>;
}

/// Plain mid-price: `(best_bid + best_ask) / 2`.
#[derive(Debug, Default)]
pub struct MidFv;

impl FvProvider for MidFv {
    fn fair_value(&self, book: &OrderBook) -> Option<Price> {
        let mid = book.get_mid_price();
        if mid.is_zero() {
            None
        } else {
            Some(mid)
        }
    }
}

/// Size-weighted top of book: pulls the fair value toward whichever side
/// has more resting quantity, i.e. `(bid*ask_qty + ask*bid_qty) / (bid_qty
/// + ask_qty)`.
#[derive(Debug, Default)]
pub struct MicroPriceFv;

impl FvProvider for MicroPriceFv {
    fn fair_value(&self, book: &OrderBook) -> Option<Price> {
        let (bid_price, bid_qty) = book.get_best_bid();
        let (ask_price, ask_qty) = book.get_best_ask();
        if bid_price.is_zero() || ask_price.is_zero() {
            return None;
        }
        let total_qty = bid_qty + ask_qty;
        if total_qty.is_zero() {
            return None;
        }
        let numerator = bid_price
            .checked_mul_qty(ask_qty)?
            .checked_add(ask_price.checked_mul_qty(bid_qty)?)?;
        let micro = numerator.checked_div_fp(total_qty.0)?;
        Some(Price(micro))
    }
}

/// Mid price weighted by fixed, configurable per-side weights rather than
/// live quantity (contrast with [`MicroPriceFv`]). Weights need not sum to
/// 1; a caller intentionally skewing fair value toward one side can use
/// weights that don't.
#[derive(Debug, Clone, Copy)]
pub struct WeightedMidFv {
    bid_weight: Price,
    ask_weight: Price,
}

impl WeightedMidFv {
    pub fn new(bid_weight: Decimal, ask_weight: Decimal) -> Self {
        Self {
            bid_weight: Price::from_decimal(bid_weight),
            ask_weight: Price::from_decimal(ask_weight),
        }
    }
}

impl Default for WeightedMidFv {
    /// Symmetric 0.5/0.5 weights, equivalent to [`MidFv`] until the caller
    /// overrides them.
    fn default() -> Self {
        Self::new(Decimal::new(5, 1), Decimal::new(5, 1))
    }
}

impl FvProvider for WeightedMidFv {
    fn fair_value(&self, book: &OrderBook) -> Option<Price> {
        let (bid_price, _) = book.get_best_bid();
        let (ask_price, _) = book.get_best_ask();
        if bid_price.is_zero() || ask_price.is_zero() {
            return None;
        }
        let weighted_bid = bid_price.0.checked_mul_fp(self.bid_weight.0)?;
        let weighted_ask = ask_price.0.checked_mul_fp(self.ask_weight.0)?;
        Some(Price(weighted_bid.checked_add(weighted_ask)?))
    }
}

/// Builds the default provider for a model selection. `WeightedMid` uses
/// symmetric weights here; construct [`WeightedMidFv`] directly for custom
/// weighting.
pub fn provider_for(model: FvModel) -> Box<dyn FvProvider> {
    match model {
        FvModel::Mid => Box::new(MidFv),
        FvModel::MicroPrice => Box::new(MicroPriceFv),
        FvModel::WeightedMid => Box::new(WeightedMidFv::default()),
    }
}
