//! Depth-bounded two-sided order book.
//!
//! [`OrderBook`] tracks up to [`DEPTH_LEVELS`] price levels per side as a
//! sorted array (bids descending, asks ascending), synchronized from a
//! stream of [`crate::event::MarketDataEvent`]s. Levels beyond the
//! configured depth are dropped rather than grown without bound, matching
//! the upstream feed's own depth cap.
//!
//! A single [`OrderBook`] is only ever mutated from the event bus's
//! distributor thread (single-writer discipline); readers elsewhere in the
//! system observe consistent snapshots by cloning the levels they need.

pub mod depth;
#[cfg(test)]
mod orderbook_proptest;

pub use depth::calculate_order_flow_imbalance;

use crate::core::errors::BookError;
use crate::core::{Price, Quantity, Side};
use crate::event::{EventKind, MarketDataEvent, PriceLevelEntry};

/// Maximum tracked price levels per side.
pub const DEPTH_LEVELS: usize = 32;

/// A single price level: a price and the aggregate resting quantity there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceLevel {
    pub price: Price,
    pub quantity: Quantity,
}

impl PriceLevel {
    fn as_tuple(self) -> (Price, Quantity) {
        (self.price, self.quantity)
    }
}

/// One side of the book: a depth-bounded, price-sorted array of levels.
///
/// Bids are kept in descending price order (best bid first); asks in
/// ascending order (best ask first). `upsert`/`remove` both use a linear
/// scan bounded by [`DEPTH_LEVELS`], which at this depth is faster in
/// practice than a binary search over a sparse, frequently-mutated array.
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    levels: [PriceLevel; DEPTH_LEVELS],
    count: usize,
}

impl BookSide {
    fn new(side: Side) -> Self {
        Self {
            side,
            levels: [PriceLevel::default(); DEPTH_LEVELS],
            count: 0,
        }
    }

    fn clear(&mut self) {
        self.count = 0;
    }

    #[inline]
    fn better(&self, a: Price, b: Price) -> bool {
        match self.side {
            Side::Buy => a > b,
            Side::Sell => a < b,
        }
    }

    /// Inserts or updates the level at `price` with `quantity`. A zero
    /// quantity removes the level (exchanges send a zero-size update to
    /// signal deletion, same as an explicit `Delete`).
    fn upsert(&mut self, price: Price, quantity: Quantity) {
        if quantity.is_zero() {
            self.remove(price);
            return;
        }

        let mut idx = None;
        let mut insert_at = self.count;
        for i in 0..self.count {
            let level = self.levels[i];
            if level.price == price {
                idx = Some(i);
                break;
            }
            if insert_at == self.count && self.better(price, level.price) {
                insert_at = i;
            }
        }

        if let Some(i) = idx {
            self.levels[i].quantity = quantity;
            return;
        }

        if insert_at >= DEPTH_LEVELS {
            // Worse than every tracked level and the book is already at
            // capacity; the far end of the ladder is intentionally dropped.
            return;
        }

        let last = (self.count).min(DEPTH_LEVELS - 1);
        let mut i = last;
        while i > insert_at {
            self.levels[i] = self.levels[i - 1];
            i -= 1;
        }
        self.levels[insert_at] = PriceLevel { price, quantity };
        self.count = (self.count + 1).min(DEPTH_LEVELS);
    }

    fn remove(&mut self, price: Price) {
        if let Some(i) = self.levels[..self.count].iter().position(|l| l.price == price) {
            for j in i..self.count - 1 {
                self.levels[j] = self.levels[j + 1];
            }
            self.count -= 1;
        }
    }

    #[inline]
    pub fn best(&self) -> Option<PriceLevel> {
        self.levels[..self.count].first().copied()
    }

    #[inline]
    pub fn levels(&self) -> &[PriceLevel] {
        &self.levels[..self.count]
    }

    #[inline]
    pub fn top(&self, n: usize) -> &[PriceLevel] {
        &self.levels[..self.count.min(n)]
    }

    pub fn total_quantity(&self, levels: usize) -> Quantity {
        self.top(levels)
            .iter()
            .fold(Quantity::zero(), |acc, l| acc + l.quantity)
    }
}

/// A depth-bounded two-sided order book for one instrument.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub instrument_id: i32,
    bid: BookSide,
    ask: BookSide,
    last_sequence: Option<u64>,
    last_update_ts: u64,
    update_count: u64,
    trade_count: u64,
}

impl OrderBook {
    pub fn new(instrument_id: i32) -> Self {
        Self {
            instrument_id,
            bid: BookSide::new(Side::Buy),
            ask: BookSide::new(Side::Sell),
            last_sequence: None,
            last_update_ts: 0,
            update_count: 0,
            trade_count: 0,
        }
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    pub fn last_update_ts(&self) -> u64 {
        self.last_update_ts
    }

    /// Number of `apply_event` calls that were accepted (not rejected for a
    /// sequence gap or instrument mismatch).
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Number of accepted `Trade` events. Trades never mutate price levels
    /// in this model; this is purely a health/activity counter.
    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }

    pub fn bid_side(&self) -> &BookSide {
        &self.bid
    }

    pub fn ask_side(&self) -> &BookSide {
        &self.ask
    }

    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bid,
            Side::Sell => &self.ask,
        }
    }

    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bid.best()
    }

    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.ask.best()
    }

    /// `(price, total_qty)`, or `(0, 0)` when the side is empty.
    pub fn get_best_bid(&self) -> (Price, Quantity) {
        self.bid.best().map(PriceLevel::as_tuple).unwrap_or_default()
    }

    /// `(price, total_qty)`, or `(0, 0)` when the side is empty.
    pub fn get_best_ask(&self) -> (Price, Quantity) {
        self.ask.best().map(PriceLevel::as_tuple).unwrap_or_default()
    }

    /// Best-ask minus best-bid. Zero when either side is empty.
    pub fn get_spread(&self) -> Price {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => ask.price - bid.price,
            _ => Price::zero(),
        }
    }

    /// Simple mid of best bid and best ask. Zero when either side is empty.
    pub fn get_mid_price(&self) -> Price {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Price::from_ticks((bid.price.raw() + ask.price.raw()) / 2),
            _ => Price::zero(),
        }
    }

    /// Top `n` levels of `side`, best-first.
    pub fn get_top_levels(&self, side: Side, n: usize) -> &[PriceLevel] {
        self.side(side).top(n)
    }

    /// Summed resting quantity across the top `n` levels of `side`.
    pub fn get_depth(&self, side: Side, n: usize) -> Quantity {
        self.side(side).total_quantity(n)
    }

    /// `(bid_depth(n) - ask_depth(n)) / (bid_depth(n) + ask_depth(n))`,
    /// in `[-1.0, 1.0]`. `0.0` when there is no liquidity on either side.
    pub fn calculate_order_flow_imbalance(&self, n: usize) -> f64 {
        depth::calculate_order_flow_imbalance(self, n)
    }

    /// True when the best bid is at or above the best ask and both sides
    /// hold a non-zero price. A crossed book is a protocol violation
    /// upstream; callers treat it as a signal to pause quoting rather than
    /// trade against it.
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => {
                !bid.price.is_zero() && !ask.price.is_zero() && bid.price >= ask.price
            }
            _ => false,
        }
    }

    /// True when the book is exactly one `tick_size` wide: not crossed, not
    /// empty on either side, and `spread == tick_size`. The quoting engine
    /// treats anything wider or narrower (crossed) as not a valid basis for
    /// a fair-value derivation.
    pub fn is_tight_spread(&self, tick_size: Price) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if !self.is_crossed() => (ask.price - bid.price) == tick_size,
            _ => false,
        }
    }

    /// Applies one [`MarketDataEvent`] to this book.
    ///
    /// Returns [`BookError::InstrumentMismatch`] if the event targets a
    /// different instrument, and [`BookError::SequenceGap`] if the event's
    /// sequence number is strictly less than the last applied one (a
    /// `Snapshot` event always resets the sequence baseline and is never
    /// rejected for a gap; an event whose sequence equals `last_sequence`
    /// is accepted and processed, not rejected). Both are
    /// caller-recoverable: the book is left unmodified on
    /// `InstrumentMismatch` or `SequenceGap`, and the caller decides
    /// whether a gap warrants a resync.
    pub fn apply_event(&mut self, event: &MarketDataEvent) -> Result<(), BookError> {
        if event.instrument_id != self.instrument_id {
            return Err(BookError::InstrumentMismatch {
                event_instrument: event.instrument_id,
                book_instrument: self.instrument_id,
            });
        }

        if event.kind != EventKind::Snapshot {
            if let Some(last) = self.last_sequence {
                if event.sequence < last {
                    return Err(BookError::SequenceGap {
                        sequence: event.sequence,
                        last_sequence: last,
                    });
                }
            }
        }

        match event.kind {
            EventKind::Snapshot => {
                self.bid.clear();
                self.ask.clear();
                for entry in event.updates() {
                    self.apply_entry(*entry, false);
                }
            }
            EventKind::Add | EventKind::Update => {
                for entry in event.updates() {
                    self.apply_entry(*entry, false);
                }
            }
            EventKind::Delete => {
                for entry in event.updates() {
                    self.apply_entry(*entry, true);
                }
            }
            EventKind::Trade => {
                self.trade_count += 1;
            }
        }

        self.last_sequence = Some(event.sequence);
        self.last_update_ts = event.timestamp_us;
        self.update_count += 1;
        Ok(())
    }

    fn apply_entry(&mut self, entry: PriceLevelEntry, delete: bool) {
        let side = match entry.side {
            Side::Buy => &mut self.bid,
            Side::Sell => &mut self.ask,
        };
        if delete {
            side.remove(entry.price);
        } else {
            side.upsert(entry.price, entry.quantity);
        }
    }

    /// Structural invariants: non-crossed, correctly sorted, and no
    /// negative quantity. Quantities can never be negative by construction
    /// (`Quantity` is itself unchecked-signed, but book levels only ever
    /// receive non-negative sizes from `upsert`/the wire), so that check is
    /// a defensive assertion rather than a recoverable error path.
    pub fn validate_integrity(&self) -> Result<(), BookIntegrityError> {
        if self.is_crossed() {
            return Err(BookIntegrityError::Crossed);
        }
        if !is_sorted_descending(self.bid.levels()) {
            return Err(BookIntegrityError::Unsorted { side: Side::Buy });
        }
        if !is_sorted_ascending(self.ask.levels()) {
            return Err(BookIntegrityError::Unsorted { side: Side::Sell });
        }
        for level in self.bid.levels().iter().chain(self.ask.levels()) {
            if level.quantity.raw() < 0 {
                return Err(BookIntegrityError::NegativeQuantity);
            }
        }
        Ok(())
    }
}

fn is_sorted_descending(levels: &[PriceLevel]) -> bool {
    levels.windows(2).all(|w| w[0].price > w[1].price)
}

fn is_sorted_ascending(levels: &[PriceLevel]) -> bool {
    levels.windows(2).all(|w| w[0].price < w[1].price)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BookIntegrityError {
    #[error("book is crossed")]
    Crossed,
    #[error("{side} side is not correctly sorted")]
    Unsorted { side: Side },
    #[error("negative quantity found in a price level")]
    NegativeQuantity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(side: Side, price: rust_decimal::Decimal, qty: rust_decimal::Decimal) -> PriceLevelEntry {
        PriceLevelEntry {
            side,
            price: Price::from_decimal(price),
            quantity: Quantity::from_decimal(qty),
        }
    }

    fn snapshot(seq: u64, entries: Vec<PriceLevelEntry>) -> MarketDataEvent {
        MarketDataEvent::new(seq, 0, EventKind::Snapshot, 1, 1, 1, entries)
    }

    fn update(seq: u64, entries: Vec<PriceLevelEntry>) -> MarketDataEvent {
        MarketDataEvent::new(seq, 0, EventKind::Update, 1, 1, 1, entries)
    }

    #[test]
    fn applies_snapshot_and_sorts_each_side() {
        let mut book = OrderBook::new(1);
        let event = snapshot(
            1,
            vec![
                entry(Side::Buy, dec!(99), dec!(1)),
                entry(Side::Buy, dec!(100), dec!(1)),
                entry(Side::Sell, dec!(102), dec!(1)),
                entry(Side::Sell, dec!(101), dec!(1)),
            ],
        );
        book.apply_event(&event).unwrap();
        assert_eq!(book.best_bid().unwrap().price.to_decimal(), dec!(100));
        assert_eq!(book.best_ask().unwrap().price.to_decimal(), dec!(101));
    }

    #[test]
    fn rejects_mismatched_instrument() {
        let mut book = OrderBook::new(1);
        let mut event = snapshot(1, vec![]);
        event.instrument_id = 2;
        assert!(matches!(
            book.apply_event(&event),
            Err(BookError::InstrumentMismatch { .. })
        ));
    }

    #[test]
    fn rejects_sequence_gap_for_non_snapshot_events() {
        let mut book = OrderBook::new(1);
        book.apply_event(&snapshot(5, vec![])).unwrap();
        let event = MarketDataEvent::new(3, 0, EventKind::Update, 1, 1, 1, vec![]);
        assert!(matches!(
            book.apply_event(&event),
            Err(BookError::SequenceGap { .. })
        ));
        assert_eq!(book.last_sequence(), Some(5));
    }

    #[test]
    fn accepts_and_processes_equal_sequence() {
        let mut book = OrderBook::new(1);
        book.apply_event(&update(10, vec![entry(Side::Buy, dec!(50000), dec!(1))]))
            .unwrap();
        let result = book.apply_event(&update(10, vec![entry(Side::Buy, dec!(50001), dec!(1))]));
        assert!(result.is_ok());
        assert_eq!(book.best_bid().unwrap().price.to_decimal(), dec!(50001));
    }

    #[test]
    fn zero_quantity_update_removes_level() {
        let mut book = OrderBook::new(1);
        book.apply_event(&snapshot(1, vec![entry(Side::Buy, dec!(100), dec!(1))]))
            .unwrap();
        assert!(book.best_bid().is_some());

        let delete = update(2, vec![entry(Side::Buy, dec!(100), dec!(0))]);
        book.apply_event(&delete).unwrap();
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn trade_event_increments_trade_count_without_mutating_levels() {
        let mut book = OrderBook::new(1);
        book.apply_event(&snapshot(1, vec![entry(Side::Buy, dec!(100), dec!(1))]))
            .unwrap();
        let trade = MarketDataEvent::new(
            2,
            0,
            EventKind::Trade,
            1,
            1,
            1,
            vec![entry(Side::Buy, dec!(100), dec!(0.5))],
        );
        book.apply_event(&trade).unwrap();
        assert_eq!(book.trade_count(), 1);
        assert_eq!(book.best_bid().unwrap().quantity.to_decimal(), dec!(1));
    }

    #[test]
    fn detects_crossed_book() {
        let mut book = OrderBook::new(1);
        book.apply_event(&snapshot(
            1,
            vec![entry(Side::Buy, dec!(101), dec!(1)), entry(Side::Sell, dec!(100), dec!(1))],
        ))
        .unwrap();
        assert!(book.is_crossed());
        assert!(book.validate_integrity().is_err());
    }

    #[test]
    fn is_tight_spread_matches_exact_tick_width() {
        let mut book = OrderBook::new(1);
        book.apply_event(&snapshot(
            1,
            vec![entry(Side::Buy, dec!(50000), dec!(1)), entry(Side::Sell, dec!(50000.01), dec!(0.5))],
        ))
        .unwrap();
        assert!(book.is_tight_spread(Price::from_decimal(dec!(0.01))));
        assert!(!book.is_tight_spread(Price::from_decimal(dec!(0.02))));
    }

    #[test]
    fn is_tight_spread_false_when_empty_or_crossed() {
        let empty = OrderBook::new(1);
        assert!(!empty.is_tight_spread(Price::from_decimal(dec!(0.01))));

        let mut crossed = OrderBook::new(1);
        crossed
            .apply_event(&snapshot(
                1,
                vec![entry(Side::Buy, dec!(101), dec!(1)), entry(Side::Sell, dec!(100), dec!(1))],
            ))
            .unwrap();
        assert!(!crossed.is_tight_spread(Price::from_decimal(dec!(0.01))));
    }

    #[test]
    fn depth_beyond_capacity_drops_far_end() {
        let mut book = OrderBook::new(1);
        let entries: Vec<_> = (0..DEPTH_LEVELS + 5)
            .map(|i| entry(Side::Buy, dec!(100) - Price::from_ticks(i as i64 * 100_000_000).to_decimal(), dec!(1)))
            .collect();
        book.apply_event(&snapshot(1, entries)).unwrap();
        assert_eq!(book.bid_side().levels().len(), DEPTH_LEVELS);
    }

    #[test]
    fn book_updates_scenario_matches_literal_values() {
        // Scenario 1 from the testable-properties list: tick=0.01.
        let mut book = OrderBook::new(1);
        book.apply_event(&update(
            1,
            vec![entry(Side::Buy, dec!(50000), dec!(1)), entry(Side::Sell, dec!(50100), dec!(0.5))],
        ))
        .unwrap();
        assert_eq!(book.get_best_bid(), (Price::from_decimal(dec!(50000)), Quantity::from_decimal(dec!(1))));
        assert_eq!(book.get_best_ask(), (Price::from_decimal(dec!(50100)), Quantity::from_decimal(dec!(0.5))));
        assert_eq!(book.get_spread().to_decimal(), dec!(100));
        assert_eq!(book.get_mid_price().to_decimal(), dec!(50050));
        assert!(!book.is_tight_spread(Price::from_decimal(dec!(0.01))));
    }

    #[test]
    fn sequence_gap_scenario_matches_literal_values() {
        // Scenario 2: after seq=10, a seq=9 update is rejected and the book
        // is unchanged.
        let mut book = OrderBook::new(1);
        book.apply_event(&update(10, vec![entry(Side::Buy, dec!(50000), dec!(1))]))
            .unwrap();
        let rejected = book.apply_event(&update(9, vec![entry(Side::Buy, dec!(50001), dec!(1))]));
        assert!(rejected.is_err());
        assert_eq!(book.last_sequence(), Some(10));
        assert_eq!(book.get_best_bid(), (Price::from_decimal(dec!(50000)), Quantity::from_decimal(dec!(1))));
    }

    #[test]
    fn snapshot_scenario_clears_prior_levels() {
        // Scenario 3: a snapshot drops levels from before it.
        let mut book = OrderBook::new(1);
        book.apply_event(&update(1, vec![entry(Side::Buy, dec!(49000), dec!(1))]))
            .unwrap();
        book.apply_event(&snapshot(
            2,
            vec![entry(Side::Buy, dec!(50000), dec!(2)), entry(Side::Sell, dec!(50010), dec!(3))],
        ))
        .unwrap();
        assert_eq!(book.get_best_bid(), (Price::from_decimal(dec!(50000)), Quantity::from_decimal(dec!(2))));
        assert_eq!(book.get_best_ask(), (Price::from_decimal(dec!(50010)), Quantity::from_decimal(dec!(3))));
        assert!(book.bid_side().levels().iter().all(|l| l.price.to_decimal() != dec!(49000)));
    }
}
