//! Property-based tests for order book integrity under arbitrary update
//! sequences.

#[cfg(test)]
mod tests {
    use super::super::{OrderBook, DEPTH_LEVELS};
    use crate::core::{Price, Quantity, Side};
    use crate::event::{EventKind, MarketDataEvent, PriceLevelEntry};
    use proptest::prelude::*;

    fn entry(side: Side, price_ticks: i64, qty_ticks: i64) -> PriceLevelEntry {
        PriceLevelEntry {
            side,
            price: Price::from_ticks(price_ticks),
            quantity: Quantity::from_ticks(qty_ticks),
        }
    }

    fn update_strategy() -> impl Strategy<Value = (Side, i64, i64)> {
        (
            prop_oneof![Just(Side::Buy), Just(Side::Sell)],
            1_i64..100_000,
            0_i64..1_000_000,
        )
    }

    proptest! {
        /// Any sequence of strictly increasing sequence numbers, each
        /// carrying a single level update, leaves the book's structural
        /// invariants intact: sorted, non-crossed (each update lands on its
        /// own side so a single-level update can never cross the book),
        /// and depth-bounded.
        #[test]
        fn monotonic_updates_preserve_integrity(updates in prop::collection::vec(update_strategy(), 1..200)) {
            let mut book = OrderBook::new(1);
            for (i, (side, price_ticks, qty_ticks)) in updates.into_iter().enumerate() {
                // Keep bid and ask price ranges disjoint so a single-level
                // update never crosses the book on its own.
                let price_ticks = match side {
                    Side::Buy => price_ticks,
                    Side::Sell => price_ticks + 10_000_000,
                };
                let event = MarketDataEvent::new(
                    i as u64 + 1,
                    0,
                    EventKind::Update,
                    1,
                    1,
                    1,
                    vec![entry(side, price_ticks, qty_ticks)],
                );
                book.apply_event(&event).unwrap();
            }
            prop_assert!(book.validate_integrity().is_ok());
            prop_assert!(book.bid_side().levels().len() <= DEPTH_LEVELS);
            prop_assert!(book.ask_side().levels().len() <= DEPTH_LEVELS);
        }

        /// A non-monotonic sequence number (strictly less than the last
        /// applied one) is always rejected and never mutates the book.
        #[test]
        fn sequence_gap_is_always_rejected(
            first_seq in 10_u64..1_000,
            gap in 1_u64..10,
            price_ticks in 1_i64..100_000,
            qty_ticks in 1_i64..1_000_000,
        ) {
            let mut book = OrderBook::new(1);
            book.apply_event(&MarketDataEvent::new(
                first_seq,
                0,
                EventKind::Update,
                1,
                1,
                1,
                vec![entry(Side::Buy, price_ticks, qty_ticks)],
            ))
            .unwrap();
            let before = book.get_best_bid();

            let result = book.apply_event(&MarketDataEvent::new(
                first_seq - gap,
                0,
                EventKind::Update,
                1,
                1,
                1,
                vec![entry(Side::Buy, price_ticks + 1, qty_ticks)],
            ));

            prop_assert!(result.is_err());
            prop_assert_eq!(book.last_sequence(), Some(first_seq));
            prop_assert_eq!(book.get_best_bid(), before);
        }

        /// Depth never exceeds `DEPTH_LEVELS` regardless of how many
        /// distinct price levels are pushed onto one side.
        #[test]
        fn depth_is_always_bounded(count in 1_usize..200) {
            let mut book = OrderBook::new(1);
            let entries: Vec<_> = (0..count)
                .map(|i| entry(Side::Buy, 100_000_000 - i as i64 * 100, 1_00000000))
                .collect();
            book.apply_event(&MarketDataEvent::new(1, 0, EventKind::Snapshot, 1, 1, 1, entries))
                .unwrap();
            prop_assert!(book.bid_side().levels().len() <= DEPTH_LEVELS);
        }
    }
}
