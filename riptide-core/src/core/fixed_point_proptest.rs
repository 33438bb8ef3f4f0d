//! Property-based tests for fixed-point arithmetic.
//!
//! Unit tests in `fixed_point.rs` pin specific values; these check the
//! invariants that have to hold across the whole representable range.

#[cfg(test)]
mod tests {
    use super::super::fixed_point::{Price, Quantity, Ticks, SCALE};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn decimal_in_range() -> impl Strategy<Value = Decimal> {
        (-1_000_000_000.0..1_000_000_000.0_f64).prop_map(|v| Decimal::from_f64_retain(v).unwrap_or_default())
    }

    proptest! {
        /// Round-trip: `Price::from_decimal(p).to_decimal()` truncates `p`
        /// to 8 decimal places toward zero, never rounds.
        #[test]
        fn roundtrip_truncates_to_eight_decimals(value in decimal_in_range()) {
            let price = Price::from_decimal(value);
            let back = price.to_decimal();
            let expected = (value * Decimal::from(SCALE)).trunc() / Decimal::from(SCALE);
            prop_assert_eq!(back, expected);
        }

        /// Addition is commutative for any pair of in-range prices.
        #[test]
        fn addition_is_commutative(a in decimal_in_range(), b in decimal_in_range()) {
            let (pa, pb) = (Price::from_decimal(a), Price::from_decimal(b));
            prop_assert_eq!((pa + pb).to_decimal(), (pb + pa).to_decimal());
        }

        /// `a - b + b == a` for any in-range pair (no overflow at this scale).
        #[test]
        fn subtraction_inverts_addition(a in decimal_in_range(), b in decimal_in_range()) {
            let (pa, pb) = (Price::from_decimal(a), Price::from_decimal(b));
            prop_assert_eq!(((pa - pb) + pb).to_decimal(), pa.to_decimal());
        }

        /// Ordering on the decimal input is preserved by the fixed-point
        /// representation once both sides are truncated to the same scale.
        #[test]
        fn ordering_matches_decimal_ordering(a in decimal_in_range(), b in decimal_in_range()) {
            let (pa, pb) = (Price::from_decimal(a), Price::from_decimal(b));
            prop_assert_eq!(pa.to_decimal().cmp(&pb.to_decimal()), pa.cmp(&pb));
        }

        /// Rounding down to a tick never produces a value above the input,
        /// and rounding up never produces one below it.
        #[test]
        fn round_to_tick_brackets_the_input(value in 0.0..1_000_000.0_f64, tick_ticks in 1_i64..1_000_000_i64) {
            let price = Price::from_decimal(Decimal::from_f64_retain(value).unwrap_or_default());
            let tick = Price::from_ticks(tick_ticks);
            prop_assert!(price.round_down_to(tick).raw() <= price.raw());
            prop_assert!(price.round_up_to(tick).raw() >= price.raw());
        }

        /// A value already a multiple of the tick size is a fixed point of
        /// both rounding directions.
        #[test]
        fn round_to_tick_is_idempotent_on_exact_multiples(n in 0_i64..1_000_000, tick_ticks in 1_i64..1_000_000_i64) {
            let price = Price::from_ticks(n * tick_ticks);
            let tick = Price::from_ticks(tick_ticks);
            prop_assert_eq!(price.round_down_to(tick).raw(), price.raw());
            prop_assert_eq!(price.round_up_to(tick).raw(), price.raw());
        }

        /// `checked_mul_qty` matches plain decimal multiplication, within
        /// one tick of truncation error from the two checked conversions.
        #[test]
        fn mul_qty_matches_decimal_multiplication(
            price_ticks in -1_000_000_000_i64..1_000_000_000,
            qty_ticks in -1_000_000_000_i64..1_000_000_000,
        ) {
            let price = Price::from_ticks(price_ticks);
            let qty = Quantity::from_ticks(qty_ticks);
            let product = price.checked_mul_qty(qty).unwrap();
            let expected = (price.to_decimal() * qty.to_decimal() * Decimal::from(SCALE)).trunc() / Decimal::from(SCALE);
            let diff = (product.to_decimal() - expected).abs();
            prop_assert!(diff <= Decimal::new(1, 8));
        }

        /// Negation is its own inverse and preserves magnitude.
        #[test]
        fn negation_is_involutive(ticks in any::<i64>().prop_filter("avoid MIN overflow on negate", |t| *t != i64::MIN)) {
            let t = Ticks::from_ticks(ticks);
            prop_assert_eq!(-(-t), t);
            prop_assert_eq!((-t).abs(), t.abs());
        }
    }
}
