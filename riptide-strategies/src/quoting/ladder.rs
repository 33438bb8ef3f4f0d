//! Pure ladder-derivation math (§4.4): turns a fair value into up to
//! `max_quote_levels` target prices/quantities per side. Kept free of any
//! gateway or order-tracking state so the pricing math is trivially
//! testable without a mock exchange.

use riptide_core::config::{HitLogic, QuotingParameters};
use riptide_core::core::{Price, Quantity, Side};
use rust_decimal::Decimal;

/// One target price/quantity at one ladder level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteTarget {
    pub level: usize,
    pub price: Price,
    pub quantity: Quantity,
}

/// Derives the target ladder for one side. `skew_bp` is
/// `skew_bp_per_unit * net_position_units`, computed by the caller from
/// current inventory; `opposite_best` is the current best price on the
/// *other* side of the target book, consulted for `NoCross`/`MakerOnly`.
///
/// Returns an empty ladder when `tick_size` or `lot_size` is degenerate
/// (zero), since no valid price/quantity could be produced.
pub fn derive_side_ladder(
    fv: Price,
    side: Side,
    skew_bp: Decimal,
    params: &QuotingParameters,
    tick_size: Price,
    lot_size: Quantity,
    opposite_best: Option<Price>,
) -> Vec<QuoteTarget> {
    if tick_size.is_zero() || lot_size.is_zero() {
        return Vec::new();
    }

    let quantity = params.quote_size.round_down_to(lot_size);
    if quantity.is_zero() {
        return Vec::new();
    }

    // Sell pushes the ladder up, buy pushes it down; skew shifts both
    // sides in the same direction (GLOSSARY: "Skew").
    let direction = match side {
        Side::Buy => -Decimal::ONE,
        Side::Sell => Decimal::ONE,
    };

    let mut targets = Vec::with_capacity(params.max_quote_levels);
    for level in 0..params.max_quote_levels {
        let level_spread_bp = params.spread_bp + Decimal::from(level) * params.level_step_bp;
        let adjustment_bp = direction * level_spread_bp + skew_bp;
        let raw_price = fv.to_decimal() * (Decimal::ONE + adjustment_bp / Decimal::from(10_000));
        if raw_price <= Decimal::ZERO {
            continue;
        }
        let mut price = Price::from_decimal(raw_price);
        price = match side {
            Side::Sell => price.round_up_to(tick_size),
            Side::Buy => price.round_down_to(tick_size),
        };

        if let Some(clamped) = apply_hit_logic(price, side, params.hit_logic, opposite_best, tick_size) {
            price = clamped;
        } else {
            // NoCross couldn't find a valid non-crossing price at this
            // level (the book is too tight); skip rather than quote
            // through the opposite side.
            continue;
        }

        if price.is_zero() {
            continue;
        }

        targets.push(QuoteTarget { level, price, quantity });
    }

    targets
}

/// Applies the hitting-logic clamp. `MakerOnly` is enforced by the engine
/// marking the order `post_only` at submission time rather than here; this
/// function only handles the price-level adjustment `NoCross` needs.
/// Returns `None` when no valid non-crossing price exists at this level.
fn apply_hit_logic(
    price: Price,
    side: Side,
    hit_logic: HitLogic,
    opposite_best: Option<Price>,
    tick_size: Price,
) -> Option<Price> {
    if hit_logic == HitLogic::AllowAll {
        return Some(price);
    }

    let Some(opposite) = opposite_best else {
        return Some(price);
    };
    if opposite.is_zero() {
        return Some(price);
    }

    match side {
        Side::Buy if price >= opposite => {
            let clamped = opposite - tick_size;
            if clamped.is_zero() || clamped < Price::zero() {
                None
            } else {
                Some(clamped)
            }
        }
        Side::Sell if price <= opposite => Some(opposite + tick_size),
        _ => Some(price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riptide_core::config::FvModel;
    use riptide_core::core::Quantity as Qty;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn params() -> QuotingParameters {
        QuotingParameters {
            instrument_id: 1,
            source_instrument_id: 2,
            book_name: "test".into(),
            fv_model: FvModel::Mid,
            hit_logic: HitLogic::AllowAll,
            spread_bp: dec!(10),
            skew_bp_per_unit: dec!(0),
            level_step_bp: dec!(5),
            max_quote_levels: 3,
            quote_size: Qty::from_decimal(dec!(1)),
            requote_threshold_bp: dec!(2),
            throttle_window: Duration::from_secs(60),
            max_fill_qty_per_window: Qty::from_decimal(dec!(100)),
            expected_update_interval_ms: None,
        }
    }

    #[test]
    fn bid_ladder_steps_down_from_fair_value() {
        let fv = Price::from_decimal(dec!(50000));
        let tick = Price::from_decimal(dec!(0.01));
        let ladder = derive_side_ladder(fv, Side::Buy, dec!(0), &params(), tick, Qty::from_decimal(dec!(0.001)), None);
        assert_eq!(ladder.len(), 3);
        // level 0: spread 10bp -> 50000 * 0.999 = 49950
        assert_eq!(ladder[0].price.to_decimal(), dec!(49950));
        // level 1: spread 15bp -> 50000 * 0.9985 = 49925
        assert_eq!(ladder[1].price.to_decimal(), dec!(49925));
        assert!(ladder[0].price > ladder[1].price);
    }

    #[test]
    fn ask_ladder_steps_up_from_fair_value() {
        let fv = Price::from_decimal(dec!(50000));
        let tick = Price::from_decimal(dec!(0.01));
        let ladder = derive_side_ladder(fv, Side::Sell, dec!(0), &params(), tick, Qty::from_decimal(dec!(0.001)), None);
        assert_eq!(ladder[0].price.to_decimal(), dec!(50050));
        assert!(ladder[1].price > ladder[0].price);
    }

    #[test]
    fn skew_shifts_both_sides_the_same_direction() {
        let fv = Price::from_decimal(dec!(50000));
        let tick = Price::from_decimal(dec!(0.01));
        let mut p = params();
        p.max_quote_levels = 1;
        let bid_unskewed = derive_side_ladder(fv, Side::Buy, dec!(0), &p, tick, Qty::from_decimal(dec!(0.001)), None);
        let bid_skewed = derive_side_ladder(fv, Side::Buy, dec!(20), &p, tick, Qty::from_decimal(dec!(0.001)), None);
        let ask_unskewed = derive_side_ladder(fv, Side::Sell, dec!(0), &p, tick, Qty::from_decimal(dec!(0.001)), None);
        let ask_skewed = derive_side_ladder(fv, Side::Sell, dec!(20), &p, tick, Qty::from_decimal(dec!(0.001)), None);

        assert!(bid_skewed[0].price > bid_unskewed[0].price);
        assert!(ask_skewed[0].price > ask_unskewed[0].price);
    }

    #[test]
    fn no_cross_clamps_to_opposite_side() {
        let fv = Price::from_decimal(dec!(50000));
        let tick = Price::from_decimal(dec!(0.01));
        let mut p = params();
        p.hit_logic = HitLogic::NoCross;
        p.max_quote_levels = 1;
        p.spread_bp = dec!(0); // would quote right at fv, crossing a tight opposite book

        let opposite_ask = Price::from_decimal(dec!(50000));
        let ladder = derive_side_ladder(
            fv,
            Side::Buy,
            dec!(0),
            &p,
            tick,
            Qty::from_decimal(dec!(0.001)),
            Some(opposite_ask),
        );
        assert_eq!(ladder[0].price.to_decimal(), dec!(49999.99));
    }

    #[test]
    fn empty_tick_or_lot_size_yields_no_quotes() {
        let fv = Price::from_decimal(dec!(50000));
        let ladder = derive_side_ladder(
            fv,
            Side::Buy,
            dec!(0),
            &params(),
            Price::zero(),
            Qty::from_decimal(dec!(0.001)),
            None,
        );
        assert!(ladder.is_empty());
    }
}
