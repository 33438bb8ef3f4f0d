//! Book ledger (§4.6): applies fills to a `(book_name, instrument_id)` row
//! and tracks running size, weighted average price, realized PnL and
//! traded volume.
//!
//! `apply_fill` is a pure function deliberately kept free of any lock or
//! map so its position-flip/reduce/add arithmetic can be unit tested
//! directly; [`Ledger`] supplies the per-key serialization around it.

use riptide_core::core::{Price, Quantity, Side, Ticks};
use riptide_core::fx::FxService;
use riptide_core::instrument::{CurrencyAmount, CurrencyCode, Instrument};
use std::collections::HashMap;
use std::sync::Mutex;

/// A single fill applied to a ledger row.
#[derive(Debug, Clone, Copy)]
pub struct Fill {
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

/// Running state of one `(book_name, instrument_id)` position. Session
/// fields reset on restart; cumulative fields are restored from a
/// repository at startup and never reset (§4.6).
#[derive(Debug, Clone, Copy, Default)]
pub struct BookElement {
    /// Signed position size: positive long, negative short.
    pub size: Quantity,
    pub avg_price: Price,
    pub session_realized_pnl: CurrencyAmountUsdt,
    pub cumulative_realized_pnl: CurrencyAmountUsdt,
    pub session_volume_usdt: CurrencyAmountUsdt,
    pub cumulative_volume_usdt: CurrencyAmountUsdt,
}

/// A USDT-denominated amount. Kept as a thin wrapper so [`BookElement`]
/// doesn't need to carry a `CurrencyCode` on every field; the ledger only
/// ever reports in USDT (§4.6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrencyAmountUsdt(pub Ticks);

impl CurrencyAmountUsdt {
    fn add(self, delta: Ticks) -> Self {
        Self(self.0.checked_add(delta).unwrap_or(self.0))
    }
}

impl BookElement {
    /// A position is flat once its fixed-point size is exactly zero. The
    /// epsilon the 1e-9 avg-price rule calls for is finer than a single
    /// tick at this type's 1e-8 resolution, so an exact-zero check already
    /// captures it.
    fn is_flat(size: Quantity) -> bool {
        size.is_zero()
    }
}

/// Applies one fill to `current`, returning the updated [`BookElement`].
/// `instrument` supplies the contract convention (linear/inverse/spot) for
/// `value_in_denomination`/`price_from_value`; `usdt` is the currency the
/// ledger reports PnL and volume in; `fx` converts the instrument's
/// denomination currency into `usdt`, failing soft to zero when no path is
/// registered (§4.6).
pub fn apply_fill(
    current: BookElement,
    fill: Fill,
    instrument: &Instrument,
    fx: &FxService,
    usdt: CurrencyCode,
) -> BookElement {
    let s = current.size;
    let p = current.avg_price;
    let signed_qty = match fill.side {
        Side::Buy => fill.quantity,
        Side::Sell => -fill.quantity,
    };
    let new_size = s + signed_qty;

    let mut realized_pnl_delta = Ticks::zero();
    if !BookElement::is_flat(s) && s.signum() != new_size.signum() && !BookElement::is_flat(new_size) {
        // Position flipped through zero: close the old position in full
        // at the fill price.
        realized_pnl_delta = value_delta(instrument, fill.price, p, s);
    } else if !BookElement::is_flat(s) && new_size.abs().raw() < s.abs().raw() {
        // Reduced but not flipped (including a full close down to flat):
        // close only the reduced quantity, signed by the position being
        // closed rather than what remains (which may now be exactly zero).
        let closed_qty = Quantity(s.abs().0 - new_size.abs().0);
        let signed_closed = if s.signum() < 0 { -closed_qty } else { closed_qty };
        realized_pnl_delta = value_delta(instrument, fill.price, p, signed_closed);
    }

    // Inverse contracts invert the sign of realized PnL relative to a
    // linear contract's (§4.6); spot and quanto exceptions are excluded
    // via `Instrument::is_inverse`, which already accounts for both.
    if instrument.is_inverse() {
        realized_pnl_delta = -realized_pnl_delta;
    }

    let new_avg_price = if BookElement::is_flat(new_size) {
        Price::zero()
    } else if BookElement::is_flat(s) || s.signum() != new_size.signum() {
        fill.price
    } else if new_size.abs().raw() > s.abs().raw() {
        let existing_value = instrument
            .value_in_denomination(p, s)
            .map(|v| v.amount)
            .unwrap_or(Ticks::zero());
        let added_value = instrument
            .value_in_denomination(fill.price, signed_qty)
            .map(|v| v.amount)
            .unwrap_or(Ticks::zero());
        let total_value = existing_value.checked_add(added_value).unwrap_or(existing_value);
        instrument.price_from_value(total_value, new_size).unwrap_or(p)
    } else {
        p
    };

    let fill_value = instrument
        .value_in_denomination(fill.price, fill.quantity)
        .map(|v| v.amount.abs())
        .unwrap_or(Ticks::zero());
    let fill_volume_usdt = fx
        .convert(CurrencyAmount::new(fill_value, instrument.denomination_currency), usdt)
        .map(|a| a.amount)
        .unwrap_or(Ticks::zero());
    let pnl_delta_usdt = fx
        .convert(CurrencyAmount::new(realized_pnl_delta, instrument.denomination_currency), usdt)
        .map(|a| a.amount)
        .unwrap_or(Ticks::zero());

    BookElement {
        size: new_size,
        avg_price: new_avg_price,
        session_realized_pnl: current.session_realized_pnl.add(pnl_delta_usdt),
        cumulative_realized_pnl: current.cumulative_realized_pnl.add(pnl_delta_usdt),
        session_volume_usdt: current.session_volume_usdt.add(fill_volume_usdt),
        cumulative_volume_usdt: current.cumulative_volume_usdt.add(fill_volume_usdt),
    }
}

/// `sign(qty) * (value(fill_price, |qty|) - value(avg_price, |qty|))`,
/// i.e. the realized PnL from closing `qty` of the existing position at
/// `fill_price` instead of at `avg_price`.
fn value_delta(instrument: &Instrument, fill_price: Price, avg_price: Price, qty: Quantity) -> Ticks {
    let at_fill = instrument.value_in_denomination(fill_price, qty).map(|v| v.amount);
    let at_avg = instrument.value_in_denomination(avg_price, qty).map(|v| v.amount);
    match (at_fill, at_avg) {
        (Some(a), Some(b)) => a.checked_sub(b).unwrap_or(Ticks::zero()),
        _ => Ticks::zero(),
    }
}

/// Owns the in-memory `(book_name, instrument_id) -> BookElement` map.
/// `OnOrderFilled` is serialized per key by the single mutex (§4.6); the
/// arithmetic itself lives in the pure [`apply_fill`] above.
#[derive(Default)]
pub struct Ledger {
    rows: Mutex<HashMap<(String, i32), BookElement>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds cumulative fields for a row from a prior session's repository
    /// snapshot, leaving session fields zeroed (§4.6 restart rule).
    pub fn restore_cumulative(&self, book_name: &str, instrument_id: i32, element: BookElement) {
        let mut rows = self.rows.lock().unwrap();
        rows.insert(
            (book_name.to_string(), instrument_id),
            BookElement {
                session_realized_pnl: CurrencyAmountUsdt::default(),
                session_volume_usdt: CurrencyAmountUsdt::default(),
                ..element
            },
        );
    }

    pub fn get(&self, book_name: &str, instrument_id: i32) -> BookElement {
        let rows = self.rows.lock().unwrap();
        rows.get(&(book_name.to_string(), instrument_id)).copied().unwrap_or_default()
    }

    pub fn on_order_filled(
        &self,
        book_name: &str,
        instrument_id: i32,
        fill: Fill,
        instrument: &Instrument,
        fx: &FxService,
        usdt: CurrencyCode,
    ) -> BookElement {
        let mut rows = self.rows.lock().unwrap();
        let key = (book_name.to_string(), instrument_id);
        let current = rows.get(&key).copied().unwrap_or_default();
        let updated = apply_fill(current, fill, instrument, fx, usdt);
        rows.insert(key, updated);
        updated
    }
}
