//! Instrument identity and contract math.
//!
//! An [`Instrument`] is immutable after construction: id, venue, contract
//! convention (linear / inverse / spot), tick/lot sizing, and the
//! denomination currency used by the ledger and the hedger's cross-currency
//! conversion. [`Instrument::value_in_denomination`] is the one function
//! every consumer (ledger, hedger) calls to price a fill.

use crate::core::fixed_point::Ticks;
use crate::core::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A short ASCII currency/venue code, stored inline (no heap allocation).
/// Instruments are created once at startup, but `CurrencyCode` is also
/// carried around by `CurrencyAmount` through the hedger and ledger hot
/// paths, so it stays `Copy`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyCode([u8; 8]);

impl CurrencyCode {
    pub fn new(code: &str) -> Self {
        assert!(code.len() <= 8, "currency code {code} longer than 8 bytes");
        let mut buf = [0u8; 8];
        buf[..code.len()].copy_from_slice(code.as_bytes());
        Self(buf)
    }

    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(8);
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrencyCode({})", self.as_str())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An amount denominated in a specific currency. Carries its own currency
/// tag so callers can't accidentally mix amounts across currencies without
/// going through [`crate::fx::FxService::convert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyAmount {
    pub amount: Ticks,
    pub currency: CurrencyCode,
}

impl CurrencyAmount {
    pub fn new(amount: Ticks, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: Ticks::zero(),
            currency,
        }
    }

    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        if self.currency != rhs.currency {
            return None;
        }
        self.amount.checked_add(rhs.amount).map(|amount| Self {
            amount,
            currency: self.currency,
        })
    }

    pub fn neg(self) -> Self {
        Self {
            amount: -self.amount,
            currency: self.currency,
        }
    }
}

/// Product type, closed set from §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Spot,
    PerpetualFuture,
    Future,
}

/// Uniquely identifies an exchange/venue for quanto-exception lookups and
/// topic/event routing.
pub type ExchangeId = i32;

/// An immutable instrument definition.
#[derive(Debug, Clone)]
pub struct Instrument {
    pub id: i32,
    pub symbol: String,
    pub exchange: ExchangeId,
    pub product_type: ProductType,
    pub base_currency: CurrencyCode,
    pub quote_currency: CurrencyCode,
    pub denomination_currency: CurrencyCode,
    pub tick_size: Price,
    pub lot_size: Quantity,
    pub multiplier: Price,
    pub min_order_size: Quantity,
    /// True when this instrument is inverse (value denominated in the base
    /// currency) under the governing quanto-exception set. Computed once at
    /// construction, not re-derived per call.
    inverse: bool,
}

impl Instrument {
    /// Builds an instrument, resolving inverse-vs-linear per §3's detection
    /// rule and the explicit `quanto_exceptions` carried in configuration
    /// (§9 Open Question: never hardcoded).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i32,
        symbol: impl Into<String>,
        exchange: ExchangeId,
        product_type: ProductType,
        base_currency: CurrencyCode,
        quote_currency: CurrencyCode,
        denomination_currency: CurrencyCode,
        tick_size: Price,
        lot_size: Quantity,
        multiplier: Price,
        min_order_size: Quantity,
        quanto_exceptions: &HashSet<(ExchangeId, CurrencyCode)>,
    ) -> Self {
        let is_quanto = quanto_exceptions.contains(&(exchange, base_currency));
        let inverse = !matches!(product_type, ProductType::Spot)
            && denomination_currency != quote_currency
            && !is_quanto;

        Self {
            id,
            symbol: symbol.into(),
            exchange,
            product_type,
            base_currency,
            quote_currency,
            denomination_currency,
            tick_size,
            lot_size,
            multiplier,
            min_order_size,
            inverse,
        }
    }

    #[inline(always)]
    pub const fn is_inverse(&self) -> bool {
        self.inverse
    }

    #[inline(always)]
    pub const fn is_spot(&self) -> bool {
        matches!(self.product_type, ProductType::Spot)
    }

    /// Contract value of `qty` units at `price`, denominated in
    /// `self.denomination_currency` (§3, §4.1):
    ///
    /// - Linear / spot: `price * qty * multiplier`
    /// - Inverse: `qty * multiplier / price`
    ///
    /// `qty` may be negative (signed position); the result carries the same
    /// sign. Returns `None` only on arithmetic overflow or a zero price for
    /// an inverse contract.
    pub fn value_in_denomination(&self, price: Price, qty: Quantity) -> Option<CurrencyAmount> {
        let value = if self.inverse {
            if price.is_zero() {
                return None;
            }
            qty.0.checked_mul_fp(self.multiplier.0)?.checked_div_fp(price.0)?
        } else {
            price.0.checked_mul_fp(qty.0)?.checked_mul_fp(self.multiplier.0)?
        };
        Some(CurrencyAmount::new(value, self.denomination_currency))
    }

    /// Inverse of [`Instrument::value_in_denomination`]: given a denominated
    /// value and a signed size, solve for the average price such that
    /// `value_in_denomination(price, size) == value`. Used by the ledger's
    /// avg-price-from-value rule when adding to a position.
    pub fn price_from_value(&self, value: Ticks, qty: Quantity) -> Option<Price> {
        if qty.is_zero() {
            return None;
        }
        let price_ticks = if self.inverse {
            // value = qty * multiplier / price  =>  price = qty * multiplier / value
            if value.is_zero() {
                return None;
            }
            qty.0.checked_mul_fp(self.multiplier.0)?.checked_div_fp(value)?
        } else {
            // value = price * qty * multiplier  =>  price = value / (qty * multiplier)
            let denom = qty.0.checked_mul_fp(self.multiplier.0)?;
            value.checked_div_fp(denom)?
        };
        Some(Price(price_ticks))
    }
}

/// Owns the immutable instrument table, built from the instruments CSV
/// described in §6. Keyed by instrument id for O(1) lookup from the
/// distributor's hot path.
#[derive(Debug, Default)]
pub struct InstrumentRepository {
    by_id: std::collections::HashMap<i32, Instrument>,
}

impl InstrumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an instrument, rejecting a duplicate `(market, symbol, type)`
    /// triple per §6.
    pub fn insert(&mut self, instrument: Instrument) -> Result<(), DuplicateInstrumentError> {
        let duplicate = self.by_id.values().any(|existing| {
            existing.exchange == instrument.exchange
                && existing.symbol == instrument.symbol
                && existing.product_type == instrument.product_type
        });
        if duplicate {
            return Err(DuplicateInstrumentError {
                exchange: instrument.exchange,
                symbol: instrument.symbol,
                product_type: instrument.product_type,
            });
        }
        self.by_id.insert(instrument.id, instrument);
        Ok(())
    }

    pub fn get(&self, id: i32) -> Option<&Instrument> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("duplicate instrument (market={exchange}, symbol={symbol}, type={product_type:?})")]
pub struct DuplicateInstrumentError {
    pub exchange: ExchangeId,
    pub symbol: String,
    pub product_type: ProductType,
}
