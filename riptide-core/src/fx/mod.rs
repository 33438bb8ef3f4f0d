//! Cross-currency conversion for the ledger and the hedger.
//!
//! [`FxService`] converts a [`CurrencyAmount`] into another currency by
//! routing through the mid-price of a designated reference instrument
//! (e.g. BTC/USDT on a reference exchange) rather than maintaining its own
//! rate table. The `(source, target) -> reference` path is resolved once
//! per currency pair and cached, matching the upstream convention of
//! memoizing a routing decision rather than re-deriving it on every call.

use crate::core::{FxError, Price};
use crate::instrument::{CurrencyAmount, CurrencyCode, Instrument};
use dashmap::DashMap;
use std::sync::Arc;

/// Supplies a mid-price for an instrument id. Implemented by whatever owns
/// the live order books (the distributor's book registry in production,
/// a fixed lookup table in tests).
pub trait MidPriceSource: Send + Sync {
    fn mid_price(&self, instrument_id: i32) -> Option<Price>;
}

/// A resolved conversion route: convert through `reference_instrument_id`'s
/// mid price, dividing instead of multiplying when `inverted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReferencePath {
    reference_instrument_id: i32,
    inverted: bool,
}

/// Converts amounts between currencies via registered reference
/// instruments. Each registered instrument contributes two directions:
/// base -> quote (multiply by mid) and quote -> base (divide by mid).
pub struct FxService {
    books: Arc<dyn MidPriceSource>,
    paths: DashMap<(CurrencyCode, CurrencyCode), ReferencePath>,
}

impl FxService {
    pub fn new(books: Arc<dyn MidPriceSource>) -> Self {
        Self {
            books,
            paths: DashMap::new(),
        }
    }

    /// Registers `instrument` as a reference path between its base and
    /// quote currencies. Both directions are cached; a later registration
    /// for the same currency pair overwrites the prior one.
    pub fn register_reference(&self, instrument: &Instrument) {
        self.paths.insert(
            (instrument.base_currency, instrument.quote_currency),
            ReferencePath {
                reference_instrument_id: instrument.id,
                inverted: false,
            },
        );
        self.paths.insert(
            (instrument.quote_currency, instrument.base_currency),
            ReferencePath {
                reference_instrument_id: instrument.id,
                inverted: true,
            },
        );
    }

    /// Converts `amount` into `target_currency`. Identity conversions
    /// (same currency) always succeed without consulting a reference book.
    /// Returns `None` (fails soft, per §6) when no reference path has been
    /// registered for the pair or the reference book has no usable mid
    /// price.
    pub fn convert(&self, amount: CurrencyAmount, target_currency: CurrencyCode) -> Option<CurrencyAmount> {
        if amount.currency == target_currency {
            return Some(amount);
        }

        let path = *self.paths.get(&(amount.currency, target_currency))?;
        let mid = self.books.mid_price(path.reference_instrument_id)?;
        if mid.is_zero() {
            return None;
        }

        let converted = if path.inverted {
            amount.amount.checked_div_fp(mid.0)?
        } else {
            amount.amount.checked_mul_fp(mid.0)?
        };

        Some(CurrencyAmount::new(converted, target_currency))
    }

    /// Same as [`Self::convert`] but surfaces *why* there was no path,
    /// for logging at call sites that want more than a bare `None`.
    pub fn convert_or_error(
        &self,
        amount: CurrencyAmount,
        target_currency: CurrencyCode,
    ) -> Result<CurrencyAmount, FxError> {
        if amount.currency == target_currency {
            return Ok(amount);
        }
        let path = *self
            .paths
            .get(&(amount.currency, target_currency))
            .ok_or_else(|| FxError::NoPath {
                from: amount.currency.to_string(),
                to: target_currency.to_string(),
            })?;
        self.books
            .mid_price(path.reference_instrument_id)
            .filter(|mid| !mid.is_zero())
            .map(|mid| {
                let converted = if path.inverted {
                    amount.amount.checked_div_fp(mid.0)
                } else {
                    amount.amount.checked_mul_fp(mid.0)
                };
                converted.map(|v| CurrencyAmount::new(v, target_currency))
            })
            .flatten()
            .ok_or(FxError::StaleReference {
                instrument_id: path.reference_instrument_id,
            })
    }
}
