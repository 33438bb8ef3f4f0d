//! Domain error types for the market-data and quoting core.
//!
//! Each subsystem gets its own small, focused error enum rather than a
//! single god-enum: `ConversionError` (fixed-point parsing), `BookError`
//! (order-book application failures), `GatewayError` (order-gateway I/O),
//! and `FxError` (currency conversion). Call sites that compose several of
//! these reach for `anyhow::Result`.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors converting between decimal and fixed-point representations.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConversionError {
    #[error("value {value} is out of range for fixed-point representation")]
    OutOfRange { value: Decimal },
}

/// Errors applying a [`crate::event::MarketDataEvent`] to an
/// [`crate::orderbook::OrderBook`].
///
/// These are all non-fatal: the book rejects the event and keeps operating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("event instrument {event_instrument} does not match book instrument {book_instrument}")]
    InstrumentMismatch {
        event_instrument: i32,
        book_instrument: i32,
    },

    #[error("sequence gap: event sequence {sequence} < last applied sequence {last_sequence}")]
    SequenceGap { sequence: u64, last_sequence: u64 },
}

/// Order-gateway failure taxonomy (§7).
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("transient I/O failure: {reason}")]
    TransientIo { reason: String },

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("fatal gateway error: {reason}")]
    Fatal { reason: String },
}

/// FX conversion failures. There is no variant for "out of range" because
/// the FX service fails soft (returns `None`) rather than erroring; this
/// type exists for cases a caller needs to distinguish *why* there was no
/// path, e.g. for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FxError {
    #[error("no reference path from {from} to {to}")]
    NoPath { from: String, to: String },

    #[error("reference instrument {instrument_id} has no usable mid price")]
    StaleReference { instrument_id: i32 },
}
