//! Riptide Strategies - quoting, hedging and ledger logic built on top of
//! `riptide-core`'s book, gateway and fixed-point primitives.
//!
//! - [`quoting`]: derives a price/quantity ladder from a fair value and
//!   drives it against a live [`riptide_core::gateway::OrderGateway`].
//! - [`hedger`]: offsets quoting fills with opposite-signed orders on a
//!   hedge instrument, including cross-currency/cross-convention conversion.
//! - [`ledger`]: per-book position and realized-PnL accounting.
//! - [`fair_value`]: fair-value models consumed by the quoting engine.
//! - [`order`]: client-side order tracking shared by quoting and hedging.

pub mod fair_value;
pub mod hedger;
pub mod ledger;
pub mod order;
pub mod quoting;
