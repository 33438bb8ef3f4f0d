//! Prometheus metrics wiring for the book, bus, quoting/hedging, and ledger
//! subsystems.

pub mod metrics;

pub use metrics::{BookMetrics, BusMetrics, LedgerMetrics, MetricsRegistry, TradingMetrics};
