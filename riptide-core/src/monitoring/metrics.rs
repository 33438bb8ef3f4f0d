//! Prometheus metrics for the market-data and quoting core.
//!
//! Grouped the same way the subsystems are: book health, event bus
//! throughput, quoting/hedging activity, and ledger PnL.

use prometheus::{
    Counter, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use tracing::info;

/// Central registry for all Prometheus metrics.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    book: Arc<BookMetrics>,
    bus: Arc<BusMetrics>,
    trading: Arc<TradingMetrics>,
    ledger: Arc<LedgerMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        let book = Arc::new(BookMetrics::new(&registry)?);
        let bus = Arc::new(BusMetrics::new(&registry)?);
        let trading = Arc::new(TradingMetrics::new(&registry)?);
        let ledger = Arc::new(LedgerMetrics::new(&registry)?);

        info!("prometheus metrics registry initialized");

        Ok(Self {
            registry,
            book,
            bus,
            trading,
            ledger,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn book(&self) -> &BookMetrics {
        &self.book
    }

    pub fn bus(&self) -> &BusMetrics {
        &self.bus
    }

    pub fn trading(&self) -> &TradingMetrics {
        &self.trading
    }

    pub fn ledger(&self) -> &LedgerMetrics {
        &self.ledger
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::error!("fatal: failed to create metrics registry: {e}");
            panic!("cannot create metrics registry")
        })
    }
}

/// Order book health per instrument.
pub struct BookMetrics {
    /// Spread in basis points.
    pub spread_bps: IntGaugeVec,
    /// Depth (resting quantity) within the top N levels, per side.
    pub depth: IntGaugeVec,
    /// Sequence gaps detected on the source feed.
    pub sequence_gaps_total: IntCounterVec,
    /// Seconds since the book last received an update.
    pub staleness_seconds: IntGaugeVec,
}

impl BookMetrics {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let spread_bps = IntGaugeVec::new(
            Opts::new("book_spread_bps", "Current spread in basis points").namespace("riptide"),
            &["instrument"],
        )?;
        registry.register(Box::new(spread_bps.clone()))?;

        let depth = IntGaugeVec::new(
            Opts::new("book_depth", "Resting quantity within the top levels").namespace("riptide"),
            &["instrument", "side"],
        )?;
        registry.register(Box::new(depth.clone()))?;

        let sequence_gaps_total = IntCounterVec::new(
            Opts::new("book_sequence_gaps_total", "Sequence gaps detected on the source feed")
                .namespace("riptide"),
            &["instrument"],
        )?;
        registry.register(Box::new(sequence_gaps_total.clone()))?;

        let staleness_seconds = IntGaugeVec::new(
            Opts::new("book_staleness_seconds", "Seconds since the book last updated")
                .namespace("riptide"),
            &["instrument"],
        )?;
        registry.register(Box::new(staleness_seconds.clone()))?;

        Ok(Self {
            spread_bps,
            depth,
            sequence_gaps_total,
            staleness_seconds,
        })
    }
}

/// Event bus throughput and backpressure.
pub struct BusMetrics {
    /// Events published to the ring buffer.
    pub events_published_total: IntCounter,
    /// Events dropped because the ring buffer was full.
    pub events_dropped_total: IntCounter,
    /// Distributor-to-subscriber dispatch latency, microseconds.
    pub dispatch_latency_us: Histogram,
    /// Current ring buffer occupancy.
    pub ring_depth: IntGauge,
    /// Subscriber callbacks that panicked or returned an error.
    pub subscriber_errors_total: IntCounterVec,
}

impl BusMetrics {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let events_published_total = IntCounter::with_opts(
            Opts::new("bus_events_published_total", "Events published to the ring buffer")
                .namespace("riptide"),
        )?;
        registry.register(Box::new(events_published_total.clone()))?;

        let events_dropped_total = IntCounter::with_opts(
            Opts::new("bus_events_dropped_total", "Events dropped because the ring buffer was full")
                .namespace("riptide"),
        )?;
        registry.register(Box::new(events_dropped_total.clone()))?;

        let dispatch_latency_us = Histogram::with_opts(
            HistogramOpts::new(
                "riptide_bus_dispatch_latency_us",
                "Distributor-to-subscriber dispatch latency in microseconds",
            )
            .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0]),
        )?;
        registry.register(Box::new(dispatch_latency_us.clone()))?;

        let ring_depth =
            IntGauge::with_opts(Opts::new("bus_ring_depth", "Current ring buffer occupancy").namespace("riptide"))?;
        registry.register(Box::new(ring_depth.clone()))?;

        let subscriber_errors_total = IntCounterVec::new(
            Opts::new("bus_subscriber_errors_total", "Subscriber callbacks that errored")
                .namespace("riptide"),
            &["subscriber"],
        )?;
        registry.register(Box::new(subscriber_errors_total.clone()))?;

        Ok(Self {
            events_published_total,
            events_dropped_total,
            dispatch_latency_us,
            ring_depth,
            subscriber_errors_total,
        })
    }
}

/// Quoting and hedging activity.
pub struct TradingMetrics {
    pub orders_total: IntCounterVec,
    pub fills_total: IntCounterVec,
    pub volume_total: Counter,
    pub rejections_total: IntCounterVec,
    pub cancellations_total: IntCounterVec,
    pub quote_state: IntGaugeVec,
    pub hedger_pending_quantity: Gauge,
    pub strategy_latency_us: HistogramVec,
}

impl TradingMetrics {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let orders_total = IntCounterVec::new(
            Opts::new("trading_orders_total", "Total number of orders submitted").namespace("riptide"),
            &["instrument", "side", "type"],
        )?;
        registry.register(Box::new(orders_total.clone()))?;

        let fills_total = IntCounterVec::new(
            Opts::new("trading_fills_total", "Total number of fills received").namespace("riptide"),
            &["instrument", "side"],
        )?;
        registry.register(Box::new(fills_total.clone()))?;

        let volume_total = Counter::with_opts(
            Opts::new("trading_volume_denomination_total", "Total traded volume, denomination currency")
                .namespace("riptide"),
        )?;
        registry.register(Box::new(volume_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("trading_rejections_total", "Total number of order rejections").namespace("riptide"),
            &["reason"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let cancellations_total = IntCounterVec::new(
            Opts::new("trading_cancellations_total", "Total number of order cancellations").namespace("riptide"),
            &["instrument"],
        )?;
        registry.register(Box::new(cancellations_total.clone()))?;

        let quote_state = IntGaugeVec::new(
            Opts::new("trading_quote_state", "Current quoting engine state (0=Idle,1=Quoting,2=Paused,3=Retired)")
                .namespace("riptide"),
            &["instrument", "side"],
        )?;
        registry.register(Box::new(quote_state.clone()))?;

        let hedger_pending_quantity = Gauge::with_opts(
            Opts::new("trading_hedger_pending_quantity", "Unhedged quantity awaiting a hedge order")
                .namespace("riptide"),
        )?;
        registry.register(Box::new(hedger_pending_quantity.clone()))?;

        let strategy_latency_us = HistogramVec::new(
            HistogramOpts::new("trading_strategy_latency_us", "Quoting decision latency in microseconds")
                .namespace("riptide")
                .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]),
            &["instrument"],
        )?;
        registry.register(Box::new(strategy_latency_us.clone()))?;

        Ok(Self {
            orders_total,
            fills_total,
            volume_total,
            rejections_total,
            cancellations_total,
            quote_state,
            hedger_pending_quantity,
            strategy_latency_us,
        })
    }
}

/// Ledger (book element) position and PnL.
pub struct LedgerMetrics {
    pub position: GaugeVec,
    pub avg_price: GaugeVec,
    pub realized_pnl: GaugeVec,
    pub unrealized_pnl: GaugeVec,
    pub session_volume: GaugeVec,
}

impl LedgerMetrics {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let position = GaugeVec::new(
            Opts::new("ledger_position", "Current signed position").namespace("riptide"),
            &["instrument"],
        )?;
        registry.register(Box::new(position.clone()))?;

        let avg_price = GaugeVec::new(
            Opts::new("ledger_avg_price", "Position average price").namespace("riptide"),
            &["instrument"],
        )?;
        registry.register(Box::new(avg_price.clone()))?;

        let realized_pnl = GaugeVec::new(
            Opts::new("ledger_realized_pnl", "Realized PnL, normalized to USDT").namespace("riptide"),
            &["instrument"],
        )?;
        registry.register(Box::new(realized_pnl.clone()))?;

        let unrealized_pnl = GaugeVec::new(
            Opts::new("ledger_unrealized_pnl", "Unrealized PnL, normalized to USDT").namespace("riptide"),
            &["instrument"],
        )?;
        registry.register(Box::new(unrealized_pnl.clone()))?;

        let session_volume = GaugeVec::new(
            Opts::new("ledger_session_volume", "Volume traded this session").namespace("riptide"),
            &["instrument"],
        )?;
        registry.register(Box::new(session_volume.clone()))?;

        Ok(Self {
            position,
            avg_price,
            realized_pnl,
            unrealized_pnl,
            session_volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_creation_registers_all_metric_families() {
        let registry = MetricsRegistry::new().unwrap();
        assert!(!registry.registry().gather().is_empty());
    }

    #[test]
    fn book_metrics_record_values() {
        let registry = MetricsRegistry::new().unwrap();
        registry.book().spread_bps.with_label_values(&["BTCUSDT"]).set(5);
        registry.book().sequence_gaps_total.with_label_values(&["BTCUSDT"]).inc();
        assert!(!registry.registry().gather().is_empty());
    }

    #[test]
    fn bus_metrics_record_values() {
        let registry = MetricsRegistry::new().unwrap();
        registry.bus().events_published_total.inc();
        registry.bus().dispatch_latency_us.observe(12.5);
        registry.bus().ring_depth.set(128);
        assert!(!registry.registry().gather().is_empty());
    }

    #[test]
    fn trading_metrics_record_values() {
        let registry = MetricsRegistry::new().unwrap();
        registry
            .trading()
            .orders_total
            .with_label_values(&["BTCUSDT", "buy", "limit"])
            .inc();
        registry.trading().hedger_pending_quantity.set(0.25);
        assert!(!registry.registry().gather().is_empty());
    }

    #[test]
    fn ledger_metrics_record_values() {
        let registry = MetricsRegistry::new().unwrap();
        registry.ledger().position.with_label_values(&["BTCUSDT"]).set(1.5);
        registry.ledger().realized_pnl.with_label_values(&["BTCUSDT"]).set(42.0);
        assert!(!registry.registry().gather().is_empty());
    }
}
