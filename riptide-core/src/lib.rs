//! riptide-core: the multi-venue market-data and execution substrate.
//!
//! This crate owns everything the quoting engine, hedger, and book ledger
//! in `riptide-strategies` build on top of, but none of their trading
//! logic itself:
//!
//! - `core`: fixed-point numerics, shared order/side/status enums, and the
//!   domain error taxonomy.
//! - `instrument`: instrument identity and linear/inverse contract math.
//! - `event`: the wire-level `MarketDataEvent`.
//! - `orderbook`: the depth-bounded, single-writer order book.
//! - `bus`: the bounded event-bus ring buffer and its distributor thread.
//! - `fx`: cross-currency conversion via reference-instrument mid prices.
//! - `gateway`: the venue-agnostic `OrderGateway` interface and its
//!   rate-limiting decorator.
//! - `config`: the instruments table and per-instrument quoting/hedging
//!   parameters.
//! - `resilience`: sequence-gap detection, stale-source breakers, a
//!   generic circuit breaker, and the process kill switch.
//! - `monitoring`: Prometheus metrics for all of the above.
//! - `utils` / `perf`: structured logging init and core-pinning helpers.

pub mod bus;
pub mod config;
pub mod core;
pub mod event;
pub mod fx;
pub mod gateway;
pub mod instrument;
pub mod monitoring;
pub mod orderbook;
pub mod perf;
pub mod resilience;
pub mod utils;

pub use anyhow::{Error, Result};

/// Convenience imports for binaries wiring the full system together.
pub mod prelude {
    pub use crate::bus::{event_bus, BookRegistry, Distributor, DistributorHandle, EventBusProducer};
    pub use crate::config::{
        Credentials, FvModel, HedgeOrderType, HedgingParameters, HitLogic, QuotingParameters,
    };
    pub use crate::core::{
        ClientOrderId, ClientOrderIdGenerator, OrderStatus, OrderType, Price, Quantity, Side, TimeInForce, Ticks,
    };
    pub use crate::event::{EventKind, MarketDataEvent, PriceLevelEntry};
    pub use crate::fx::FxService;
    pub use crate::gateway::{GatewayRateLimiter, OrderGateway, RateLimitedGateway};
    pub use crate::instrument::{CurrencyAmount, CurrencyCode, Instrument, InstrumentRepository, ProductType};
    pub use crate::monitoring::MetricsRegistry;
    pub use crate::orderbook::OrderBook;
    pub use crate::resilience::{
        CircuitBreaker, CircuitBreakerConfig, CircuitState, GapDetector, KillSwitch, KillSwitchState,
        StaleSourceBreaker, StaleSourceConfig, StaleSourceState,
    };
    pub use crate::{Error, Result};
}
