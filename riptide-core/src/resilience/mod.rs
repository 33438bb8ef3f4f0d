//! Resilience patterns shared by the book, the gateway, and the quoting
//! engine: sequence gap detection, source-book staleness, a generic
//! circuit breaker, and the process-wide kill switch.

pub mod circuit_breaker;
pub mod gap_detector;
pub mod kill_switch;
pub mod stale_source;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use gap_detector::GapDetector;
pub use kill_switch::{KillSwitch, KillSwitchState};
pub use stale_source::{StaleSourceBreaker, StaleSourceConfig, StaleSourceState};
