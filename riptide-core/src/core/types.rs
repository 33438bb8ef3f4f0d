//! Shared closed-set enums used across the book, gateway and engines.
//!
//! Kept as single-byte `#[repr(u8)]` enums where the upstream codebase did
//! the same for its own order/side/status types — small, `Copy`, and cheap
//! to carry inside the fixed-capacity [`crate::event::MarketDataEvent`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (or price-level side, in the order book).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    #[default]
    Buy = 0,
    Sell = 1,
}

impl Side {
    #[inline(always)]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// +1 for Buy, -1 for Sell. Used for signed-quantity and skew math.
    #[inline(always)]
    pub const fn sign(self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderType {
    Limit = 0,
    Market = 1,
    PostOnly = 2,
}

/// Time-in-force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TimeInForce {
    /// Good-til-cancelled (default).
    Gtc = 0,
    /// Immediate-or-cancel.
    Ioc = 1,
    /// Fill-or-kill.
    Fok = 2,
}

/// Order status, the canonical closed set from §6's `OrderStatusReport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderStatus {
    Pending = 0,
    New = 1,
    PartiallyFilled = 2,
    Filled = 3,
    Cancelled = 4,
    Rejected = 5,
}

impl OrderStatus {
    #[inline(always)]
    pub const fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected)
    }
}

/// Monotonic per-order client order id, unique within a process lifetime.
///
/// Uses a timestamp-high / counter-low layout so ids sort roughly by
/// creation order without a shared mutex on the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ClientOrderId(pub u64);

impl ClientOrderId {
    #[inline(always)]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Thread-safe monotonic generator for [`ClientOrderId`]s.
///
/// One instance is shared by a quoting engine and its hedger so ids never
/// collide across the pair.
#[derive(Debug, Default)]
pub struct ClientOrderIdGenerator {
    counter: std::sync::atomic::AtomicU64,
}

impl ClientOrderIdGenerator {
    pub fn new() -> Self {
        Self {
            counter: std::sync::atomic::AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn next(&self) -> ClientOrderId {
        ClientOrderId(self.counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
    }
}
