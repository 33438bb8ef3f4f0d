//! Foundational types: fixed-point arithmetic, closed-set enums, and the
//! domain error taxonomy shared by every other module in this crate.

pub mod errors;
pub mod fixed_point;
#[cfg(test)]
mod fixed_point_proptest;
pub mod types;

pub use errors::{BookError, ConversionError, FxError, GatewayError};
pub use fixed_point::{Price, Quantity, Ticks, SCALE};
pub use types::{ClientOrderId, ClientOrderIdGenerator, OrderStatus, OrderType, Side, TimeInForce};
