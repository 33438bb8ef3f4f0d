//! Order-gateway interface: the one seam every venue-specific execution
//! adapter implements.
//!
//! The quoting engine and hedger never talk to a venue's REST/WebSocket API
//! directly; they hold a `Arc<dyn OrderGateway>` and the distributor's
//! shared tokio runtime drives the `async fn`s. Venue adapters (out of
//! scope here) live behind this trait; [`RateLimitedGateway`] is the one
//! concrete decorator every adapter is wrapped in before it reaches a
//! strategy.

pub mod rate_limiter;

pub use rate_limiter::GatewayRateLimiter;

use crate::core::errors::GatewayError;
use crate::core::{ClientOrderId, OrderStatus, OrderType, Price, Quantity, Side, TimeInForce};
use async_trait::async_trait;

/// Request to place a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderRequest {
    pub instrument_id: i32,
    pub client_order_id: ClientOrderId,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Price,
    pub quantity: Quantity,
    pub time_in_force: TimeInForce,
}

/// Request to replace (cancel/reprice) an existing resting order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceOrderRequest {
    pub instrument_id: i32,
    pub original_client_order_id: ClientOrderId,
    pub new_client_order_id: ClientOrderId,
    pub new_price: Price,
    pub new_quantity: Quantity,
}

/// Request to cancel a single resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelOrderRequest {
    pub instrument_id: i32,
    pub client_order_id: ClientOrderId,
}

/// Request to cancel several resting orders in one round trip. Venues that
/// don't support a native bulk-cancel endpoint fall back to issuing the
/// individual cancels themselves inside their `OrderGateway` impl; callers
/// only ever see the batch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCancelOrdersRequest {
    pub instrument_id: i32,
    pub client_order_ids: Vec<ClientOrderId>,
}

/// Outcome of a new-order submission.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderPlacementResult {
    /// Venue acknowledged the order; it is now resting (or immediately
    /// filled, reported separately through the fill stream).
    Accepted { client_order_id: ClientOrderId },
    /// Venue rejected the order outright (e.g. post-only would cross,
    /// below min size).
    Rejected { client_order_id: ClientOrderId, reason: String },
}

/// Outcome of a replace/cancel submission.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderModificationResult {
    Accepted { client_order_id: ClientOrderId },
    Rejected { client_order_id: ClientOrderId, reason: String },
    /// The order was already in a terminal state (filled/cancelled) by the
    /// time the modification reached the venue.
    AlreadyTerminal { client_order_id: ClientOrderId, status: OrderStatus },
}

/// A single fill report, as returned by [`OrderGateway::fetch_order_status`]
/// or pushed through a venue's own fill stream (out of scope here).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub client_order_id: ClientOrderId,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp_us: u64,
}

/// Point-in-time status of an order, as reported by the venue.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusReport {
    pub client_order_id: ClientOrderId,
    pub status: OrderStatus,
    pub filled_quantity: Quantity,
    pub avg_fill_price: Price,
}

/// The execution-side interface every venue adapter implements. Calls are
/// `async` because they are driven by the distributor's shared tokio
/// runtime handle rather than blocking the event-processing thread.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Whether this venue supports in-place order replacement, or whether
    /// the quoting engine must cancel and resubmit instead.
    fn supports_order_replacement(&self) -> bool;

    async fn send_new_order(&self, request: NewOrderRequest) -> Result<OrderPlacementResult, GatewayError>;

    async fn send_replace_order(
        &self,
        request: ReplaceOrderRequest,
    ) -> Result<OrderModificationResult, GatewayError>;

    async fn send_cancel_order(
        &self,
        request: CancelOrderRequest,
    ) -> Result<OrderModificationResult, GatewayError>;

    async fn send_bulk_cancel_orders(
        &self,
        request: BulkCancelOrdersRequest,
    ) -> Result<Vec<OrderModificationResult>, GatewayError>;

    /// Bypasses rate limiting in [`RateLimitedGateway`]: a status poll
    /// must never be starved by order-flow traffic.
    async fn fetch_order_status(
        &self,
        instrument_id: i32,
        client_order_id: ClientOrderId,
    ) -> Result<OrderStatusReport, GatewayError>;

    /// Bypasses rate limiting in [`RateLimitedGateway`]: this is the kill
    /// switch's escape hatch and must always get through.
    async fn cancel_all_orders(&self, instrument_id: i32) -> Result<(), GatewayError>;
}

/// Wraps any [`OrderGateway`] with per-second/per-minute token-bucket rate
/// limiting on the order-flow calls (new/replace/cancel/bulk-cancel).
/// `fetch_order_status` and `cancel_all_orders` pass straight through.
pub struct RateLimitedGateway<G> {
    inner: G,
    limiter: GatewayRateLimiter,
}

impl<G: OrderGateway> RateLimitedGateway<G> {
    pub fn new(inner: G, limiter: GatewayRateLimiter) -> Self {
        Self { inner, limiter }
    }
}

#[async_trait]
impl<G: OrderGateway> OrderGateway for RateLimitedGateway<G> {
    fn supports_order_replacement(&self) -> bool {
        self.inner.supports_order_replacement()
    }

    async fn send_new_order(&self, request: NewOrderRequest) -> Result<OrderPlacementResult, GatewayError> {
        if !self.limiter.try_acquire() {
            return Err(GatewayError::RateLimited);
        }
        self.inner.send_new_order(request).await
    }

    async fn send_replace_order(
        &self,
        request: ReplaceOrderRequest,
    ) -> Result<OrderModificationResult, GatewayError> {
        if !self.limiter.try_acquire() {
            return Err(GatewayError::RateLimited);
        }
        self.inner.send_replace_order(request).await
    }

    async fn send_cancel_order(
        &self,
        request: CancelOrderRequest,
    ) -> Result<OrderModificationResult, GatewayError> {
        if !self.limiter.try_acquire() {
            return Err(GatewayError::RateLimited);
        }
        self.inner.send_cancel_order(request).await
    }

    async fn send_bulk_cancel_orders(
        &self,
        request: BulkCancelOrdersRequest,
    ) -> Result<Vec<OrderModificationResult>, GatewayError> {
        if !self.limiter.try_acquire() {
            return Err(GatewayError::RateLimited);
        }
        self.inner.send_bulk_cancel_orders(request).await
    }

    async fn fetch_order_status(
        &self,
        instrument_id: i32,
        client_order_id: ClientOrderId,
    ) -> Result<OrderStatusReport, GatewayError> {
        self.inner.fetch_order_status(instrument_id, client_order_id).await
    }

    async fn cancel_all_orders(&self, instrument_id: i32) -> Result<(), GatewayError> {
        self.inner.cancel_all_orders(instrument_id).await
    }
}
