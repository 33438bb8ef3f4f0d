//! Hedger (§4.5): keeps the net signed quantity of filled quoted orders on
//! a target instrument offset by orders of opposite sign on a (possibly
//! cross-currency, cross-convention) hedge instrument.
//!
//! As with the quoting engine, the decision step
//! ([`Hedger::on_quote_fill`]) is pure and synchronous; dispatching the
//! resulting gateway calls happens through [`Hedger::dispatch`], which
//! spawns onto a shared `tokio` runtime handle rather than awaiting inline.

use riptide_core::config::{HedgeOrderType, HedgingParameters};
use riptide_core::core::{ClientOrderId, ClientOrderIdGenerator, OrderType, Price, Quantity, Side, TimeInForce};
use riptide_core::fx::FxService;
use riptide_core::gateway::{
    BulkCancelOrdersRequest, CancelOrderRequest, NewOrderRequest, OrderGateway, OrderPlacementResult,
};
use riptide_core::instrument::Instrument;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::order::{Order, OrderSource};

/// Converts a quote-side fill into the signed quantity of hedge-instrument
/// contracts still owed, per §4.5 steps 1-2. Returns `None` when the fill's
/// notional can't be converted into the hedge instrument's denomination
/// currency (no FX path, or the hedge book has no usable mid) — the caller
/// treats this as "hold", matching the FX service's fail-soft contract.
pub fn compute_hedge_delta(
    quote_instrument: &Instrument,
    hedge_instrument: &Instrument,
    fx: &FxService,
    fill_side: Side,
    fill_price: Price,
    fill_qty: Quantity,
    hedge_mid: Price,
) -> Option<Quantity> {
    let q_signed = match fill_side {
        Side::Buy => fill_qty,
        Side::Sell => -fill_qty,
    };
    let notional_quote_denom = quote_instrument.value_in_denomination(fill_price, q_signed)?;
    let notional_hedge_denom = fx.convert(notional_quote_denom, hedge_instrument.denomination_currency)?;
    let needed = notional_hedge_denom.neg();

    let one_unit = Quantity::from_ticks(riptide_core::core::SCALE);
    let per_unit_value = hedge_instrument.value_in_denomination(hedge_mid, one_unit)?;
    if per_unit_value.amount.is_zero() {
        return None;
    }

    let hedge_qty_ticks = needed.amount.checked_div_fp(per_unit_value.amount)?;
    Some(Quantity(hedge_qty_ticks))
}

/// One hedge order the caller must submit or cancel. Mirrors
/// [`crate::quoting::engine::SlotAction`]'s split between decision and
/// dispatch.
#[derive(Debug, Clone)]
pub enum HedgeAction {
    Submit { order: Order },
    Cancel { client_order_id: ClientOrderId },
    BulkCancel { client_order_ids: Vec<ClientOrderId> },
}

/// Stateful hedger for one (quoting instrument, hedge instrument) pair.
pub struct Hedger<G: OrderGateway + 'static> {
    quote_instrument: Arc<Instrument>,
    hedge_instrument: Arc<Instrument>,
    params: Mutex<HedgingParameters>,
    fx: Arc<FxService>,
    gateway: Arc<G>,
    id_gen: Arc<ClientOrderIdGenerator>,
    runtime: Handle,
    net_pending_hedge_quantity: Mutex<Quantity>,
    outstanding: Mutex<Option<Order>>,
    active: AtomicBool,
}

impl<G: OrderGateway + 'static> Hedger<G> {
    pub fn new(
        quote_instrument: Arc<Instrument>,
        hedge_instrument: Arc<Instrument>,
        params: HedgingParameters,
        fx: Arc<FxService>,
        gateway: Arc<G>,
        id_gen: Arc<ClientOrderIdGenerator>,
        runtime: Handle,
    ) -> Self {
        Self {
            quote_instrument,
            hedge_instrument,
            params: Mutex::new(params),
            fx,
            gateway,
            id_gen,
            runtime,
            net_pending_hedge_quantity: Mutex::new(Quantity::zero()),
            outstanding: Mutex::new(None),
            active: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(AtomicOrdering::Relaxed)
    }

    /// Transitions activation state per §4.5: a connection change on the
    /// hedge exchange (or parameters being applied/withdrawn) flips this.
    /// Deactivating issues a bulk-cancel of every outstanding hedge order.
    pub fn set_active(&self, active: bool) -> Vec<HedgeAction> {
        let was_active = self.active.swap(active, AtomicOrdering::Relaxed);
        if was_active && !active {
            if let Some(order) = self.outstanding.lock().unwrap().take() {
                return vec![HedgeAction::BulkCancel {
                    client_order_ids: vec![order.client_order_id],
                }];
            }
        }
        Vec::new()
    }

    pub fn net_pending(&self) -> Quantity {
        *self.net_pending_hedge_quantity.lock().unwrap()
    }

    /// Decision step for one quoting fill (§4.5 steps 1-4). `hedge_mid` is
    /// the current mid price of the hedge instrument's book, needed both
    /// for the per-unit-value conversion and for passive order placement.
    pub fn on_quote_fill(
        &self,
        fill_side: Side,
        fill_price: Price,
        fill_qty: Quantity,
        hedge_mid: Price,
        hedge_best_bid: Price,
        hedge_best_ask: Price,
    ) -> Vec<HedgeAction> {
        if !self.is_active() {
            return Vec::new();
        }

        let Some(delta) = compute_hedge_delta(
            &self.quote_instrument,
            &self.hedge_instrument,
            &self.fx,
            fill_side,
            fill_price,
            fill_qty,
            hedge_mid,
        ) else {
            warn!("hedge fill ignored: no fx path or stale hedge book");
            return Vec::new();
        };

        let mut pending = self.net_pending_hedge_quantity.lock().unwrap();
        *pending = *pending + delta;
        self.maybe_slice(&mut pending, hedge_best_bid, hedge_best_ask)
    }

    fn maybe_slice(&self, pending: &mut Quantity, hedge_best_bid: Price, hedge_best_ask: Price) -> Vec<HedgeAction> {
        if self.outstanding.lock().unwrap().is_some() {
            return Vec::new();
        }

        let params = self.params.lock().unwrap();
        let min_order_size = self.hedge_instrument.min_order_size;
        if pending.abs().raw() < min_order_size.raw() {
            return Vec::new();
        }

        let capped = std::cmp::min(pending.abs(), params.max_order_size);
        let slice_magnitude = capped.round_down_to(self.hedge_instrument.lot_size);
        if slice_magnitude.is_zero() {
            return Vec::new();
        }

        let side = if pending.signum() > 0 { Side::Buy } else { Side::Sell };
        let price = match params.hedge_order_type {
            HedgeOrderType::Market => hedge_mid_fallback(hedge_best_bid, hedge_best_ask, side),
            // OppositeFirst: rest passively on the opposite side of the
            // current spread rather than crossing it.
            HedgeOrderType::Limit => match side {
                Side::Buy => hedge_best_bid,
                Side::Sell => hedge_best_ask,
            },
        };
        let order_type = match params.hedge_order_type {
            HedgeOrderType::Market => OrderType::Market,
            HedgeOrderType::Limit => OrderType::Limit,
        };

        let signed_slice = if side == Side::Buy { slice_magnitude } else { -slice_magnitude };
        *pending = *pending - signed_slice;

        let order = Order::new(
            self.id_gen.next(),
            self.hedge_instrument.id,
            OrderSource::Hedging,
            side,
            order_type,
            TimeInForce::Gtc,
            price,
            slice_magnitude,
        );
        *self.outstanding.lock().unwrap() = Some(order.clone());
        vec![HedgeAction::Submit { order }]
    }

    /// Called when the outstanding hedge order reaches a terminal state
    /// without being fully filled (§4.5 step 5: unfilled portion is added
    /// back to `net_pending_hedge_quantity`).
    pub fn on_hedge_order_cancelled_or_rejected(&self) {
        if let Some(order) = self.outstanding.lock().unwrap().take() {
            let unfilled = order.leaves_quantity();
            if !unfilled.is_zero() {
                let signed_unfilled = if order.side == Side::Buy { unfilled } else { -unfilled };
                let mut pending = self.net_pending_hedge_quantity.lock().unwrap();
                *pending = *pending + signed_unfilled;
            }
        }
    }

    /// The hedge order filled (fully or partially); already-deducted
    /// quantity stays deducted (§4.5 step 5), so this only clears the slot
    /// once the order reaches a terminal state.
    pub fn on_hedge_order_filled(&self, terminal: bool) {
        if terminal {
            *self.outstanding.lock().unwrap() = None;
        }
    }

    pub fn dispatch(self: &Arc<Self>, actions: Vec<HedgeAction>) {
        for action in actions {
            let hedger = Arc::clone(self);
            self.runtime.spawn(async move {
                hedger.execute(action).await;
            });
        }
    }

    async fn execute(&self, action: HedgeAction) {
        match action {
            HedgeAction::Submit { order } => {
                let request = NewOrderRequest {
                    instrument_id: order.instrument_id,
                    client_order_id: order.client_order_id,
                    side: order.side,
                    order_type: order.order_type,
                    price: order.price,
                    quantity: order.quantity,
                    time_in_force: order.time_in_force,
                };
                match self.gateway.send_new_order(request).await {
                    Ok(OrderPlacementResult::Accepted { client_order_id }) => {
                        info!(?client_order_id, "hedge order submitted");
                    }
                    Ok(OrderPlacementResult::Rejected { reason, .. }) => {
                        warn!(%reason, "hedge order rejected");
                        self.on_hedge_order_cancelled_or_rejected();
                    }
                    Err(err) => {
                        warn!(error = %err, "gateway failure submitting hedge order");
                        self.on_hedge_order_cancelled_or_rejected();
                    }
                }
            }
            HedgeAction::Cancel { client_order_id } => {
                let request = CancelOrderRequest {
                    instrument_id: self.hedge_instrument.id,
                    client_order_id,
                };
                if let Err(err) = self.gateway.send_cancel_order(request).await {
                    warn!(error = %err, "gateway failure cancelling hedge order");
                }
                self.on_hedge_order_cancelled_or_rejected();
            }
            HedgeAction::BulkCancel { client_order_ids } => {
                let request = BulkCancelOrdersRequest {
                    instrument_id: self.hedge_instrument.id,
                    client_order_ids,
                };
                if let Err(err) = self.gateway.send_bulk_cancel_orders(request).await {
                    warn!(error = %err, "gateway failure bulk-cancelling hedge orders");
                }
            }
        }
    }
}

fn hedge_mid_fallback(best_bid: Price, best_ask: Price, side: Side) -> Price {
    match side {
        Side::Buy => best_ask,
        Side::Sell => best_bid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riptide_core::core::errors::GatewayError;
    use riptide_core::gateway::{
        CancelOrderRequest as CancelReq, OrderModificationResult, OrderStatusReport, ReplaceOrderRequest,
    };
    use riptide_core::instrument::{CurrencyCode, ProductType};
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicU64;

    struct NoopGateway {
        calls: AtomicU64,
    }

    #[async_trait::async_trait]
    impl OrderGateway for NoopGateway {
        fn supports_order_replacement(&self) -> bool {
            false
        }
        async fn send_new_order(&self, request: NewOrderRequest) -> Result<OrderPlacementResult, GatewayError> {
            self.calls.fetch_add(1, AtomicOrdering::Relaxed);
            Ok(OrderPlacementResult::Accepted { client_order_id: request.client_order_id })
        }
        async fn send_replace_order(&self, _request: ReplaceOrderRequest) -> Result<OrderModificationResult, GatewayError> {
            unimplemented!()
        }
        async fn send_cancel_order(&self, _request: CancelReq) -> Result<OrderModificationResult, GatewayError> {
            unimplemented!()
        }
        async fn send_bulk_cancel_orders(&self, request: BulkCancelOrdersRequest) -> Result<Vec<OrderModificationResult>, GatewayError> {
            Ok(request
                .client_order_ids
                .into_iter()
                .map(|client_order_id| OrderModificationResult::Accepted { client_order_id })
                .collect())
        }
        async fn fetch_order_status(&self, _instrument_id: i32, client_order_id: ClientOrderId) -> Result<OrderStatusReport, GatewayError> {
            Ok(OrderStatusReport {
                client_order_id,
                status: riptide_core::core::OrderStatus::New,
                filled_quantity: Quantity::zero(),
                avg_fill_price: Price::zero(),
            })
        }
        async fn cancel_all_orders(&self, _instrument_id: i32) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn usdt() -> CurrencyCode {
        CurrencyCode::new("USDT")
    }

    fn quote_instrument() -> Instrument {
        Instrument::new(
            1,
            "BTCUSDT-PERP",
            1,
            ProductType::PerpetualFuture,
            CurrencyCode::new("BTC"),
            usdt(),
            usdt(),
            Price::from_decimal(dec!(0.01)),
            Quantity::from_decimal(dec!(0.001)),
            Price::from_decimal(dec!(1)),
            Quantity::from_decimal(dec!(0.001)),
            &Default::default(),
        )
    }

    fn hedge_instrument() -> Instrument {
        Instrument::new(
            2,
            "BTCUSDT",
            2,
            ProductType::Spot,
            CurrencyCode::new("BTC"),
            usdt(),
            usdt(),
            Price::from_decimal(dec!(0.01)),
            Quantity::from_decimal(dec!(0.0001)),
            Price::from_decimal(dec!(1)),
            Quantity::from_decimal(dec!(0.0001)),
            &Default::default(),
        )
    }

    struct FixedMid(Price);
    impl riptide_core::fx::MidPriceSource for FixedMid {
        fn mid_price(&self, _instrument_id: i32) -> Option<Price> {
            Some(self.0)
        }
    }

    fn params() -> HedgingParameters {
        HedgingParameters {
            quoting_instrument_id: 1,
            hedge_instrument_id: 2,
            hedge_exchange: 2,
            hedge_order_type: HedgeOrderType::Limit,
            max_order_size: Quantity::from_decimal(dec!(500)),
            slippage_bp: dec!(5),
        }
    }

    fn make_hedger() -> Arc<Hedger<NoopGateway>> {
        let fx = Arc::new(FxService::new(Arc::new(FixedMid(Price::from_decimal(dec!(50000))))));
        Arc::new(Hedger::new(
            Arc::new(quote_instrument()),
            Arc::new(hedge_instrument()),
            params(),
            fx,
            Arc::new(NoopGateway { calls: AtomicU64::new(0) }),
            Arc::new(ClientOrderIdGenerator::new()),
            Handle::current(),
        ))
    }

    #[test]
    fn compute_hedge_delta_is_opposite_sign_of_fill() {
        let fx = FxService::new(Arc::new(FixedMid(Price::from_decimal(dec!(50000)))));
        let q = quote_instrument();
        let h = hedge_instrument();
        let delta = compute_hedge_delta(
            &q,
            &h,
            &fx,
            Side::Buy,
            Price::from_decimal(dec!(50000)),
            Quantity::from_decimal(dec!(1)),
            Price::from_decimal(dec!(50000)),
        )
        .unwrap();
        // Buying 1 BTC of quoting exposure needs a Sell of 1 BTC on the
        // hedge instrument (linear-to-linear, same denomination currency).
        assert!(delta.signum() < 0);
        assert_eq!(delta.abs().to_decimal(), dec!(1));
    }

    #[tokio::test]
    async fn inactive_hedger_ignores_fills() {
        let hedger = make_hedger();
        let actions = hedger.on_quote_fill(
            Side::Buy,
            Price::from_decimal(dec!(50000)),
            Quantity::from_decimal(dec!(1)),
            Price::from_decimal(dec!(50000)),
            Price::from_decimal(dec!(49999)),
            Price::from_decimal(dec!(50001)),
        );
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn active_hedger_slices_and_submits() {
        let hedger = make_hedger();
        hedger.set_active(true);
        let actions = hedger.on_quote_fill(
            Side::Buy,
            Price::from_decimal(dec!(50000)),
            Quantity::from_decimal(dec!(1)),
            Price::from_decimal(dec!(50000)),
            Price::from_decimal(dec!(49999)),
            Price::from_decimal(dec!(50001)),
        );
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            HedgeAction::Submit { order } => {
                assert_eq!(order.side, Side::Sell);
                assert_eq!(order.quantity, Quantity::from_decimal(dec!(1)));
            }
            _ => panic!("expected a submit action"),
        }
        // No second slice fires while one is outstanding.
        let second = hedger.on_quote_fill(
            Side::Buy,
            Price::from_decimal(dec!(50000)),
            Quantity::from_decimal(dec!(0.0001)),
            Price::from_decimal(dec!(50000)),
            Price::from_decimal(dec!(49999)),
            Price::from_decimal(dec!(50001)),
        );
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn deactivating_with_an_outstanding_order_bulk_cancels_it() {
        let hedger = make_hedger();
        hedger.set_active(true);
        hedger.on_quote_fill(
            Side::Buy,
            Price::from_decimal(dec!(50000)),
            Quantity::from_decimal(dec!(1)),
            Price::from_decimal(dec!(50000)),
            Price::from_decimal(dec!(49999)),
            Price::from_decimal(dec!(50001)),
        );
        let actions = hedger.set_active(false);
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], HedgeAction::BulkCancel { .. }));
    }

    #[tokio::test]
    async fn unfilled_cancel_rolls_back_into_pending() {
        let hedger = make_hedger();
        hedger.set_active(true);
        hedger.on_quote_fill(
            Side::Buy,
            Price::from_decimal(dec!(50000)),
            Quantity::from_decimal(dec!(1)),
            Price::from_decimal(dec!(50000)),
            Price::from_decimal(dec!(49999)),
            Price::from_decimal(dec!(50001)),
        );
        assert_eq!(hedger.net_pending(), Quantity::zero());
        hedger.on_hedge_order_cancelled_or_rejected();
        assert_eq!(hedger.net_pending(), Quantity::from_decimal(dec!(-1)));
    }
}
