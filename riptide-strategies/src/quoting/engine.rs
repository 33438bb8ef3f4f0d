//! Stateful quoting engine (§4.4): owns one ladder per side on a target
//! instrument, derives target prices from a source book on every update,
//! and diffs against what is currently resting to decide whether to
//! submit, replace, or cancel each slot.
//!
//! The distributor thread that drives [`QuotingEngine::on_source_book_update`]
//! must never block on gateway I/O (§5), so the decision step
//! (`on_source_book_update`) is synchronous and only returns a plan; the
//! caller hands that plan to [`QuotingEngine::dispatch`], which spawns each
//! gateway call onto a shared `tokio` runtime and applies the result back
//! without the distributor ever awaiting it.

use crate::fair_value::FvProvider;
use crate::order::{Order, OrderSource};
use crate::quoting::ladder::{derive_side_ladder, QuoteTarget};
use riptide_core::config::{HitLogic, QuotingParameters};
use riptide_core::core::errors::GatewayError;
use riptide_core::core::{
    ClientOrderId, ClientOrderIdGenerator, OrderStatus, OrderType, Price, Quantity, Side, Ticks, TimeInForce,
};
use riptide_core::gateway::{
    CancelOrderRequest, NewOrderRequest, OrderGateway, OrderModificationResult, OrderPlacementResult,
    OrderStatusReport, ReplaceOrderRequest,
};
use riptide_core::orderbook::OrderBook;
use riptide_core::resilience::{StaleSourceBreaker, StaleSourceConfig};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Per-side quoting state (§4.4's state machine). `Idle` means no target
/// has been derived yet; `Retired` means parameters were withdrawn and the
/// side will never quote again until the engine is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideState {
    Idle,
    Quoting,
    Paused,
    Retired,
}

/// One ladder action the distributor's caller must carry out against the
/// gateway. Returned by [`QuotingEngine::on_source_book_update`] rather
/// than executed inline, so the decision step stays synchronous.
#[derive(Debug, Clone)]
pub enum SlotAction {
    Submit { side: Side, level: usize, order: Order },
    Replace { side: Side, level: usize, original: ClientOrderId, new_order: Order },
    CancelThenNew { side: Side, level: usize, cancel: ClientOrderId, new_order: Order },
    Cancel { side: Side, level: usize, client_order_id: ClientOrderId },
}

struct SideLedger {
    state: Mutex<SideState>,
    slots: Mutex<Vec<Option<Order>>>,
    window_start: Mutex<Instant>,
    cumulative_fill_ticks: AtomicI64,
}

impl SideLedger {
    fn new(levels: usize) -> Self {
        Self {
            state: Mutex::new(SideState::Idle),
            slots: Mutex::new(vec![None; levels]),
            window_start: Mutex::new(Instant::now()),
            cumulative_fill_ticks: AtomicI64::new(0),
        }
    }
}

/// Maintains a bid/ask ladder on `instrument_id`, priced off
/// `source_instrument_id`'s book, and dispatches order-gateway calls
/// through `G` without ever blocking the caller of
/// [`Self::on_source_book_update`] (§5.1).
pub struct QuotingEngine<G: OrderGateway + 'static> {
    instrument_id: i32,
    params: Mutex<QuotingParameters>,
    tick_size: Price,
    lot_size: Quantity,
    fv_provider: Box<dyn FvProvider>,
    gateway: Arc<G>,
    id_gen: Arc<ClientOrderIdGenerator>,
    runtime: Handle,
    stale_breaker: Mutex<StaleSourceBreaker>,
    bid: SideLedger,
    ask: SideLedger,
    net_position_units: AtomicI64,
}

impl<G: OrderGateway + 'static> QuotingEngine<G> {
    pub fn new(
        params: QuotingParameters,
        tick_size: Price,
        lot_size: Quantity,
        fv_provider: Box<dyn FvProvider>,
        gateway: Arc<G>,
        id_gen: Arc<ClientOrderIdGenerator>,
        runtime: Handle,
    ) -> Self {
        let stale_config = match params.expected_update_interval_ms {
            Some(ms) => StaleSourceConfig::from_expected_interval(Duration::from_millis(ms)),
            None => StaleSourceConfig::default(),
        };
        let levels = params.max_quote_levels;
        Self {
            instrument_id: params.instrument_id,
            params: Mutex::new(params),
            tick_size,
            lot_size,
            fv_provider,
            gateway,
            id_gen,
            runtime,
            stale_breaker: Mutex::new(StaleSourceBreaker::new(stale_config)),
            bid: SideLedger::new(levels),
            ask: SideLedger::new(levels),
            net_position_units: AtomicI64::new(0),
        }
    }

    pub fn instrument_id(&self) -> i32 {
        self.instrument_id
    }

    /// Feeds the current net position (in whole units, scaled externally
    /// by the ledger) into the skew calculation.
    pub fn set_net_position(&self, units: Decimal) {
        self.net_position_units
            .store(Price::from_decimal(units).raw(), AtomicOrdering::Relaxed);
    }

    fn net_position_decimal(&self) -> Decimal {
        Price(Ticks::from_ticks(self.net_position_units.load(AtomicOrdering::Relaxed))).to_decimal()
    }

    /// Marks the source book fresh; called whenever an applied event
    /// belongs to `source_instrument_id` (§4.4.1).
    pub fn mark_source_fresh(&self) {
        self.stale_breaker.lock().unwrap().mark_fresh();
    }

    /// The decision step: derives a fair value from `source_book`, builds
    /// the target ladder for both sides, and diffs it against what is
    /// currently resting. Returns the actions the caller must dispatch.
    /// Never touches the gateway itself.
    pub fn on_source_book_update(&self, source_book: &OrderBook) -> Vec<SlotAction> {
        let fresh = self.stale_breaker.lock().unwrap().check_freshness();
        if !fresh {
            return self.cancel_all_resting();
        }

        let Some(fv) = self.fv_provider.fair_value(source_book) else {
            return self.cancel_all_resting();
        };

        let params = self.params.lock().unwrap().clone();
        let skew_bp = params.skew_bp_per_unit * self.net_position_decimal();

        let opposite_for_bid = Some(source_book.get_best_ask().0).filter(|p| !p.is_zero());
        let opposite_for_ask = Some(source_book.get_best_bid().0).filter(|p| !p.is_zero());

        let mut actions = Vec::new();
        actions.extend(self.plan_side(Side::Buy, fv, skew_bp, &params, opposite_for_bid));
        actions.extend(self.plan_side(Side::Sell, fv, skew_bp, &params, opposite_for_ask));
        actions
    }

    fn side_ledger(&self, side: Side) -> &SideLedger {
        match side {
            Side::Buy => &self.bid,
            Side::Sell => &self.ask,
        }
    }

    fn plan_side(
        &self,
        side: Side,
        fv: Price,
        skew_bp: Decimal,
        params: &QuotingParameters,
        opposite_best: Option<Price>,
    ) -> Vec<SlotAction> {
        let ledger = self.side_ledger(side);
        {
            let mut state = ledger.state.lock().unwrap();
            if *state == SideState::Retired {
                return Vec::new();
            }
            if *state == SideState::Paused {
                self.maybe_reset_throttle(ledger, params);
                if self.is_throttled(ledger, params) {
                    return Vec::new();
                }
                *state = SideState::Quoting;
            }
        }
        self.maybe_reset_throttle(ledger, params);
        if self.is_throttled(ledger, params) {
            *ledger.state.lock().unwrap() = SideState::Paused;
            return self.cancel_side(side);
        }

        let targets = derive_side_ladder(fv, side, skew_bp, params, self.tick_size, self.lot_size, opposite_best);
        let mut slots = ledger.slots.lock().unwrap();
        let mut actions = Vec::new();

        for level in 0..slots.len() {
            let target = targets.iter().find(|t| t.level == level);
            match (slots[level].as_ref(), target) {
                (None, Some(target)) => {
                    let order = self.build_order(side, *target, params);
                    slots[level] = Some(order.clone());
                    actions.push(SlotAction::Submit { side, level, order });
                }
                (Some(existing), Some(target)) => {
                    if existing.is_resting() && requote_needed(existing.price, target.price, params.requote_threshold_bp) {
                        let new_order = self.build_order(side, *target, params);
                        if self.gateway.supports_order_replacement() {
                            slots[level] = Some(new_order.clone());
                            actions.push(SlotAction::Replace {
                                side,
                                level,
                                original: existing.client_order_id,
                                new_order,
                            });
                        } else {
                            slots[level] = Some(new_order.clone());
                            actions.push(SlotAction::CancelThenNew {
                                side,
                                level,
                                cancel: existing.client_order_id,
                                new_order,
                            });
                        }
                    }
                }
                (Some(existing), None) => {
                    if existing.is_resting() {
                        actions.push(SlotAction::Cancel {
                            side,
                            level,
                            client_order_id: existing.client_order_id,
                        });
                    }
                    slots[level] = None;
                }
                (None, None) => {}
            }
        }

        *ledger.state.lock().unwrap() = SideState::Quoting;
        actions
    }

    fn maybe_reset_throttle(&self, ledger: &SideLedger, params: &QuotingParameters) {
        let mut window_start = ledger.window_start.lock().unwrap();
        if window_start.elapsed() > params.throttle_window {
            *window_start = Instant::now();
            ledger.cumulative_fill_ticks.store(0, AtomicOrdering::Relaxed);
        }
    }

    fn is_throttled(&self, ledger: &SideLedger, params: &QuotingParameters) -> bool {
        let cumulative = ledger.cumulative_fill_ticks.load(AtomicOrdering::Relaxed);
        cumulative >= params.max_fill_qty_per_window.raw()
    }

    fn build_order(&self, side: Side, target: QuoteTarget, params: &QuotingParameters) -> Order {
        let order_type = if params.hit_logic == HitLogic::MakerOnly {
            OrderType::PostOnly
        } else {
            OrderType::Limit
        };
        Order::new(
            self.id_gen.next(),
            self.instrument_id,
            OrderSource::Quoting,
            side,
            order_type,
            TimeInForce::Gtc,
            target.price,
            target.quantity,
        )
    }

    fn cancel_side(&self, side: Side) -> Vec<SlotAction> {
        let ledger = self.side_ledger(side);
        let mut slots = ledger.slots.lock().unwrap();
        let mut actions = Vec::new();
        for (level, slot) in slots.iter_mut().enumerate() {
            if let Some(order) = slot.take() {
                if order.is_resting() {
                    actions.push(SlotAction::Cancel {
                        side,
                        level,
                        client_order_id: order.client_order_id,
                    });
                }
            }
        }
        actions
    }

    fn cancel_all_resting(&self) -> Vec<SlotAction> {
        let mut actions = self.cancel_side(Side::Buy);
        actions.extend(self.cancel_side(Side::Sell));
        actions
    }

    /// Records a fill against the side's rolling throttle window (§4.4)
    /// and updates the resting order's fill state.
    pub fn apply_status_report(&self, side: Side, level: usize, report: &OrderStatusReport) {
        let ledger = self.side_ledger(side);
        let mut slots = ledger.slots.lock().unwrap();
        if let Some(order) = slots.get_mut(level).and_then(|s| s.as_mut()) {
            if order.client_order_id == report.client_order_id {
                let previously_filled = order.filled_quantity;
                order.apply_status_report(report);
                let delta = order.filled_quantity.raw() - previously_filled.raw();
                if delta > 0 {
                    ledger.cumulative_fill_ticks.fetch_add(delta, AtomicOrdering::Relaxed);
                }
            }
        }
    }

    /// Dispatches a plan produced by [`Self::on_source_book_update`].
    /// Every gateway call is spawned onto `self.runtime` and never awaited
    /// here — this function returns immediately (§5.1).
    pub fn dispatch(self: &Arc<Self>, actions: Vec<SlotAction>) {
        for action in actions {
            let engine = Arc::clone(self);
            self.runtime.spawn(async move {
                engine.execute(action).await;
            });
        }
    }

    async fn execute(&self, action: SlotAction) {
        match action {
            SlotAction::Submit { side, level, order } => {
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
                        info!(?side, level, ?client_order_id, "quote submitted");
                    }
                    Ok(OrderPlacementResult::Rejected { client_order_id, reason }) => {
                        warn!(?side, level, ?client_order_id, %reason, "quote rejected");
                        self.clear_slot_on_terminal_failure(side, level);
                    }
                    Err(err) => {
                        warn!(?side, level, error = %err, "gateway failure submitting quote");
                        self.handle_gateway_failure(side, level, &err);
                    }
                }
            }
            SlotAction::Replace { side, level, new_order, .. } => {
                let request = ReplaceOrderRequest {
                    instrument_id: new_order.instrument_id,
                    original_client_order_id: new_order.client_order_id,
                    new_client_order_id: new_order.client_order_id,
                    new_price: new_order.price,
                    new_quantity: new_order.quantity,
                };
                match self.gateway.send_replace_order(request).await {
                    Ok(OrderModificationResult::Rejected { reason, .. }) => {
                        warn!(?side, level, %reason, "replace rejected");
                        self.clear_slot_on_terminal_failure(side, level);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(?side, level, error = %err, "gateway failure replacing quote");
                        self.handle_gateway_failure(side, level, &err);
                    }
                }
            }
            SlotAction::CancelThenNew { side, level, cancel, new_order } => {
                let cancel_request = CancelOrderRequest {
                    instrument_id: new_order.instrument_id,
                    client_order_id: cancel,
                };
                if let Err(err) = self.gateway.send_cancel_order(cancel_request).await {
                    warn!(?side, level, error = %err, "gateway failure cancelling before resubmit");
                    self.handle_gateway_failure(side, level, &err);
                    return;
                }
                let request = NewOrderRequest {
                    instrument_id: new_order.instrument_id,
                    client_order_id: new_order.client_order_id,
                    side: new_order.side,
                    order_type: new_order.order_type,
                    price: new_order.price,
                    quantity: new_order.quantity,
                    time_in_force: new_order.time_in_force,
                };
                if let Err(err) = self.gateway.send_new_order(request).await {
                    warn!(?side, level, error = %err, "gateway failure resubmitting quote");
                    self.handle_gateway_failure(side, level, &err);
                }
            }
            SlotAction::Cancel { side, level, client_order_id } => {
                let request = CancelOrderRequest {
                    instrument_id: self.instrument_id,
                    client_order_id,
                };
                if let Err(err) = self.gateway.send_cancel_order(request).await {
                    warn!(?side, level, error = %err, "gateway failure cancelling quote");
                    self.handle_gateway_failure(side, level, &err);
                }
            }
        }
    }

    fn clear_slot_on_terminal_failure(&self, side: Side, level: usize) {
        let ledger = self.side_ledger(side);
        let mut slots = ledger.slots.lock().unwrap();
        if let Some(slot) = slots.get_mut(level) {
            *slot = None;
        }
    }

    /// Transient gateway failures release the slot to retry on the next
    /// tick; a fatal gateway error pauses the whole engine pending operator
    /// intervention (§4.4 failure semantics).
    fn handle_gateway_failure(&self, side: Side, level: usize, err: &GatewayError) {
        self.clear_slot_on_terminal_failure(side, level);
        if matches!(err, GatewayError::Fatal { .. }) {
            *self.bid.state.lock().unwrap() = SideState::Paused;
            *self.ask.state.lock().unwrap() = SideState::Paused;
        }
    }

    pub fn side_state(&self, side: Side) -> SideState {
        *self.side_ledger(side).state.lock().unwrap()
    }

    pub fn retire(&self) {
        *self.bid.state.lock().unwrap() = SideState::Retired;
        *self.ask.state.lock().unwrap() = SideState::Retired;
    }
}

/// Two candidate prices within `requote_threshold_bp` collapse onto the
/// existing order rather than triggering a replace, so a small fair-value
/// move doesn't churn resting orders (§4.4).
fn requote_needed(current: Price, target: Price, requote_threshold_bp: Decimal) -> bool {
    if current == target {
        return false;
    }
    let current_decimal = current.to_decimal();
    if current_decimal.is_zero() {
        return true;
    }
    let diff_bp = ((target.to_decimal() - current_decimal) / current_decimal).abs() * Decimal::from(10_000);
    diff_bp >= requote_threshold_bp
}
