//! Strategy engine: drains market-data events, computes Avellaneda-Stoikov
//! quotes skewed by order-book imbalance, and gates them through risk before
//! handing them to a capability object rather than a heap-allocated closure
//! (the same callback-trait style the teacher crate uses at its engine/order
//! boundary, chosen per §9's redesign note so the hot loop never allocates).

use std::sync::Arc;

use crate::book::{OrderId, Price, Qty, Side};
use crate::md::MarketDataEvent;
use crate::quoter::AvellanedaStoikov;
use crate::ring::SpscRing;
use crate::risk::RiskEngine;
use crate::signal::ObiSignal;

/// Receives quoting decisions and cancellations from [`StrategyEngine`].
/// Implemented by whatever layer turns a quote into an order (FIX session,
/// simulator, test harness); kept as a trait object instead of a closure so
/// `poll` never allocates on the hot path.
pub trait OrderSink {
    /// A new order at `price`/`qty` on `side` was accepted by risk.
    /// `is_bid` restates `side` as a bool for adapters that key off it
    /// directly. `id` is always 0 at this layer — a higher layer assigns a
    /// real id before FIX dispatch.
    fn on_order(&mut self, id: OrderId, price: Price, qty: Qty, side: Side, is_bid: bool);

    /// A previously emitted order should be cancelled.
    fn on_cancel(&mut self, id: OrderId);
}

/// Binds a market-data ring, a risk gate, and Avellaneda-Stoikov parameters
/// into a single polling loop.
pub struct StrategyEngine {
    ring: Arc<SpscRing<MarketDataEvent>>,
    risk: Arc<RiskEngine>,
    quoter: AvellanedaStoikov,
    obi: ObiSignal,
    k: f64,
    quote_qty: Qty,
    session_start_ns: i64,
    order_sink: Option<Box<dyn OrderSink>>,
    cancel_sink: Option<Box<dyn OrderSink>>,
}

impl StrategyEngine {
    /// Creates an engine bound to `ring` (the same ring the market-data
    /// handler publishes onto), `risk`, and the given Avellaneda-Stoikov
    /// parameters. `session_start_ns` anchors the `t_sec` fed to the
    /// reservation-price model. No callbacks are registered yet; see
    /// [`StrategyEngine::set_order_callback`]/[`StrategyEngine::set_cancel_callback`].
    pub fn new(
        ring: Arc<SpscRing<MarketDataEvent>>,
        risk: Arc<RiskEngine>,
        quoter: AvellanedaStoikov,
        obi_alpha: f64,
        k: f64,
        quote_qty: Qty,
        session_start_ns: i64,
    ) -> Self {
        StrategyEngine {
            ring,
            risk,
            quoter,
            obi: ObiSignal::new(obi_alpha),
            k,
            quote_qty,
            session_start_ns,
            order_sink: None,
            cancel_sink: None,
        }
    }

    /// Registers the capability object that receives `on_order` calls.
    pub fn set_order_callback(&mut self, sink: Box<dyn OrderSink>) {
        self.order_sink = Some(sink);
    }

    /// Registers the capability object that receives `on_cancel` calls.
    pub fn set_cancel_callback(&mut self, sink: Box<dyn OrderSink>) {
        self.cancel_sink = Some(sink);
    }

    /// Updates the Avellaneda-Stoikov order-arrival decay parameter used by
    /// subsequent `poll` calls.
    pub fn set_k(&mut self, k: f64) {
        self.k = k;
    }

    /// Forwards to the bound quoter's reservation price at zero inventory
    /// skew, for external inspection/diagnostics.
    pub fn reservation_price(&self, mid: f64, t_seconds: f64, inventory: f64) -> f64 {
        self.quoter.reservation_price(mid, t_seconds, inventory)
    }

    /// Current smoothed order-book imbalance.
    pub fn obi_signal(&self) -> f64 {
        self.obi.value()
    }

    /// Requests cancellation of a previously emitted order. No-op if no
    /// cancel callback has been registered.
    pub fn cancel(&mut self, id: OrderId) {
        if let Some(sink) = self.cancel_sink.as_mut() {
            sink.on_cancel(id);
        }
    }

    /// Drains every event currently queued on the ring (non-blocking) and,
    /// for each, computes a fresh two-sided quote and offers it to the
    /// registered order callback once per side that clears the risk gate.
    /// Inventory is fixed at zero: tracking a live position is a deliberate
    /// future extension, not a gap in this pass.
    pub fn poll(&mut self) {
        while let Some(event) = self.ring.try_pop() {
            self.handle_event(&event);
        }
    }

    fn handle_event(&mut self, event: &MarketDataEvent) {
        let obi_skew = self.obi.update(event.bid_volume, event.ask_volume);
        let mid = event.mid as f64;
        let t_sec = (event.ts_ns - self.session_start_ns) as f64 / 1e9;
        let inventory = 0.0;

        let (bid, ask) = self.quoter.get_quotes(mid, t_sec, inventory, self.k, obi_skew);
        let bid_price = bid.round() as Price;
        let ask_price = ask.round() as Price;

        let Some(sink) = self.order_sink.as_mut() else {
            return;
        };
        if self.risk.check_order(bid_price, self.quote_qty, Side::Buy) {
            sink.on_order(0, bid_price, self.quote_qty, Side::Buy, true);
        }
        if self.risk.check_order(ask_price, self.quote_qty, Side::Sell) {
            sink.on_order(0, ask_price, self.quote_qty, Side::Sell, false);
        }
    }
}
