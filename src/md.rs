//! Market-data handler: owns an order book and turns its mutations into
//! [`MarketDataEvent`]s published onto the strategy-bound ring.
//!
//! Grounded on the teacher crate's feed-handler worker-thread pattern
//! (spawn on `start`, join on `stop`, a `running` flag checked each tick).
//! The handler mutates its book through `order_book_mut()` and only
//! publishes once the caller tells it the mutation is done — the book
//! mutation itself still originates with the caller (order placement,
//! cancellation, trade matching), not inside `on_trade`/`on_book_update`,
//! since those calls differ in what mutation already happened and the
//! handler has no way to infer that from the book alone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use serde::Serialize;

use crate::book::{OrderBook, Price, Qty, Side, TimestampNs};
use crate::error::CoreError;
use crate::ring::SpscRing;

/// Discriminates what populated a [`MarketDataEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventFlag {
    /// Placeholder/empty event; never published.
    None,
    /// A trade occurred.
    Trade,
    /// A resting order was added, cancelled, or filled.
    BookUpdate,
    /// The best bid or ask changed without necessarily trading.
    BestBidAsk,
}

/// A trivially-copyable snapshot of book state plus, optionally, the trade
/// that produced it. Published by value onto the strategy ring.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MarketDataEvent {
    /// What kind of update this event represents.
    pub flag: EventFlag,
    /// Event timestamp.
    pub ts_ns: TimestampNs,
    /// Book mid price at event time.
    pub mid: Price,
    /// Best bid price.
    pub bid: Price,
    /// Best ask price.
    pub ask: Price,
    /// Quantity resting at the best bid.
    pub bid_qty: Qty,
    /// Quantity resting at the best ask.
    pub ask_qty: Qty,
    /// Total resting bid-side volume.
    pub bid_volume: Qty,
    /// Total resting ask-side volume.
    pub ask_volume: Qty,
    /// Price of the trade that produced this event, or 0 for non-trade events.
    pub last_trade_price: Price,
    /// Quantity of the trade that produced this event, or 0 for non-trade events.
    pub last_trade_qty: Qty,
}

impl MarketDataEvent {
    fn snapshot(book: &OrderBook, flag: EventFlag, ts_ns: TimestampNs) -> Self {
        let bid_level = book.best_bid_level();
        let ask_level = book.best_ask_level();
        let mut bid_volume = 0;
        let mut ask_volume = 0;
        book.get_bid_ask_volumes(&mut bid_volume, &mut ask_volume);
        MarketDataEvent {
            flag,
            ts_ns,
            mid: book.mid_price(),
            bid: book.best_bid(),
            ask: book.best_ask(),
            bid_qty: bid_level.total_qty,
            ask_qty: ask_level.total_qty,
            bid_volume,
            ask_volume,
            last_trade_price: 0,
            last_trade_qty: 0,
        }
    }
}

/// Owns an [`OrderBook`] and republishes its state as [`MarketDataEvent`]s
/// onto a ring shared with the strategy engine.
pub struct MarketDataHandler {
    book: OrderBook,
    ring: Arc<SpscRing<MarketDataEvent>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl MarketDataHandler {
    /// Creates a handler owning a fresh book of `max_orders` capacity,
    /// publishing onto `ring`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ZeroPoolCapacity`] if `max_orders` is zero.
    pub fn new(max_orders: usize, ring: Arc<SpscRing<MarketDataEvent>>) -> Result<Self, CoreError> {
        Ok(MarketDataHandler {
            book: OrderBook::new(max_orders)?,
            ring,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }

    /// Borrows the owned book read-only.
    pub fn order_book(&self) -> &OrderBook {
        &self.book
    }

    /// Borrows the owned book mutably, for order placement, cancellation,
    /// or matching ahead of a call to `on_trade`/`on_book_update`.
    pub fn order_book_mut(&mut self) -> &mut OrderBook {
        &mut self.book
    }

    /// Publishes a trade event from the book's current (post-trade) state.
    /// Returns `false` if the ring was full and the event was dropped.
    pub fn on_trade(&self, price: Price, qty: Qty, ts_ns: TimestampNs) -> bool {
        let mut event = MarketDataEvent::snapshot(&self.book, EventFlag::Trade, ts_ns);
        event.last_trade_price = price;
        event.last_trade_qty = qty;
        let ok = self.ring.try_push(event);
        if !ok {
            tracing::warn!(price, qty, "market data ring full, trade event dropped");
        }
        ok
    }

    /// Publishes a book-update event from the book's current (post-mutation)
    /// state. `side`/`price`/`delta_qty`/`is_add` describe the mutation for
    /// tracing only.
    pub fn on_book_update(&self, side: Side, price: Price, delta_qty: Qty, is_add: bool) -> bool {
        let event = MarketDataEvent::snapshot(&self.book, EventFlag::BookUpdate, 0);
        let ok = self.ring.try_push(event);
        tracing::trace!(?side, price, delta_qty, is_add, published = ok, "book update");
        ok
    }

    /// Spawns the handler's worker thread. The worker currently only sleeps;
    /// it exists so the architecture has a place to grow a future
    /// source-polling loop without changing the public surface.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let running = Arc::clone(&self.running);
        self.worker = Some(std::thread::spawn(move || {
            while running.load(Ordering::Acquire) {
                std::thread::sleep(Duration::from_millis(10));
            }
        }));
    }

    /// Stops the worker thread and joins it.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MarketDataHandler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_trade_publishes_a_snapshot_with_trade_fields_set() {
        let ring = Arc::new(SpscRing::new(8).unwrap());
        let mut handler = MarketDataHandler::new(16, ring.clone()).unwrap();
        handler.order_book_mut().add_order(1, 100, 10, Side::Buy, 0);
        handler.order_book_mut().add_order(2, 101, 10, Side::Sell, 0);

        assert!(handler.on_trade(100, 5, 42));
        let event = ring.try_pop().unwrap();
        assert_eq!(event.flag, EventFlag::Trade);
        assert_eq!(event.last_trade_price, 100);
        assert_eq!(event.last_trade_qty, 5);
        assert_eq!(event.bid, 100);
        assert_eq!(event.ask, 101);
    }

    #[test]
    fn on_book_update_reports_ring_full_as_drop() {
        let ring = Arc::new(SpscRing::new(2).unwrap());
        let handler = MarketDataHandler::new(16, ring).unwrap();
        assert!(handler.on_book_update(Side::Buy, 100, 1, true));
        assert!(handler.on_book_update(Side::Buy, 100, 1, true));
        assert!(!handler.on_book_update(Side::Buy, 100, 1, true));
    }

    #[test]
    fn zero_max_orders_is_rejected() {
        let ring = Arc::new(SpscRing::new(8).unwrap());
        assert!(matches!(
            MarketDataHandler::new(0, ring),
            Err(CoreError::ZeroPoolCapacity)
        ));
    }

    #[test]
    fn start_stop_joins_the_worker_thread_cleanly() {
        let ring = Arc::new(SpscRing::new(8).unwrap());
        let mut handler = MarketDataHandler::new(8, ring).unwrap();
        handler.start();
        std::thread::sleep(Duration::from_millis(5));
        handler.stop();
    }
}
