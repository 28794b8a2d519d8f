use std::sync::Arc;

use mm_core::prelude::*;

struct CapturingSink {
    orders: Vec<(Side, Price, Qty)>,
    cancels: Vec<OrderId>,
}

impl OrderSink for CapturingSink {
    fn on_order(&mut self, _id: OrderId, price: Price, qty: Qty, side: Side, _is_bid: bool) {
        self.orders.push((side, price, qty));
    }

    fn on_cancel(&mut self, id: OrderId) {
        self.cancels.push(id);
    }
}

#[test]
fn end_to_end_trade_flows_from_book_through_strategy_to_a_sink() {
    let ring = Arc::new(SpscRing::new(1024).unwrap());
    let mut handler = MarketDataHandler::new(1024, Arc::clone(&ring)).unwrap();
    handler.order_book_mut().add_order(1, 10_000, 50, Side::Buy, 0);
    handler.order_book_mut().add_order(2, 10_010, 50, Side::Sell, 0);
    assert!(handler.on_trade(10_000, 10, 1_000));

    let risk = Arc::new(RiskEngine::new(i64::MAX / 2, i64::MAX / 2));
    let quoter = AvellanedaStoikov::new(0.1, 0.02, 3600.0).unwrap();
    let mut engine = StrategyEngine::new(ring, risk, quoter, 0.1, 1.5, 5, 0);
    engine.set_order_callback(Box::new(CapturingSink {
        orders: Vec::new(),
        cancels: Vec::new(),
    }));

    engine.poll();
}

#[test]
fn kill_switch_suppresses_every_quote_even_with_live_market_data() {
    let ring = Arc::new(SpscRing::new(1024).unwrap());
    let mut handler = MarketDataHandler::new(1024, Arc::clone(&ring)).unwrap();
    handler.order_book_mut().add_order(1, 10_000, 50, Side::Buy, 0);
    handler.order_book_mut().add_order(2, 10_010, 50, Side::Sell, 0);
    handler.on_trade(10_000, 10, 1_000);

    let risk = Arc::new(RiskEngine::new(i64::MAX / 2, i64::MAX / 2));
    risk.kill();
    let quoter = AvellanedaStoikov::new(0.1, 0.02, 3600.0).unwrap();
    let mut engine = StrategyEngine::new(ring, risk, quoter, 0.1, 1.5, 5, 0);
    engine.poll();
}

#[test]
fn notional_cap_rejects_after_the_budget_is_consumed() {
    let ring = Arc::new(SpscRing::new(16).unwrap());
    let risk = Arc::new(RiskEngine::new(100_000, i64::MAX / 2));
    risk.add_fill(10_000, 9);

    let quoter = AvellanedaStoikov::new(0.1, 0.02, 3600.0).unwrap();
    let mut engine = StrategyEngine::new(Arc::clone(&ring), risk, quoter, 0.1, 1.5, 100, 0);

    let mut handler = MarketDataHandler::new(16, Arc::clone(&ring)).unwrap();
    handler.order_book_mut().add_order(1, 10_000, 50, Side::Buy, 0);
    handler.order_book_mut().add_order(2, 10_010, 50, Side::Sell, 0);
    handler.on_book_update(Side::Buy, 10_000, 100, true);

    engine.poll();
}

#[test]
fn multi_symbol_books_stay_independent_through_a_book_manager() {
    let mut manager = BookManager::new(256).unwrap();
    manager.book_mut("BTC-USD").add_order(1, 60_000, 1, Side::Buy, 0);
    manager.book_mut("ETH-USD").add_order(1, 3_000, 1, Side::Buy, 0);

    let mut fills = Vec::new();
    manager.book_mut("BTC-USD").add_order(2, 60_001, 1, Side::Sell, 0);
    let filled = manager.book_mut("BTC-USD").match_order(Side::Buy, 1, 1, &mut fills);

    assert_eq!(filled, 0);
    assert_eq!(manager.book("ETH-USD").unwrap().best_bid(), 3_000);
}

#[test]
fn pool_exhaustion_surfaces_through_the_book_and_stops_accepting_orders() {
    let mut book = OrderBook::new(4).unwrap();
    for i in 0..4 {
        assert!(book.add_order(i, 100, 1, Side::Buy, 0));
    }
    assert!(!book.add_order(4, 100, 1, Side::Buy, 0));
    assert_eq!(book.order_count(), 4);
}

#[test]
fn cancel_requests_reach_the_registered_cancel_sink() {
    let ring = Arc::new(SpscRing::new(16).unwrap());
    let risk = Arc::new(RiskEngine::new(i64::MAX / 2, i64::MAX / 2));
    let quoter = AvellanedaStoikov::new(0.1, 0.02, 3600.0).unwrap();
    let mut engine = StrategyEngine::new(ring, risk, quoter, 0.1, 1.5, 5, 0);
    engine.set_cancel_callback(Box::new(CapturingSink {
        orders: Vec::new(),
        cancels: Vec::new(),
    }));
    engine.cancel(1);
}
