//! Pooled, index-addressable limit order book.
//!
//! Every resting order lives in a [`crate::pool::Pool`]-owned `OrderNode`,
//! addressed by a stable `u32` handle — the arena-and-handle redesign §9
//! calls for in place of intrusive raw-pointer linked lists. Price levels
//! are kept in a `BTreeMap<Price, PriceLevel>` per side, which gives
//! amortized O(log n) best-price maintenance for free from the map's
//! ordering (§4.D permits either an O(log n) sorted structure or an O(1)
//! amortized doubly-linked level chain; this crate takes the former, the
//! simpler of the two, since nothing in the spec requires O(1) level
//! traversal — only O(1) `best_bid`/`best_ask` reads, which the cached
//! `best_bid`/`best_ask` fields provide).
//!
//! The book is **not internally synchronized** (§5): all mutating calls must
//! come from a single thread. Readers on other threads are unsupported; the
//! market-data handler publishes snapshots onto a ring instead of letting
//! the strategy thread touch the book directly.

use std::collections::{BTreeMap, HashMap};

use crate::error::CoreError;
use crate::pool::{Handle, Pool};

use super::types::{LevelInfo, Order, OrderId, Price, Qty, Side, TimestampNs, Trade};

/// An order plus its intrusive links within a price level's FIFO chain.
struct OrderNode {
    order: Order,
    prev: Option<Handle>,
    next: Option<Handle>,
}

/// One price's worth of resting orders, FIFO by arrival (head oldest).
struct PriceLevel {
    total_qty: Qty,
    head: Option<Handle>,
    tail: Option<Handle>,
}

impl PriceLevel {
    fn empty() -> Self {
        PriceLevel {
            total_qty: 0,
            head: None,
            tail: None,
        }
    }
}

/// A pooled limit order book for one symbol.
pub struct OrderBook {
    pool: Pool<OrderNode>,
    bids: BTreeMap<Price, PriceLevel>,
    asks: BTreeMap<Price, PriceLevel>,
    order_index: HashMap<OrderId, Handle>,
    best_bid: Option<Price>,
    best_ask: Option<Price>,
    bid_volume_total: Qty,
    ask_volume_total: Qty,
}

impl OrderBook {
    /// Creates an empty book whose order-node pool holds up to `max_orders`
    /// live orders at once.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ZeroPoolCapacity`] if `max_orders` is zero.
    pub fn new(max_orders: usize) -> Result<Self, CoreError> {
        Ok(OrderBook {
            pool: Pool::new(max_orders)?,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_index: HashMap::new(),
            best_bid: None,
            best_ask: None,
            bid_volume_total: 0,
            ask_volume_total: 0,
        })
    }

    fn levels(&self, side: Side) -> &BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn levels_mut(&mut self, side: Side) -> &mut BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Adds a new resting order. Returns `false` on a duplicate id or pool
    /// exhaustion; `qty` must be positive. Never crosses the book itself —
    /// crossing is the caller's responsibility via [`OrderBook::match_order`]
    /// (§9: "crossing on add").
    pub fn add_order(&mut self, id: OrderId, price: Price, qty: Qty, side: Side, created_ns: TimestampNs) -> bool {
        if qty <= 0 || self.order_index.contains_key(&id) {
            return false;
        }
        let node = OrderNode {
            order: Order {
                id,
                price,
                qty,
                side,
                created_ns,
            },
            prev: None,
            next: None,
        };
        let Some(handle) = self.pool.allocate(node) else {
            tracing::warn!(id, "add_order rejected: pool exhausted");
            return false;
        };

        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = levels.entry(price).or_insert_with(PriceLevel::empty);
        if let Some(tail) = level.tail {
            self.pool.get_mut(tail).next = Some(handle);
            self.pool.get_mut(handle).prev = Some(tail);
        } else {
            level.head = Some(handle);
        }
        level.tail = Some(handle);
        level.total_qty += qty;

        self.order_index.insert(id, handle);
        match side {
            Side::Buy => self.bid_volume_total += qty,
            Side::Sell => self.ask_volume_total += qty,
        }

        match side {
            Side::Buy if self.best_bid.map_or(true, |b| price > b) => {
                self.best_bid = Some(price);
                tracing::debug!(price, "new best bid");
            }
            Side::Sell if self.best_ask.map_or(true, |a| price < a) => {
                self.best_ask = Some(price);
                tracing::debug!(price, "new best ask");
            }
            _ => {}
        }
        tracing::trace!(id, price, qty, ?side, "order added");
        true
    }

    /// Cancels a resting order by id. Idempotent: a missing id is a no-op.
    pub fn cancel_order(&mut self, id: OrderId) {
        let Some(handle) = self.order_index.remove(&id) else {
            return;
        };
        let node = self.pool.deallocate(handle);
        let side = node.order.side;
        let price = node.order.price;

        // Borrow `bids`/`asks` directly so `self.pool` can still be borrowed
        // mutably below while `level` is alive (see the note in
        // `match_order`).
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = levels.get_mut(&price).expect("order_index points into a live level (I1)");

        match node.prev {
            Some(prev) => self.pool.get_mut(prev).next = node.next,
            None => level.head = node.next,
        }
        match node.next {
            Some(next) => self.pool.get_mut(next).prev = node.prev,
            None => level.tail = node.prev,
        }
        level.total_qty -= node.order.qty;
        let emptied = level.total_qty <= 0;

        match side {
            Side::Buy => self.bid_volume_total -= node.order.qty,
            Side::Sell => self.ask_volume_total -= node.order.qty,
        }

        if emptied {
            self.levels_mut(side).remove(&price);
            self.recompute_best_if_needed(side, price);
        }
        tracing::trace!(id, "order cancelled");
    }

    /// Cancels by id; `price`/`side` are advisory hints only (§4.D).
    pub fn cancel_order_hinted(&mut self, id: OrderId, _price: Price, _side: Side) {
        self.cancel_order(id);
    }

    /// Recomputes `best_bid`/`best_ask` after the level at `removed_price`
    /// (on `side`) was destroyed, but only if that level had been the cached
    /// best — otherwise the cache is still correct and untouched.
    fn recompute_best_if_needed(&mut self, side: Side, removed_price: Price) {
        match side {
            Side::Buy if self.best_bid == Some(removed_price) => {
                self.best_bid = self.bids.keys().next_back().copied();
            }
            Side::Sell if self.best_ask == Some(removed_price) => {
                self.best_ask = self.asks.keys().next().copied();
            }
            _ => {}
        }
    }

    /// Matches an aggressor of `qty` on `side` against the opposite book,
    /// walking from the opposite side's best price inward in strict
    /// price-time priority. Appends one [`Trade`] per resting node touched
    /// to `out_fills` and returns the quantity actually filled (may be less
    /// than `qty` if the opposite book is thinner than the request).
    ///
    /// For `side = Buy` this consumes ask levels starting at `best_ask`
    /// and walking upward; for `side = Sell` it consumes bid levels
    /// starting at `best_bid` and walking downward — the match-side fix
    /// §9 calls out (the source material inverted which side's levels were
    /// removed/re-bested).
    pub fn match_order(&mut self, side: Side, qty: Qty, time_ns: TimestampNs, out_fills: &mut Vec<Trade>) -> Qty {
        let opposite = side.opposite();
        let mut remaining = qty;

        while remaining > 0 {
            let Some(&price) = self.levels(opposite).keys().next_if_best(opposite) else {
                break;
            };
            // Borrow `bids`/`asks` directly (not through `levels_mut`, which
            // takes `&mut self` and would make the compiler treat `pool` and
            // `order_index` as still-borrowed for as long as `level` lives).
            let levels = match opposite {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            let level = levels
                .get_mut(&price)
                .expect("best price always names a live level (I3)");
            let emptied = Self::drain_level(
                &mut self.pool,
                level,
                &mut self.order_index,
                time_ns,
                price,
                &mut remaining,
                out_fills,
            );
            if emptied {
                levels.remove(&price);
                self.recompute_best_if_needed(opposite, price);
            }
        }

        let filled = qty - remaining;
        match side {
            Side::Buy => self.ask_volume_total -= filled,
            Side::Sell => self.bid_volume_total -= filled,
        }
        tracing::trace!(?side, requested = qty, filled, "match_order");
        filled
    }

    /// Consumes resting quantity from the head of `level` until either
    /// `*remaining` reaches zero or the level empties. Returns `true` if the
    /// level is now empty.
    #[allow(clippy::too_many_arguments)]
    fn drain_level(
        pool: &mut Pool<OrderNode>,
        level: &mut PriceLevel,
        order_index: &mut HashMap<OrderId, Handle>,
        time_ns: TimestampNs,
        price: Price,
        remaining: &mut Qty,
        out_fills: &mut Vec<Trade>,
    ) -> bool {
        while *remaining > 0 {
            let Some(head) = level.head else { break };
            let node_qty = pool.get(head).order.qty;
            let resting_id = pool.get(head).order.id;
            let fill_qty = node_qty.min(*remaining);

            out_fills.push(Trade {
                bid_id: resting_id,
                ask_id: 0,
                price,
                qty: fill_qty,
                time_ns,
            });
            *remaining -= fill_qty;
            level.total_qty -= fill_qty;

            if fill_qty == node_qty {
                let next = pool.get(head).next;
                order_index.remove(&resting_id);
                pool.deallocate(head);
                level.head = next;
                match next {
                    Some(n) => pool.get_mut(n).prev = None,
                    None => level.tail = None,
                }
            } else {
                pool.get_mut(head).order.qty -= fill_qty;
            }
        }
        level.head.is_none()
    }

    /// Cached best bid price, or 0 if the bid side is empty.
    pub fn best_bid(&self) -> Price {
        self.best_bid.unwrap_or(0)
    }

    /// Cached best ask price, or 0 if the ask side is empty.
    pub fn best_ask(&self) -> Price {
        self.best_ask.unwrap_or(0)
    }

    /// `(best_bid + best_ask) / 2` (integer division) when both sides are
    /// non-empty; the non-empty side's price when only one side has
    /// liquidity; 0 when both are empty.
    pub fn mid_price(&self) -> Price {
        match (self.best_bid, self.best_ask) {
            (Some(b), Some(a)) => (b + a) / 2,
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => 0,
        }
    }

    /// Total resting quantity on the bid side. O(1): maintained
    /// incrementally by `add_order`/`cancel_order`/`match_order` (§9).
    pub fn bid_volume(&self) -> Qty {
        self.bid_volume_total
    }

    /// Total resting quantity on the ask side. O(1), incrementally maintained.
    pub fn ask_volume(&self) -> Qty {
        self.ask_volume_total
    }

    /// Writes both side totals into `out_bid`/`out_ask`.
    pub fn get_bid_ask_volumes(&self, out_bid: &mut Qty, out_ask: &mut Qty) {
        *out_bid = self.bid_volume_total;
        *out_ask = self.ask_volume_total;
    }

    /// Snapshot of the best bid level, or a zeroed `LevelInfo` if the bid
    /// side is empty.
    pub fn best_bid_level(&self) -> LevelInfo {
        self.level_info(Side::Buy, self.best_bid)
    }

    /// Snapshot of the best ask level, or a zeroed `LevelInfo` if the ask
    /// side is empty.
    pub fn best_ask_level(&self) -> LevelInfo {
        self.level_info(Side::Sell, self.best_ask)
    }

    fn level_info(&self, side: Side, price: Option<Price>) -> LevelInfo {
        match price {
            Some(p) => {
                let level = self.levels(side).get(&p).expect("best price names a live level");
                LevelInfo {
                    price: p,
                    total_qty: level.total_qty,
                    order_count: 0,
                }
            }
            None => LevelInfo::default(),
        }
    }

    /// Lazily iterates `(price, total_qty)` for every level on `side`, in
    /// time/price priority order (best first): descending for bids,
    /// ascending for asks.
    pub fn levels_iter(&self, side: Side) -> Box<dyn Iterator<Item = (Price, Qty)> + '_> {
        match side {
            Side::Buy => Box::new(self.bids.iter().rev().map(|(&p, l)| (p, l.total_qty))),
            Side::Sell => Box::new(self.asks.iter().map(|(&p, l)| (p, l.total_qty))),
        }
    }

    /// Number of orders currently resting in the book.
    pub fn order_count(&self) -> usize {
        self.pool.size_used()
    }
}

/// Helper trait giving `levels(side).keys()` the right traversal direction
/// (descending for bids/`best_bid`, ascending for asks/`best_ask`) without
/// duplicating the match loop per side.
trait BestKeyIter<'a> {
    fn next_if_best(self, side: Side) -> Option<&'a Price>;
}

impl<'a, I> BestKeyIter<'a> for I
where
    I: DoubleEndedIterator<Item = &'a Price>,
{
    fn next_if_best(mut self, side: Side) -> Option<&'a Price> {
        match side {
            Side::Buy => self.next_back(),
            Side::Sell => self.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_bid_ask_track_the_tightest_resting_price() {
        let mut book = OrderBook::new(16).unwrap();
        assert_eq!(book.best_bid(), 0);
        assert_eq!(book.best_ask(), 0);

        book.add_order(1, 100, 10, Side::Buy, 0);
        book.add_order(2, 99, 5, Side::Buy, 0);
        assert_eq!(book.best_bid(), 100);

        book.add_order(3, 105, 10, Side::Sell, 0);
        book.add_order(4, 110, 5, Side::Sell, 0);
        assert_eq!(book.best_ask(), 105);
        assert_eq!(book.mid_price(), (100 + 105) / 2);
    }

    #[test]
    fn cancelling_the_best_level_recomputes_the_next_best() {
        let mut book = OrderBook::new(16).unwrap();
        book.add_order(1, 100, 10, Side::Buy, 0);
        book.add_order(2, 99, 5, Side::Buy, 0);
        book.cancel_order(1);
        assert_eq!(book.best_bid(), 99);

        book.cancel_order(2);
        assert_eq!(book.best_bid(), 0);
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn cancel_is_idempotent_for_unknown_ids() {
        let mut book = OrderBook::new(16).unwrap();
        book.cancel_order(999);
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn duplicate_id_and_non_positive_qty_are_rejected() {
        let mut book = OrderBook::new(16).unwrap();
        assert!(book.add_order(1, 100, 10, Side::Buy, 0));
        assert!(!book.add_order(1, 101, 5, Side::Buy, 0));
        assert!(!book.add_order(2, 100, 0, Side::Buy, 0));
    }

    #[test]
    fn pool_exhaustion_rejects_further_orders() {
        let mut book = OrderBook::new(2).unwrap();
        assert!(book.add_order(1, 100, 1, Side::Buy, 0));
        assert!(book.add_order(2, 100, 1, Side::Buy, 0));
        assert!(!book.add_order(3, 100, 1, Side::Buy, 0));
    }

    #[test]
    fn orders_at_a_level_fill_in_strict_fifo_arrival_order() {
        let mut book = OrderBook::new(16).unwrap();
        book.add_order(1, 100, 4, Side::Sell, 0);
        book.add_order(2, 100, 6, Side::Sell, 1);

        let mut fills = Vec::new();
        let filled = book.match_order(Side::Buy, 5, 10, &mut fills);

        assert_eq!(filled, 5);
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].bid_id, 1);
        assert_eq!(fills[0].ask_id, 0);
        assert_eq!(fills[0].qty, 4);
        assert_eq!(fills[1].bid_id, 2);
        assert_eq!(fills[1].ask_id, 0);
        assert_eq!(fills[1].qty, 1);
    }

    #[test]
    fn matching_a_buy_consumes_ask_levels_from_best_upward() {
        let mut book = OrderBook::new(16).unwrap();
        book.add_order(1, 101, 10, Side::Sell, 0);
        book.add_order(2, 100, 10, Side::Sell, 0);

        let mut fills = Vec::new();
        book.match_order(Side::Buy, 12, 0, &mut fills);

        assert_eq!(fills[0].price, 100);
        assert_eq!(fills[1].price, 101);
        assert_eq!(book.best_ask(), 101);
        assert_eq!(book.ask_volume(), 8);
    }

    #[test]
    fn matching_a_sell_consumes_bid_levels_from_best_downward() {
        let mut book = OrderBook::new(16).unwrap();
        book.add_order(1, 99, 10, Side::Buy, 0);
        book.add_order(2, 100, 10, Side::Buy, 0);

        let mut fills = Vec::new();
        book.match_order(Side::Sell, 12, 0, &mut fills);

        assert_eq!(fills[0].price, 100);
        assert_eq!(fills[1].price, 99);
        assert_eq!(book.best_bid(), 99);
        assert_eq!(book.bid_volume(), 8);
    }

    #[test]
    fn match_returns_less_than_requested_when_book_is_thin() {
        let mut book = OrderBook::new(16).unwrap();
        book.add_order(1, 100, 3, Side::Sell, 0);
        let mut fills = Vec::new();
        let filled = book.match_order(Side::Buy, 10, 0, &mut fills);
        assert_eq!(filled, 3);
        assert_eq!(book.best_ask(), 0);
    }

    #[test]
    fn levels_iter_walks_price_time_priority_order() {
        let mut book = OrderBook::new(16).unwrap();
        book.add_order(1, 100, 1, Side::Buy, 0);
        book.add_order(2, 102, 1, Side::Buy, 0);
        book.add_order(3, 101, 1, Side::Buy, 0);

        let prices: Vec<Price> = book.levels_iter(Side::Buy).map(|(p, _)| p).collect();
        assert_eq!(prices, vec![102, 101, 100]);
    }

    #[test]
    fn partial_fill_leaves_remaining_qty_on_the_resting_order() {
        let mut book = OrderBook::new(16).unwrap();
        book.add_order(1, 100, 10, Side::Sell, 0);
        let mut fills = Vec::new();
        book.match_order(Side::Buy, 4, 0, &mut fills);

        let level = book.best_ask_level();
        assert_eq!(level.total_qty, 6);
        assert_eq!(book.order_count(), 1);
    }
}
