//! Plain data types shared by the order book.

use serde::Serialize;

/// Fixed-point tick price.
pub type Price = i64;
/// Contract/share quantity.
pub type Qty = i64;
/// Caller-supplied monotonic order identifier.
pub type OrderId = u64;
/// Nanosecond timestamp counter.
pub type TimestampNs = i64;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    /// Resting/aggressing buy order.
    Buy,
    /// Resting/aggressing sell order.
    Sell,
}

impl Side {
    /// The opposite side.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// A single resting order. Lives exclusively inside a pool-owned
/// [`super::book::OrderNode`]; never copied on the hot path.
#[derive(Debug, Clone, Copy)]
pub struct Order {
    /// Caller-supplied identifier.
    pub id: OrderId,
    /// Limit price.
    pub price: Price,
    /// Remaining quantity (decremented in place on partial fill).
    pub qty: Qty,
    /// Side of the book this order rests on.
    pub side: Side,
    /// Creation timestamp, used only for diagnostics (FIFO order is
    /// determined by arrival into the level's node list, not by comparing
    /// timestamps).
    pub created_ns: TimestampNs,
}

/// A completed match between a resting order and an aggressor.
///
/// `bid_id` always carries the resting order's id and `ask_id` is always 0,
/// regardless of which side rested — the aggressor's id is not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trade {
    /// The resting order's id.
    pub bid_id: OrderId,
    /// Always 0; the aggressor's id is not retained.
    pub ask_id: OrderId,
    /// Price at which the trade occurred (the resting level's price).
    pub price: Price,
    /// Quantity filled.
    pub qty: Qty,
    /// Time of the trade.
    pub time_ns: TimestampNs,
}

/// A snapshot of a price level's aggregate state, returned by
/// `best_bid_level`/`best_ask_level`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelInfo {
    /// Level price.
    pub price: Price,
    /// Summed quantity of every order resting at this price.
    pub total_qty: Qty,
    /// Reserved for a future order count; always 0 today.
    pub order_count: u32,
}
