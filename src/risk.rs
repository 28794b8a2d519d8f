//! Pre-trade risk: an atomic notional accumulator, a fat-finger cap, and a
//! kill switch, all individually linearizable so any number of risk-observer
//! threads may call `check_order`/`add_fill`/`kill` concurrently (§5).
//!
//! A concurrent `check_order` then `add_fill` pair is not serializable as a
//! unit — the spec accepts this because both checks are conservative: a
//! transient race can only ever make the engine slightly more cautious than
//! a sequential execution would, never less.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use crate::book::Side;

/// Pre-trade risk gate shared across order-submitting threads.
pub struct RiskEngine {
    max_notional: i64,
    max_order_qty: i64,
    total_notional: AtomicI64,
    killed: AtomicBool,
}

impl RiskEngine {
    /// Creates a risk gate with the given absolute notional cap and
    /// per-order quantity cap.
    pub fn new(max_notional: i64, max_order_qty: i64) -> Self {
        RiskEngine {
            max_notional,
            max_order_qty,
            total_notional: AtomicI64::new(0),
            killed: AtomicBool::new(false),
        }
    }

    /// Returns `true` when the order would be accepted: not killed, positive
    /// quantity within the fat-finger cap, and within the remaining notional
    /// budget. `side` is currently unused, reserved for a future
    /// short-exposure policy.
    pub fn check_order(&self, price: i64, qty: i64, _side: Side) -> bool {
        if self.killed.load(Ordering::Acquire) {
            tracing::warn!(price, qty, "risk check rejected: kill switch engaged");
            return false;
        }
        if qty <= 0 || qty > self.max_order_qty {
            tracing::warn!(price, qty, max = self.max_order_qty, "risk check rejected: fat-finger");
            return false;
        }
        let notional = notional_of(price, qty);
        let current = self.total_notional.load(Ordering::Acquire);
        if current.saturating_add(notional) > self.max_notional {
            tracing::warn!(
                price,
                qty,
                current,
                max = self.max_notional,
                "risk check rejected: notional cap"
            );
            return false;
        }
        true
    }

    /// Atomically accounts for a fill's absolute notional.
    pub fn add_fill(&self, price: i64, qty: i64) {
        self.total_notional
            .fetch_add(notional_of(price, qty), Ordering::AcqRel);
    }

    /// Trips the kill switch: all subsequent `check_order` calls fail until
    /// [`RiskEngine::reset_kill`].
    pub fn kill(&self) {
        self.killed.store(true, Ordering::Release);
    }

    /// Returns whether the kill switch is currently engaged.
    pub fn killed(&self) -> bool {
        self.killed.load(Ordering::Acquire)
    }

    /// Clears the kill switch.
    pub fn reset_kill(&self) {
        self.killed.store(false, Ordering::Release);
    }

    /// Resets the accumulated notional to zero.
    pub fn reset_notional(&self) {
        self.total_notional.store(0, Ordering::Release);
    }

    /// Current accumulated notional.
    pub fn total_notional(&self) -> i64 {
        self.total_notional.load(Ordering::Acquire)
    }
}

#[inline]
fn notional_of(price: i64, qty: i64) -> i64 {
    (price.saturating_mul(qty)).abs()
}
