//! Low-latency core of a market-making engine.
//!
//! Three logical stages run on three threads, connected by lock-free ring
//! buffers with no locks and no allocation once warmed up:
//!
//! 1. Market data arrives and mutates an [`book::OrderBook`]; [`md`] turns
//!    each mutation into a [`md::MarketDataEvent`] and publishes it onto a
//!    [`ring::SpscRing`].
//! 2. [`strategy::StrategyEngine`] drains that ring, smooths an
//!    order-book-imbalance signal ([`signal`]), computes an
//!    Avellaneda-Stoikov quote ([`quoter`]), and gates it through
//!    [`risk::RiskEngine`].
//! 3. Accepted quotes are handed to a caller-supplied [`strategy::OrderSink`]
//!    for dispatch (FIX, a simulator, or a test harness).
//!
//! FIX encoding, persistence, tick storage, CPU pinning, process wiring, and
//! language bindings live outside this crate; it owns only the parts on the
//! hot path. [`config::EngineConfig`] gathers every construction parameter
//! the pieces above need in one serializable place.

pub mod book;
pub mod config;
pub mod error;
pub mod md;
pub mod pool;
pub mod prelude;
pub mod quoter;
pub mod ring;
pub mod risk;
pub mod signal;
pub mod stats;
pub mod strategy;
