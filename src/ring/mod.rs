//! Lock-free ring buffers used to hand values between threads without
//! allocation or locking on the hot path.
//!
//! [`spsc::SpscRing`] is the market-data-to-strategy channel (§5: exactly one
//! producer, exactly one consumer). [`mpmc::MpmcRing`] is provided for the
//! many-writer case (e.g. several risk observers or a future multi-feed
//! handler) described in §4.C.

pub mod mpmc;
pub mod spsc;

pub use mpmc::MpmcRing;
pub use spsc::SpscRing;
