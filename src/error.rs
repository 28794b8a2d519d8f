//! Construction-time error types.
//!
//! Hot-path operations never return this type — `add_order`, `try_push`, and
//! friends report failure as `bool`/`Option` per the core's error taxonomy
//! (capacity exceeded, duplicate id, not found are all local, non-fatal
//! results). `CoreError` only covers programming-error conditions that are
//! fatal at construction time: a non-power-of-two ring size, a zero-capacity
//! pool, or non-finite strategy parameters.

use std::fmt;

/// Fatal construction-time error.
#[derive(Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// A ring buffer was constructed with a capacity that is not a power of two.
    RingCapacityNotPowerOfTwo {
        /// The capacity that was requested.
        requested: usize,
    },

    /// A pool was constructed with zero capacity.
    ZeroPoolCapacity,

    /// An Avellaneda-Stoikov parameter was non-finite or out of its valid domain.
    InvalidQuoterParameter {
        /// Name of the offending parameter (`gamma`, `sigma`, `k`, ...).
        name: &'static str,
        /// The value that was rejected.
        value: f64,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::RingCapacityNotPowerOfTwo { requested } => {
                write!(f, "ring capacity {requested} is not a power of two")
            }
            CoreError::ZeroPoolCapacity => write!(f, "pool capacity must be greater than zero"),
            CoreError::InvalidQuoterParameter { name, value } => {
                write!(f, "invalid quoter parameter {name}: {value}")
            }
        }
    }
}

impl std::error::Error for CoreError {}
