//! Construction parameters for every component, gathered in one place.
//!
//! `EngineConfig` carries no behaviour of its own; it is a plain
//! serializable bag of the parameters enumerated in the core's external
//! interface so an embedding application can load them from JSON (or build
//! one field at a time) instead of threading a dozen constructor arguments
//! through. The core itself never reads a file or an environment variable —
//! there is no persisted state.

use serde::{Deserialize, Serialize};

/// Default order-node pool capacity (2^20).
pub const DEFAULT_MAX_ORDERS: usize = 1 << 20;

/// Default ring buffer capacity for the market-data channel.
pub const DEFAULT_RING_SIZE: usize = 65536;

/// Default OBI smoothing factor.
pub const DEFAULT_OBI_ALPHA: f64 = 0.1;

/// Default Avellaneda-Stoikov decay parameter `k`.
pub const DEFAULT_AS_K: f64 = 1.5;

/// Aggregated construction configuration for the strategy core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Order-node pool capacity for the order book.
    pub max_orders: usize,
    /// Market-data ring buffer capacity. Must be a power of two.
    pub ring_size: usize,
    /// Pre-trade risk: absolute notional cap.
    pub max_notional: i64,
    /// Pre-trade risk: fat-finger single-order quantity cap.
    pub max_order_qty: i64,
    /// Avellaneda-Stoikov inventory risk aversion.
    pub gamma: f64,
    /// Avellaneda-Stoikov volatility.
    pub sigma: f64,
    /// Avellaneda-Stoikov session length, in seconds.
    pub t_seconds: f64,
    /// OBI EMA smoothing factor.
    pub obi_alpha: f64,
    /// Avellaneda-Stoikov order-arrival decay parameter.
    pub k: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_orders: DEFAULT_MAX_ORDERS,
            ring_size: DEFAULT_RING_SIZE,
            max_notional: i64::MAX / 2,
            max_order_qty: i64::MAX / 2,
            gamma: 0.1,
            sigma: 0.02,
            t_seconds: 3600.0,
            obi_alpha: DEFAULT_OBI_ALPHA,
            k: DEFAULT_AS_K,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn default_ring_size_is_power_of_two() {
        assert!(EngineConfig::default().ring_size.is_power_of_two());
    }
}
