//! Order-book imbalance: a short-horizon directional signal derived from
//! resting bid/ask volume.

/// Raw order-book imbalance for one sample: `(bv - av) / (bv + av)`, or `0`
/// when both volumes are zero. Positive means bid-heavy (expected upward
/// pressure); range is `[-1, 1]`.
pub fn obi(bid_volume: i64, ask_volume: i64) -> f64 {
    let total = bid_volume + ask_volume;
    if total <= 0 {
        return 0.0;
    }
    (bid_volume - ask_volume) as f64 / total as f64
}

/// EMA-smoothed order-book imbalance signal.
#[derive(Debug, Clone, Copy)]
pub struct ObiSignal {
    alpha: f64,
    ema: f64,
}

impl ObiSignal {
    /// Creates a signal with smoothing factor `alpha` and `ema` initialized
    /// to zero (not to the first sample).
    pub fn new(alpha: f64) -> Self {
        ObiSignal { alpha, ema: 0.0 }
    }

    /// Current smoothed value.
    #[inline]
    pub fn value(&self) -> f64 {
        self.ema
    }

    /// Feeds one `(bid_volume, ask_volume)` sample and returns the updated EMA.
    pub fn update(&mut self, bid_volume: i64, ask_volume: i64) -> f64 {
        let raw = obi(bid_volume, ask_volume);
        self.ema = self.alpha * raw + (1.0 - self.alpha) * self.ema;
        self.ema
    }

    /// Resets the smoothed value to zero.
    pub fn reset(&mut self) {
        self.ema = 0.0;
    }
}
