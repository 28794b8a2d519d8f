//! Avellaneda-Stoikov inventory-aware quoting.
//!
//! Holds the three mutable strategy parameters (`gamma`, `sigma`, `t_seconds`)
//! and turns a mid price, elapsed time, and inventory into a reservation
//! price, an optimal half-spread, and finally an OBI-skewed bid/ask pair.

use crate::error::CoreError;

/// Avellaneda-Stoikov reservation price and spread model.
#[derive(Debug, Clone, Copy)]
pub struct AvellanedaStoikov {
    /// Inventory risk aversion.
    pub gamma: f64,
    /// Volatility.
    pub sigma: f64,
    /// Session length, in seconds.
    pub t_seconds: f64,
}

/// Fixed coefficient applied to `obi_skew * half_spread` when shifting quotes.
const SKEW_COEFFICIENT: f64 = 0.5;

impl AvellanedaStoikov {
    /// Creates a quoter with the given parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuoterParameter`] if `gamma` is not
    /// finite, or if `sigma`/`t_seconds` is not finite and strictly positive.
    pub fn new(gamma: f64, sigma: f64, t_seconds: f64) -> Result<Self, CoreError> {
        if !gamma.is_finite() {
            return Err(CoreError::InvalidQuoterParameter {
                name: "gamma",
                value: gamma,
            });
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(CoreError::InvalidQuoterParameter {
                name: "sigma",
                value: sigma,
            });
        }
        if !t_seconds.is_finite() || t_seconds <= 0.0 {
            return Err(CoreError::InvalidQuoterParameter {
                name: "t_seconds",
                value: t_seconds,
            });
        }
        Ok(AvellanedaStoikov {
            gamma,
            sigma,
            t_seconds,
        })
    }

    /// Reservation price `s - q * gamma * sigma^2 * (T - t)`, or `s` when the
    /// session has ended (`T - t <= 0`).
    pub fn reservation_price(&self, mid: f64, t_seconds: f64, inventory: f64) -> f64 {
        let remaining = self.t_seconds - t_seconds;
        if remaining <= 0.0 {
            return mid;
        }
        mid - inventory * self.gamma * self.sigma * self.sigma * remaining
    }

    /// Optimal half-spread `(1/k) * ln(1 + gamma/k)`.
    pub fn optimal_half_spread(&self, k: f64) -> f64 {
        (1.0 / k) * (1.0 + self.gamma / k).ln()
    }

    /// Computes OBI-skewed bid/ask offsets around mid.
    ///
    /// Returns `(bid, ask)` where `bid = r - h - skew`, `ask = r + h + skew`,
    /// `r` the reservation price, `h` the optimal half-spread, and
    /// `skew = obi_skew * 0.5 * h`.
    pub fn get_quotes(&self, mid: f64, t_seconds: f64, inventory: f64, k: f64, obi_skew: f64) -> (f64, f64) {
        let r = self.reservation_price(mid, t_seconds, inventory);
        let h = self.optimal_half_spread(k);
        let skew = obi_skew * SKEW_COEFFICIENT * h;
        (r - h - skew, r + h + skew)
    }
}
