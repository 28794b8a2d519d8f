//! Rolling statistics over contiguous `f64` spans.
//!
//! `variance` and `sum` have a scalar reference implementation plus an
//! optional AVX2-accelerated path selected at runtime via
//! `is_x86_feature_detected!`, the same "scalar reference plus target-feature
//! intrinsics behind a runtime check" split the wider corpus uses for its
//! depth-summation kernels. `ema` is a strict left-to-right recurrence and is
//! intentionally scalar-only — vectorizing across the per-element
//! fused-multiply-add only pays off within a single iteration, not across
//! the chain.
//!
//! Tests assert numeric tolerance between the scalar and vector paths, never
//! bit-for-bit identity (reassociated partial sums round differently).

/// Biased (population) variance: `(Σx²)/n − (Σx/n)²`. Returns 0 for empty input.
pub fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n == 0 {
        return 0.0;
    }
    let (sum, sum_sq) = sum_and_sum_sq(data);
    let n = n as f64;
    let mean = sum / n;
    (sum_sq / n) - (mean * mean)
}

/// Plain arithmetic sum. Partial sums may be reassociated by vector width,
/// so the result is only guaranteed up to floating-point reassociation
/// tolerance versus a strict left-to-right fold.
pub fn sum(data: &[f64]) -> f64 {
    sum_and_sum_sq(data).0
}

/// Exponential moving average over `input`, written into `output`.
///
/// `output[0] = input[0]`; `output[i] = alpha * input[i] + (1 - alpha) *
/// output[i - 1]`. Strict left-to-right dependence — each element depends on
/// the previous, so this is a scalar recurrence regardless of build target.
///
/// # Panics
///
/// Panics if `output.len() < input.len()`.
pub fn ema(input: &[f64], output: &mut [f64], alpha: f64) {
    assert!(output.len() >= input.len());
    if input.is_empty() {
        return;
    }
    output[0] = input[0];
    for i in 1..input.len() {
        output[i] = alpha * input[i] + (1.0 - alpha) * output[i - 1];
    }
}

/// Computes `(Σx, Σx²)` in one pass, dispatching to an AVX2 kernel when the
/// running CPU supports it and scalar otherwise.
fn sum_and_sum_sq(data: &[f64]) -> (f64, f64) {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            // Safety: guarded by the runtime feature check above.
            return unsafe { avx2::sum_and_sum_sq(data) };
        }
    }
    scalar::sum_and_sum_sq(data)
}

mod scalar {
    /// Reference implementation: a plain loop, four accumulators wide so
    /// the compiler has a fair shot at auto-vectorizing it even when the
    /// AVX2 path above is unavailable.
    pub fn sum_and_sum_sq(data: &[f64]) -> (f64, f64) {
        let mut sum = [0.0f64; 4];
        let mut sum_sq = [0.0f64; 4];
        let chunks = data.chunks_exact(4);
        let remainder = chunks.remainder();
        for chunk in chunks {
            for lane in 0..4 {
                sum[lane] += chunk[lane];
                sum_sq[lane] += chunk[lane] * chunk[lane];
            }
        }
        let mut total = sum.iter().sum::<f64>();
        let mut total_sq = sum_sq.iter().sum::<f64>();
        for &x in remainder {
            total += x;
            total_sq += x * x;
        }
        (total, total_sq)
    }
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use std::arch::x86_64::*;

    /// AVX2-accelerated `(Σx, Σx²)`.
    ///
    /// # Safety
    ///
    /// Caller must ensure the running CPU supports AVX2 (checked via
    /// `is_x86_feature_detected!("avx2")` by the only caller, `sum_and_sum_sq`).
    #[target_feature(enable = "avx2")]
    pub unsafe fn sum_and_sum_sq(data: &[f64]) -> (f64, f64) {
        let mut sum_acc = _mm256_setzero_pd();
        let mut sum_sq_acc = _mm256_setzero_pd();
        let chunks = data.chunks_exact(4);
        let remainder = chunks.remainder();

        for chunk in chunks {
            let v = _mm256_loadu_pd(chunk.as_ptr());
            sum_acc = _mm256_add_pd(sum_acc, v);
            sum_sq_acc = _mm256_fmadd_pd(v, v, sum_sq_acc);
        }

        let mut sum_lanes = [0.0f64; 4];
        let mut sum_sq_lanes = [0.0f64; 4];
        _mm256_storeu_pd(sum_lanes.as_mut_ptr(), sum_acc);
        _mm256_storeu_pd(sum_sq_lanes.as_mut_ptr(), sum_sq_acc);

        let mut total: f64 = sum_lanes.iter().sum();
        let mut total_sq: f64 = sum_sq_lanes.iter().sum();
        for &x in remainder {
            total += x;
            total_sq += x * x;
        }
        (total, total_sq)
    }
}
