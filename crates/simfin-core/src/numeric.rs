//! Log-space combinatorics shared by every discrete distribution.
//!
//! Factorials overflow `f64` past 170!, so all probability mass is assembled
//! as a sum of logarithms and exponentiated once at the end.

use crate::error::SimFinError;
use crate::SimFinResult;

const HALF_LN_TWO_PI: f64 = 0.918_938_533_204_672_8;

/// Below this the factorial is summed exactly; the Stirling tail is not yet
/// accurate to 1e-14 for small arguments.
const EXACT_LOG_FACTORIAL_LIMIT: u64 = 20;

/// ln(n!) for n >= 0. Exactly zero for n in {0, 1}.
pub fn log_factorial(n: u64) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    if n <= EXACT_LOG_FACTORIAL_LIMIT {
        return (2..=n).map(|i| (i as f64).ln()).sum();
    }

    // Stirling series: ln n! = (n+1/2)ln n - n + ln(2π)/2 + Σ B_2k / (2k(2k-1) n^(2k-1))
    let x = n as f64;
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    let correction =
        inv * (1.0 / 12.0 - inv2 * (1.0 / 360.0 - inv2 * (1.0 / 1260.0 - inv2 / 1680.0)));
    (x + 0.5) * x.ln() - x + HALF_LN_TWO_PI + correction
}

/// ln C(n, k). Negative infinity when k lies outside [0, n], so the
/// coefficient behaves as an exact zero once exponentiated.
pub fn log_choose(n: i64, k: i64) -> f64 {
    if k < 0 || k > n {
        return f64::NEG_INFINITY;
    }
    // k <= n and k >= 0 imply n >= 0
    log_factorial(n as u64) - log_factorial(k as u64) - log_factorial((n - k) as u64)
}

/// Clamp residual floating-point drift back into [0, 1].
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Reject NaN and infinities with a descriptive error.
pub fn require_finite(field: &str, value: f64) -> SimFinResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimFinError::InvalidInput {
            field: field.into(),
            reason: format!("must be a finite number (got {value})"),
        })
    }
}
