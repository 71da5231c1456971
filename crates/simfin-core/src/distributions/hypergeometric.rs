//! Hypergeometric(N, K, n): successes among `n` draws without replacement
//! from a population of `N` holding `K` successes.
//!
//! Every parameter is an integer, so no query here is structurally invalid:
//! impossible populations and draws are simply outside the support, with
//! PMF and CDF both 0.

use crate::numeric::{clamp01, log_choose};
use crate::types::Probability;
use crate::SimFinResult;

use super::{running_sum, DEFAULT_MAX_TERMS};

/// Inclusive support [k_min, k_max]: at least `n - (N - K)` successes must be
/// drawn once the failures run out, at most `min(n, K)` can be.
pub fn support(population: i64, successes: i64, draws: i64) -> (i64, i64) {
    let failures = population.saturating_sub(successes);
    let k_min = draws.saturating_sub(failures).max(0);
    let k_max = draws.min(successes);
    (k_min, k_max)
}

fn valid_parameters(population: i64, successes: i64, draws: i64) -> bool {
    population > 0 && (0..=population).contains(&successes) && (0..=population).contains(&draws)
}

/// P(X = k). Zero for invalid populations and for `k` outside the support.
pub fn pmf(population: i64, successes: i64, draws: i64, k: i64) -> Probability {
    if !valid_parameters(population, successes, draws) {
        return 0.0;
    }
    let (k_min, k_max) = support(population, successes, draws);
    if k < k_min || k > k_max {
        return 0.0;
    }
    let log_mass = log_choose(successes, k) + log_choose(population - successes, draws - k)
        - log_choose(population, draws);
    clamp01(log_mass.exp())
}

/// P(X <= k), summed from the bottom of the support. Zero for invalid
/// populations, like [`pmf`].
///
/// Fails only when the sum needs more than the default number of terms.
pub fn cdf(population: i64, successes: i64, draws: i64, k: i64) -> SimFinResult<Probability> {
    cdf_with_limit(population, successes, draws, k, DEFAULT_MAX_TERMS)
}

/// [`cdf`] with an explicit cap on summation terms.
pub fn cdf_with_limit(
    population: i64,
    successes: i64,
    draws: i64,
    k: i64,
    max_terms: u64,
) -> SimFinResult<Probability> {
    if !valid_parameters(population, successes, draws) {
        return Ok(0.0);
    }
    let (k_min, k_max) = support(population, successes, draws);
    if k < k_min {
        return Ok(0.0);
    }
    if k >= k_max {
        return Ok(1.0);
    }
    let mode = mode(population, successes, draws);
    running_sum(k_min, k, mode, max_terms, |i| {
        pmf(population, successes, draws, i)
    })
}

fn mode(population: i64, successes: i64, draws: i64) -> i64 {
    let num = (draws as f64 + 1.0) * (successes as f64 + 1.0);
    (num / (population as f64 + 2.0)).floor() as i64
}
