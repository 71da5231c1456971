//! Poisson(λ): event counts at a constant average rate.

use crate::error::SimFinError;
use crate::numeric::{clamp01, log_factorial, require_finite};
use crate::types::Probability;
use crate::SimFinResult;

use super::{running_sum, DEFAULT_MAX_TERMS};

fn validate(lambda: f64) -> SimFinResult<()> {
    require_finite("rate", lambda)?;
    if lambda < 0.0 {
        return Err(SimFinError::InvalidInput {
            field: "rate".into(),
            reason: format!("Poisson rate λ must be >= 0 (got {lambda})"),
        });
    }
    Ok(())
}

/// P(X = k). Zero for negative `k`.
pub fn pmf(lambda: f64, k: i64) -> SimFinResult<Probability> {
    validate(lambda)?;
    Ok(mass(lambda, k))
}

/// P(X <= k), summed term by term from 0.
pub fn cdf(lambda: f64, k: i64) -> SimFinResult<Probability> {
    cdf_with_limit(lambda, k, DEFAULT_MAX_TERMS)
}

/// [`cdf`] with an explicit cap on summation terms.
pub fn cdf_with_limit(lambda: f64, k: i64, max_terms: u64) -> SimFinResult<Probability> {
    validate(lambda)?;
    if k < 0 {
        return Ok(0.0);
    }
    let mode = lambda.floor() as i64;
    running_sum(0, k, mode, max_terms, |i| mass(lambda, i))
}

fn mass(lambda: f64, k: i64) -> Probability {
    if k < 0 {
        return 0.0;
    }
    if lambda == 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    let log_mass = -lambda + k as f64 * lambda.ln() - log_factorial(k as u64);
    clamp01(log_mass.exp())
}
