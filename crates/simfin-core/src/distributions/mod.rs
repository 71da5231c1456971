//! Discrete probability laws evaluated in log space.
//!
//! Each family exposes typed `pmf`/`cdf` primitives; [`evaluate`] dispatches a
//! serialized [`DistributionQuery`] and reports PMF, CDF and upper tail for
//! one value.
//!
//! Structural violations (negative trials, `p` outside [0, 1], negative or
//! non-finite rates) are errors. Values outside the support are not: they
//! have probability exactly 0 (or a CDF of exactly 0 or 1).

pub mod binomial;
pub mod hypergeometric;
pub mod poisson;

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SimFinError;
use crate::numeric::{clamp01, require_finite};
use crate::types::{with_metadata_f64, ComputationOutput, Probability};
use crate::SimFinResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default cap on CDF summation terms. A CDF that needs more is refused
/// rather than left to run for minutes.
pub const DEFAULT_MAX_TERMS: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Distribution family and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum Distribution {
    Binomial {
        trials: i64,
        success_prob: f64,
    },
    Poisson {
        rate: f64,
    },
    Hypergeometric {
        population_size: i64,
        population_successes: i64,
        draws: i64,
    },
}

impl Distribution {
    fn methodology(&self) -> &'static str {
        match self {
            Distribution::Binomial { .. } => "Binomial PMF/CDF via log-space binomial coefficients",
            Distribution::Poisson { .. } => "Poisson PMF/CDF via log-space factorials",
            Distribution::Hypergeometric { .. } => {
                "Hypergeometric PMF/CDF via log-space binomial coefficients"
            }
        }
    }
}

/// One probability question against one distribution family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionQuery {
    #[serde(flatten)]
    pub distribution: Distribution,
    /// Value `k` whose PMF and CDF are reported.
    pub value: f64,
    /// Most terms the CDF may sum before the query is refused.
    #[serde(default = "default_max_terms")]
    pub max_terms: u64,
}

fn default_max_terms() -> u64 {
    DEFAULT_MAX_TERMS
}

impl DistributionQuery {
    pub fn new(distribution: Distribution, value: f64) -> Self {
        Self {
            distribution,
            value,
            max_terms: DEFAULT_MAX_TERMS,
        }
    }
}

/// P(X = k), P(X <= k) and P(X > k) for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionResult {
    pub pmf: Probability,
    pub cdf: Probability,
    pub upper_tail: Probability,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate PMF, CDF and upper tail for the query's value.
///
/// A fractional value has zero mass; its CDF is that of the integer below it.
pub fn evaluate(query: &DistributionQuery) -> SimFinResult<ComputationOutput<DistributionResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let value = require_finite("value", query.value)?;
    if query.max_terms == 0 {
        return Err(SimFinError::InvalidInput {
            field: "max_terms".into(),
            reason: "Summation limit must be > 0".into(),
        });
    }
    // `as` saturates, so huge values land at the ends of the i64 range
    let k = value.floor() as i64;
    let integral = value.fract() == 0.0;
    if !integral {
        warnings.push(format!(
            "Value {value} is not an integer; P(X = {value}) is 0 and the CDF uses {k}"
        ));
    }

    let max_terms = query.max_terms;
    let (pmf, cdf) = match query.distribution {
        Distribution::Binomial {
            trials,
            success_prob,
        } => (
            binomial::pmf(trials, success_prob, k)?,
            binomial::cdf_with_limit(trials, success_prob, k, max_terms)?,
        ),
        Distribution::Poisson { rate } => (
            poisson::pmf(rate, k)?,
            poisson::cdf_with_limit(rate, k, max_terms)?,
        ),
        Distribution::Hypergeometric {
            population_size,
            population_successes,
            draws,
        } => (
            hypergeometric::pmf(population_size, population_successes, draws, k),
            hypergeometric::cdf_with_limit(
                population_size,
                population_successes,
                draws,
                k,
                max_terms,
            )?,
        ),
    };
    let pmf = if integral { pmf } else { 0.0 };

    #[cfg(feature = "tracing")]
    tracing::debug!(?query, pmf, cdf, "evaluated distribution query");

    let result = DistributionResult {
        pmf,
        cdf,
        upper_tail: clamp01(1.0 - cdf),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        query.distribution.methodology(),
        query,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Shared summation
// ---------------------------------------------------------------------------

/// Σ term(i) for i in [from, to], clamped to [0, 1].
///
/// Past the mode the mass is decreasing, so once a term underflows to exactly
/// zero every later term is zero as well and the loop stops. Needing more
/// than `max_terms` terms is an error.
pub(crate) fn running_sum(
    from: i64,
    to: i64,
    mode: i64,
    max_terms: u64,
    term: impl Fn(i64) -> f64,
) -> SimFinResult<f64> {
    let mut sum = 0.0;
    let mut used: u64 = 0;
    for i in from..=to {
        if used == max_terms {
            return Err(SimFinError::InvalidInput {
                field: "max_terms".into(),
                reason: format!(
                    "CDF at {to} needs more than {max_terms} summation terms; \
                     raise max_terms or query a smaller value"
                ),
            });
        }
        used += 1;
        let t = term(i);
        if t == 0.0 && i > mode {
            break;
        }
        sum += t;
    }
    Ok(clamp01(sum))
}
