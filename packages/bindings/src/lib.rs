use napi::Result as NapiResult;
use napi_derive::napi;

use simfin_core::amortization::schedule::{self, LoanInput};
use simfin_core::distributions::{self, binomial, hypergeometric, poisson, DistributionQuery};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

/// `inputJson` is a `LoanInput`: `{"principal": "10000", "periodic_rate": "0.01",
/// "term_periods": 12}` with one of principal/term_periods/payment omitted.
#[napi]
pub fn compute_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = schedule::compute_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Distributions
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_distribution(query_json: String) -> NapiResult<String> {
    let query: DistributionQuery = serde_json::from_str(&query_json).map_err(to_napi_error)?;
    let output = distributions::evaluate(&query).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn binomial_pmf(n: i64, p: f64, k: i64) -> NapiResult<f64> {
    binomial::pmf(n, p, k).map_err(to_napi_error)
}

#[napi]
pub fn binomial_cdf(n: i64, p: f64, k: i64) -> NapiResult<f64> {
    binomial::cdf(n, p, k).map_err(to_napi_error)
}

#[napi]
pub fn poisson_pmf(lambda: f64, k: i64) -> NapiResult<f64> {
    poisson::pmf(lambda, k).map_err(to_napi_error)
}

#[napi]
pub fn poisson_cdf(lambda: f64, k: i64) -> NapiResult<f64> {
    poisson::cdf(lambda, k).map_err(to_napi_error)
}

/// Population `N`, successes `K`, draws `n`, observed successes `k`.
/// Impossible urns and values outside the support give 0.
#[napi]
pub fn hypergeo_pmf(population: i64, successes: i64, draws: i64, k: i64) -> f64 {
    hypergeometric::pmf(population, successes, draws, k)
}

#[napi]
pub fn hypergeo_cdf(population: i64, successes: i64, draws: i64, k: i64) -> NapiResult<f64> {
    hypergeometric::cdf(population, successes, draws, k).map_err(to_napi_error)
}
