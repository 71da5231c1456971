//! Binomial(n, p): number of successes in `n` independent trials.

use crate::error::SimFinError;
use crate::numeric::{clamp01, log_choose, require_finite};
use crate::types::Probability;
use crate::SimFinResult;

use super::{running_sum, DEFAULT_MAX_TERMS};

fn validate(n: i64, p: f64) -> SimFinResult<()> {
    if n < 0 {
        return Err(SimFinError::InvalidInput {
            field: "trials".into(),
            reason: format!("Number of trials must be an integer >= 0 (got {n})"),
        });
    }
    require_finite("success_prob", p)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(SimFinError::InvalidInput {
            field: "success_prob".into(),
            reason: format!("Success probability must lie in [0, 1] (got {p})"),
        });
    }
    Ok(())
}

/// P(X = k). Zero for `k` outside [0, n].
pub fn pmf(n: i64, p: f64, k: i64) -> SimFinResult<Probability> {
    validate(n, p)?;
    Ok(mass(n, p, k))
}

/// P(X <= k), summed term by term from 0.
pub fn cdf(n: i64, p: f64, k: i64) -> SimFinResult<Probability> {
    cdf_with_limit(n, p, k, DEFAULT_MAX_TERMS)
}

/// [`cdf`] with an explicit cap on summation terms.
pub fn cdf_with_limit(n: i64, p: f64, k: i64, max_terms: u64) -> SimFinResult<Probability> {
    validate(n, p)?;
    if k < 0 {
        return Ok(0.0);
    }
    if k >= n {
        return Ok(1.0);
    }
    let mode = ((n as f64 + 1.0) * p).floor() as i64;
    running_sum(0, k, mode, max_terms, |i| mass(n, p, i))
}

/// Mass for already-validated parameters.
fn mass(n: i64, p: f64, k: i64) -> Probability {
    if k < 0 || k > n {
        return 0.0;
    }
    // log(0) would appear in the general formula
    if p == 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    if p == 1.0 {
        return if k == n { 1.0 } else { 0.0 };
    }
    let log_mass = log_choose(n, k) + k as f64 * p.ln() + (n - k) as f64 * (-p).ln_1p();
    clamp01(log_mass.exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pmf_reference_value() {
        let v = pmf(10, 0.3, 3).unwrap();
        assert!((v - 0.266_827_932).abs() < 1e-8, "got {v}");
    }

    #[test]
    fn test_cdf_reference_value() {
        let v = cdf(10, 0.3, 3).unwrap();
        assert!((v - 0.649_610_718).abs() < 1e-8, "got {v}");
    }

    #[test]
    fn test_out_of_support_is_zero() {
        assert_eq!(pmf(10, 0.3, -1).unwrap(), 0.0);
        assert_eq!(pmf(10, 0.3, 11).unwrap(), 0.0);
    }

    #[test]
    fn test_cdf_bounds() {
        assert_eq!(cdf(10, 0.3, -1).unwrap(), 0.0);
        assert_eq!(cdf(10, 0.3, 10).unwrap(), 1.0);
        assert_eq!(cdf(10, 0.3, 1_000).unwrap(), 1.0);
    }

    #[test]
    fn test_degenerate_probabilities() {
        assert_eq!(pmf(5, 0.0, 0).unwrap(), 1.0);
        assert_eq!(pmf(5, 0.0, 1).unwrap(), 0.0);
        assert_eq!(pmf(5, 1.0, 5).unwrap(), 1.0);
        assert_eq!(pmf(5, 1.0, 4).unwrap(), 0.0);
        assert_eq!(cdf(5, 0.0, 0).unwrap(), 1.0);
        assert_eq!(cdf(5, 1.0, 4).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_trials() {
        assert_eq!(pmf(0, 0.4, 0).unwrap(), 1.0);
        assert_eq!(cdf(0, 0.4, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            pmf(-1, 0.5, 0),
            Err(SimFinError::InvalidInput { ref field, .. }) if field == "trials"
        ));
        assert!(matches!(
            pmf(10, 1.5, 3),
            Err(SimFinError::InvalidInput { ref field, .. }) if field == "success_prob"
        ));
        assert!(pmf(10, -0.1, 3).is_err());
        assert!(pmf(10, f64::NAN, 3).is_err());
        // Structural checks win over out-of-support shortcuts.
        assert!(cdf(10, 2.0, -1).is_err());
        assert!(cdf(10, 2.0, 10).is_err());
    }

    #[test]
    fn test_small_tail_does_not_underflow() {
        // 0.01^100 = 1e-200, representable but lost by naive products of factorials.
        let v = pmf(100, 0.01, 100).unwrap();
        assert!(v > 0.0);
        assert!((v.log10() + 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_cdf_term_limit() {
        // 1e6 trials summed to the middle needs ~5e5 terms.
        assert!(matches!(
            cdf_with_limit(1_000_000, 0.5, 500_000, 1_000),
            Err(SimFinError::InvalidInput { ref field, .. }) if field == "max_terms"
        ));
        assert!((cdf(1_000_000, 0.5, 500_000).unwrap() - 0.5).abs() < 1e-3);
        // Shortcut bounds need no summation at all.
        assert_eq!(cdf_with_limit(1_000_000, 0.5, 1_000_000, 1).unwrap(), 1.0);
    }
}
