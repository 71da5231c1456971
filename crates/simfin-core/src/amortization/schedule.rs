//! Fixed-payment loan amortization.
//!
//! Given any two of principal, term and payment (plus the periodic rate) the
//! missing one is solved from the annuity identity
//!
//! ```text
//! payment = principal * r / (1 - (1 + r)^-n)
//! ```
//!
//! and a month-by-month schedule is generated from the resolved values.
//! Rates are per-period fractions; annual/percentage conversion belongs to
//! the caller.

use chrono::{Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SimFinError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::SimFinResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default cap on schedule length: 100 years of monthly payments.
pub const DEFAULT_MAX_PERIODS: u32 = 1200;

/// Residuals below one cent are floating noise, not a real balance.
const CENT: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// Loan description with at most one of principal, term or payment missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    /// Amount borrowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Money>,
    /// Per-period rate as a fraction (0.005 = 0.5% per month).
    pub periodic_rate: Rate,
    /// Number of payment periods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_periods: Option<u32>,
    /// Constant periodic payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Money>,
    /// Longest schedule this call will generate.
    #[serde(default = "default_max_periods")]
    pub max_periods: u32,
    /// Date the loan starts; row `i` falls due `i` months later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

fn default_max_periods() -> u32 {
    DEFAULT_MAX_PERIODS
}

impl LoanInput {
    pub fn new(
        principal: Option<Money>,
        periodic_rate: Rate,
        term_periods: Option<u32>,
        payment: Option<Money>,
    ) -> Self {
        Self {
            principal,
            periodic_rate,
            term_periods,
            payment,
            max_periods: DEFAULT_MAX_PERIODS,
            start_date: None,
        }
    }
}

/// Fully resolved loan: every value present and positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    pub principal: Money,
    pub periodic_rate: Rate,
    pub term_periods: u32,
    pub payment: Money,
}

/// One period of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based period index.
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub payment: Money,
    /// Outstanding balance before the period times the rate.
    pub interest_portion: Money,
    /// Payment minus interest.
    pub principal_portion: Money,
    /// Balance after the period, floored at zero.
    pub remaining_balance: Money,
}

/// Totals over the whole schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_principal: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub parameters: LoanParameters,
    pub rows: Vec<AmortizationRow>,
    pub summary: ScheduleSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve the missing loan value and build the full payment schedule.
///
/// Fails without producing any rows when the input is underdetermined, when
/// a supplied or solved value is non-positive, or when the payment cannot
/// cover the first period's interest. Amounts whose schedule would leave the
/// Decimal range are rejected as `InvalidInput` rather than overflowing.
pub fn compute_schedule(
    input: &LoanInput,
) -> SimFinResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let parameters = resolve_parameters(input, &mut warnings)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        principal = %parameters.principal,
        rate = %parameters.periodic_rate,
        term = parameters.term_periods,
        payment = %parameters.payment,
        "resolved loan parameters"
    );

    let (rows, final_balance) = build_rows(&parameters, input.start_date)?;

    if final_balance.abs() > CENT {
        let msg = if final_balance > Decimal::ZERO {
            format!(
                "Schedule ends with an unamortized balance of {}",
                final_balance.round_dp(2)
            )
        } else {
            format!(
                "Schedule overpays the loan by {} in the final period",
                (-final_balance).round_dp(2)
            )
        };
        #[cfg(feature = "tracing")]
        tracing::warn!("{msg}");
        warnings.push(msg);
    }

    let summary = summarize(&parameters, &rows)?;

    let output = AmortizationSchedule {
        parameters,
        rows,
        summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-payment annuity amortization",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Payment that amortizes `principal` over `term` periods at `rate`.
/// A zero rate degenerates to `principal / term`.
pub fn solve_payment(principal: Money, rate: Rate, term: u32) -> SimFinResult<Money> {
    if term == 0 {
        return Err(SimFinError::InvalidInput {
            field: "term_periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if rate.is_zero() {
        return Ok(principal / Decimal::from(term));
    }

    let annuity = Decimal::ONE - discount_factor(rate, term);
    if annuity.is_zero() {
        return Err(SimFinError::DivisionByZero {
            context: "payment annuity factor".into(),
        });
    }
    principal
        .checked_mul(rate)
        .and_then(|interest| interest.checked_div(annuity))
        .ok_or_else(|| overflow("payment"))
}

/// Principal that `payment` repays over `term` periods at `rate`.
/// A zero rate degenerates to `payment * term`.
pub fn solve_principal(payment: Money, rate: Rate, term: u32) -> SimFinResult<Money> {
    if rate.is_zero() {
        return payment
            .checked_mul(Decimal::from(term))
            .ok_or_else(|| overflow("principal"));
    }
    payment
        .checked_mul(Decimal::ONE - discount_factor(rate, term))
        .and_then(|v| v.checked_div(rate))
        .ok_or_else(|| overflow("principal"))
}

/// Number of periods `payment` needs to repay `principal` at `rate`,
/// rounded half away from zero.
pub fn solve_term(principal: Money, rate: Rate, payment: Money) -> SimFinResult<u32> {
    let periods = if rate.is_zero() {
        if payment <= Decimal::ZERO {
            return Err(SimFinError::DivisionByZero {
                context: "zero-rate term (payment is zero)".into(),
            });
        }
        principal
            .checked_div(payment)
            .ok_or_else(|| overflow("term"))?
    } else {
        let first_interest = principal
            .checked_mul(rate)
            .ok_or_else(|| overflow("first period interest"))?;
        if payment <= first_interest {
            return Err(SimFinError::FinancialImpossibility(format!(
                "Payment {payment} does not cover the first period's interest {first_interest}; \
                 the loan never amortizes"
            )));
        }
        let ratio = payment
            .checked_div(payment - first_interest)
            .ok_or_else(|| overflow("term"))?;
        let ln_ratio = ratio.checked_ln().ok_or_else(|| {
            SimFinError::FinancialImpossibility(format!(
                "Term logarithm undefined for ratio {ratio}"
            ))
        })?;
        let ln_growth = Decimal::ONE
            .checked_add(rate)
            .and_then(|growth| growth.checked_ln())
            .filter(|v| !v.is_zero())
            .ok_or_else(|| SimFinError::DivisionByZero {
                context: "term solve ln(1 + rate)".into(),
            })?;
        ln_ratio
            .checked_div(ln_growth)
            .ok_or_else(|| overflow("term"))?
    };

    periods
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .ok_or_else(|| SimFinError::InvalidInput {
            field: "term_periods".into(),
            reason: format!("Solved term {periods} is outside the representable range"),
        })
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn overflow(context: &str) -> SimFinError {
    SimFinError::InvalidInput {
        field: "loan".into(),
        reason: format!("Amounts exceed the decimal range while computing {context}"),
    }
}

/// (1 + rate)^-term. Growth beyond Decimal range means the discount is
/// below Decimal resolution, i.e. zero.
fn discount_factor(rate: Rate, term: u32) -> Decimal {
    let growth = Decimal::ONE
        .checked_add(rate)
        .and_then(|base| base.checked_powi(i64::from(term)));
    match growth {
        Some(growth) if !growth.is_zero() => Decimal::ONE / growth,
        _ => Decimal::ZERO,
    }
}

fn resolve_parameters(
    input: &LoanInput,
    warnings: &mut Vec<String>,
) -> SimFinResult<LoanParameters> {
    validate_input(input)?;

    let rate = input.periodic_rate;
    let (principal, term, payment) = match (input.principal, input.term_periods, input.payment) {
        (Some(principal), Some(term), None) => {
            (principal, term, solve_payment(principal, rate, term)?)
        }
        (None, Some(term), Some(payment)) => {
            (solve_principal(payment, rate, term)?, term, payment)
        }
        (Some(principal), None, Some(payment)) => {
            (principal, solve_term(principal, rate, payment)?, payment)
        }
        (Some(principal), Some(term), Some(payment)) => {
            let implied = solve_payment(principal, rate, term)?;
            if (implied - payment).abs() > CENT {
                warnings.push(format!(
                    "Supplied payment {payment} differs from the annuity payment {} implied by \
                     principal and term; the schedule uses the supplied payment",
                    implied.round_dp(2)
                ));
            }
            (principal, term, payment)
        }
        _ => {
            return Err(SimFinError::InsufficientData(
                "At least two of principal, term_periods and payment are required".into(),
            ))
        }
    };

    if principal <= Decimal::ZERO || payment <= Decimal::ZERO || term == 0 {
        return Err(SimFinError::InvalidInput {
            field: "loan".into(),
            reason: format!(
                "Resolved values must be positive (principal {principal}, term {term}, payment {payment})"
            ),
        });
    }
    if term > input.max_periods {
        return Err(SimFinError::InvalidInput {
            field: "term_periods".into(),
            reason: format!("Term of {term} periods exceeds the limit of {}", input.max_periods),
        });
    }
    let first_interest = principal
        .checked_mul(rate)
        .ok_or_else(|| overflow("first period interest"))?;
    if !rate.is_zero() && payment <= first_interest {
        return Err(SimFinError::FinancialImpossibility(format!(
            "Payment {payment} does not cover the first period's interest {first_interest}"
        )));
    }

    Ok(LoanParameters {
        principal,
        periodic_rate: rate,
        term_periods: term,
        payment,
    })
}

fn validate_input(input: &LoanInput) -> SimFinResult<()> {
    if input.periodic_rate < Decimal::ZERO {
        return Err(SimFinError::InvalidInput {
            field: "periodic_rate".into(),
            reason: "Periodic rate must be >= 0".into(),
        });
    }
    if let Some(p) = input.principal {
        if p <= Decimal::ZERO {
            return Err(SimFinError::InvalidInput {
                field: "principal".into(),
                reason: "Principal must be positive".into(),
            });
        }
    }
    if let Some(pmt) = input.payment {
        if pmt <= Decimal::ZERO {
            return Err(SimFinError::InvalidInput {
                field: "payment".into(),
                reason: "Payment must be positive".into(),
            });
        }
    }
    if input.term_periods == Some(0) {
        return Err(SimFinError::InvalidInput {
            field: "term_periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    Ok(())
}

/// Rows plus the unclamped closing balance.
fn build_rows(
    params: &LoanParameters,
    start_date: Option<NaiveDate>,
) -> SimFinResult<(Vec<AmortizationRow>, Money)> {
    let mut rows = Vec::with_capacity(params.term_periods as usize);
    let mut balance = params.principal;

    for period in 1..=params.term_periods {
        let interest = balance
            .checked_mul(params.periodic_rate)
            .ok_or_else(|| overflow("period interest"))?;
        let principal_portion = params
            .payment
            .checked_sub(interest)
            .ok_or_else(|| overflow("principal portion"))?;
        balance = balance
            .checked_sub(principal_portion)
            .ok_or_else(|| overflow("remaining balance"))?;

        rows.push(AmortizationRow {
            period,
            due_date: start_date.and_then(|d| d.checked_add_months(Months::new(period))),
            payment: params.payment,
            interest_portion: interest,
            principal_portion,
            remaining_balance: balance.max(Decimal::ZERO),
        });
    }

    Ok((rows, balance))
}

fn checked_total(mut values: impl Iterator<Item = Money>, context: &str) -> SimFinResult<Money> {
    values
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
        .ok_or_else(|| overflow(context))
}

fn summarize(params: &LoanParameters, rows: &[AmortizationRow]) -> SimFinResult<ScheduleSummary> {
    let total_paid = params
        .payment
        .checked_mul(Decimal::from(params.term_periods))
        .ok_or_else(|| overflow("total paid"))?;
    Ok(ScheduleSummary {
        total_paid,
        total_interest: checked_total(rows.iter().map(|r| r.interest_portion), "total interest")?,
        total_principal: checked_total(
            rows.iter().map(|r| r.principal_portion),
            "total principal",
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// 1e28: representable, but with little headroom.
    const HUGE: Decimal = dec!(10000000000000000000000000000);

    fn close(a: Decimal, b: Decimal, tol: Decimal) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_solve_payment_twelve_months() {
        let pmt = solve_payment(dec!(10000), dec!(0.01), 12).unwrap();
        assert!(close(pmt, dec!(888.4879), dec!(0.0001)), "payment {pmt}");
    }

    #[test]
    fn test_solve_payment_zero_rate() {
        let pmt = solve_payment(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(pmt, dec!(100));
    }

    #[test]
    fn test_solve_payment_zero_term_rejected() {
        assert!(matches!(
            solve_payment(dec!(1000), dec!(0.01), 0),
            Err(SimFinError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_solve_principal_zero_rate() {
        assert_eq!(solve_principal(dec!(250), Decimal::ZERO, 8).unwrap(), dec!(2000));
    }

    #[test]
    fn test_solve_term_inverts_payment() {
        let pmt = solve_payment(dec!(100000), dec!(0.0025), 240).unwrap();
        assert_eq!(solve_term(dec!(100000), dec!(0.0025), pmt).unwrap(), 240);
    }

    #[test]
    fn test_solve_term_zero_rate_rounds() {
        // 1000 / 300 = 3.33 periods
        assert_eq!(solve_term(dec!(1000), Decimal::ZERO, dec!(300)).unwrap(), 3);
        // 1000 / 400 = 2.5 periods, half rounds away from zero
        assert_eq!(solve_term(dec!(1000), Decimal::ZERO, dec!(400)).unwrap(), 3);
    }

    #[test]
    fn test_solve_term_payment_below_interest() {
        let err = solve_term(dec!(10000), dec!(0.01), dec!(100)).unwrap_err();
        assert!(matches!(err, SimFinError::FinancialImpossibility(_)));
        let err = solve_term(dec!(10000), dec!(0.01), dec!(50)).unwrap_err();
        assert!(matches!(err, SimFinError::FinancialImpossibility(_)));
    }

    #[test]
    fn test_discount_factor_overflow_is_zero() {
        // 1.5^1200 is far beyond Decimal::MAX
        assert_eq!(discount_factor(dec!(0.5), 1200), Decimal::ZERO);
        let pmt = solve_payment(dec!(1000), dec!(0.5), 1200).unwrap();
        assert_eq!(pmt, dec!(500));
    }

    #[test]
    fn test_schedule_first_row() {
        let input = LoanInput::new(Some(dec!(10000)), dec!(0.01), Some(12), None);
        let out = compute_schedule(&input).unwrap();
        let first = &out.result.rows[0];
        assert_eq!(first.period, 1);
        assert_eq!(first.interest_portion, dec!(100.00));
        assert!(close(first.principal_portion, dec!(788.49), dec!(0.005)));
        assert!(close(first.remaining_balance, dec!(9211.51), dec!(0.005)));
        assert!(first.due_date.is_none());
        assert!(out.warnings.is_empty());
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_schedule_due_dates() {
        let mut input = LoanInput::new(Some(dec!(3000)), dec!(0.01), Some(3), None);
        input.start_date = NaiveDate::from_ymd_opt(2024, 1, 31);
        let out = compute_schedule(&input).unwrap();
        let dates: Vec<_> = out.result.rows.iter().map(|r| r.due_date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 29),
                NaiveDate::from_ymd_opt(2024, 3, 31),
                NaiveDate::from_ymd_opt(2024, 4, 30),
            ]
        );
    }

    #[test]
    fn test_negative_rate_rejected() {
        let input = LoanInput::new(Some(dec!(1000)), dec!(-0.01), Some(12), None);
        assert!(matches!(
            compute_schedule(&input),
            Err(SimFinError::InvalidInput { ref field, .. }) if field == "periodic_rate"
        ));
    }

    #[test]
    fn test_supplied_zero_principal_rejected() {
        let input = LoanInput::new(Some(Decimal::ZERO), dec!(0.01), Some(12), None);
        assert!(matches!(
            compute_schedule(&input),
            Err(SimFinError::InvalidInput { ref field, .. }) if field == "principal"
        ));
    }

    #[test]
    fn test_term_above_limit_rejected() {
        let mut input = LoanInput::new(Some(dec!(1000)), dec!(0.01), Some(60), None);
        input.max_periods = 36;
        assert!(matches!(
            compute_schedule(&input),
            Err(SimFinError::InvalidInput { ref field, .. }) if field == "term_periods"
        ));
    }

    #[test]
    fn test_overdetermined_inconsistent_payment_warns() {
        let input = LoanInput::new(Some(dec!(10000)), dec!(0.01), Some(12), Some(dec!(900)));
        let out = compute_schedule(&input).unwrap();
        assert_eq!(out.result.parameters.payment, dec!(900));
        assert!(out.warnings.iter().any(|w| w.contains("differs")));
        // Paying more than required overshoots the loan.
        assert!(out.warnings.iter().any(|w| w.contains("overpays")));
        assert_eq!(out.result.rows.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_overdetermined_payment_below_interest_fails() {
        let input = LoanInput::new(Some(dec!(10000)), dec!(0.01), Some(12), Some(dec!(90)));
        assert!(matches!(
            compute_schedule(&input),
            Err(SimFinError::FinancialImpossibility(_))
        ));
    }

    #[test]
    fn test_huge_principal_overflows_to_error() {
        // Each payment fits, but 1200 of them do not.
        let input = LoanInput::new(Some(HUGE), dec!(0.01), Some(1200), None);
        assert!(matches!(
            compute_schedule(&input),
            Err(SimFinError::InvalidInput { ref field, .. }) if field == "loan"
        ));
    }

    #[test]
    fn test_huge_interest_overflows_to_error() {
        let input = LoanInput::new(Some(HUGE), dec!(10), Some(12), None);
        assert!(matches!(
            compute_schedule(&input),
            Err(SimFinError::InvalidInput { .. })
        ));
        assert!(solve_term(HUGE, dec!(10), dec!(1)).is_err());
    }

    #[test]
    fn test_solve_principal_overflow_is_error() {
        assert!(solve_principal(Decimal::MAX, Decimal::ZERO, 12).is_err());
        assert!(solve_term(Decimal::MAX, Decimal::ZERO, dec!(0.0001)).is_err());
    }

    #[test]
    fn test_checked_total_overflow() {
        let values = vec![Decimal::MAX, Decimal::ONE];
        assert!(checked_total(values.into_iter(), "sum").is_err());
        assert_eq!(
            checked_total(vec![dec!(1.5), dec!(2.5)].into_iter(), "sum").unwrap(),
            dec!(4)
        );
    }
}
