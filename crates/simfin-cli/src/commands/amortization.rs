use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use simfin_core::amortization::schedule::{self, LoanInput, DEFAULT_MAX_PERIODS};

use crate::input;

/// How the value passed to `--rate` is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RateBasis {
    /// Already a per-period fraction (0.005 = 0.5% per month)
    Periodic,
    /// Monthly rate in percent (0.5 = 0.5% per month)
    MonthlyPercent,
    /// Nominal annual rate in percent, paid monthly (6 = 6% per year)
    AnnualPercent,
}

impl RateBasis {
    /// Convert to the per-period fraction the engine expects.
    pub fn to_periodic(self, rate: Decimal) -> Decimal {
        match self {
            RateBasis::Periodic => rate,
            RateBasis::MonthlyPercent => rate / dec!(100),
            RateBasis::AnnualPercent => rate / dec!(1200),
        }
    }
}

/// Arguments for amortization schedule generation.
/// Supply any two of --principal, --term and --payment.
#[derive(Args)]
pub struct ScheduleArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Interest rate, interpreted according to --rate-basis
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Unit of --rate
    #[arg(long, value_enum, default_value = "periodic")]
    pub rate_basis: RateBasis,

    /// Number of monthly payments
    #[arg(long)]
    pub term: Option<u32>,

    /// Constant monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// First day of the loan (YYYY-MM-DD); adds a due date to every row
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Refuse schedules longer than this many periods
    #[arg(long, default_value_t = DEFAULT_MAX_PERIODS)]
    pub max_periods: u32,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan: LoanInput = match input::load(args.input.as_deref())? {
        Some(loan) => loan,
        None => loan_from_flags(&args)?,
    };
    let result = schedule::compute_schedule(&loan)?;
    Ok(serde_json::to_value(result)?)
}

fn loan_from_flags(args: &ScheduleArgs) -> Result<LoanInput, Box<dyn std::error::Error>> {
    let rate = args
        .rate
        .ok_or("--rate is required (or provide --input)")?;
    Ok(LoanInput {
        principal: args.principal,
        periodic_rate: args.rate_basis.to_periodic(rate),
        term_periods: args.term,
        payment: args.payment,
        max_periods: args.max_periods,
        start_date: args.start_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_basis_conversion() {
        assert_eq!(RateBasis::Periodic.to_periodic(dec!(0.005)), dec!(0.005));
        assert_eq!(RateBasis::MonthlyPercent.to_periodic(dec!(0.5)), dec!(0.005));
        assert_eq!(RateBasis::AnnualPercent.to_periodic(dec!(6)), dec!(0.005));
    }

    #[test]
    fn test_loan_from_flags_requires_rate() {
        let args = ScheduleArgs {
            principal: Some(dec!(1000)),
            rate: None,
            rate_basis: RateBasis::Periodic,
            term: Some(12),
            payment: None,
            start_date: None,
            max_periods: DEFAULT_MAX_PERIODS,
            input: None,
        };
        assert!(loan_from_flags(&args).is_err());
    }

    #[test]
    fn test_loan_from_flags_converts_annual_percent() {
        let args = ScheduleArgs {
            principal: Some(dec!(200000)),
            rate: Some(dec!(3.6)),
            rate_basis: RateBasis::AnnualPercent,
            term: Some(240),
            payment: None,
            start_date: None,
            max_periods: 480,
            input: None,
        };
        let loan = loan_from_flags(&args).unwrap();
        assert_eq!(loan.periodic_rate, dec!(0.003));
        assert_eq!(loan.max_periods, 480);
    }
}
