use clap::Args;
use serde_json::Value;

use simfin_core::distributions::{self, Distribution, DistributionQuery, DEFAULT_MAX_TERMS};

use crate::input;

/// Arguments for a binomial probability
#[derive(Args)]
pub struct BinomialArgs {
    /// Number of trials (n)
    #[arg(long)]
    pub trials: i64,

    /// Probability of success on each trial, in [0, 1]
    #[arg(long)]
    pub prob: f64,

    /// Number of successes to evaluate (k)
    #[arg(long, allow_hyphen_values = true)]
    pub k: f64,

    /// Refuse CDFs that need more summation terms than this
    #[arg(long, default_value_t = DEFAULT_MAX_TERMS)]
    pub max_terms: u64,
}

/// Arguments for a Poisson probability
#[derive(Args)]
pub struct PoissonArgs {
    /// Average number of events (λ)
    #[arg(long)]
    pub lambda: f64,

    /// Event count to evaluate (k)
    #[arg(long, allow_hyphen_values = true)]
    pub k: f64,

    /// Refuse CDFs that need more summation terms than this
    #[arg(long, default_value_t = DEFAULT_MAX_TERMS)]
    pub max_terms: u64,
}

/// Arguments for a hypergeometric probability
#[derive(Args)]
pub struct HypergeometricArgs {
    /// Population size (N)
    #[arg(long)]
    pub population: i64,

    /// Successes in the population (K)
    #[arg(long)]
    pub successes: i64,

    /// Draws without replacement (n)
    #[arg(long)]
    pub draws: i64,

    /// Successes among the draws to evaluate (k)
    #[arg(long, allow_hyphen_values = true)]
    pub k: f64,

    /// Refuse CDFs that need more summation terms than this
    #[arg(long, default_value_t = DEFAULT_MAX_TERMS)]
    pub max_terms: u64,
}

/// Arguments for a JSON-described query
#[derive(Args)]
pub struct QueryArgs {
    /// Path to JSON file holding a tagged query, e.g.
    /// {"distribution":"poisson","rate":2.0,"value":3}
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_binomial(args: BinomialArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let law = Distribution::Binomial {
        trials: args.trials,
        success_prob: args.prob,
    };
    evaluate(bounded(law, args.k, args.max_terms))
}

pub fn run_poisson(args: PoissonArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let law = Distribution::Poisson { rate: args.lambda };
    evaluate(bounded(law, args.k, args.max_terms))
}

pub fn run_hypergeometric(args: HypergeometricArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let law = Distribution::Hypergeometric {
        population_size: args.population,
        population_successes: args.successes,
        draws: args.draws,
    };
    evaluate(bounded(law, args.k, args.max_terms))
}

pub fn run_query(args: QueryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let query: DistributionQuery = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for a distribution query")?;
    evaluate(query)
}

fn bounded(law: Distribution, k: f64, max_terms: u64) -> DistributionQuery {
    DistributionQuery {
        max_terms,
        ..DistributionQuery::new(law, k)
    }
}

fn evaluate(query: DistributionQuery) -> Result<Value, Box<dyn std::error::Error>> {
    let result = distributions::evaluate(&query)?;
    Ok(serde_json::to_value(result)?)
}
