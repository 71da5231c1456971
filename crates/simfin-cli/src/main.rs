mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::amortization::ScheduleArgs;
use commands::distributions::{BinomialArgs, HypergeometricArgs, PoissonArgs, QueryArgs};

/// Loan amortization schedules and discrete probability laws
#[derive(Parser)]
#[command(
    name = "simfin",
    version,
    about = "Loan amortization schedules and discrete probability laws",
    long_about = "Solves a fixed-payment loan for its missing principal, term or payment \
                  and prints the month-by-month schedule, or evaluates PMF/CDF for \
                  binomial, Poisson and hypergeometric distributions. \
                  Set RUST_LOG=debug for diagnostic output on stderr."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an amortization schedule from any two of principal, term and payment
    Schedule(ScheduleArgs),
    /// Binomial probability P(X = k), P(X <= k), P(X > k)
    Binomial(BinomialArgs),
    /// Poisson probability P(X = k), P(X <= k), P(X > k)
    Poisson(PoissonArgs),
    /// Hypergeometric probability P(X = k), P(X <= k), P(X > k)
    Hypergeometric(HypergeometricArgs),
    /// Evaluate a distribution query read from JSON
    Query(QueryArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::amortization::run_schedule(args),
        Commands::Binomial(args) => commands::distributions::run_binomial(args),
        Commands::Poisson(args) => commands::distributions::run_poisson(args),
        Commands::Hypergeometric(args) => commands::distributions::run_hypergeometric(args),
        Commands::Query(args) => commands::distributions::run_query(args),
        Commands::Version => {
            println!("simfin {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
