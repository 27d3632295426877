mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::depreciation::DepreciationArgs;
use commands::fitness::{BmiArgs, BodyFatArgs, EnergyArgs};
use commands::loans::{AffordabilityArgs, AmortizationArgs, MortgageArgs};
use commands::retirement::RetirementArgs;
use commands::stats::ConfidenceIntervalArgs;
use commands::time_value::{AnnuityArgs, CompoundGrowthArgs, IrrArgs};

/// Loan, depreciation, time-value and fitness calculators
#[derive(Parser)]
#[command(
    name = "calcdesk",
    version,
    about = "Loan, depreciation, time-value and fitness calculators",
    long_about = "A CLI for everyday financial and health calculations with decimal \
                  precision. Supports amortization, mortgages, affordability, \
                  depreciation, annuities, IRR, confidence intervals, retirement \
                  projections, BMI, BMR/TDEE and body fat."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "calcdesk_core=trace")
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Level-payment loan amortization schedule
    Amortization(AmortizationArgs),
    /// Monthly mortgage payment with tax, insurance and PMI/MIP
    Mortgage(MortgageArgs),
    /// Maximum affordable home price under DTI limits
    Affordability(AffordabilityArgs),
    /// Depreciation schedule (straight-line, DDB, SYD)
    Depreciation(DepreciationArgs),
    /// Present or future value of a level annuity
    Annuity(AnnuityArgs),
    /// Compound growth of a single deposit
    CompoundGrowth(CompoundGrowthArgs),
    /// Internal rate of return of a cash-flow series
    Irr(IrrArgs),
    /// Confidence interval for a sample mean
    ConfidenceInterval(ConfidenceIntervalArgs),
    /// Year-by-year retirement savings projection
    Retirement(RetirementArgs),
    /// Body mass index
    Bmi(BmiArgs),
    /// Basal metabolic rate and daily energy expenditure
    Energy(EnergyArgs),
    /// US Navy body fat estimate
    BodyFat(BodyFatArgs),
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

/// Logs go to stderr so piped output stays machine-readable.
fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortization(args) => commands::loans::run_amortization(args),
        Commands::Mortgage(args) => commands::loans::run_mortgage(args),
        Commands::Affordability(args) => commands::loans::run_affordability(args),
        Commands::Depreciation(args) => commands::depreciation::run_depreciation(args),
        Commands::Annuity(args) => commands::time_value::run_annuity(args),
        Commands::CompoundGrowth(args) => commands::time_value::run_compound_growth(args),
        Commands::Irr(args) => commands::time_value::run_irr(args),
        Commands::ConfidenceInterval(args) => commands::stats::run_confidence_interval(args),
        Commands::Retirement(args) => commands::retirement::run_retirement(args),
        Commands::Bmi(args) => commands::fitness::run_bmi(args),
        Commands::Energy(args) => commands::fitness::run_energy(args),
        Commands::BodyFat(args) => commands::fitness::run_body_fat(args),
        Commands::Version => {
            println!("calcdesk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            debug!(format = ?cli.output, "writing result");
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
