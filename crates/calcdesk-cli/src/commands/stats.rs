use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use calcdesk_core::stats::{self, ConfidenceIntervalInput};

use super::CommandResult;
use crate::input;

/// Arguments for a confidence interval
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ConfidenceIntervalArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Sample mean
    #[arg(long)]
    pub mean: Option<Decimal>,

    /// Sample standard deviation
    #[arg(long)]
    pub std_dev: Option<Decimal>,

    /// Number of observations
    #[arg(long, short = 'n')]
    pub sample_size: Option<u64>,

    /// Confidence level in percent (80, 85, 90, 95, 98, 99, 99.5, 99.9)
    #[arg(long)]
    pub confidence: Option<Decimal>,
}

pub fn run_confidence_interval(args: ConfidenceIntervalArgs) -> CommandResult {
    let sample: ConfidenceIntervalInput = match input::load(args.input.as_deref())? {
        Some(sample) => sample,
        None => ConfidenceIntervalInput {
            mean: args.mean.ok_or("--mean is required (or provide --input)")?,
            std_dev: args.std_dev.ok_or("--std-dev is required (or provide --input)")?,
            sample_size: args
                .sample_size
                .ok_or("--sample-size is required (or provide --input)")?,
            confidence_pct: args.confidence.unwrap_or(dec!(95)),
        },
    };
    let result = stats::compute_confidence_interval(&sample)?;
    Ok(serde_json::to_value(result)?)
}
