use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use calcdesk_core::retirement::{self, RetirementInput};

use super::CommandResult;
use crate::input;

/// Arguments for a retirement projection
#[derive(Args)]
pub struct RetirementArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub current_age: Option<u32>,

    #[arg(long)]
    pub retirement_age: Option<u32>,

    /// Savings today
    #[arg(long, default_value = "0")]
    pub savings: Decimal,

    /// Contribution in the first year
    #[arg(long, default_value = "0")]
    pub contribution: Decimal,

    /// Yearly raise in the contribution, percent
    #[arg(long, default_value = "0")]
    pub contribution_growth: Decimal,

    /// Expected annual return, percent
    #[arg(long)]
    pub return_rate: Option<Decimal>,

    /// Expected inflation, percent
    #[arg(long, default_value = "2.5")]
    pub inflation: Decimal,

    /// Withdrawal rate in retirement, percent
    #[arg(long)]
    pub withdrawal_rate: Option<Decimal>,
}

pub fn run_retirement(args: RetirementArgs) -> CommandResult {
    let plan: RetirementInput = match input::load(args.input.as_deref())? {
        Some(plan) => plan,
        None => RetirementInput {
            current_age: args
                .current_age
                .ok_or("--current-age is required (or provide --input)")?,
            retirement_age: args
                .retirement_age
                .ok_or("--retirement-age is required (or provide --input)")?,
            current_savings: args.savings,
            annual_contribution: args.contribution,
            contribution_growth_pct: args.contribution_growth,
            annual_return_pct: args
                .return_rate
                .ok_or("--return-rate is required (or provide --input)")?,
            inflation_pct: args.inflation,
            withdrawal_rate_pct: args.withdrawal_rate.unwrap_or(dec!(4)),
        },
    };
    let result = retirement::project_retirement(&plan)?;
    Ok(serde_json::to_value(result)?)
}
