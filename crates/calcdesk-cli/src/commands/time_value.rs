use clap::Args;
use rust_decimal::Decimal;

use calcdesk_core::solvers::irr::{self, IrrInput};
use calcdesk_core::time_value::{
    self, AnnuityInput, AnnuityKind, AnnuityTiming, CompoundGrowthInput,
};
use calcdesk_core::Frequency;

use super::{parse_choice, CommandResult};
use crate::input;

const FREQUENCIES: &[&str] = &[
    "annually",
    "semi_annually",
    "quarterly",
    "monthly",
    "bi_weekly",
    "weekly",
    "daily",
];

/// Arguments for annuity valuation
#[derive(Args)]
pub struct AnnuityArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// future_value or present_value
    #[arg(long, default_value = "future_value")]
    pub kind: String,

    /// Payment per period
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of years
    #[arg(long)]
    pub years: Option<u32>,

    /// Payment frequency
    #[arg(long, default_value = "annually")]
    pub frequency: String,

    /// Payments at the start of each period (annuity due)
    #[arg(long)]
    pub due: bool,
}

pub fn run_annuity(args: AnnuityArgs) -> CommandResult {
    let annuity: AnnuityInput = match input::load(args.input.as_deref())? {
        Some(annuity) => annuity,
        None => {
            let kind: AnnuityKind =
                parse_choice("kind", &args.kind, &["future_value", "present_value"])?;
            let frequency: Frequency = parse_choice("frequency", &args.frequency, FREQUENCIES)?;
            AnnuityInput {
                kind,
                payment: args.payment.ok_or("--payment is required (or provide --input)")?,
                annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
                periods: args.years.ok_or("--years is required (or provide --input)")?,
                frequency,
                timing: if args.due {
                    AnnuityTiming::Due
                } else {
                    AnnuityTiming::Ordinary
                },
            }
        }
    };
    let result = time_value::compute_annuity_value(&annuity)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for compound growth of a lump sum
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CompoundGrowthArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Opening deposit
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate in percent (negative for a shrinking balance)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of years
    #[arg(long)]
    pub years: Option<u32>,

    /// Compounding frequency
    #[arg(long, default_value = "annually")]
    pub compounding: String,
}

pub fn run_compound_growth(args: CompoundGrowthArgs) -> CommandResult {
    let growth: CompoundGrowthInput = match input::load(args.input.as_deref())? {
        Some(growth) => growth,
        None => CompoundGrowthInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            compounding: parse_choice("compounding", &args.compounding, FREQUENCIES)?,
        },
    };
    let result = time_value::compute_compound_growth(&growth)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for internal rate of return
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Periodic cash flows (comma-separated, e.g. "-1000,300,400,500")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_irr(args: IrrArgs) -> CommandResult {
    let flows: IrrInput = match input::load(args.input.as_deref())? {
        Some(flows) => flows,
        None => IrrInput {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
        },
    };
    let result = irr::compute_irr(&flows)?;
    Ok(serde_json::to_value(result)?)
}
