use clap::Args;
use rust_decimal::Decimal;

use calcdesk_core::depreciation::{self, DepreciationInput, DepreciationMethod};

use super::{parse_choice, CommandResult};
use crate::input;

/// Arguments for a depreciation schedule
#[derive(Args)]
pub struct DepreciationArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Asset cost
    #[arg(long)]
    pub cost: Option<Decimal>,

    /// Residual value at the end of the useful life
    #[arg(long, default_value = "0")]
    pub salvage: Decimal,

    /// Useful life in years
    #[arg(long)]
    pub life: Option<u32>,

    /// straight_line, double_declining_balance, sum_of_years_digits
    #[arg(long, default_value = "straight_line")]
    pub method: String,
}

pub fn run_depreciation(args: DepreciationArgs) -> CommandResult {
    let asset: DepreciationInput = match input::load(args.input.as_deref())? {
        Some(asset) => asset,
        None => {
            let method: DepreciationMethod = parse_choice(
                "method",
                &args.method,
                &["straight_line", "double_declining_balance", "sum_of_years_digits"],
            )?;
            DepreciationInput {
                cost: args.cost.ok_or("--cost is required (or provide --input)")?,
                salvage_value: args.salvage,
                useful_life_years: args.life.ok_or("--life is required (or provide --input)")?,
                method,
            }
        }
    };
    let result = depreciation::compute_depreciation(&asset)?;
    Ok(serde_json::to_value(result)?)
}
