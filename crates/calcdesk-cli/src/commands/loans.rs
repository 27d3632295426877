use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use calcdesk_core::loans::affordability::{self, AffordabilityInput};
use calcdesk_core::loans::amortization::{self, AmortizationInput};
use calcdesk_core::loans::mortgage::{self, LoanProgram, MortgageInput};

use super::{parse_choice, CommandResult};
use crate::input;

/// Arguments for a loan amortization schedule
#[derive(Args)]
pub struct AmortizationArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 6.5)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Extra principal paid every month
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// Loan start date (YYYY-MM-DD); enables payment dates
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_amortization(args: AmortizationArgs) -> CommandResult {
    let loan: AmortizationInput = match input::load(args.input.as_deref())? {
        Some(loan) => loan,
        None => AmortizationInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.years.ok_or("--years is required (or provide --input)")?,
            extra_monthly_payment: args.extra,
            start_date: args.start_date,
        },
    };
    let result = amortization::compute_amortization(&loan)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a full mortgage payment
#[derive(Args)]
pub struct MortgageArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Cash down payment
    #[arg(long)]
    pub down: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long, default_value = "30")]
    pub years: u32,

    /// Annual property tax as a percent of price
    #[arg(long, default_value = "0")]
    pub tax_rate: Decimal,

    /// Annual homeowners insurance premium
    #[arg(long, default_value = "0")]
    pub insurance: Decimal,

    /// Monthly HOA dues
    #[arg(long, default_value = "0")]
    pub hoa: Decimal,

    /// Loan program: conventional, fha, va
    #[arg(long, default_value = "conventional")]
    pub program: String,

    /// Annual PMI rate in percent (conventional loans)
    #[arg(long, default_value = "0.5")]
    pub pmi_rate: Decimal,

    /// VA entitlement used before
    #[arg(long)]
    pub va_subsequent_use: bool,

    /// Exempt from the VA funding fee
    #[arg(long)]
    pub va_exempt: bool,
}

pub fn run_mortgage(args: MortgageArgs) -> CommandResult {
    let loan: MortgageInput = match input::load(args.input.as_deref())? {
        Some(loan) => loan,
        None => {
            let program: LoanProgram =
                parse_choice("program", &args.program, &["conventional", "fha", "va"])?;
            MortgageInput {
                home_price: args.price.ok_or("--price is required (or provide --input)")?,
                down_payment: args.down.ok_or("--down is required (or provide --input)")?,
                annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
                term_years: args.years,
                property_tax_rate_pct: args.tax_rate,
                annual_insurance: args.insurance,
                monthly_hoa: args.hoa,
                program,
                pmi_rate_pct: args.pmi_rate,
                va_subsequent_use: args.va_subsequent_use,
                va_funding_fee_exempt: args.va_exempt,
            }
        }
    };
    let result = mortgage::compute_mortgage_payment(&loan)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for home affordability
#[derive(Args)]
pub struct AffordabilityArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross annual household income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Existing monthly debt payments
    #[arg(long, default_value = "0")]
    pub debts: Decimal,

    /// Cash available for the down payment
    #[arg(long, default_value = "0")]
    pub down: Decimal,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long, default_value = "30")]
    pub years: u32,

    /// Annual property tax as a percent of price
    #[arg(long, default_value = "1.1")]
    pub tax_rate: Decimal,

    /// Annual insurance as a percent of price
    #[arg(long, default_value = "0.35")]
    pub insurance_rate: Decimal,

    /// Front-end DTI limit in percent
    #[arg(long)]
    pub front_end: Option<Decimal>,

    /// Back-end DTI limit in percent
    #[arg(long)]
    pub back_end: Option<Decimal>,
}

pub fn run_affordability(args: AffordabilityArgs) -> CommandResult {
    let household: AffordabilityInput = match input::load(args.input.as_deref())? {
        Some(household) => household,
        None => AffordabilityInput {
            annual_income: args.income.ok_or("--income is required (or provide --input)")?,
            monthly_debts: args.debts,
            down_payment: args.down,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.years,
            property_tax_rate_pct: args.tax_rate,
            insurance_rate_pct: args.insurance_rate,
            front_end_limit_pct: args.front_end.unwrap_or(dec!(28)),
            back_end_limit_pct: args.back_end.unwrap_or(dec!(36)),
        },
    };
    let result = affordability::compute_affordability(&household)?;
    Ok(serde_json::to_value(result)?)
}
