use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::time_value::compound;
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for a retirement savings projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementInput {
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_savings: Money,
    /// Contribution made at the end of the first year
    pub annual_contribution: Money,
    /// Yearly raise applied to the contribution, percent
    #[serde(default)]
    pub contribution_growth_pct: Decimal,
    /// Expected nominal portfolio return, percent
    pub annual_return_pct: Decimal,
    #[serde(default)]
    pub inflation_pct: Decimal,
    /// Share of the nest egg drawn in the first retirement year, percent
    #[serde(default = "default_withdrawal_rate_pct")]
    pub withdrawal_rate_pct: Decimal,
}

fn default_withdrawal_rate_pct() -> Decimal {
    dec!(4)
}

/// A single year in the accumulation projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementYear {
    pub year: u32,
    pub age: u32,
    pub starting_balance: Money,
    pub contribution: Money,
    pub growth: Money,
    pub ending_balance: Money,
    /// Ending balance in today's money
    pub real_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementOutput {
    pub years_to_retirement: u32,
    pub nest_egg: Money,
    pub real_nest_egg: Money,
    pub total_contributions: Money,
    pub total_growth: Money,
    /// First-year retirement income at the withdrawal rate
    pub sustainable_annual_income: Money,
    pub real_sustainable_annual_income: Money,
    pub schedule: Vec<RetirementYear>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Project savings year by year up to retirement.
///
/// Growth accrues on the opening balance; the year's contribution lands at
/// year end and grows by `contribution_growth_pct` each following year.
pub fn project_retirement(
    input: &RetirementInput,
) -> CalcResult<ComputationOutput<RetirementOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_retirement_input(input)?;

    let years_to_retirement = input.retirement_age - input.current_age;
    let annual_return = pct_to_rate(input.annual_return_pct);
    let contribution_growth = pct_to_rate(input.contribution_growth_pct);
    let inflation = pct_to_rate(input.inflation_pct);

    let mut schedule: Vec<RetirementYear> = Vec::with_capacity(years_to_retirement as usize);
    let mut balance = input.current_savings;
    let mut total_contributions = Decimal::ZERO;
    let mut total_growth = Decimal::ZERO;

    for yr in 0..years_to_retirement {
        let age = input.current_age + yr + 1;
        let starting_balance = balance;
        let contribution = input
            .annual_contribution
            .checked_mul(compound(contribution_growth, yr)?)
            .ok_or_else(|| CalcError::overflow(format!("contribution at age {age}")))?;
        let growth = starting_balance
            .checked_mul(annual_return)
            .ok_or_else(|| CalcError::overflow(format!("growth at age {age}")))?;
        balance = starting_balance
            .checked_add(growth)
            .and_then(|b| b.checked_add(contribution))
            .ok_or_else(|| CalcError::overflow(format!("balance at age {age}")))?;

        total_contributions = total_contributions
            .checked_add(contribution)
            .ok_or_else(|| CalcError::overflow("total contributions"))?;
        total_growth = total_growth
            .checked_add(growth)
            .ok_or_else(|| CalcError::overflow("total growth"))?;

        let real_balance = deflate(balance, compound(inflation, yr + 1)?)?;

        schedule.push(RetirementYear {
            year: yr + 1,
            age,
            starting_balance,
            contribution,
            growth,
            ending_balance: balance,
            real_balance,
        });
    }

    let nest_egg = balance;
    let deflator = compound(inflation, years_to_retirement)?;
    let real_nest_egg = deflate(nest_egg, deflator)?;
    let withdrawal_rate = pct_to_rate(input.withdrawal_rate_pct);
    let sustainable_annual_income = nest_egg
        .checked_mul(withdrawal_rate)
        .ok_or_else(|| CalcError::overflow("sustainable annual income"))?;
    let real_sustainable_annual_income = deflate(sustainable_annual_income, deflator)?;

    if balance < Decimal::ZERO {
        warnings.push("Projected balance is negative at retirement".into());
    }
    if input.withdrawal_rate_pct > dec!(5) {
        warnings.push(format!(
            "Withdrawal rate of {}% is above the common 4% guideline; the nest egg may not last",
            input.withdrawal_rate_pct
        ));
    }
    if input.annual_return_pct > dec!(12) {
        warnings.push(format!(
            "Expected return of {}% is optimistic for a diversified portfolio",
            input.annual_return_pct
        ));
    }

    let output = RetirementOutput {
        years_to_retirement,
        nest_egg,
        real_nest_egg,
        total_contributions,
        total_growth,
        sustainable_annual_income,
        real_sustainable_annual_income,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Retirement accumulation projection with withdrawal-rate income",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Express a nominal amount in today's money.
fn deflate(amount: Money, deflator: Decimal) -> CalcResult<Money> {
    amount.checked_div(deflator).ok_or_else(|| CalcError::DivisionByZero {
        context: "inflation deflator".into(),
    })
}

fn validate_retirement_input(input: &RetirementInput) -> CalcResult<()> {
    if input.retirement_age < input.current_age {
        return Err(CalcError::invalid(
            "retirement_age",
            "retirement_age must be >= current_age",
        ));
    }
    if input.current_savings < Decimal::ZERO {
        return Err(CalcError::invalid(
            "current_savings",
            "Current savings cannot be negative",
        ));
    }
    if input.annual_contribution < Decimal::ZERO {
        return Err(CalcError::invalid(
            "annual_contribution",
            "Annual contribution cannot be negative",
        ));
    }
    if input.annual_return_pct <= dec!(-100) || input.inflation_pct <= dec!(-100) {
        return Err(CalcError::invalid(
            "annual_return_pct / inflation_pct",
            "Rates must be greater than -100%",
        ));
    }
    if input.withdrawal_rate_pct < Decimal::ZERO || input.withdrawal_rate_pct > dec!(100) {
        return Err(CalcError::invalid(
            "withdrawal_rate_pct",
            "Withdrawal rate must be between 0 and 100",
        ));
    }
    Ok(())
}
