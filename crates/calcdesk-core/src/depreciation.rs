use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::error::CalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepreciationMethod {
    StraightLine,
    DoubleDecliningBalance,
    SumOfYearsDigits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciationInput {
    pub cost: Money,
    pub salvage_value: Money,
    pub useful_life_years: u32,
    pub method: DepreciationMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationEntry {
    pub year: u32,
    pub beginning_book_value: Money,
    pub depreciation_expense: Money,
    pub accumulated_depreciation: Money,
    pub ending_book_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciationOutput {
    pub method: DepreciationMethod,
    pub depreciable_base: Money,
    pub total_depreciation: Money,
    /// First-year expense as a fraction of the depreciable base
    pub first_year_rate: Rate,
    pub schedule: Vec<DepreciationEntry>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Year-by-year depreciation schedule.
///
/// Expenses are clamped so book value never falls below salvage. The last
/// year books whatever is left above salvage, so the schedule always ends at
/// exactly the salvage value.
pub fn compute_depreciation(
    input: &DepreciationInput,
) -> CalcResult<ComputationOutput<DepreciationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_depreciation_input(input)?;

    let life_years = input.useful_life_years;
    let life = Decimal::from(life_years);
    let depreciable_base = input.cost - input.salvage_value;
    let syd_denominator = life * (life + Decimal::ONE) / dec!(2);
    let ddb_rate = dec!(2) / life;

    let mut schedule: Vec<DepreciationEntry> = Vec::with_capacity(life_years as usize);
    let mut book_value = input.cost;

    for year in 1..=life_years {
        let beginning_book_value = book_value;
        let headroom = (beginning_book_value - input.salvage_value).max(Decimal::ZERO);

        let planned = method_expense(
            input.method,
            beginning_book_value,
            depreciable_base,
            life,
            year,
            ddb_rate,
            syd_denominator,
        );

        let (depreciation_expense, ending_book_value) = if year == life_years {
            if input.method == DepreciationMethod::DoubleDecliningBalance && headroom > planned {
                warn!(year, %headroom, %planned, "final year absorbs declining-balance remainder");
                warnings.push(format!(
                    "Final year absorbs {} of remaining book value above salvage",
                    (headroom - planned).round_dp(2)
                ));
            }
            (headroom, input.salvage_value)
        } else {
            let expense = planned.min(headroom);
            (expense, beginning_book_value - expense)
        };

        schedule.push(DepreciationEntry {
            year,
            beginning_book_value,
            depreciation_expense,
            accumulated_depreciation: Decimal::ZERO,
            ending_book_value,
        });
        book_value = ending_book_value;
    }

    // Accumulated totals are summed after the final-year adjustment
    let mut accumulated = Decimal::ZERO;
    for entry in schedule.iter_mut() {
        accumulated += entry.depreciation_expense;
        entry.accumulated_depreciation = accumulated;
    }

    let first_year_rate = match schedule.first() {
        Some(first) if !depreciable_base.is_zero() => first.depreciation_expense / depreciable_base,
        _ => Decimal::ZERO,
    };

    if depreciable_base.is_zero() {
        warnings.push("Salvage value equals cost; nothing to depreciate".into());
    }

    let output = DepreciationOutput {
        method: input.method,
        depreciable_base,
        total_depreciation: accumulated,
        first_year_rate,
        schedule,
    };

    let methodology = match input.method {
        DepreciationMethod::StraightLine => "Straight-line depreciation",
        DepreciationMethod::DoubleDecliningBalance => "Double-declining-balance depreciation",
        DepreciationMethod::SumOfYearsDigits => "Sum-of-years-digits depreciation",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Unclamped expense for one year under the chosen method.
fn method_expense(
    method: DepreciationMethod,
    book_value: Money,
    depreciable_base: Money,
    life: Decimal,
    year: u32,
    ddb_rate: Rate,
    syd_denominator: Decimal,
) -> Money {
    match method {
        DepreciationMethod::StraightLine => depreciable_base / life,
        DepreciationMethod::DoubleDecliningBalance => book_value * ddb_rate,
        DepreciationMethod::SumOfYearsDigits => {
            let remaining_life = life - Decimal::from(year) + Decimal::ONE;
            depreciable_base * remaining_life / syd_denominator
        }
    }
}

fn validate_depreciation_input(input: &DepreciationInput) -> CalcResult<()> {
    if input.cost <= Decimal::ZERO {
        return Err(CalcError::invalid("cost", "Asset cost must be positive"));
    }
    if input.salvage_value < Decimal::ZERO {
        return Err(CalcError::invalid(
            "salvage_value",
            "Salvage value cannot be negative",
        ));
    }
    if input.salvage_value > input.cost {
        return Err(CalcError::invalid(
            "salvage_value",
            "Salvage value cannot exceed cost",
        ));
    }
    if input.useful_life_years == 0 {
        return Err(CalcError::invalid(
            "useful_life_years",
            "Useful life must be at least one year",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn asset(method: DepreciationMethod) -> DepreciationInput {
        DepreciationInput {
            cost: dec!(10000),
            salvage_value: dec!(1000),
            useful_life_years: 5,
            method,
        }
    }

    #[test]
    fn test_ddb_first_years() {
        let out = compute_depreciation(&asset(DepreciationMethod::DoubleDecliningBalance)).unwrap();
        let s = &out.result.schedule;
        assert_eq!(s[0].depreciation_expense, dec!(4000));
        assert_eq!(s[1].depreciation_expense, dec!(2400));
        assert_eq!(s[2].depreciation_expense, dec!(1440));
        assert_eq!(s[3].depreciation_expense, dec!(864));
        // 1296 - 1000 is all that is left above salvage
        assert_eq!(s[4].depreciation_expense, dec!(296));
        assert_eq!(s[4].ending_book_value, dec!(1000));
    }

    #[test]
    fn test_ddb_final_year_plug_warns() {
        let input = DepreciationInput {
            cost: dec!(10000),
            salvage_value: Decimal::ZERO,
            useful_life_years: 3,
            method: DepreciationMethod::DoubleDecliningBalance,
        };
        let out = compute_depreciation(&input).unwrap();
        // 6666.67, 2222.22, then the remaining 1111.11 is booked in year 3
        assert_eq!(out.result.schedule[2].ending_book_value, Decimal::ZERO);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_syd_weights() {
        let out = compute_depreciation(&asset(DepreciationMethod::SumOfYearsDigits)).unwrap();
        let s = &out.result.schedule;
        // 9000 * 5/15, 4/15, 3/15, 2/15, 1/15
        assert_eq!(s[0].depreciation_expense, dec!(3000));
        assert_eq!(s[1].depreciation_expense, dec!(2400));
        assert_eq!(s[4].depreciation_expense, dec!(600));
        assert_eq!(out.result.first_year_rate.round_dp(4), dec!(0.3333));
    }

    #[test]
    fn test_salvage_equal_to_cost() {
        let input = DepreciationInput {
            cost: dec!(5000),
            salvage_value: dec!(5000),
            useful_life_years: 4,
            method: DepreciationMethod::StraightLine,
        };
        let out = compute_depreciation(&input).unwrap();
        assert!(out.result.schedule.iter().all(|e| e.depreciation_expense.is_zero()));
        assert_eq!(out.result.total_depreciation, Decimal::ZERO);
    }

    #[test]
    fn test_single_year_life() {
        let mut input = asset(DepreciationMethod::DoubleDecliningBalance);
        input.useful_life_years = 1;
        let out = compute_depreciation(&input).unwrap();
        assert_eq!(out.result.schedule.len(), 1);
        assert_eq!(out.result.schedule[0].depreciation_expense, dec!(9000));
    }

    #[test]
    fn test_salvage_above_cost_rejected() {
        let mut input = asset(DepreciationMethod::StraightLine);
        input.salvage_value = dec!(20000);
        assert!(compute_depreciation(&input).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_zero_life_rejected() {
        let mut input = asset(DepreciationMethod::StraightLine);
        input.useful_life_years = 0;
        assert!(compute_depreciation(&input).unwrap_err().is_invalid_input());
    }
}
