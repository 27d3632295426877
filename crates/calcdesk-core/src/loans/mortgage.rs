use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::loans::amortization::{build_schedule, checked_total, level_payment, AmortizationEntry};
use crate::types::{pct_to_rate, rate_to_pct, with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

const MONTHS_PER_YEAR: u32 = 12;

// Conventional private mortgage insurance
const PMI_REQUIRED_ABOVE_LTV: Rate = dec!(0.80);
const PMI_CANCELS_AT_LTV: Rate = dec!(0.78);
const CONVENTIONAL_MIN_DOWN: Rate = dec!(0.03);

// FHA mortgage insurance premium (HUD schedule, case numbers from March 2023)
const FHA_MIN_DOWN: Rate = dec!(0.035);
const FHA_UPFRONT_MIP: Rate = dec!(0.0175);
const FHA_ELEVEN_YEAR_MIP_MAX_LTV: Rate = dec!(0.90);
const FHA_ELEVEN_YEAR_MIP_MONTHS: u32 = 132;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loan program, which decides how mortgage insurance is charged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanProgram {
    #[default]
    Conventional,
    Fha,
    Va,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageInput {
    pub home_price: Money,
    pub down_payment: Money,
    /// Nominal annual rate in percent
    pub annual_rate_pct: Decimal,
    pub term_years: u32,
    /// Annual property tax as a percent of the home price
    #[serde(default)]
    pub property_tax_rate_pct: Decimal,
    /// Annual homeowners insurance premium
    #[serde(default)]
    pub annual_insurance: Money,
    #[serde(default)]
    pub monthly_hoa: Money,
    #[serde(default)]
    pub program: LoanProgram,
    /// Annual PMI as a percent of the original loan (conventional only)
    #[serde(default = "default_pmi_rate_pct")]
    pub pmi_rate_pct: Decimal,
    /// VA borrower has used the entitlement before
    #[serde(default)]
    pub va_subsequent_use: bool,
    /// VA borrower is exempt from the funding fee (e.g. service-connected disability)
    #[serde(default)]
    pub va_funding_fee_exempt: bool,
}

fn default_pmi_rate_pct() -> Decimal {
    dec!(0.5)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageOutput {
    /// Home price less down payment
    pub base_loan_amount: Money,
    /// FHA upfront MIP or VA funding fee, financed into the loan
    pub upfront_fee: Money,
    pub loan_amount: Money,
    pub loan_to_value_pct: Decimal,
    pub principal_and_interest: Money,
    pub monthly_property_tax: Money,
    pub monthly_insurance: Money,
    pub monthly_mortgage_insurance: Money,
    pub monthly_hoa: Money,
    /// PITI plus mortgage insurance and HOA while insurance is charged
    pub total_monthly_payment: Money,
    pub mortgage_insurance_months: u32,
    pub total_mortgage_insurance: Money,
    pub total_interest: Money,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Full monthly housing payment for a purchase under a given loan program.
pub fn compute_mortgage_payment(
    input: &MortgageInput,
) -> CalcResult<ComputationOutput<MortgageOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_mortgage_input(input)?;

    let base_loan_amount = input.home_price - input.down_payment;
    let down_fraction = input.down_payment / input.home_price;
    let ltv = base_loan_amount / input.home_price;

    let upfront_fee = match input.program {
        LoanProgram::Conventional => Decimal::ZERO,
        LoanProgram::Fha => base_loan_amount * FHA_UPFRONT_MIP,
        LoanProgram::Va => {
            base_loan_amount
                * va_funding_fee_rate(
                    down_fraction,
                    input.va_subsequent_use,
                    input.va_funding_fee_exempt,
                )
        }
    };
    let loan_amount = base_loan_amount
        .checked_add(upfront_fee)
        .ok_or_else(|| CalcError::overflow("loan amount with financed fee"))?;

    let periods = input
        .term_years
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| CalcError::overflow("number of monthly payments"))?;
    let monthly_rate = pct_to_rate(input.annual_rate_pct) / Decimal::from(MONTHS_PER_YEAR);
    let principal_and_interest = level_payment(loan_amount, monthly_rate, periods)?;
    let schedule = build_schedule(
        loan_amount,
        monthly_rate,
        periods,
        principal_and_interest,
        Decimal::ZERO,
        None,
    )?;
    let total_interest = checked_total(schedule.iter().map(|e| e.interest), "total interest")?;

    let (monthly_mortgage_insurance, mortgage_insurance_months) = match input.program {
        LoanProgram::Conventional => {
            if ltv > PMI_REQUIRED_ABOVE_LTV {
                let monthly = base_loan_amount
                    .checked_mul(pct_to_rate(input.pmi_rate_pct))
                    .ok_or_else(|| CalcError::overflow("monthly PMI"))?
                    / Decimal::from(MONTHS_PER_YEAR);
                let months = months_until_ltv(&schedule, input.home_price, PMI_CANCELS_AT_LTV);
                (monthly, months)
            } else {
                (Decimal::ZERO, 0)
            }
        }
        LoanProgram::Fha => {
            let annual = fha_annual_mip_rate(ltv, input.term_years);
            let monthly = base_loan_amount * annual / Decimal::from(MONTHS_PER_YEAR);
            let months = if ltv <= FHA_ELEVEN_YEAR_MIP_MAX_LTV {
                FHA_ELEVEN_YEAR_MIP_MONTHS.min(schedule.len() as u32)
            } else {
                schedule.len() as u32
            };
            (monthly, months)
        }
        LoanProgram::Va => (Decimal::ZERO, 0),
    };

    let monthly_property_tax = input
        .home_price
        .checked_mul(pct_to_rate(input.property_tax_rate_pct))
        .ok_or_else(|| CalcError::overflow("monthly property tax"))?
        / Decimal::from(MONTHS_PER_YEAR);
    let monthly_insurance = input.annual_insurance / Decimal::from(MONTHS_PER_YEAR);
    let total_monthly_payment = checked_total(
        [
            principal_and_interest,
            monthly_property_tax,
            monthly_insurance,
            monthly_mortgage_insurance,
            input.monthly_hoa,
        ],
        "total monthly payment",
    )?;
    let total_mortgage_insurance = monthly_mortgage_insurance
        .checked_mul(Decimal::from(mortgage_insurance_months))
        .ok_or_else(|| CalcError::overflow("total mortgage insurance"))?;

    if input.program == LoanProgram::Conventional && down_fraction < CONVENTIONAL_MIN_DOWN {
        warnings.push(format!(
            "Down payment of {}% is below the 3% minimum for most conventional loans",
            rate_to_pct(down_fraction).round_dp(2)
        ));
    }
    if input.program == LoanProgram::Conventional && input.pmi_rate_pct > dec!(2) {
        warnings.push(format!(
            "PMI rate of {}% is above the typical 0.3%-1.5% range",
            input.pmi_rate_pct
        ));
    }

    let output = MortgageOutput {
        base_loan_amount,
        upfront_fee,
        loan_amount,
        loan_to_value_pct: rate_to_pct(ltv),
        principal_and_interest,
        monthly_property_tax,
        monthly_insurance,
        monthly_mortgage_insurance,
        monthly_hoa: input.monthly_hoa,
        total_monthly_payment,
        mortgage_insurance_months,
        total_mortgage_insurance,
        total_interest,
    };

    let methodology = match input.program {
        LoanProgram::Conventional => "Conventional mortgage PITI with PMI to 78% LTV",
        LoanProgram::Fha => "FHA mortgage PITI with upfront and annual MIP",
        LoanProgram::Va => "VA mortgage PITI with financed funding fee",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_mortgage_input(input: &MortgageInput) -> CalcResult<()> {
    if input.home_price <= Decimal::ZERO {
        return Err(CalcError::invalid("home_price", "Home price must be positive"));
    }
    if input.down_payment < Decimal::ZERO {
        return Err(CalcError::invalid("down_payment", "Down payment cannot be negative"));
    }
    if input.down_payment >= input.home_price {
        return Err(CalcError::invalid(
            "down_payment",
            "Down payment must be less than the home price",
        ));
    }
    if input.annual_rate_pct < Decimal::ZERO {
        return Err(CalcError::invalid(
            "annual_rate_pct",
            "Interest rate cannot be negative",
        ));
    }
    if input.term_years == 0 {
        return Err(CalcError::invalid("term_years", "Term must be at least one year"));
    }
    if input.property_tax_rate_pct < Decimal::ZERO
        || input.annual_insurance < Decimal::ZERO
        || input.monthly_hoa < Decimal::ZERO
        || input.pmi_rate_pct < Decimal::ZERO
    {
        return Err(CalcError::invalid(
            "property_tax_rate_pct / annual_insurance / monthly_hoa / pmi_rate_pct",
            "Housing costs cannot be negative",
        ));
    }
    if input.program == LoanProgram::Fha && input.down_payment / input.home_price < FHA_MIN_DOWN {
        return Err(CalcError::invalid(
            "down_payment",
            "FHA loans require at least 3.5% down",
        ));
    }
    Ok(())
}

/// VA funding fee as a fraction of the base loan.
fn va_funding_fee_rate(down_fraction: Rate, subsequent_use: bool, exempt: bool) -> Rate {
    if exempt {
        return Decimal::ZERO;
    }
    if down_fraction >= dec!(0.10) {
        dec!(0.0125)
    } else if down_fraction >= dec!(0.05) {
        dec!(0.015)
    } else if subsequent_use {
        dec!(0.033)
    } else {
        dec!(0.0215)
    }
}

/// Annual FHA MIP as a fraction of the base loan.
fn fha_annual_mip_rate(ltv: Rate, term_years: u32) -> Rate {
    if term_years > 15 {
        if ltv > dec!(0.95) {
            dec!(0.0055)
        } else {
            dec!(0.0050)
        }
    } else if ltv > dec!(0.90) {
        dec!(0.0040)
    } else {
        dec!(0.0015)
    }
}

/// Number of payments made while the opening balance is above `ltv` of the
/// home's value.
fn months_until_ltv(schedule: &[AmortizationEntry], home_price: Money, ltv: Rate) -> u32 {
    let threshold = home_price * ltv;
    schedule
        .iter()
        .take_while(|e| e.beginning_balance > threshold)
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn purchase(program: LoanProgram, down: Decimal) -> MortgageInput {
        MortgageInput {
            home_price: dec!(300000),
            down_payment: down,
            annual_rate_pct: dec!(6.5),
            term_years: 30,
            property_tax_rate_pct: dec!(1.2),
            annual_insurance: dec!(1500),
            monthly_hoa: Decimal::ZERO,
            program,
            pmi_rate_pct: dec!(0.5),
            va_subsequent_use: false,
            va_funding_fee_exempt: false,
        }
    }

    #[test]
    fn test_conventional_twenty_percent_down_has_no_pmi() {
        let out = compute_mortgage_payment(&purchase(LoanProgram::Conventional, dec!(60000))).unwrap();
        let r = &out.result;
        assert_eq!(r.base_loan_amount, dec!(240000));
        assert_eq!(r.upfront_fee, Decimal::ZERO);
        assert_eq!(r.monthly_mortgage_insurance, Decimal::ZERO);
        assert_eq!(r.monthly_property_tax, dec!(300));
        assert_eq!(r.monthly_insurance, dec!(125));
        // P&I on 240k at 6.5% over 30 years
        assert_eq!(r.principal_and_interest.round_dp(2), dec!(1516.96));
        assert_eq!(
            r.total_monthly_payment,
            r.principal_and_interest + dec!(300) + dec!(125)
        );
    }

    #[test]
    fn test_conventional_pmi_until_78_percent() {
        let out = compute_mortgage_payment(&purchase(LoanProgram::Conventional, dec!(30000))).unwrap();
        let r = &out.result;
        // 0.5% of 270k / 12
        assert_eq!(r.monthly_mortgage_insurance, dec!(112.5));
        assert!(r.mortgage_insurance_months > 0 && r.mortgage_insurance_months < 360);
        assert_eq!(
            r.total_mortgage_insurance,
            dec!(112.5) * Decimal::from(r.mortgage_insurance_months)
        );
    }

    #[test]
    fn test_fha_finances_upfront_mip() {
        let out = compute_mortgage_payment(&purchase(LoanProgram::Fha, dec!(10500))).unwrap();
        let r = &out.result;
        assert_eq!(r.base_loan_amount, dec!(289500));
        assert_eq!(r.upfront_fee, dec!(289500) * dec!(0.0175));
        assert_eq!(r.loan_amount, r.base_loan_amount + r.upfront_fee);
        // LTV 96.5% on a 30-year term: 0.55% annual, charged for the life of the loan
        assert_eq!(r.monthly_mortgage_insurance, dec!(289500) * dec!(0.0055) / dec!(12));
        assert_eq!(r.mortgage_insurance_months, 360);
    }

    #[test]
    fn test_fha_ten_percent_down_drops_mip_after_eleven_years() {
        let out = compute_mortgage_payment(&purchase(LoanProgram::Fha, dec!(30000))).unwrap();
        assert_eq!(out.result.mortgage_insurance_months, 132);
    }

    #[test]
    fn test_fha_requires_minimum_down() {
        let err = compute_mortgage_payment(&purchase(LoanProgram::Fha, dec!(5000))).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_va_funding_fee_bands() {
        assert_eq!(va_funding_fee_rate(dec!(0), false, false), dec!(0.0215));
        assert_eq!(va_funding_fee_rate(dec!(0), true, false), dec!(0.033));
        assert_eq!(va_funding_fee_rate(dec!(0.05), true, false), dec!(0.015));
        assert_eq!(va_funding_fee_rate(dec!(0.10), false, false), dec!(0.0125));
        assert_eq!(va_funding_fee_rate(dec!(0), false, true), Decimal::ZERO);
    }

    #[test]
    fn test_va_has_no_monthly_insurance() {
        let out = compute_mortgage_payment(&purchase(LoanProgram::Va, Decimal::ZERO)).unwrap();
        let r = &out.result;
        assert_eq!(r.upfront_fee, dec!(300000) * dec!(0.0215));
        assert_eq!(r.monthly_mortgage_insurance, Decimal::ZERO);
        assert_eq!(r.loan_to_value_pct, dec!(100));
    }

    #[test]
    fn test_down_payment_covering_price_rejected() {
        let err = compute_mortgage_payment(&purchase(LoanProgram::Conventional, dec!(300000)))
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_financed_fee_beyond_decimal_range_is_overflow() {
        let mut input = purchase(LoanProgram::Va, Decimal::ZERO);
        input.home_price = Decimal::MAX;
        let err = compute_mortgage_payment(&input).unwrap_err();
        assert!(matches!(err, CalcError::Overflow { .. }));
    }

    #[test]
    fn test_low_conventional_down_warns() {
        let out = compute_mortgage_payment(&purchase(LoanProgram::Conventional, dec!(3000))).unwrap();
        assert!(!out.warnings.is_empty());
    }
}
