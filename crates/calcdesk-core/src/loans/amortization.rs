use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::CalcError;
use crate::time_value::compound;
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

/// Balances below this are treated as paid off.
pub const BALANCE_TOLERANCE: Decimal = dec!(0.005);
const MONTHS_PER_YEAR: u32 = 12;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub principal: Money,
    /// Nominal annual rate in percent (5 = 5%)
    pub annual_rate_pct: Decimal,
    pub term_years: u32,
    /// Added to every scheduled payment until the loan is retired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_monthly_payment: Option<Money>,
    /// Loan origination date; the first payment falls one month later
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// One payment period of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub beginning_balance: Money,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub ending_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    /// Level scheduled payment, excluding any extra payment
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_payment: Money,
    pub number_of_payments: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_saved: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_saved: Option<u32>,
    pub schedule: Vec<AmortizationEntry>,
}

// ---------------------------------------------------------------------------
// Building blocks shared with the mortgage and affordability calculators
// ---------------------------------------------------------------------------

/// Level payment that retires `principal` over `periods` at `periodic_rate`.
///
/// payment = P * i * (1+i)^n / ((1+i)^n - 1), or P / n when i == 0.
pub fn level_payment(principal: Money, periodic_rate: Rate, periods: u32) -> CalcResult<Money> {
    if periods == 0 {
        return Err(CalcError::invalid("periods", "Number of payments must be > 0"));
    }
    if periodic_rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let factor = compound(periodic_rate, periods)?;
    let numerator = principal
        .checked_mul(periodic_rate)
        .and_then(|v| v.checked_mul(factor))
        .ok_or_else(|| CalcError::overflow("level payment numerator"))?;
    let denominator = factor - Decimal::ONE;
    numerator
        .checked_div(denominator)
        .ok_or_else(|| CalcError::DivisionByZero {
            context: "level payment annuity factor".into(),
        })
}

/// Roll a loan forward period by period.
///
/// The final period (or any period whose principal would overshoot the
/// balance) pays exactly the remaining balance. A balance that drops below
/// [`BALANCE_TOLERANCE`] is folded into that period and the schedule stops.
pub fn build_schedule(
    principal: Money,
    periodic_rate: Rate,
    periods: u32,
    payment: Money,
    extra_payment: Money,
    start_date: Option<NaiveDate>,
) -> CalcResult<Vec<AmortizationEntry>> {
    let mut entries = Vec::with_capacity(periods as usize);
    let mut balance = principal;

    for period in 1..=periods {
        let beginning_balance = balance;
        let interest = beginning_balance
            .checked_mul(periodic_rate)
            .ok_or_else(|| CalcError::overflow(format!("interest for period {period}")))?;
        let mut period_payment = payment
            .checked_add(extra_payment)
            .ok_or_else(|| CalcError::overflow(format!("payment for period {period}")))?;
        let mut principal_paid = period_payment - interest;

        if period == periods || principal_paid >= beginning_balance {
            principal_paid = beginning_balance;
            period_payment = principal_paid
                .checked_add(interest)
                .ok_or_else(|| CalcError::overflow(format!("payment for period {period}")))?;
        }

        balance = beginning_balance - principal_paid;
        if balance < BALANCE_TOLERANCE {
            principal_paid += balance;
            period_payment += balance;
            balance = Decimal::ZERO;
        }

        let payment_date = match start_date {
            Some(date) => Some(date.checked_add_months(Months::new(period)).ok_or_else(|| {
                CalcError::DateError(format!("payment date for period {period} is out of range"))
            })?),
            None => None,
        };

        entries.push(AmortizationEntry {
            period,
            payment_date,
            beginning_balance,
            payment: period_payment,
            principal: principal_paid,
            interest,
            ending_balance: balance,
        });

        if balance.is_zero() {
            if period < periods {
                debug!(period, periods, "loan retired before final scheduled period");
            }
            break;
        }
    }

    Ok(entries)
}

pub(crate) fn checked_total(
    amounts: impl IntoIterator<Item = Money>,
    context: &str,
) -> CalcResult<Money> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| CalcError::overflow(context))
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Level-payment amortization of a fixed-rate loan with monthly payments.
pub fn compute_amortization(
    input: &AmortizationInput,
) -> CalcResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_amortization_input(input)?;

    let periods = input
        .term_years
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| CalcError::overflow("number of monthly payments"))?;
    let monthly_rate = pct_to_rate(input.annual_rate_pct) / Decimal::from(MONTHS_PER_YEAR);
    let monthly_payment = level_payment(input.principal, monthly_rate, periods)?;
    let extra = input.extra_monthly_payment.unwrap_or(Decimal::ZERO);

    let schedule = build_schedule(
        input.principal,
        monthly_rate,
        periods,
        monthly_payment,
        extra,
        input.start_date,
    )?;

    let total_interest = checked_total(schedule.iter().map(|e| e.interest), "total interest")?;
    let total_payment = checked_total(schedule.iter().map(|e| e.payment), "total payment")?;
    let number_of_payments = schedule.len() as u32;
    let payoff_date = schedule.last().and_then(|e| e.payment_date);

    let (interest_saved, months_saved) = if extra > Decimal::ZERO {
        let baseline = build_schedule(
            input.principal,
            monthly_rate,
            periods,
            monthly_payment,
            Decimal::ZERO,
            None,
        )?;
        let baseline_interest =
            checked_total(baseline.iter().map(|e| e.interest), "baseline interest")?;
        (
            Some(baseline_interest - total_interest),
            Some(baseline.len() as u32 - number_of_payments),
        )
    } else {
        (None, None)
    };

    if input.annual_rate_pct > dec!(25) {
        warnings.push(format!(
            "Annual rate of {}% is unusually high; verify the input is a percentage",
            input.annual_rate_pct
        ));
    }
    if total_interest > input.principal {
        warnings.push("Total interest exceeds the amount borrowed".into());
    }

    let output = AmortizationOutput {
        monthly_payment,
        total_interest,
        total_payment,
        number_of_payments,
        payoff_date,
        interest_saved,
        months_saved,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortization (monthly compounding)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_amortization_input(input: &AmortizationInput) -> CalcResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(CalcError::invalid("principal", "Principal must be positive"));
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
    if let Some(extra) = input.extra_monthly_payment {
        if extra < Decimal::ZERO {
            return Err(CalcError::invalid(
                "extra_monthly_payment",
                "Extra payment cannot be negative",
            ));
        }
    }
    Ok(())
}
