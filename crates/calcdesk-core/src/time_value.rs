use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Frequency, Money, Rate};
use crate::CalcResult;

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
///
/// Fails with `Overflow` instead of panicking when the factor leaves the
/// Decimal range.
pub fn compound(rate: Rate, n: u32) -> CalcResult<Decimal> {
    let factor = Decimal::ONE + rate;
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result
            .checked_mul(factor)
            .ok_or_else(|| CalcError::overflow(format!("(1 + {rate})^{n}")))?;
    }
    Ok(result)
}

/// Net Present Value of a series of cash flows, first flow at t = 0.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> CalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(CalcError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| CalcError::overflow(format!("NPV discount factor at period {t}")))?;
        }
        let term = cf.checked_div(discount).ok_or_else(|| CalcError::DivisionByZero {
            context: format!("NPV discount factor at period {t}"),
        })?;
        result = result
            .checked_add(term)
            .ok_or_else(|| CalcError::overflow("NPV sum"))?;
    }

    Ok(result)
}

/// Present Value (spreadsheet sign convention: payments out, value in).
pub fn pv(rate: Rate, nper: u32, pmt: Money, fv: Money) -> CalcResult<Money> {
    if rate.is_zero() {
        return pmt
            .checked_mul(Decimal::from(nper))
            .and_then(|paid| paid.checked_add(fv))
            .map(|total| -total)
            .ok_or_else(|| CalcError::overflow("PV of undiscounted payments"));
    }
    if rate <= dec!(-1) {
        return Err(CalcError::invalid("rate", "Rate must be greater than -100%"));
    }

    let factor = compound(rate, nper)?;
    let annuity_factor = (Decimal::ONE - Decimal::ONE / factor) / rate;
    let discounted_fv = fv.checked_div(factor).ok_or_else(|| CalcError::DivisionByZero {
        context: "PV discount factor".into(),
    })?;
    pmt.checked_mul(annuity_factor)
        .and_then(|annuity| annuity.checked_add(discounted_fv))
        .map(|total| -total)
        .ok_or_else(|| CalcError::overflow("PV of payment stream"))
}

/// Future Value
pub fn fv(rate: Rate, nper: u32, pmt: Money, present_value: Money) -> CalcResult<Money> {
    if rate.is_zero() {
        return pmt
            .checked_mul(Decimal::from(nper))
            .and_then(|paid| paid.checked_add(present_value))
            .map(|total| -total)
            .ok_or_else(|| CalcError::overflow("FV of undiscounted payments"));
    }

    let factor = compound(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    let grown = present_value
        .checked_mul(factor)
        .ok_or_else(|| CalcError::overflow("FV of present value"))?;
    pmt.checked_mul(annuity_factor)
        .and_then(|annuity| annuity.checked_add(grown))
        .map(|total| -total)
        .ok_or_else(|| CalcError::overflow("FV of payment stream"))
}

/// Payment (PMT)
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> CalcResult<Money> {
    if nper == 0 {
        return Err(CalcError::invalid("nper", "Number of periods must be > 0"));
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let factor = compound(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(CalcError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    let target = present_value
        .checked_mul(factor)
        .and_then(|grown| grown.checked_add(future_value))
        .ok_or_else(|| CalcError::overflow("PMT future balance"))?;
    Ok(-target / annuity_factor)
}

// ---------------------------------------------------------------------------
// Annuity value
// ---------------------------------------------------------------------------

/// Which end of the time line the annuity is valued at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnuityKind {
    FutureValue,
    PresentValue,
}

/// Whether payments fall at the end (ordinary) or start (due) of each period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnuityTiming {
    #[default]
    Ordinary,
    Due,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityInput {
    pub kind: AnnuityKind,
    /// Level payment per period
    pub payment: Money,
    /// Nominal annual rate in percent (6 = 6%)
    pub annual_rate_pct: Decimal,
    /// Number of years the payments run for
    pub periods: u32,
    /// Payments per year
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub timing: AnnuityTiming,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityOutput {
    pub value: Money,
    pub total_periods: u32,
    pub periodic_rate: Rate,
    /// Sum of all payments, undiscounted
    pub total_payments: Money,
    /// Growth earned (FV) or discount given up (PV) relative to the payments
    pub interest_component: Money,
}

/// Value an annuity of level payments.
///
/// Ordinary annuity:
///   FV = PMT * ((1+i)^N - 1) / i
///   PV = PMT * (1 - (1+i)^-N) / i
/// with `i = annual_rate / frequency` and `N = periods * frequency`. A zero
/// rate degenerates to `PMT * N`. An annuity due multiplies by `(1+i)`.
pub fn compute_annuity_value(
    input: &AnnuityInput,
) -> CalcResult<ComputationOutput<AnnuityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.payment <= Decimal::ZERO {
        return Err(CalcError::invalid("payment", "Payment must be positive"));
    }
    if input.annual_rate_pct < Decimal::ZERO {
        return Err(CalcError::invalid(
            "annual_rate_pct",
            "Interest rate cannot be negative",
        ));
    }
    if input.periods == 0 {
        return Err(CalcError::invalid("periods", "Number of periods must be > 0"));
    }

    let per_year = input.frequency.periods_per_year();
    let total_periods = input
        .periods
        .checked_mul(per_year)
        .ok_or_else(|| CalcError::overflow("total annuity periods"))?;
    let periodic_rate = pct_to_rate(input.annual_rate_pct) / Decimal::from(per_year);
    let total_payments = input
        .payment
        .checked_mul(Decimal::from(total_periods))
        .ok_or_else(|| CalcError::overflow("total annuity payments"))?;

    let value = if periodic_rate.is_zero() {
        total_payments
    } else {
        let factor = compound(periodic_rate, total_periods)?;
        let growth = match input.kind {
            AnnuityKind::FutureValue => factor - Decimal::ONE,
            AnnuityKind::PresentValue => Decimal::ONE - Decimal::ONE / factor,
        };
        let ordinary = input
            .payment
            .checked_mul(growth)
            .and_then(|v| v.checked_div(periodic_rate))
            .ok_or_else(|| CalcError::overflow("annuity value"))?;
        match input.timing {
            AnnuityTiming::Ordinary => ordinary,
            AnnuityTiming::Due => ordinary
                .checked_mul(Decimal::ONE + periodic_rate)
                .ok_or_else(|| CalcError::overflow("annuity due value"))?,
        }
    };

    let interest_component = match input.kind {
        AnnuityKind::FutureValue => value - total_payments,
        AnnuityKind::PresentValue => total_payments - value,
    };

    if input.annual_rate_pct > dec!(25) {
        warnings.push(format!(
            "Annual rate of {}% is unusually high; verify the input is a percentage",
            input.annual_rate_pct
        ));
    }

    let output = AnnuityOutput {
        value,
        total_periods,
        periodic_rate,
        total_payments,
        interest_component,
    };

    let methodology = match (input.kind, input.timing) {
        (AnnuityKind::FutureValue, AnnuityTiming::Ordinary) => "Future value of ordinary annuity",
        (AnnuityKind::FutureValue, AnnuityTiming::Due) => "Future value of annuity due",
        (AnnuityKind::PresentValue, AnnuityTiming::Ordinary) => "Present value of ordinary annuity",
        (AnnuityKind::PresentValue, AnnuityTiming::Due) => "Present value of annuity due",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Compound growth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundGrowthInput {
    pub principal: Money,
    /// Nominal annual rate in percent; may be negative for a shrinking balance
    pub annual_rate_pct: Decimal,
    pub years: u32,
    /// Compounding periods per year
    #[serde(default)]
    pub compounding: Frequency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthYear {
    pub year: u32,
    pub starting_balance: Money,
    pub interest_earned: Money,
    pub ending_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundGrowthOutput {
    pub future_value: Money,
    pub total_interest: Money,
    pub periodic_rate: Rate,
    pub effective_annual_rate: Rate,
    pub schedule: Vec<GrowthYear>,
}

/// Grow a single deposit: FV = PV * (1 + r/m)^(n*m).
pub fn compute_compound_growth(
    input: &CompoundGrowthInput,
) -> CalcResult<ComputationOutput<CompoundGrowthOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    if input.principal < Decimal::ZERO {
        return Err(CalcError::invalid("principal", "Principal cannot be negative"));
    }
    if input.annual_rate_pct <= dec!(-100) {
        return Err(CalcError::invalid(
            "annual_rate_pct",
            "Rate must be greater than -100%",
        ));
    }

    let per_year = input.compounding.periods_per_year();
    let periodic_rate = pct_to_rate(input.annual_rate_pct) / Decimal::from(per_year);
    let yearly_factor = compound(periodic_rate, per_year)?;

    let mut schedule = Vec::with_capacity(input.years as usize);
    let mut balance = input.principal;
    for year in 1..=input.years {
        let ending = balance
            .checked_mul(yearly_factor)
            .ok_or_else(|| CalcError::overflow(format!("balance in year {year}")))?;
        schedule.push(GrowthYear {
            year,
            starting_balance: balance,
            interest_earned: ending - balance,
            ending_balance: ending,
        });
        balance = ending;
    }

    let output = CompoundGrowthOutput {
        future_value: balance,
        total_interest: balance - input.principal,
        periodic_rate,
        effective_annual_rate: yearly_factor - Decimal::ONE,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Compound growth: FV = PV * (1 + r/m)^(n*m)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
