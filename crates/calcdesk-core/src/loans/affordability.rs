use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::CalcError;
use crate::loans::amortization::level_payment;
use crate::solvers::{bisect_feasible, BisectionConfig};
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

const MONTHS_PER_YEAR: u32 = 12;
const MAX_PRICE_ITERATIONS: u32 = 100;
/// Prices are resolved to the cent.
const PRICE_RESOLUTION: Decimal = dec!(0.01);
/// Upper end of the price search, as a multiple of annual income.
const PRICE_CEILING_INCOME_MULTIPLE: Decimal = dec!(10);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityInput {
    /// Gross annual household income
    pub annual_income: Money,
    /// Recurring monthly debt payments (cards, auto, student loans)
    #[serde(default)]
    pub monthly_debts: Money,
    pub down_payment: Money,
    /// Nominal annual mortgage rate in percent
    pub annual_rate_pct: Decimal,
    pub term_years: u32,
    /// Annual property tax as a percent of the home price
    #[serde(default)]
    pub property_tax_rate_pct: Decimal,
    /// Annual homeowners insurance as a percent of the home price
    #[serde(default)]
    pub insurance_rate_pct: Decimal,
    /// Maximum housing payment as a percent of gross monthly income
    #[serde(default = "default_front_end_limit_pct")]
    pub front_end_limit_pct: Decimal,
    /// Maximum total debt payments as a percent of gross monthly income
    #[serde(default = "default_back_end_limit_pct")]
    pub back_end_limit_pct: Decimal,
}

fn default_front_end_limit_pct() -> Decimal {
    dec!(28)
}

fn default_back_end_limit_pct() -> Decimal {
    dec!(36)
}

/// Which debt-to-income rule caps the housing payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitingFactor {
    FrontEndRatio,
    BackEndRatio,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityOutput {
    pub max_home_price: Money,
    pub loan_amount: Money,
    /// Housing payment allowed by the binding DTI rule
    pub max_monthly_payment: Money,
    pub principal_and_interest: Money,
    pub monthly_property_tax: Money,
    pub monthly_insurance: Money,
    /// PITI at `max_home_price`
    pub monthly_piti: Money,
    pub limiting_factor: LimitingFactor,
    pub front_end_payment_limit: Money,
    pub back_end_payment_limit: Money,
    pub iterations: u32,
}

/// Monthly housing cost split for one candidate price.
#[derive(Debug, Clone, Copy)]
struct Piti {
    loan_amount: Money,
    principal_and_interest: Money,
    property_tax: Money,
    insurance: Money,
}

impl Piti {
    fn total(&self) -> CalcResult<Money> {
        self.principal_and_interest
            .checked_add(self.property_tax)
            .and_then(|v| v.checked_add(self.insurance))
            .ok_or_else(|| CalcError::overflow("monthly PITI"))
    }
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Largest home price whose PITI fits both debt-to-income limits.
///
/// The housing budget is the smaller of the front-end cap
/// (income × front%) and the back-end cap (income × back% − debts). The
/// answer is the largest whole-cent price in `[down_payment, 10 × annual_income]`
/// whose PITI does not exceed that budget, so a higher income never buys less.
pub fn compute_affordability(
    input: &AffordabilityInput,
) -> CalcResult<ComputationOutput<AffordabilityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_affordability_input(input)?;

    let monthly_income = input.annual_income / Decimal::from(MONTHS_PER_YEAR);
    let front_end_payment_limit = monthly_income * pct_to_rate(input.front_end_limit_pct);
    let back_end_payment_limit =
        monthly_income * pct_to_rate(input.back_end_limit_pct) - input.monthly_debts;

    let (max_monthly_payment, limiting_factor) = if back_end_payment_limit < front_end_payment_limit {
        (back_end_payment_limit, LimitingFactor::BackEndRatio)
    } else {
        (front_end_payment_limit, LimitingFactor::FrontEndRatio)
    };

    if max_monthly_payment <= Decimal::ZERO {
        return Err(CalcError::NoSolution {
            function: "affordability".into(),
            reason: format!(
                "existing debts of {} leave no room under the {}% back-end limit",
                input.monthly_debts, input.back_end_limit_pct
            ),
        });
    }

    let periods = input
        .term_years
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| CalcError::overflow("number of monthly payments"))?;
    let monthly_rate = pct_to_rate(input.annual_rate_pct) / Decimal::from(MONTHS_PER_YEAR);

    let price_ceiling = input
        .annual_income
        .checked_mul(PRICE_CEILING_INCOME_MULTIPLE)
        .ok_or_else(|| CalcError::overflow("price search ceiling"))?;
    let config = BisectionConfig {
        lower: input.down_payment,
        upper: price_ceiling,
        max_iterations: MAX_PRICE_ITERATIONS,
        tolerance: PRICE_RESOLUTION,
    };
    let root = bisect_feasible("affordability", &config, |price| {
        let piti = monthly_piti(price, input, monthly_rate, periods)?;
        Ok(piti.total()? - max_monthly_payment)
    })?;

    let max_home_price = root.value;
    let piti = monthly_piti(max_home_price, input, monthly_rate, periods)?;
    let monthly_piti_total = piti.total()?;
    debug!(%max_home_price, iterations = root.iterations, limiting = ?limiting_factor, "affordability solved");

    if input.down_payment < max_home_price * dec!(0.20) {
        warnings.push(
            "Down payment is under 20% of the price; mortgage insurance (not included) will likely apply"
                .into(),
        );
    }
    if input.back_end_limit_pct > dec!(43) {
        warnings.push(format!(
            "Back-end limit of {}% exceeds the 43% qualified-mortgage guideline",
            input.back_end_limit_pct
        ));
    }

    let output = AffordabilityOutput {
        max_home_price,
        loan_amount: piti.loan_amount,
        max_monthly_payment,
        principal_and_interest: piti.principal_and_interest,
        monthly_property_tax: piti.property_tax,
        monthly_insurance: piti.insurance,
        monthly_piti: monthly_piti_total,
        limiting_factor,
        front_end_payment_limit,
        back_end_payment_limit,
        iterations: root.iterations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Home affordability via DTI limits and feasible-side bisection on price",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn monthly_piti(
    price: Money,
    input: &AffordabilityInput,
    monthly_rate: Rate,
    periods: u32,
) -> CalcResult<Piti> {
    let loan_amount = (price - input.down_payment).max(Decimal::ZERO);
    let principal_and_interest = if loan_amount.is_zero() {
        Decimal::ZERO
    } else {
        level_payment(loan_amount, monthly_rate, periods)?
    };
    let monthly_share = |rate_pct: Decimal, context: &str| {
        price
            .checked_mul(pct_to_rate(rate_pct))
            .map(|annual| annual / Decimal::from(MONTHS_PER_YEAR))
            .ok_or_else(|| CalcError::overflow(context))
    };
    Ok(Piti {
        loan_amount,
        principal_and_interest,
        property_tax: monthly_share(input.property_tax_rate_pct, "monthly property tax")?,
        insurance: monthly_share(input.insurance_rate_pct, "monthly insurance")?,
    })
}

fn validate_affordability_input(input: &AffordabilityInput) -> CalcResult<()> {
    if input.annual_income <= Decimal::ZERO {
        return Err(CalcError::invalid("annual_income", "Annual income must be positive"));
    }
    if input.monthly_debts < Decimal::ZERO {
        return Err(CalcError::invalid("monthly_debts", "Monthly debts cannot be negative"));
    }
    if input.down_payment < Decimal::ZERO {
        return Err(CalcError::invalid("down_payment", "Down payment cannot be negative"));
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
    if input.property_tax_rate_pct < Decimal::ZERO || input.insurance_rate_pct < Decimal::ZERO {
        return Err(CalcError::invalid(
            "property_tax_rate_pct / insurance_rate_pct",
            "Tax and insurance rates cannot be negative",
        ));
    }
    for (field, value) in [
        ("front_end_limit_pct", input.front_end_limit_pct),
        ("back_end_limit_pct", input.back_end_limit_pct),
    ] {
        if value <= Decimal::ZERO || value > dec!(100) {
            return Err(CalcError::invalid(field, "DTI limit must be in (0, 100]"));
        }
    }
    Ok(())
}
