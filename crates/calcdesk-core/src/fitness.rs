use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::error::CalcError;
use crate::types::{pct_to_rate, with_metadata, ComputationOutput};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// WHO adult BMI classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn multiplier(self) -> Decimal {
        match self {
            ActivityLevel::Sedentary => dec!(1.2),
            ActivityLevel::Light => dec!(1.375),
            ActivityLevel::Moderate => dec!(1.55),
            ActivityLevel::Active => dec!(1.725),
            ActivityLevel::VeryActive => dec!(1.9),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmrFormula {
    MifflinStJeor,
    KatchMcArdle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmiInput {
    pub weight_kg: Decimal,
    pub height_cm: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmiOutput {
    pub bmi: Decimal,
    pub category: BmiCategory,
    /// Weight range for a BMI of 18.5 to 24.9 at this height
    pub healthy_weight_min_kg: Decimal,
    pub healthy_weight_max_kg: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyInput {
    pub sex: Sex,
    pub age_years: u32,
    pub weight_kg: Decimal,
    pub height_cm: Decimal,
    #[serde(default)]
    pub activity: ActivityLevel,
    /// When present, Katch-McArdle is used instead of Mifflin-St Jeor
    #[serde(default)]
    pub body_fat_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyOutput {
    pub formula: BmrFormula,
    pub bmr: Decimal,
    pub activity_multiplier: Decimal,
    pub tdee: Decimal,
    pub lean_body_mass_kg: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyFatInput {
    pub sex: Sex,
    pub height_cm: Decimal,
    pub neck_cm: Decimal,
    pub waist_cm: Decimal,
    /// Required for women
    #[serde(default)]
    pub hip_cm: Option<Decimal>,
    /// Optional; enables the fat/lean mass split
    #[serde(default)]
    pub weight_kg: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyFatOutput {
    pub body_fat_pct: Decimal,
    pub fat_mass_kg: Option<Decimal>,
    pub lean_mass_kg: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// BMI
// ---------------------------------------------------------------------------

/// Body mass index from metric weight and height.
pub fn compute_bmi(input: &BmiInput) -> CalcResult<ComputationOutput<BmiOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive("weight_kg", input.weight_kg)?;
    require_positive("height_cm", input.height_cm)?;

    let height_m = input.height_cm / dec!(100);
    let height_sq = height_m
        .checked_mul(height_m)
        .ok_or_else(|| CalcError::overflow("height squared"))?;
    if height_sq.is_zero() {
        return Err(CalcError::DivisionByZero {
            context: "height squared".into(),
        });
    }
    let bmi = input
        .weight_kg
        .checked_div(height_sq)
        .ok_or_else(|| CalcError::overflow("BMI"))?;
    let healthy_weight = |bmi_bound: Decimal| {
        bmi_bound
            .checked_mul(height_sq)
            .ok_or_else(|| CalcError::overflow("healthy weight range"))
    };

    let category = if bmi < dec!(18.5) {
        BmiCategory::Underweight
    } else if bmi < dec!(25) {
        BmiCategory::Normal
    } else if bmi < dec!(30) {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    };

    if input.height_cm < dec!(100) || input.height_cm > dec!(250) {
        warnings.push("Height is outside the adult range; BMI classes may not apply".into());
    }

    let output = BmiOutput {
        bmi,
        category,
        healthy_weight_min_kg: healthy_weight(dec!(18.5))?,
        healthy_weight_max_kg: healthy_weight(dec!(24.9))?,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Body mass index with WHO adult classification",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// BMR / TDEE
// ---------------------------------------------------------------------------

/// Basal metabolic rate and total daily energy expenditure (kcal/day).
pub fn compute_energy_expenditure(
    input: &EnergyInput,
) -> CalcResult<ComputationOutput<EnergyOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive("weight_kg", input.weight_kg)?;
    require_positive("height_cm", input.height_cm)?;
    if input.age_years == 0 {
        return Err(CalcError::invalid("age_years", "Age must be at least one year"));
    }

    let (formula, bmr, lean_body_mass_kg) = match input.body_fat_pct {
        Some(fat_pct) => {
            if fat_pct < Decimal::ZERO || fat_pct >= dec!(100) {
                return Err(CalcError::invalid(
                    "body_fat_pct",
                    "Body fat must be in [0, 100)",
                ));
            }
            let lean = input.weight_kg * (Decimal::ONE - pct_to_rate(fat_pct));
            let bmr = dec!(21.6)
                .checked_mul(lean)
                .and_then(|v| v.checked_add(dec!(370)))
                .ok_or_else(|| CalcError::overflow("Katch-McArdle BMR"))?;
            (BmrFormula::KatchMcArdle, bmr, Some(lean))
        }
        None => {
            let offset = match input.sex {
                Sex::Male => dec!(5),
                Sex::Female => dec!(-161),
            };
            let bmr = dec!(10)
                .checked_mul(input.weight_kg)
                .zip(dec!(6.25).checked_mul(input.height_cm))
                .and_then(|(weight, height)| weight.checked_add(height))
                .map(|v| v - dec!(5) * Decimal::from(input.age_years) + offset)
                .ok_or_else(|| CalcError::overflow("Mifflin-St Jeor BMR"))?;
            (BmrFormula::MifflinStJeor, bmr, None)
        }
    };

    if bmr <= Decimal::ZERO {
        return Err(CalcError::NoSolution {
            function: "bmr".into(),
            reason: "measurements give a non-positive metabolic rate".into(),
        });
    }
    if input.age_years < 18 {
        warnings.push("BMR equations are calibrated on adults".into());
    }

    let activity_multiplier = input.activity.multiplier();
    let tdee = bmr
        .checked_mul(activity_multiplier)
        .ok_or_else(|| CalcError::overflow("total daily energy expenditure"))?;
    let output = EnergyOutput {
        formula,
        bmr,
        activity_multiplier,
        tdee,
        lean_body_mass_kg,
    };

    let methodology = match formula {
        BmrFormula::MifflinStJeor => "Mifflin-St Jeor BMR with activity multiplier",
        BmrFormula::KatchMcArdle => "Katch-McArdle BMR with activity multiplier",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Body fat
// ---------------------------------------------------------------------------

/// US Navy circumference method, metric form.
pub fn compute_body_fat(input: &BodyFatInput) -> CalcResult<ComputationOutput<BodyFatOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive("height_cm", input.height_cm)?;
    require_positive("neck_cm", input.neck_cm)?;
    require_positive("waist_cm", input.waist_cm)?;

    let log_height = log10("height_cm", input.height_cm)?;
    let density = match input.sex {
        Sex::Male => {
            let girth = log10("waist_cm - neck_cm", input.waist_cm - input.neck_cm)?;
            dec!(1.0324) - dec!(0.19077) * girth + dec!(0.15456) * log_height
        }
        Sex::Female => {
            let hip = input
                .hip_cm
                .ok_or_else(|| CalcError::invalid("hip_cm", "Hip measurement is required for women"))?;
            require_positive("hip_cm", hip)?;
            let girth_cm = input
                .waist_cm
                .checked_add(hip)
                .ok_or_else(|| CalcError::overflow("waist_cm + hip_cm"))?
                - input.neck_cm;
            let girth = log10("waist_cm + hip_cm - neck_cm", girth_cm)?;
            dec!(1.29579) - dec!(0.35004) * girth + dec!(0.22100) * log_height
        }
    };

    if density <= Decimal::ZERO {
        return Err(CalcError::DivisionByZero {
            context: "body density".into(),
        });
    }
    let body_fat_pct = dec!(495)
        .checked_div(density)
        .ok_or_else(|| CalcError::overflow("body fat from density"))?
        - dec!(450);

    if body_fat_pct < dec!(2) || body_fat_pct > dec!(60) {
        warn!(%body_fat_pct, "circumference estimate outside physiological range");
        warnings.push(format!(
            "Estimated body fat of {}% is implausible; check the measurements",
            body_fat_pct.round_dp(1)
        ));
    }

    let (fat_mass_kg, lean_mass_kg) = match input.weight_kg {
        Some(w) => {
            require_positive("weight_kg", w)?;
            let fat = w * pct_to_rate(body_fat_pct.max(Decimal::ZERO));
            (Some(fat), Some(w - fat))
        }
        None => (None, None),
    };

    let output = BodyFatOutput {
        body_fat_pct,
        fat_mass_kg,
        lean_mass_kg,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "US Navy circumference body fat estimate",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn require_positive(field: &str, value: Decimal) -> CalcResult<()> {
    if value <= Decimal::ZERO {
        return Err(CalcError::invalid(field, "Must be positive"));
    }
    Ok(())
}

fn log10(field: &str, value: Decimal) -> CalcResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(CalcError::invalid(field, "Logarithm argument must be positive"));
    }
    value
        .checked_log10()
        .ok_or_else(|| CalcError::invalid(field, "Logarithm is undefined"))
}
