use clap::Args;
use rust_decimal::Decimal;

use calcdesk_core::fitness::{self, ActivityLevel, BmiInput, BodyFatInput, EnergyInput, Sex};

use super::{parse_choice, CommandResult};
use crate::input;

const SEXES: &[&str] = &["male", "female"];

/// Arguments for body mass index
#[derive(Args)]
pub struct BmiArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Weight in kilograms
    #[arg(long)]
    pub weight: Option<Decimal>,

    /// Height in centimetres
    #[arg(long)]
    pub height: Option<Decimal>,
}

pub fn run_bmi(args: BmiArgs) -> CommandResult {
    let body: BmiInput = match input::load(args.input.as_deref())? {
        Some(body) => body,
        None => BmiInput {
            weight_kg: args.weight.ok_or("--weight is required (or provide --input)")?,
            height_cm: args.height.ok_or("--height is required (or provide --input)")?,
        },
    };
    Ok(serde_json::to_value(fitness::compute_bmi(&body)?)?)
}

/// Arguments for BMR and TDEE
#[derive(Args)]
pub struct EnergyArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// male or female
    #[arg(long)]
    pub sex: Option<String>,

    #[arg(long)]
    pub age: Option<u32>,

    /// Weight in kilograms
    #[arg(long)]
    pub weight: Option<Decimal>,

    /// Height in centimetres
    #[arg(long)]
    pub height: Option<Decimal>,

    /// sedentary, light, moderate, active, very_active
    #[arg(long, default_value = "sedentary")]
    pub activity: String,

    /// Body fat percent; switches to Katch-McArdle
    #[arg(long)]
    pub body_fat: Option<Decimal>,
}

pub fn run_energy(args: EnergyArgs) -> CommandResult {
    let person: EnergyInput = match input::load(args.input.as_deref())? {
        Some(person) => person,
        None => {
            let sex = args.sex.as_deref().ok_or("--sex is required (or provide --input)")?;
            let activity: ActivityLevel = parse_choice(
                "activity",
                &args.activity,
                &["sedentary", "light", "moderate", "active", "very_active"],
            )?;
            EnergyInput {
                sex: parse_choice("sex", sex, SEXES)?,
                age_years: args.age.ok_or("--age is required (or provide --input)")?,
                weight_kg: args.weight.ok_or("--weight is required (or provide --input)")?,
                height_cm: args.height.ok_or("--height is required (or provide --input)")?,
                activity,
                body_fat_pct: args.body_fat,
            }
        }
    };
    Ok(serde_json::to_value(fitness::compute_energy_expenditure(&person)?)?)
}

/// Arguments for the US Navy body fat estimate
#[derive(Args)]
pub struct BodyFatArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// male or female
    #[arg(long)]
    pub sex: Option<String>,

    /// Height in centimetres
    #[arg(long)]
    pub height: Option<Decimal>,

    /// Neck circumference in centimetres
    #[arg(long)]
    pub neck: Option<Decimal>,

    /// Waist circumference in centimetres
    #[arg(long)]
    pub waist: Option<Decimal>,

    /// Hip circumference in centimetres (required for women)
    #[arg(long)]
    pub hip: Option<Decimal>,

    /// Weight in kilograms, for the fat/lean split
    #[arg(long)]
    pub weight: Option<Decimal>,
}

pub fn run_body_fat(args: BodyFatArgs) -> CommandResult {
    let body: BodyFatInput = match input::load(args.input.as_deref())? {
        Some(body) => body,
        None => {
            let sex: Sex = parse_choice(
                "sex",
                args.sex.as_deref().ok_or("--sex is required (or provide --input)")?,
                SEXES,
            )?;
            BodyFatInput {
                sex,
                height_cm: args.height.ok_or("--height is required (or provide --input)")?,
                neck_cm: args.neck.ok_or("--neck is required (or provide --input)")?,
                waist_cm: args.waist.ok_or("--waist is required (or provide --input)")?,
                hip_cm: args.hip,
                weight_kg: args.weight,
            }
        }
    };
    Ok(serde_json::to_value(fitness::compute_body_fat(&body)?)?)
}
