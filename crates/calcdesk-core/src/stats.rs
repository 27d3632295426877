use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::types::{with_metadata, ComputationOutput};
use crate::CalcResult;

/// Two-sided standard normal critical values by confidence level (percent).
pub const Z_SCORES: [(Decimal, Decimal); 8] = [
    (dec!(80), dec!(1.282)),
    (dec!(85), dec!(1.440)),
    (dec!(90), dec!(1.645)),
    (dec!(95), dec!(1.960)),
    (dec!(98), dec!(2.326)),
    (dec!(99), dec!(2.576)),
    (dec!(99.5), dec!(2.807)),
    (dec!(99.9), dec!(3.291)),
];

/// Look up the z-score for a tabulated confidence level.
pub fn z_score(confidence_pct: Decimal) -> Option<Decimal> {
    Z_SCORES
        .iter()
        .find(|(level, _)| *level == confidence_pct)
        .map(|(_, z)| *z)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceIntervalInput {
    pub mean: Decimal,
    pub std_dev: Decimal,
    pub sample_size: u64,
    /// One of 80, 85, 90, 95, 98, 99, 99.5, 99.9
    pub confidence_pct: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceIntervalOutput {
    pub lower_bound: Decimal,
    pub upper_bound: Decimal,
    pub margin_of_error: Decimal,
    pub standard_error: Decimal,
    pub z_score: Decimal,
}

/// mean ± z * (std_dev / sqrt(n))
pub fn compute_confidence_interval(
    input: &ConfidenceIntervalInput,
) -> CalcResult<ComputationOutput<ConfidenceIntervalOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.sample_size == 0 {
        return Err(CalcError::invalid("sample_size", "Sample size must be at least 1"));
    }
    if input.std_dev < Decimal::ZERO {
        return Err(CalcError::invalid(
            "std_dev",
            "Standard deviation cannot be negative",
        ));
    }
    let z = z_score(input.confidence_pct).ok_or_else(|| {
        CalcError::invalid(
            "confidence_pct",
            format!(
                "Unsupported confidence level {}; use 80, 85, 90, 95, 98, 99, 99.5 or 99.9",
                input.confidence_pct
            ),
        )
    })?;

    let root_n = Decimal::from(input.sample_size)
        .sqrt()
        .ok_or_else(|| CalcError::invalid("sample_size", "Cannot take square root"))?;
    let standard_error = input.std_dev / root_n;
    let margin_of_error = z * standard_error;

    if input.sample_size < 30 {
        warnings.push(format!(
            "Sample size {} is below 30; a t-distribution interval would be wider",
            input.sample_size
        ));
    }

    let output = ConfidenceIntervalOutput {
        lower_bound: input.mean - margin_of_error,
        upper_bound: input.mean + margin_of_error,
        margin_of_error,
        standard_error,
        z_score: z,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Normal-approximation confidence interval for a mean",
        input,
        warnings,
        elapsed,
        output,
    ))
}
