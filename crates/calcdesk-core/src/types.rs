use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Inputs taken in percent are
/// named `*_pct` and converted with [`pct_to_rate`].
pub type Rate = Decimal;

/// Convert a percentage (5 = 5%) into a decimal rate (0.05).
pub fn pct_to_rate(pct: Decimal) -> Rate {
    pct / dec!(100)
}

/// Convert a decimal rate (0.05) into a percentage (5).
pub fn rate_to_pct(rate: Rate) -> Decimal {
    rate * dec!(100)
}

/// How often payments are made or interest is compounded within a year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Annually,
    SemiAnnually,
    Quarterly,
    Monthly,
    BiWeekly,
    Weekly,
    Daily,
}

impl Frequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            Frequency::Annually => 1,
            Frequency::SemiAnnually => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
            Frequency::BiWeekly => 26,
            Frequency::Weekly => 52,
            Frequency::Daily => 365,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_conversions() {
        assert_eq!(pct_to_rate(dec!(5)), dec!(0.05));
        assert_eq!(rate_to_pct(dec!(0.125)), dec!(12.5));
    }

    #[test]
    fn test_frequency_serde_names() {
        let f: Frequency = serde_json::from_str("\"semi_annually\"").unwrap();
        assert_eq!(f, Frequency::SemiAnnually);
        assert_eq!(f.periods_per_year(), 2);
        assert_eq!(Frequency::default().periods_per_year(), 1);
    }
}
