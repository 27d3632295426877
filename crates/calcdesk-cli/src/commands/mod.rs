pub mod depreciation;
pub mod fitness;
pub mod loans;
pub mod retirement;
pub mod stats;
pub mod time_value;

use serde::de::DeserializeOwned;

pub type CommandResult = Result<serde_json::Value, Box<dyn std::error::Error>>;

/// Parse a flag value into one of the core's snake_case enums.
/// Hyphens are accepted in place of underscores (`sum-of-years-digits`).
pub fn parse_choice<T: DeserializeOwned>(
    flag: &str,
    value: &str,
    choices: &[&str],
) -> Result<T, Box<dyn std::error::Error>> {
    let normalised = value.trim().to_lowercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(normalised)).map_err(|_| {
        format!(
            "Unknown {flag} '{value}'. Use: {}",
            choices.join(", ")
        )
        .into()
    })
}
