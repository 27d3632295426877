pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load a typed input from `--input` or piped JSON on stdin, in that order.
/// Returns `Ok(None)` when neither is present so callers can fall back to flags.
pub fn load<T: DeserializeOwned>(path: Option<&str>) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_structured(path)?));
    }
    match stdin::read_piped()? {
        Some(text) => {
            let value: T = serde_json::from_str(&text)
                .map_err(|e| format!("Failed to parse JSON from stdin: {e}"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}
