use serde_json::Value;

use super::plain;

/// Headline answer for each calculator, in priority order.
const PRIORITY_KEYS: [&str; 12] = [
    "monthly_payment",
    "total_monthly_payment",
    "max_home_price",
    "irr_pct",
    "value",
    "future_value",
    "nest_egg",
    "total_depreciation",
    "margin_of_error",
    "bmi",
    "tdee",
    "body_fat_pct",
];

/// Print just the key answer value from the output, falling back to the
/// first field of the result object.
pub fn print_minimal(value: &Value) {
    let result = value.get("result").unwrap_or(value);
    println!("{}", headline(result));
}

fn headline(result: &Value) -> String {
    let Value::Object(map) = result else {
        return plain(result, "null");
    };

    PRIORITY_KEYS
        .iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
        .map(|v| plain(v, "null"))
        .or_else(|| {
            map.iter()
                .next()
                .map(|(key, val)| format!("{key}: {}", plain(val, "null")))
        })
        .unwrap_or_default()
}
