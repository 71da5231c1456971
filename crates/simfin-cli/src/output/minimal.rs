use serde_json::Value;

use super::format_value;

/// Headline fields, most specific first. Schedules report the payment,
/// distribution queries the point probability.
const PRIORITY_KEYS: [&str; 4] = ["pmf", "payment", "principal", "term_periods"];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result = value.get("result").unwrap_or(value);
    match headline(result) {
        Some(v) => println!("{}", format_value(v)),
        None => println!("{}", format_value(result)),
    }
}

/// Look for a priority key at the top level of the result, then one level down
/// (e.g. `parameters.payment`).
fn headline(result: &Value) -> Option<&Value> {
    let map = result.as_object()?;
    let nested = || map.values().filter_map(Value::as_object);
    PRIORITY_KEYS.iter().find_map(|key| {
        map.get(*key)
            .filter(|v| !v.is_null())
            .or_else(|| nested().find_map(|inner| inner.get(*key)))
    })
}
