pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Render a scalar for a table cell or CSV field.
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// A result field that is a non-empty list of records, e.g. schedule rows.
pub(crate) fn record_list(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            Some(items)
        }
        _ => None,
    }
}

/// Scalar fields of a result, with one level of nested objects flattened to
/// `outer.inner`. Record lists are skipped.
pub(crate) fn flatten_fields(result: &serde_json::Map<String, Value>) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for (key, val) in result {
        match val {
            Value::Object(inner) => {
                for (k, v) in inner {
                    fields.push((format!("{key}.{k}"), format_value(v)));
                }
            }
            v if record_list(v).is_some() => {}
            v => fields.push((key.clone(), format_value(v))),
        }
    }
    fields
}

/// Column headers for a record list, with `period` leading when present.
pub(crate) fn record_headers(records: &[Value]) -> Vec<String> {
    let mut headers: Vec<String> = records
        .first()
        .and_then(Value::as_object)
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default();
    if let Some(pos) = headers.iter().position(|h| h == "period") {
        let period = headers.remove(pos);
        headers.insert(0, period);
    }
    headers
}
