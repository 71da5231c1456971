use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{flatten_fields, format_value, record_headers, record_list};

/// Format output as tables: scalar results as Field/Value, record lists
/// (such as schedule rows) as their own table underneath.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result(result, map),
            _ => print_fields(map),
        },
        _ => println!("{}", value),
    }
}

fn print_result(result: &serde_json::Map<String, Value>, envelope: &serde_json::Map<String, Value>) {
    print_fields(result);

    for (key, val) in result {
        if let Some(records) = record_list(val) {
            println!("\n{}:", key);
            print_records(records);
        }
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(map: &serde_json::Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field".to_string(), "Value".to_string()]);
    for (field, val) in flatten_fields(map) {
        builder.push_record([field, val]);
    }
    println!("{}", Table::from(builder));
}

fn print_records(records: &[Value]) {
    let headers = record_headers(records);
    let mut builder = Builder::default();
    builder.push_record(headers.clone());

    for item in records {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }

    println!("{}", Table::from(builder));
}
