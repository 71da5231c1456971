use serde_json::Value;
use std::io;

use super::{flatten_fields, format_value, record_headers, record_list};

/// Write output as CSV to stdout.
///
/// A result holding a record list (schedule rows) is written as one CSV row
/// per record; anything else becomes two-column `field,value` CSV.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value.get("result").unwrap_or(value);
    match result {
        Value::Object(map) => {
            if let Some(records) = map.values().find_map(record_list) {
                write_records(&mut wtr, records);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (field, val) in flatten_fields(map) {
                    let _ = wtr.write_record([field, val]);
                }
            }
        }
        Value::Array(arr) => match record_list(result) {
            Some(records) => write_records(&mut wtr, records),
            None => {
                for item in arr {
                    let _ = wtr.write_record([format_value(item)]);
                }
            }
        },
        _ => {
            let _ = wtr.write_record([format_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_records<W: io::Write>(wtr: &mut csv::Writer<W>, records: &[Value]) {
    let headers = record_headers(records);
    let _ = wtr.write_record(&headers);

    for item in records {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
