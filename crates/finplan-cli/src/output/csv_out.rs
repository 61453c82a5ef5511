use serde_json::Value;
use std::io;

use super::{headers, row_field};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(value, stdout.lock()) {
        eprintln!("CSV output error: {}", e);
    }
}

/// Write the period rows of a result as CSV, or `field,value` pairs when the
/// result has no rows.
pub fn write_csv<W: io::Write>(value: &Value, writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let result = value.as_object().and_then(|m| m.get("result")).unwrap_or(value);
    match result {
        Value::Object(map) => match row_field(map) {
            Some((_, rows)) => write_rows(&mut wtr, rows)?,
            None => {
                wtr.write_record(["field", "value"])?;
                for (key, val) in map {
                    wtr.write_record([key.as_str(), &format_csv_value(val)])?;
                }
            }
        },
        Value::Array(rows) => write_rows(&mut wtr, rows)?,
        _ => wtr.write_record([&format_csv_value(result)])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let headers = headers(rows);
    if headers.is_empty() {
        for item in rows {
            wtr.write_record([&format_csv_value(item)])?;
        }
        return Ok(());
    }

    wtr.write_record(&headers)?;
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
