use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{headers, row_field, summary_fields};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    print!("{}", render_table(value));
}

/// Summary table, then the period rows, then warnings and methodology.
pub fn render_table(value: &Value) -> String {
    let mut out = String::new();
    let Some(envelope) = value.as_object() else {
        out.push_str(&format!("{}\n", format_value(value)));
        return out;
    };

    match envelope.get("result") {
        Some(Value::Object(result)) => {
            out.push_str(&summary_table(result));
            if let Some((name, rows)) = row_field(result) {
                out.push_str(&format!("\n{} ({}):\n", name, rows.len()));
                out.push_str(&rows_table(rows));
            }
        }
        _ => out.push_str(&summary_table(envelope)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for w in warnings.iter().filter_map(Value::as_str) {
                out.push_str(&format!("  - {}\n", w));
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        out.push_str(&format!("\nMethodology: {}\n", meth));
    }
    out
}

fn summary_table(map: &Map<String, Value>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in summary_fields(map) {
        builder.push_record([key, format_value(val)]);
    }
    format!("{}\n", Table::from(builder))
}

fn rows_table(rows: &[Value]) -> String {
    let headers = headers(rows);
    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    format!("{}\n", Table::from(builder))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
