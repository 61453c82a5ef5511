pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The per-period rows of a result: the first field holding an array of objects
/// (`schedule`, `periods` or `results`).
pub(crate) fn row_field(result: &Map<String, Value>) -> Option<(&str, &[Value])> {
    result.iter().find_map(|(key, val)| match val {
        Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
            Some((key.as_str(), rows.as_slice()))
        }
        _ => None,
    })
}

/// Scalar fields of a result, with nested objects flattened to `outer.inner`.
pub(crate) fn summary_fields(result: &Map<String, Value>) -> Vec<(String, &Value)> {
    let mut fields = Vec::new();
    for (key, val) in result {
        match val {
            Value::Object(inner) => {
                for (inner_key, inner_val) in inner {
                    fields.push((format!("{key}.{inner_key}"), inner_val));
                }
            }
            Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {}
            _ => fields.push((key.clone(), val)),
        }
    }
    fields
}

/// Column headers of a row table, taken from the first row.
pub(crate) fn headers(rows: &[Value]) -> Vec<&str> {
    match rows.first() {
        Some(Value::Object(first)) => first.keys().map(String::as_str).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_summary_flattens_nested_and_skips_rows() {
        let result = json!({
            "battery_capacity_kwh": "5",
            "baseline": { "pv_generation_kwh": "100", "self_consumption_rate_pct": null },
            "periods": [{ "Monat": "Januar" }],
        });
        let map = result.as_object().unwrap();
        let keys: Vec<String> = summary_fields(map).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "battery_capacity_kwh".to_string(),
                "baseline.pv_generation_kwh".to_string(),
                "baseline.self_consumption_rate_pct".to_string(),
            ]
        );
        let (name, rows) = row_field(map).unwrap();
        assert_eq!(name, "periods");
        assert_eq!(headers(rows), vec!["Monat"]);
    }

    #[test]
    fn test_empty_array_is_not_a_row_field() {
        let result = json!({ "schedule": [], "monthly_payment": "0" });
        assert!(row_field(result.as_object().unwrap()).is_none());
    }
}
