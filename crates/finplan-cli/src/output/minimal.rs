use serde_json::Value;

/// Headline figure of each command, in order of priority.
const PRIORITY_KEYS: [&str; 4] = [
    "monthly_payment",
    "payoff_year",
    "self_consumption_rate_with_storage_pct",
    "self_consumption_rate_pct",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

/// Looks for a priority key in the result, then one level down (e.g.
/// `totals.self_consumption_rate_pct`), then falls back to the first field.
pub fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result_obj else {
        return format_minimal(result_obj);
    };

    for key in &PRIORITY_KEYS {
        if let Some(val) = map.get(*key) {
            return format_minimal(val);
        }
        let nested = map
            .values()
            .filter_map(Value::as_object)
            .find_map(|inner| inner.get(*key));
        if let Some(val) = nested {
            return format_minimal(val);
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => String::new(),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_annuity_prints_monthly_payment() {
        let value = json!({ "result": { "monthly_payment": "947.86", "number_of_payments": 300 } });
        assert_eq!(minimal_line(&value), "947.86");
    }

    #[test]
    fn test_storage_rate_preferred_over_baseline() {
        let value = json!({ "result": {
            "baseline": { "self_consumption_rate_pct": "40.1" },
            "self_consumption_rate_with_storage_pct": "55.3",
        }});
        assert_eq!(minimal_line(&value), "55.3");
    }

    #[test]
    fn test_consumption_rate_found_in_totals() {
        let value = json!({ "result": { "totals": { "self_consumption_rate_pct": null } } });
        assert_eq!(minimal_line(&value), "null");
    }
}
