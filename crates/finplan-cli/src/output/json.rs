use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print the envelope to stdout.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_json(value, stdout.lock()) {
        eprintln!("JSON output error: {}", e);
    }
}

/// Decimals arrive as strings and are written untouched, so no precision is lost.
pub fn write_json<W: Write>(value: &Value, mut writer: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_keys_keep_insertion_order() {
        let value = json!({ "result": { "monthly_payment": "947.86", "number_of_payments": 300 } });
        let mut buf = Vec::new();
        write_json(&value, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\n  \"result\": {\n    \"monthly_payment\": \"947.86\",\n    \"number_of_payments\": 300\n  }\n}\n"
        );
    }
}
