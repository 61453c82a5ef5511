pub mod energy;
pub mod loans;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use finplan_core::defaults::Range;
use finplan_core::ComputationOutput;

/// Clamp a flag value into its dashboard range, noting any adjustment.
pub(crate) fn clamp_flag(
    flag: &str,
    value: Decimal,
    range: Range,
    notes: &mut Vec<String>,
) -> Decimal {
    let clamped = range.clamp(value);
    if clamped != value {
        warn!(flag, requested = %value, used = %clamped, "flag outside allowed range");
        notes.push(format!(
            "--{flag} {value} is outside {}..={}; using {clamped}",
            range.min, range.max
        ));
    }
    clamped
}

/// Prepend front-end notes to the core warnings and serialise the envelope.
pub(crate) fn finish<T: Serialize>(
    mut output: ComputationOutput<T>,
    notes: Vec<String>,
) -> Result<Value, Box<dyn std::error::Error>> {
    output.warnings.splice(0..0, notes);
    Ok(serde_json::to_value(output)?)
}
