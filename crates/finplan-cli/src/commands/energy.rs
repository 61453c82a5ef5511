use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finplan_core::defaults::{BATTERY_CAPACITY_RANGE, DEFAULT_BATTERY_CAPACITY_KWH};
use finplan_core::energy::analysis;
use finplan_core::energy::records::EnergyPeriodRecord;
use finplan_core::energy::storage::{self, CapacitySweepInput, StorageInput};

use super::{clamp_flag, finish};
use crate::input;

/// Readings from `--csv`, or CSV piped on stdin.
fn load_records(csv_path: Option<&str>) -> Result<Vec<EnergyPeriodRecord>, Box<dyn std::error::Error>> {
    if let Some(path) = csv_path {
        return input::csv_in::read_energy_csv(input::file::open(path)?);
    }
    if let Some(text) = input::stdin::read_stdin_text()? {
        return input::csv_in::read_energy_csv(text.as_bytes());
    }
    Err("--csv <file.csv> or CSV on stdin required (see `finplan energy-sample`)".into())
}

/// Arguments for the self-consumption analysis without storage
#[derive(Args)]
pub struct ConsumptionArgs {
    /// Monthly readings (Monat,PV_Erzeugung_kWh,Einspeisung_kWh,Netzbezug_kWh)
    #[arg(long)]
    pub csv: Option<String>,
}

pub fn run_consumption(
    args: ConsumptionArgs,
    precision: u32,
) -> Result<Value, Box<dyn std::error::Error>> {
    let records = load_records(args.csv.as_deref())?;
    let mut result = analysis::analyze_consumption(&records)?;
    result.result = result.result.rounded(precision);
    finish(result, Vec::new())
}

/// Arguments for the battery simulation
#[derive(Args)]
pub struct StorageArgs {
    /// Path to JSON input file with records and capacity (overrides other flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly readings (Monat,PV_Erzeugung_kWh,Einspeisung_kWh,Netzbezug_kWh)
    #[arg(long)]
    pub csv: Option<String>,

    /// Usable battery capacity in kWh [default: 5]
    #[arg(long)]
    pub capacity: Option<Decimal>,
}

pub fn run_storage(args: StorageArgs, precision: u32) -> Result<Value, Box<dyn std::error::Error>> {
    let mut notes = Vec::new();
    let storage_input: StorageInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else {
        let capacity = clamp_flag(
            "capacity",
            args.capacity.unwrap_or(DEFAULT_BATTERY_CAPACITY_KWH),
            BATTERY_CAPACITY_RANGE,
            &mut notes,
        );
        StorageInput {
            records: load_records(args.csv.as_deref())?,
            battery_capacity_kwh: capacity,
        }
    };

    let mut result = storage::simulate_storage(&storage_input)?;
    result.result = result.result.rounded(precision);
    finish(result, notes)
}

/// Arguments for comparing battery sizes
#[derive(Args)]
pub struct CapacitySweepArgs {
    /// Monthly readings (Monat,PV_Erzeugung_kWh,Einspeisung_kWh,Netzbezug_kWh)
    #[arg(long)]
    pub csv: Option<String>,

    /// Smallest capacity in kWh
    #[arg(long, default_value = "1")]
    pub min: Decimal,

    /// Largest capacity in kWh
    #[arg(long, default_value = "15")]
    pub max: Decimal,

    /// Capacity increment in kWh
    #[arg(long, default_value = "1")]
    pub step: Decimal,
}

pub fn run_capacity_sweep(
    args: CapacitySweepArgs,
    precision: u32,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sweep_input = CapacitySweepInput {
        records: load_records(args.csv.as_deref())?,
        min_capacity_kwh: args.min,
        max_capacity_kwh: args.max,
        step_kwh: args.step,
    };

    let mut result = storage::compare_capacities(&sweep_input)?;
    result.result = result.result.rounded(precision);
    finish(result, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Sample CSV on disk, removed again when dropped.
    struct SampleFile(std::path::PathBuf);

    impl SampleFile {
        fn create(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!("finplan-{name}-{}.csv", std::process::id()));
            let mut f = std::fs::File::create(&path).unwrap();
            f.write_all(input::csv_in::SAMPLE_ENERGY_CSV.as_bytes()).unwrap();
            Self(path)
        }

        fn arg(&self) -> Option<String> {
            Some(self.0.display().to_string())
        }
    }

    impl Drop for SampleFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_run_storage_from_csv_file() {
        let sample = SampleFile::create("storage");
        let args = StorageArgs {
            input: None,
            csv: sample.arg(),
            capacity: Some(rust_decimal_macros::dec!(5)),
        };
        let value = run_storage(args, 1).unwrap();
        let periods = value["result"]["periods"].as_array().unwrap();
        assert_eq!(periods.len(), 12);
        assert_eq!(periods[0]["Monat"], "Januar");
        assert!(periods[0].get("Quote_mit_Speicher_%").is_some());
        assert_eq!(value["result"]["battery_capacity_kwh"], "5");
    }

    #[test]
    fn test_run_storage_clamps_capacity_flag() {
        let sample = SampleFile::create("clamp");
        let args = StorageArgs {
            input: None,
            csv: sample.arg(),
            capacity: Some(rust_decimal_macros::dec!(40)),
        };
        let value = run_storage(args, 1).unwrap();
        assert_eq!(value["result"]["battery_capacity_kwh"], "15");
        assert_eq!(value["warnings"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_sample_file_removed_after_use() {
        let sample = SampleFile::create("cleanup");
        let path = sample.0.clone();
        let args = ConsumptionArgs { csv: sample.arg() };
        assert!(run_consumption(args, 1).is_ok());
        drop(sample);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_csv_file_is_an_error() {
        let args = ConsumptionArgs {
            csv: Some("/nonexistent/finplan.csv".into()),
        };
        let err = run_consumption(args, 1).unwrap_err().to_string();
        assert!(err.contains("File not found"));
    }
}
