//! Monthly energy readings as CSV:
//! Monat,PV_Erzeugung_kWh,Einspeisung_kWh,Netzbezug_kWh

use csv::{ErrorKind, ReaderBuilder, StringRecord, Trim};
use std::io::Read;

use finplan_core::energy::records::EnergyPeriodRecord;

/// Sample dataset shipped with the binary.
pub const SAMPLE_ENERGY_CSV: &str = include_str!("../../data/energie_simulator_sample.csv");

/// Rewrite a csv error as "line N, column NAME: ...".
fn describe(err: csv::Error, headers: &StringRecord) -> String {
    match err.kind() {
        ErrorKind::Deserialize { pos, err: de } => {
            let line = pos.as_ref().map(|p| p.line()).unwrap_or_default();
            match de.field().and_then(|i| headers.get(i as usize)) {
                Some(column) => format!("line {line}, column {column}: {}", de.kind()),
                None => format!("line {line}: {}", de.kind()),
            }
        }
        _ => err.to_string(),
    }
}

/// Parse readings in file order straight into records. Extra columns are ignored.
pub fn read_energy_csv<R: Read>(reader: R) -> Result<Vec<EnergyPeriodRecord>, Box<dyn std::error::Error>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let records = rdr
        .deserialize::<EnergyPeriodRecord>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| describe(e, &headers))?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sample_has_twelve_months() {
        let records = read_energy_csv(SAMPLE_ENERGY_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 12);
        assert_eq!(
            records[0],
            EnergyPeriodRecord::new("Januar", dec!(120), dec!(10), dec!(420))
        );
        assert_eq!(records[11].period, "Dezember");
    }

    #[test]
    fn test_columns_in_any_order_with_extras() {
        let data = "Netzbezug_kWh,Monat,Kommentar,Einspeisung_kWh,PV_Erzeugung_kWh\n\
                    300.5, Juni ,sonnig,400,1000.25\n";
        let records = read_energy_csv(data.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![EnergyPeriodRecord::new("Juni", dec!(1000.25), dec!(400), dec!(300.5))]
        );
    }

    #[test]
    fn test_non_numeric_value_names_line_and_column() {
        let data = "Monat,PV_Erzeugung_kWh,Einspeisung_kWh,Netzbezug_kWh\n\
                    Januar,120,10,420\n\
                    Februar,viel,40,360\n";
        let err = read_energy_csv(data.as_bytes()).unwrap_err().to_string();
        assert!(err.contains("line 3"), "{err}");
        assert!(err.contains("PV_Erzeugung_kWh"), "{err}");
    }

    #[test]
    fn test_missing_column_rejected() {
        let data = "Monat,PV_Erzeugung_kWh,Einspeisung_kWh\nJanuar,120,10\n";
        assert!(read_energy_csv(data.as_bytes()).is_err());
    }
}
