use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinPlanError;
use crate::types::{Kwh, Percent};
use crate::FinPlanResult;

/// One period of meter readings. Field names follow the CSV column headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPeriodRecord {
    /// Period label, usually the month name.
    #[serde(rename = "Monat")]
    pub period: String,
    #[serde(rename = "PV_Erzeugung_kWh")]
    pub pv_generation_kwh: Kwh,
    /// Energy fed into the grid.
    #[serde(rename = "Einspeisung_kWh")]
    pub grid_export_kwh: Kwh,
    /// Energy drawn from the grid.
    #[serde(rename = "Netzbezug_kWh")]
    pub grid_import_kwh: Kwh,
}

impl EnergyPeriodRecord {
    pub fn new(period: impl Into<String>, pv: Kwh, export: Kwh, import: Kwh) -> Self {
        Self {
            period: period.into(),
            pv_generation_kwh: pv,
            grid_export_kwh: export,
            grid_import_kwh: import,
        }
    }

    /// PV energy used on site.
    pub fn self_consumption(&self) -> Kwh {
        self.pv_generation_kwh - self.grid_export_kwh
    }

    /// Household demand: self-consumed PV plus grid import.
    pub fn total_consumption(&self) -> Kwh {
        self.self_consumption() + self.grid_import_kwh
    }

    /// Share of generation consumed on site, in percent.
    pub fn self_consumption_rate(&self) -> FinPlanResult<Percent> {
        share_of_generation(self.self_consumption(), self.pv_generation_kwh, &self.period)
    }

    /// Check the physical constraints of the readings.
    pub fn validate(&self, index: usize) -> FinPlanResult<()> {
        let checks = [
            (self.pv_generation_kwh, "PV generation"),
            (self.grid_export_kwh, "grid export"),
            (self.grid_import_kwh, "grid import"),
        ];
        for (value, name) in checks {
            if value < Decimal::ZERO {
                return Err(FinPlanError::Validation {
                    index,
                    period: self.period.clone(),
                    reason: format!("{name} must not be negative, got {value}"),
                });
            }
        }
        if self.grid_export_kwh > self.pv_generation_kwh {
            return Err(FinPlanError::Validation {
                index,
                period: self.period.clone(),
                reason: format!(
                    "grid export {} exceeds PV generation {}",
                    self.grid_export_kwh, self.pv_generation_kwh
                ),
            });
        }
        Ok(())
    }
}

/// Validate a batch; the first offending record rejects all of them.
pub fn validate_records(records: &[EnergyPeriodRecord]) -> FinPlanResult<()> {
    records
        .iter()
        .enumerate()
        .try_for_each(|(i, r)| r.validate(i))
}

/// `100 * part / generation`, undefined when nothing was generated.
pub(crate) fn share_of_generation(part: Kwh, generation: Kwh, context: &str) -> FinPlanResult<Percent> {
    if generation.is_zero() {
        return Err(FinPlanError::DivisionUndefined {
            context: format!("self-consumption rate for '{context}' (no PV generation)"),
        });
    }
    Ok(dec!(100) * part / generation)
}
