//! Self-consumption figures without storage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::energy::records::{share_of_generation, validate_records, EnergyPeriodRecord};
use crate::types::*;
use crate::FinPlanResult;

/// Sums over all periods.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsumptionTotals {
    pub pv_generation_kwh: Kwh,
    pub grid_export_kwh: Kwh,
    pub grid_import_kwh: Kwh,
    pub self_consumption_kwh: Kwh,
    pub total_consumption_kwh: Kwh,
    /// Overall share of generation consumed on site; null when nothing was generated.
    pub self_consumption_rate_pct: Option<Percent>,
}

impl ConsumptionTotals {
    pub fn from_records(records: &[EnergyPeriodRecord]) -> Self {
        let mut totals = records.iter().fold(Self::default(), |acc, r| Self {
            pv_generation_kwh: acc.pv_generation_kwh + r.pv_generation_kwh,
            grid_export_kwh: acc.grid_export_kwh + r.grid_export_kwh,
            grid_import_kwh: acc.grid_import_kwh + r.grid_import_kwh,
            self_consumption_kwh: acc.self_consumption_kwh + r.self_consumption(),
            total_consumption_kwh: acc.total_consumption_kwh + r.total_consumption(),
            self_consumption_rate_pct: None,
        });
        totals.self_consumption_rate_pct =
            share_of_generation(totals.self_consumption_kwh, totals.pv_generation_kwh, "all periods").ok();
        totals
    }

    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            pv_generation_kwh: self.pv_generation_kwh.round_dp(dp),
            grid_export_kwh: self.grid_export_kwh.round_dp(dp),
            grid_import_kwh: self.grid_import_kwh.round_dp(dp),
            self_consumption_kwh: self.self_consumption_kwh.round_dp(dp),
            total_consumption_kwh: self.total_consumption_kwh.round_dp(dp),
            self_consumption_rate_pct: self.self_consumption_rate_pct.map(|v| v.round_dp(dp)),
        }
    }
}

/// Per-period baseline figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionPeriod {
    #[serde(flatten)]
    pub record: EnergyPeriodRecord,
    #[serde(rename = "Eigenverbrauch_kWh")]
    pub self_consumption_kwh: Kwh,
    #[serde(rename = "Gesamtverbrauch_kWh")]
    pub total_consumption_kwh: Kwh,
    #[serde(rename = "Eigenverbrauchsquote_%")]
    pub self_consumption_rate_pct: Option<Percent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionAnalysis {
    pub totals: ConsumptionTotals,
    pub periods: Vec<ConsumptionPeriod>,
}

impl ConsumptionAnalysis {
    /// Copy with derived values rounded to `dp` places; readings are left as given.
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            totals: self.totals.rounded(dp),
            periods: self
                .periods
                .iter()
                .map(|p| ConsumptionPeriod {
                    record: p.record.clone(),
                    self_consumption_kwh: p.self_consumption_kwh.round_dp(dp),
                    total_consumption_kwh: p.total_consumption_kwh.round_dp(dp),
                    self_consumption_rate_pct: p.self_consumption_rate_pct.map(|v| v.round_dp(dp)),
                })
                .collect(),
        }
    }
}

/// Self-consumption per period and overall, before any battery is added.
pub fn analyze_consumption(
    records: &[EnergyPeriodRecord],
) -> FinPlanResult<ComputationOutput<ConsumptionAnalysis>> {
    let start = Instant::now();
    validate_records(records)?;

    let mut warnings = Vec::new();
    let periods = records
        .iter()
        .map(|r| {
            let rate = match r.self_consumption_rate() {
                Ok(rate) => Some(rate),
                Err(e) => {
                    warnings.push(e.to_string());
                    None
                }
            };
            ConsumptionPeriod {
                record: r.clone(),
                self_consumption_kwh: r.self_consumption(),
                total_consumption_kwh: r.total_consumption(),
                self_consumption_rate_pct: rate,
            }
        })
        .collect();

    let output = ConsumptionAnalysis {
        totals: ConsumptionTotals::from_records(records),
        periods,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Self-consumption = generation - export; consumption = self-consumption + import",
        &serde_json::json!({ "periods": records.len() }),
        warnings,
        elapsed,
        output,
    ))
}

/// Total self-consumption gain in kWh between two totals.
pub fn self_consumption_gain(baseline: &ConsumptionTotals, with_storage_kwh: Kwh) -> Kwh {
    (with_storage_kwh - baseline.self_consumption_kwh).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_totals_and_overall_rate() {
        let records = vec![
            EnergyPeriodRecord::new("Januar", dec!(100), dec!(20), dec!(300)),
            EnergyPeriodRecord::new("Juli", dec!(900), dec!(500), dec!(50)),
        ];
        let out = analyze_consumption(&records).unwrap().result;
        assert_eq!(out.totals.pv_generation_kwh, dec!(1000));
        assert_eq!(out.totals.self_consumption_kwh, dec!(480));
        assert_eq!(out.totals.total_consumption_kwh, dec!(830));
        assert_eq!(out.totals.self_consumption_rate_pct, Some(dec!(48)));
        assert_eq!(out.periods[0].self_consumption_rate_pct, Some(dec!(80)));
    }

    #[test]
    fn test_zero_generation_period_is_null_with_warning() {
        let records = vec![EnergyPeriodRecord::new("Dezember", dec!(0), dec!(0), dec!(400))];
        let result = analyze_consumption(&records).unwrap();
        assert_eq!(result.result.periods[0].self_consumption_rate_pct, None);
        assert_eq!(result.result.totals.self_consumption_rate_pct, None);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Dezember"));
    }

    #[test]
    fn test_empty_input() {
        let out = analyze_consumption(&[]).unwrap().result;
        assert!(out.periods.is_empty());
        assert_eq!(out.totals.self_consumption_rate_pct, None);
    }
}
