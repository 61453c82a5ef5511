//! Single-battery storage simulation.
//!
//! Per period the battery first charges from the PV energy that was exported
//! (the only energy not already used on site), limited by free capacity, and
//! then discharges to cover grid import. The state of charge carries over to
//! the next period. No conversion losses, no power limits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::defaults::{DEFAULT_BATTERY_CAPACITY_KWH, MAX_SWEEP_POINTS};
use crate::energy::analysis::{self_consumption_gain, ConsumptionTotals};
use crate::energy::records::{share_of_generation, validate_records, EnergyPeriodRecord};
use crate::error::FinPlanError;
use crate::types::*;
use crate::FinPlanResult;

/// Battery charge state within one simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryState {
    capacity_kwh: Kwh,
    stored_kwh: Kwh,
}

impl BatteryState {
    /// An empty battery of the given capacity.
    pub fn empty(capacity_kwh: Kwh) -> Self {
        Self {
            capacity_kwh,
            stored_kwh: Decimal::ZERO,
        }
    }

    pub fn stored_kwh(&self) -> Kwh {
        self.stored_kwh
    }

    /// Store up to `available` kWh; returns what was actually stored.
    pub fn charge(&mut self, available: Kwh) -> Kwh {
        let charge = available.min(self.capacity_kwh - self.stored_kwh).max(Decimal::ZERO);
        self.stored_kwh += charge;
        charge
    }

    /// Release up to `demand` kWh; returns what was actually released.
    pub fn discharge(&mut self, demand: Kwh) -> Kwh {
        let discharge = self.stored_kwh.min(demand).max(Decimal::ZERO);
        self.stored_kwh -= discharge;
        discharge
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageInput {
    /// Readings in chronological order.
    pub records: Vec<EnergyPeriodRecord>,
    pub battery_capacity_kwh: Kwh,
}

impl StorageInput {
    /// Readings with the default 5 kWh battery.
    pub fn with_default_capacity(records: Vec<EnergyPeriodRecord>) -> Self {
        Self {
            records,
            battery_capacity_kwh: DEFAULT_BATTERY_CAPACITY_KWH,
        }
    }
}

/// One input row augmented with baseline and storage figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoragePeriod {
    #[serde(flatten)]
    pub record: EnergyPeriodRecord,
    #[serde(rename = "Eigenverbrauch_kWh")]
    pub self_consumption_kwh: Kwh,
    #[serde(rename = "Gesamtverbrauch_kWh")]
    pub total_consumption_kwh: Kwh,
    #[serde(rename = "Eigenverbrauchsquote_%")]
    pub self_consumption_rate_pct: Option<Percent>,
    #[serde(rename = "Eigenverbrauch_mit_Speicher_kWh")]
    pub adjusted_self_consumption_kwh: Kwh,
    #[serde(rename = "Quote_mit_Speicher_%")]
    pub adjusted_rate_pct: Option<Percent>,
    pub charge_kwh: Kwh,
    pub discharge_kwh: Kwh,
    /// State of charge at the end of the period.
    pub stored_kwh: Kwh,
}

impl StoragePeriod {
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            record: self.record.clone(),
            self_consumption_kwh: self.self_consumption_kwh.round_dp(dp),
            total_consumption_kwh: self.total_consumption_kwh.round_dp(dp),
            self_consumption_rate_pct: self.self_consumption_rate_pct.map(|v| v.round_dp(dp)),
            adjusted_self_consumption_kwh: self.adjusted_self_consumption_kwh.round_dp(dp),
            adjusted_rate_pct: self.adjusted_rate_pct.map(|v| v.round_dp(dp)),
            charge_kwh: self.charge_kwh.round_dp(dp),
            discharge_kwh: self.discharge_kwh.round_dp(dp),
            stored_kwh: self.stored_kwh.round_dp(dp),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageOutput {
    pub battery_capacity_kwh: Kwh,
    pub baseline: ConsumptionTotals,
    pub self_consumption_with_storage_kwh: Kwh,
    /// Overall rate with storage; null when nothing was generated.
    pub self_consumption_rate_with_storage_pct: Option<Percent>,
    pub self_consumption_gain_kwh: Kwh,
    pub periods: Vec<StoragePeriod>,
}

impl StorageOutput {
    /// Copy with all energy values rounded to `dp` places, for display.
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            battery_capacity_kwh: self.battery_capacity_kwh,
            baseline: self.baseline.rounded(dp),
            self_consumption_with_storage_kwh: self.self_consumption_with_storage_kwh.round_dp(dp),
            self_consumption_rate_with_storage_pct: self
                .self_consumption_rate_with_storage_pct
                .map(|v| v.round_dp(dp)),
            self_consumption_gain_kwh: self.self_consumption_gain_kwh.round_dp(dp),
            periods: self.periods.iter().map(|p| p.rounded(dp)).collect(),
        }
    }
}

fn validate_capacity(capacity: Kwh) -> FinPlanResult<()> {
    if capacity < Decimal::ZERO {
        return Err(FinPlanError::InvalidInput {
            field: "battery_capacity_kwh".into(),
            reason: "Battery capacity must not be negative".into(),
        });
    }
    Ok(())
}

/// Advance the battery through one period.
fn step(battery: &mut BatteryState, record: &EnergyPeriodRecord) -> StoragePeriod {
    let pv = record.pv_generation_kwh;
    let self_consumption = pv - record.grid_export_kwh;
    let surplus = pv - self_consumption;

    let charge = battery.charge(surplus);
    let discharge = battery.discharge(record.grid_import_kwh);
    let adjusted = self_consumption + discharge;

    StoragePeriod {
        record: record.clone(),
        self_consumption_kwh: self_consumption,
        total_consumption_kwh: self_consumption + record.grid_import_kwh,
        self_consumption_rate_pct: share_of_generation(self_consumption, pv, &record.period).ok(),
        adjusted_self_consumption_kwh: adjusted,
        adjusted_rate_pct: share_of_generation(adjusted, pv, &record.period).ok(),
        charge_kwh: charge,
        discharge_kwh: discharge,
        stored_kwh: battery.stored_kwh(),
    }
}

/// Run the battery over `records` in order, starting empty.
///
/// Rejects the whole batch if any record is physically inconsistent. Periods
/// without generation get a null rate and a warning.
pub fn simulate_storage(input: &StorageInput) -> FinPlanResult<ComputationOutput<StorageOutput>> {
    let start = Instant::now();
    validate_capacity(input.battery_capacity_kwh)?;
    validate_records(&input.records)?;

    let mut battery = BatteryState::empty(input.battery_capacity_kwh);
    let periods: Vec<StoragePeriod> = input
        .records
        .iter()
        .map(|record| step(&mut battery, record))
        .collect();

    let mut warnings = Vec::new();
    for p in periods.iter().filter(|p| p.adjusted_rate_pct.is_none()) {
        warn!(period = %p.record.period, "no PV generation, self-consumption rate undefined");
        warnings.push(format!(
            "{}: no PV generation, self-consumption rate undefined",
            p.record.period
        ));
    }

    let baseline = ConsumptionTotals::from_records(&input.records);
    let with_storage: Kwh = periods.iter().map(|p| p.adjusted_self_consumption_kwh).sum();
    let rate_with_storage =
        share_of_generation(with_storage, baseline.pv_generation_kwh, "all periods").ok();

    debug!(
        capacity = %input.battery_capacity_kwh,
        periods = periods.len(),
        with_storage = %with_storage,
        "storage simulation finished"
    );

    let output = StorageOutput {
        battery_capacity_kwh: input.battery_capacity_kwh,
        self_consumption_gain_kwh: self_consumption_gain(&baseline, with_storage),
        baseline,
        self_consumption_with_storage_kwh: with_storage,
        self_consumption_rate_with_storage_pct: rate_with_storage,
        periods,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Battery charges from exported PV up to free capacity, discharges against grid import; lossless",
        &serde_json::json!({
            "battery_capacity_kwh": input.battery_capacity_kwh.to_string(),
            "periods": input.records.len(),
            "initial_state_of_charge_kwh": "0",
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Capacities to compare, inclusive on both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacitySweepInput {
    pub records: Vec<EnergyPeriodRecord>,
    pub min_capacity_kwh: Kwh,
    pub max_capacity_kwh: Kwh,
    pub step_kwh: Kwh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityResult {
    pub battery_capacity_kwh: Kwh,
    pub self_consumption_with_storage_kwh: Kwh,
    pub self_consumption_rate_with_storage_pct: Option<Percent>,
    pub self_consumption_gain_kwh: Kwh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacitySweepOutput {
    pub baseline: ConsumptionTotals,
    pub results: Vec<CapacityResult>,
}

impl CapacitySweepOutput {
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            baseline: self.baseline.rounded(dp),
            results: self
                .results
                .iter()
                .map(|r| CapacityResult {
                    battery_capacity_kwh: r.battery_capacity_kwh,
                    self_consumption_with_storage_kwh: r.self_consumption_with_storage_kwh.round_dp(dp),
                    self_consumption_rate_with_storage_pct: r
                        .self_consumption_rate_with_storage_pct
                        .map(|v| v.round_dp(dp)),
                    self_consumption_gain_kwh: r.self_consumption_gain_kwh.round_dp(dp),
                })
                .collect(),
        }
    }
}

fn sweep_values(input: &CapacitySweepInput) -> FinPlanResult<Vec<Kwh>> {
    if input.step_kwh <= Decimal::ZERO {
        return Err(FinPlanError::InvalidInput {
            field: "step_kwh".into(),
            reason: "Step must be positive".into(),
        });
    }
    if input.min_capacity_kwh > input.max_capacity_kwh {
        return Err(FinPlanError::InvalidInput {
            field: "min_capacity_kwh".into(),
            reason: "Min must be <= max".into(),
        });
    }
    validate_capacity(input.min_capacity_kwh)?;

    let steps = (input.max_capacity_kwh - input.min_capacity_kwh).checked_div(input.step_kwh);
    if steps.map_or(true, |s| s >= Decimal::from(MAX_SWEEP_POINTS - 1)) {
        return Err(FinPlanError::InvalidInput {
            field: "step_kwh".into(),
            reason: format!("Sweep would exceed {MAX_SWEEP_POINTS} capacities"),
        });
    }

    let mut values = Vec::new();
    let mut current = Some(input.min_capacity_kwh);
    while let Some(capacity) = current.filter(|c| *c <= input.max_capacity_kwh) {
        values.push(capacity);
        current = capacity.checked_add(input.step_kwh);
    }
    // Include max if the step doesn't land exactly on it
    if values.last().is_some_and(|&last| last < input.max_capacity_kwh) {
        values.push(input.max_capacity_kwh);
    }
    Ok(values)
}

/// Simulate every capacity in the sweep against the same readings.
pub fn compare_capacities(
    input: &CapacitySweepInput,
) -> FinPlanResult<ComputationOutput<CapacitySweepOutput>> {
    let start = Instant::now();
    let capacities = sweep_values(input)?;
    validate_records(&input.records)?;

    let mut warnings = Vec::new();
    let mut results = Vec::with_capacity(capacities.len());
    for capacity in capacities {
        let run = simulate_storage(&StorageInput {
            records: input.records.clone(),
            battery_capacity_kwh: capacity,
        })?;
        if warnings.is_empty() {
            warnings = run.warnings;
        }
        results.push(CapacityResult {
            battery_capacity_kwh: capacity,
            self_consumption_with_storage_kwh: run.result.self_consumption_with_storage_kwh,
            self_consumption_rate_with_storage_pct: run.result.self_consumption_rate_with_storage_pct,
            self_consumption_gain_kwh: run.result.self_consumption_gain_kwh,
        });
    }

    let output = CapacitySweepOutput {
        baseline: ConsumptionTotals::from_records(&input.records),
        results,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Storage simulation repeated per battery capacity",
        &serde_json::json!({
            "min_capacity_kwh": input.min_capacity_kwh.to_string(),
            "max_capacity_kwh": input.max_capacity_kwh.to_string(),
            "step_kwh": input.step_kwh.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
