use napi::Result as NapiResult;
use napi_derive::napi;

use finplan_core::energy::records::EnergyPeriodRecord;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn annuity_schedule(input_json: String) -> NapiResult<String> {
    let input: finplan_core::loans::annuity::AnnuityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        finplan_core::loans::annuity::compute_annuity_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn prepayment_schedule(input_json: String) -> NapiResult<String> {
    let input: finplan_core::loans::prepayment::PrepaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = finplan_core::loans::prepayment::compute_prepayment_schedule(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

/// Takes a JSON array of records keyed like the CSV columns.
#[napi]
pub fn analyze_consumption(records_json: String) -> NapiResult<String> {
    let records: Vec<EnergyPeriodRecord> =
        serde_json::from_str(&records_json).map_err(to_napi_error)?;
    let output =
        finplan_core::energy::analysis::analyze_consumption(&records).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn simulate_storage(input_json: String) -> NapiResult<String> {
    let input: finplan_core::energy::storage::StorageInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        finplan_core::energy::storage::simulate_storage(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_capacities(input_json: String) -> NapiResult<String> {
    let input: finplan_core::energy::storage::CapacitySweepInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        finplan_core::energy::storage::compare_capacities(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
