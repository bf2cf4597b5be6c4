use napi::Result as NapiResult;
use napi_derive::napi;

use credit_contracts_core::lifecycle::ContractStatus;
use credit_contracts_core::schedule::report::{self, RecalculationInput, TermConversionInput};
use credit_contracts_core::schedule::ScheduleParams;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_schedule(input_json: String) -> NapiResult<String> {
    let input: ScheduleParams = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = report::build_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn recalculate_schedule(input_json: String) -> NapiResult<String> {
    let input: RecalculationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = report::build_recalculation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn convert_term(input_json: String) -> NapiResult<String> {
    let input: TermConversionInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = report::build_term_conversion(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Statuses reachable from `from` (e.g. "ACTIVE"), as a JSON array.
#[napi]
pub fn allowed_transitions(from: String) -> NapiResult<String> {
    let status: ContractStatus = from.parse().map_err(to_napi_error)?;
    serde_json::to_string(status.allowed_targets()).map_err(to_napi_error)
}

#[napi]
pub fn can_transition(from: String, to: String) -> NapiResult<bool> {
    let from: ContractStatus = from.parse().map_err(to_napi_error)?;
    let to: ContractStatus = to.parse().map_err(to_napi_error)?;
    Ok(from.can_transition_to(to))
}
