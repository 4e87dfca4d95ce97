use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn run_simulation(input_json: String) -> NapiResult<String> {
    let input: proforma_core::types::SimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::simulation::run_simulation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// IRR
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_irr(input_json: String) -> NapiResult<String> {
    let input: proforma_core::irr::IrrInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proforma_core::irr::solve_irr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_distribution(input_json: String) -> NapiResult<String> {
    let input: proforma_core::aggregate::DistributionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::aggregate::analyze_distribution(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
