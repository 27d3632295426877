use napi::Result as NapiResult;
use napi_derive::napi;
use serde::{de::DeserializeOwned, Serialize};

use calcdesk_core::{CalcResult, ComputationOutput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Decode the JSON input, run the calculator and encode its envelope.
fn call<I, O>(
    input_json: &str,
    calculator: fn(&I) -> CalcResult<ComputationOutput<O>>,
) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calculator(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_amortization(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::loans::amortization::compute_amortization)
}

#[napi]
pub fn compute_mortgage_payment(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::loans::mortgage::compute_mortgage_payment)
}

#[napi]
pub fn compute_affordability(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::loans::affordability::compute_affordability)
}

// ---------------------------------------------------------------------------
// Depreciation
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_depreciation(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::depreciation::compute_depreciation)
}

// ---------------------------------------------------------------------------
// Time value and solvers
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_annuity_value(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::time_value::compute_annuity_value)
}

#[napi]
pub fn compute_compound_growth(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::time_value::compute_compound_growth)
}

#[napi]
pub fn compute_irr(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::solvers::irr::compute_irr)
}

// ---------------------------------------------------------------------------
// Statistics and planning
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_confidence_interval(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::stats::compute_confidence_interval)
}

#[napi]
pub fn project_retirement(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::retirement::project_retirement)
}

// ---------------------------------------------------------------------------
// Fitness
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_bmi(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::fitness::compute_bmi)
}

#[napi]
pub fn compute_energy_expenditure(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::fitness::compute_energy_expenditure)
}

#[napi]
pub fn compute_body_fat(input_json: String) -> NapiResult<String> {
    call(&input_json, calcdesk_core::fitness::compute_body_fat)
}
