//! Free functions exposing the integrator and distance calculator.

use crate::{settings_or_default, to_js_error};
use anyhow::{bail, Context, Result};
use js_sys::Float64Array;
use quint_core::distance::{luminosity_distance, OutOfRangePolicy};
use quint_core::expansion::{CosmologyParams, ExpansionState};
use quint_core::solvers::{integrate_with, IntegrationSettings};
use quint_core::trajectory::Trajectory;
use wasm_bindgen::prelude::*;

fn parse_params(params_val: JsValue) -> Result<CosmologyParams, JsValue> {
    serde_wasm_bindgen::from_value(params_val)
        .map_err(|err| JsValue::from_str(&format!("Invalid cosmology parameters: {err}")))
}

pub(crate) fn run_integration(
    params: &CosmologyParams,
    settings: &IntegrationSettings,
    initial_state: &[f64],
) -> Result<Trajectory> {
    let initial = match initial_state {
        [] => params.initial_state(),
        [c, cp, e] => ExpansionState::new(*c, *cp, *e),
        other => bail!(
            "Initial state must hold (C, dC/da, E); got {} values.",
            other.len()
        ),
    };
    integrate_with(settings, initial, params).context("Integration request rejected")
}

/// Integrates the expansion equations and returns the serialized trajectory.
///
/// An empty `initial_state` starts from `(C0, dC0, 1.0)` taken from the parameters.
#[wasm_bindgen]
pub fn integrate_expansion(
    params_val: JsValue,
    settings_val: JsValue,
    initial_state: Vec<f64>,
) -> Result<JsValue, JsValue> {
    let params = parse_params(params_val)?;
    let settings: IntegrationSettings = settings_or_default(settings_val, "integration settings")?;
    let trajectory = run_integration(&params, &settings, &initial_state).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&trajectory)
        .map_err(|err| JsValue::from_str(&format!("Failed to serialize trajectory: {err}")))
}

/// Luminosity distances (in units of c/H0) at the requested redshifts.
#[wasm_bindgen]
pub fn luminosity_distances(
    params_val: JsValue,
    redshifts: Vec<f64>,
    settings_val: JsValue,
    reject_out_of_range: bool,
) -> Result<Float64Array, JsValue> {
    let params = parse_params(params_val)?;
    let settings: IntegrationSettings = settings_or_default(settings_val, "integration settings")?;
    let policy = if reject_out_of_range {
        OutOfRangePolicy::Reject
    } else {
        OutOfRangePolicy::Extrapolate
    };
    let distances = run_integration(&params, &settings, &[])
        .and_then(|trajectory| {
            luminosity_distance(&redshifts, &trajectory, policy)
                .context("Distance evaluation failed")
        })
        .map_err(to_js_error)?;
    Ok(Float64Array::from(distances.as_slice()))
}
