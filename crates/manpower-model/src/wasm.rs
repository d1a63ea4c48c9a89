//! WASM bindings for the manpower planner
//!
//! The browser front-end edits a scenario as a plain JS object, sends it
//! here, and renders the returned report.

use wasm_bindgen::prelude::*;

use crate::report::Report;
use crate::scenario::Scenario;

/// The built-in scenario, as a starting point for user edits
#[wasm_bindgen]
pub fn default_scenario() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&Scenario::default()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Partial scenario objects are merged onto the defaults, so the front-end
/// can send only the fields the user edited
fn scenario_from_js(value: JsValue) -> Result<Scenario, JsValue> {
    let overrides: serde_json::Value =
        serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Scenario::from_overrides(overrides).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Validate a scenario; returns null when valid, otherwise the error message
#[wasm_bindgen]
pub fn validate(scenario: JsValue) -> Result<JsValue, JsValue> {
    let scenario = scenario_from_js(scenario)?;
    Ok(match scenario.validate() {
        Ok(()) => JsValue::NULL,
        Err(e) => JsValue::from_str(&e.to_string()),
    })
}

/// Build and solve a scenario and return the report as a JS object.
/// Infeasible and invalid scenarios still produce a report with a status.
#[wasm_bindgen]
pub fn solve(scenario: JsValue) -> Result<JsValue, JsValue> {
    let scenario = scenario_from_js(scenario)?;

    let outcome = crate::optimize(&scenario);
    let report = Report::from_outcome(&outcome, &scenario);

    serde_wasm_bindgen::to_value(&report).map_err(|e| JsValue::from_str(&e.to_string()))
}
