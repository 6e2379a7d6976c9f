//! WASM bridge exposing the quintessence likelihood engine to a JavaScript host.
//!
//! The host owns the sampler; this crate only turns JS arrays and settings
//! objects into `quint_core` calls.

mod integration;
mod likelihood;

pub use integration::{integrate_expansion, luminosity_distances};
pub use likelihood::WasmLikelihood;

use serde::de::DeserializeOwned;
use wasm_bindgen::JsValue;

pub(crate) fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

/// Deserializes an optional settings object, falling back to defaults.
pub(crate) fn settings_or_default<T>(value: JsValue, what: &str) -> Result<T, JsValue>
where
    T: DeserializeOwned + Default,
{
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|err| JsValue::from_str(&format!("Invalid {what}: {err}")))
}
