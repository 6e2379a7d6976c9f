//! Dataset-bound likelihood handle.

use crate::{settings_or_default, to_js_error};
use anyhow::{Context, Result};
use js_sys::Float64Array;
use quint_core::dataset::Dataset;
use quint_core::likelihood::{LikelihoodEvaluator, LikelihoodSettings, Theta};
use quint_core::posterior::{LogDensity, Posterior};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmLikelihood {
    dataset: Dataset,
    settings: LikelihoodSettings,
}

impl WasmLikelihood {
    pub(crate) fn from_parts(dataset: Dataset, settings: LikelihoodSettings) -> Self {
        Self { dataset, settings }
    }

    fn evaluator(&self) -> LikelihoodEvaluator<'_> {
        LikelihoodEvaluator::with_settings(&self.dataset, self.settings)
    }

    pub(crate) fn score(&self, theta: &[f64]) -> Result<f64> {
        self.evaluator()
            .log_likelihood_slice(theta)
            .context("Cannot evaluate log-likelihood")
    }

    pub(crate) fn posterior_score(&self, theta: &[f64]) -> Result<f64> {
        Posterior::with_settings(&self.dataset, self.settings)
            .log_density(theta)
            .context("Cannot evaluate log-probability")
    }

    pub(crate) fn predict(&self, theta: &[f64]) -> Result<Vec<f64>> {
        let theta = Theta::try_from(theta).context("Cannot predict distance moduli")?;
        self.evaluator()
            .predict(&theta)
            .context("Distance modulus prediction failed")
    }
}

#[wasm_bindgen]
impl WasmLikelihood {
    #[wasm_bindgen(constructor)]
    pub fn new(
        z: Vec<f64>,
        mu: Vec<f64>,
        sigma_mu: Vec<f64>,
        settings_val: JsValue,
    ) -> Result<WasmLikelihood, JsValue> {
        console_error_panic_hook::set_once();

        let settings: LikelihoodSettings =
            settings_or_default(settings_val, "likelihood settings")?;
        let dataset = Dataset::new(z, mu, sigma_mu)
            .context("Invalid dataset")
            .map_err(to_js_error)?;
        Ok(Self::from_parts(dataset, settings))
    }

    /// Builds a handle from `z,mu,sigma_mu` csv text.
    pub fn from_csv(text: &str, settings_val: JsValue) -> Result<WasmLikelihood, JsValue> {
        console_error_panic_hook::set_once();

        let settings: LikelihoodSettings =
            settings_or_default(settings_val, "likelihood settings")?;
        let dataset = Dataset::from_csv_str(text)
            .context("Failed to parse dataset csv")
            .map_err(to_js_error)?;
        Ok(Self::from_parts(dataset, settings))
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn log_likelihood(&self, theta: &[f64]) -> Result<f64, JsValue> {
        self.score(theta).map_err(to_js_error)
    }

    /// Prior-gated log-probability, the objective handed to the sampler.
    pub fn log_probability(&self, theta: &[f64]) -> Result<f64, JsValue> {
        self.posterior_score(theta).map_err(to_js_error)
    }

    pub fn distance_moduli(&self, theta: &[f64]) -> Result<Float64Array, JsValue> {
        let mu = self.predict(theta).map_err(to_js_error)?;
        Ok(Float64Array::from(mu.as_slice()))
    }

    pub fn settings(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.settings)
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize settings: {err}")))
    }
}
