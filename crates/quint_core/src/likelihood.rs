use crate::dataset::Dataset;
use crate::distance::{ComovingDistance, OutOfRangePolicy};
use crate::error::{QuintError, QuintResult};
use crate::expansion::CosmologyParams;
use crate::solvers::{ExpansionIntegrator, IntegrationSettings, Rk4Integrator};
use crate::traits::floor_at;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Floor applied to luminosity distances before taking the logarithm.
pub const DISTANCE_FLOOR: f64 = 1e-12;

/// `5 log10(Mpc / 10 pc)`; the remaining `c/H0` scale is absorbed by `M`.
pub const MODULUS_OFFSET: f64 = 25.0;

/// Sampled parameter vector `(V0, k, Om, C0, dC0, M)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Theta {
    pub v0: f64,
    pub k: f64,
    pub om: f64,
    pub c0: f64,
    pub dc0: f64,
    pub m: f64,
}

impl Theta {
    pub const DIMENSION: usize = 6;

    /// Conventional starting point for walkers.
    pub fn reference() -> Self {
        Self {
            v0: 0.7,
            k: 1.549,
            om: 0.3,
            c0: 0.0,
            dc0: 0.0,
            m: 0.0,
        }
    }

    pub fn to_array(self) -> [f64; 6] {
        [self.v0, self.k, self.om, self.c0, self.dc0, self.m]
    }

    /// Cosmology with no radiation and the sampled initial field conditions.
    pub fn cosmology(&self) -> CosmologyParams {
        CosmologyParams::new(self.v0, self.k, self.om).with_field(self.c0, self.dc0)
    }
}

impl TryFrom<&[f64]> for Theta {
    type Error = QuintError;

    fn try_from(values: &[f64]) -> QuintResult<Self> {
        match *values {
            [v0, k, om, c0, dc0, m] => Ok(Self {
                v0,
                k,
                om,
                c0,
                dc0,
                m,
            }),
            _ => Err(QuintError::DimensionMismatch {
                expected: Self::DIMENSION,
                actual: values.len(),
            }),
        }
    }
}

/// Open interval `(lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenInterval {
    pub lower: f64,
    pub upper: f64,
}

impl OpenInterval {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower < value && value < self.upper
    }
}

/// Flat prior support on the cosmological parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorBounds {
    pub om: OpenInterval,
    pub v0: OpenInterval,
    pub k: OpenInterval,
}

impl Default for PriorBounds {
    fn default() -> Self {
        Self {
            om: OpenInterval::new(0.0, 1.0),
            v0: OpenInterval::new(0.0, 5.0),
            k: OpenInterval::new(0.0, 5.0),
        }
    }
}

impl PriorBounds {
    pub fn contains(&self, theta: &Theta) -> bool {
        self.om.contains(theta.om) && self.v0.contains(theta.v0) && self.k.contains(theta.k)
    }

    /// Flat log-prior: `0` inside the support, `-inf` outside.
    pub fn log_prior(&self, theta: &Theta) -> f64 {
        if self.contains(theta) {
            0.0
        } else {
            f64::NEG_INFINITY
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LikelihoodSettings {
    #[serde(default)]
    pub integration: IntegrationSettings,
    #[serde(default)]
    pub out_of_range: OutOfRangePolicy,
    #[serde(default)]
    pub prior: PriorBounds,
}

/// `mu = 5 log10(max(DL, floor)) + 25 + M`.
pub fn distance_modulus(luminosity_distance: f64, nuisance: f64) -> f64 {
    5.0 * floor_at(luminosity_distance, DISTANCE_FLOOR).log10() + MODULUS_OFFSET + nuisance
}

/// Predicted distance modulus at each redshift for `theta`.
pub fn predict_distance_moduli(
    redshifts: &[f64],
    theta: &Theta,
    settings: &LikelihoodSettings,
    integrator: &impl ExpansionIntegrator,
) -> QuintResult<Vec<f64>> {
    let params = theta.cosmology();
    let trajectory =
        integrator.integrate(&settings.integration, params.initial_state(), &params)?;
    let table = ComovingDistance::from_trajectory(&trajectory, settings.out_of_range)?;
    redshifts
        .iter()
        .map(|&z| Ok(distance_modulus(table.luminosity(z)?, theta.m)))
        .collect()
}

/// `Σ ((mu_obs - mu_pred) / sigma_mu)^2`, summed in dataset order.
pub fn chi_square(dataset: &Dataset, predicted: &[f64]) -> f64 {
    dataset
        .distance_moduli()
        .iter()
        .zip(dataset.uncertainties())
        .zip(predicted)
        .map(|((obs, sigma), pred)| {
            let pull = (obs - pred) / sigma;
            pull * pull
        })
        .sum()
}

/// Scores parameter vectors against one borrowed dataset.
///
/// Holds no mutable state, so a single evaluator may be shared by
/// concurrently running walkers.
#[derive(Debug, Clone)]
pub struct LikelihoodEvaluator<'a, I = Rk4Integrator> {
    dataset: &'a Dataset,
    settings: LikelihoodSettings,
    integrator: I,
}

impl<'a> LikelihoodEvaluator<'a, Rk4Integrator> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self::with_settings(dataset, LikelihoodSettings::default())
    }

    pub fn with_settings(dataset: &'a Dataset, settings: LikelihoodSettings) -> Self {
        debug!(
            rows = dataset.len(),
            steps = settings.integration.steps,
            policy = ?settings.out_of_range,
            "constructed likelihood evaluator"
        );
        Self {
            dataset,
            settings,
            integrator: Rk4Integrator,
        }
    }
}

impl<'a, I: ExpansionIntegrator> LikelihoodEvaluator<'a, I> {
    pub fn with_integrator<J: ExpansionIntegrator>(
        self,
        integrator: J,
    ) -> LikelihoodEvaluator<'a, J> {
        LikelihoodEvaluator {
            dataset: self.dataset,
            settings: self.settings,
            integrator,
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn settings(&self) -> &LikelihoodSettings {
        &self.settings
    }

    pub fn predict(&self, theta: &Theta) -> QuintResult<Vec<f64>> {
        predict_distance_moduli(
            self.dataset.redshifts(),
            theta,
            &self.settings,
            &self.integrator,
        )
    }

    /// Log-likelihood of `theta`; `-inf` outside the prior support or when
    /// the prediction is numerically unusable. Never fails.
    pub fn log_likelihood(&self, theta: &Theta) -> f64 {
        if !self.settings.prior.contains(theta) {
            trace!(?theta, "parameters outside prior support");
            return f64::NEG_INFINITY;
        }

        let predicted = match self.predict(theta) {
            Ok(predicted) => predicted,
            Err(err) => {
                debug!(%err, ?theta, "prediction failed");
                return f64::NEG_INFINITY;
            }
        };

        let chi2 = chi_square(self.dataset, &predicted);
        if chi2.is_nan() {
            debug!(?theta, "chi-square is NaN");
            return f64::NEG_INFINITY;
        }
        -0.5 * chi2
    }

    /// Flat-vector entry point; fails only on a wrong-length vector.
    pub fn log_likelihood_slice(&self, theta: &[f64]) -> QuintResult<f64> {
        let theta = Theta::try_from(theta)?;
        Ok(self.log_likelihood(&theta))
    }
}

/// Log-likelihood of the 6-vector `theta` under default settings.
pub fn log_likelihood(theta: &[f64], dataset: &Dataset) -> QuintResult<f64> {
    LikelihoodEvaluator::new(dataset).log_likelihood_slice(theta)
}
