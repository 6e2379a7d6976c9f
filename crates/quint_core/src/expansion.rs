//! Coupled scalar-field / expansion-rate equations in the scale factor.
//!
//! The state is `[C, dC/da, E]` with `E(a) = H(a)/H0`. The Friedmann
//! constraint `E^2 = rho_m + rho_r + rho_C` is not solved algebraically:
//! the `E` component relaxes toward it at rate [`RELAXATION_RATE`].

use crate::potential::ExponentialPotential;
use crate::traits::{floor_at, DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};

/// Gain pulling the integrated `E` toward the constraint value.
pub const RELAXATION_RATE: f64 = 10.0;

/// Floor applied to `E^2` before the square root and the field-equation division.
pub const CONSTRAINT_FLOOR: f64 = 1e-12;

/// Cosmological parameters and initial field conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CosmologyParams {
    pub v0: f64,
    pub k: f64,
    pub om: f64,
    #[serde(default)]
    pub or: f64,
    #[serde(default)]
    pub c0: f64,
    #[serde(default)]
    pub dc0: f64,
}

impl CosmologyParams {
    pub fn new(v0: f64, k: f64, om: f64) -> Self {
        Self {
            v0,
            k,
            om,
            or: 0.0,
            c0: 0.0,
            dc0: 0.0,
        }
    }

    pub fn with_radiation(mut self, or: f64) -> Self {
        self.or = or;
        self
    }

    pub fn with_field(mut self, c0: f64, dc0: f64) -> Self {
        self.c0 = c0;
        self.dc0 = dc0;
        self
    }

    pub fn potential(&self) -> ExponentialPotential {
        ExponentialPotential::new(self.v0, self.k)
    }

    /// State at the start of integration: `(C0, dC0, 1.0)`.
    pub fn initial_state(&self) -> ExpansionState {
        ExpansionState::new(self.c0, self.dc0, 1.0)
    }
}

/// State vector `(C, Cp, E)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpansionState {
    pub c: f64,
    pub cp: f64,
    pub e: f64,
}

impl ExpansionState {
    pub const DIMENSION: usize = 3;

    pub fn new(c: f64, cp: f64, e: f64) -> Self {
        Self { c, cp, e }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.c, self.cp, self.e]
    }

    pub fn from_array(values: [f64; 3]) -> Self {
        let [c, cp, e] = values;
        Self::new(c, cp, e)
    }
}

/// Energy budget at a given scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityBudget<T> {
    pub matter: T,
    pub radiation: T,
    pub field: T,
}

impl<T: Scalar> DensityBudget<T> {
    /// Raw constraint value `rho_m + rho_r + rho_C`, before the floor.
    pub fn total(&self) -> T {
        self.matter + self.radiation + self.field
    }

    /// `E^2` clamped to [`CONSTRAINT_FLOOR`].
    pub fn clamped_e2(&self) -> T {
        floor_at(self.total(), T::constant(CONSTRAINT_FLOOR))
    }
}

/// Right-hand side of the expansion equations for a fixed parameter set.
#[derive(Debug, Clone, Copy)]
pub struct ExpansionSystem {
    params: CosmologyParams,
    potential: ExponentialPotential,
}

impl ExpansionSystem {
    pub fn new(params: CosmologyParams) -> Self {
        Self {
            params,
            potential: params.potential(),
        }
    }

    pub fn params(&self) -> &CosmologyParams {
        &self.params
    }

    pub fn densities<T: Scalar>(&self, a: T, c: T, cp: T) -> DensityBudget<T> {
        let half = T::constant(0.5);
        let a2 = a * a;
        DensityBudget {
            matter: T::constant(self.params.om) / (a2 * a),
            radiation: T::constant(self.params.or) / (a2 * a2),
            field: half * a2 * cp * cp + self.potential.value(c),
        }
    }

    /// Expansion rate implied by the Friedmann constraint for `state` at `a`.
    pub fn constraint_rate<T: Scalar>(&self, a: T, c: T, cp: T) -> T {
        self.densities(a, c, cp).clamped_e2().sqrt()
    }
}

impl<T: Scalar> DynamicalSystem<T> for ExpansionSystem {
    fn dimension(&self) -> usize {
        ExpansionState::DIMENSION
    }

    fn apply(&self, a: T, x: &[T], out: &mut [T]) {
        let (c, cp, e) = (x[0], x[1], x[2]);

        let e2 = self.densities(a, c, cp).clamped_e2();
        let e_target = e2.sqrt();

        let cpp = -(T::constant(3.0) / a) * cp
            - (T::one() / (a * a * e2)) * self.potential.derivative(c);

        out[0] = cp;
        out[1] = cpp;
        out[2] = (e_target - e) * T::constant(RELAXATION_RATE);
    }
}
