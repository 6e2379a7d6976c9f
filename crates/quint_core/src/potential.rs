use crate::traits::Scalar;
use serde::{Deserialize, Serialize};

/// Exponential scalar-field potential `V(C) = V0 * exp(k * C)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialPotential {
    pub v0: f64,
    pub k: f64,
}

impl ExponentialPotential {
    pub fn new(v0: f64, k: f64) -> Self {
        Self { v0, k }
    }

    pub fn value<T: Scalar>(&self, c: T) -> T {
        T::constant(self.v0) * (T::constant(self.k) * c).exp()
    }

    /// `dV/dC = k * V(C)`.
    pub fn derivative<T: Scalar>(&self, c: T) -> T {
        T::constant(self.k) * self.value(c)
    }
}
