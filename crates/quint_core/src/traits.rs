//! Numeric and ODE abstractions shared by the expansion model and its stepper.
//!
//! Systems here evolve in the scale factor `a`, not in time: `s` below is
//! `a`, and a step `ds` is a spacing `da` on the integration grid.

use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Numeric types the expansion equations can be evaluated over.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {
    /// Converts an `f64` constant, falling back to NaN if the type cannot hold it.
    fn constant(value: f64) -> Self {
        Self::from_f64(value).unwrap_or_else(Self::nan)
    }
}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A first-order ODE system in a single independent variable.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the derivative of the state.
    /// s: independent variable (the scale factor for cosmological systems)
    /// x: current state
    /// out: buffer receiving dx/ds
    fn apply(&self, s: T, x: &[T], out: &mut [T]);
}

/// A fixed-step stepper advancing a system by one increment.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size ds.
    /// s: independent variable (updated after step)
    /// state: current state (updated after step)
    fn step(&mut self, system: &impl DynamicalSystem<T>, s: &mut T, state: &mut [T], ds: T);
}

/// Replaces values strictly below `floor` with `floor`.
///
/// Unlike `Float::max`, a NaN input is returned unchanged so that diverged
/// trajectories stay visibly invalid downstream.
pub fn floor_at<T: Scalar>(value: T, floor: T) -> T {
    if value < floor {
        floor
    } else {
        value
    }
}
