//! Luminosity distances from an integrated expansion history.
//!
//! The scale-factor grid is mapped to redshift, reversed so redshift
//! ascends, and `1/E` is accumulated with an upper-endpoint rectangle rule.
//! Distances at arbitrary redshifts come from a piecewise-linear
//! interpolant over that table. All distances are in units of `c/H0`.

use crate::error::{QuintError, QuintResult};
use crate::traits::floor_at;
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};

/// Floor applied to `E` before inverting it.
pub const RATE_FLOOR: f64 = 1e-12;

/// What to do with query redshifts outside the integrated range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutOfRangePolicy {
    /// Linear extrapolation from the nearest edge segment.
    Extrapolate,
    /// Fail with [`QuintError::RedshiftOutOfRange`].
    Reject,
}

impl Default for OutOfRangePolicy {
    fn default() -> Self {
        OutOfRangePolicy::Extrapolate
    }
}

/// Piecewise-linear interpolant over strictly ascending knots.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearInterpolant {
    xs: Vec<f64>,
    ys: Vec<f64>,
    policy: OutOfRangePolicy,
}

impl LinearInterpolant {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, policy: OutOfRangePolicy) -> QuintResult<Self> {
        if xs.len() < 2 || xs.len() != ys.len() {
            return Err(QuintError::TooFewKnots {
                knots: xs.len(),
                values: ys.len(),
            });
        }
        Ok(Self { xs, ys, policy })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    pub fn evaluate(&self, x: f64) -> QuintResult<f64> {
        let (min, max) = self.domain();
        if self.policy == OutOfRangePolicy::Reject && !(x >= min && x <= max) {
            return Err(QuintError::RedshiftOutOfRange { z: x, min, max });
        }

        // Segment index as in a left-sided search, clipped to the edge segments.
        let upper = self
            .xs
            .partition_point(|&knot| knot < x)
            .clamp(1, self.xs.len() - 1);
        let lower = upper - 1;

        let (x_lo, x_hi) = (self.xs[lower], self.xs[upper]);
        let (y_lo, y_hi) = (self.ys[lower], self.ys[upper]);
        let slope = (y_hi - y_lo) / (x_hi - x_lo);
        Ok(slope * (x - x_lo) + y_lo)
    }
}

/// Cumulative comoving-distance table over the trajectory's redshift range.
#[derive(Debug, Clone, PartialEq)]
pub struct ComovingDistance {
    interpolant: LinearInterpolant,
}

impl ComovingDistance {
    pub fn from_trajectory(
        trajectory: &Trajectory,
        policy: OutOfRangePolicy,
    ) -> QuintResult<Self> {
        let redshifts: Vec<f64> = trajectory
            .scale_factors()
            .iter()
            .rev()
            .map(|a| 1.0 / a - 1.0)
            .collect();
        let inverse_rates: Vec<f64> = trajectory
            .states()
            .iter()
            .rev()
            .map(|s| 1.0 / floor_at(s.e, RATE_FLOOR))
            .collect();

        let mut distances = Vec::with_capacity(redshifts.len());
        let mut running = 0.0;
        distances.push(running);
        for i in 1..redshifts.len() {
            running += (redshifts[i] - redshifts[i - 1]) * inverse_rates[i];
            distances.push(running);
        }

        Ok(Self {
            interpolant: LinearInterpolant::new(redshifts, distances, policy)?,
        })
    }

    /// Redshift range covered by the integration.
    pub fn redshift_range(&self) -> (f64, f64) {
        self.interpolant.domain()
    }

    pub fn comoving(&self, z: f64) -> QuintResult<f64> {
        self.interpolant.evaluate(z)
    }

    /// Flat-universe luminosity distance `(1 + z) * Dc(z)`.
    pub fn luminosity(&self, z: f64) -> QuintResult<f64> {
        Ok((1.0 + z) * self.comoving(z)?)
    }
}

/// Luminosity distance at each query redshift.
pub fn luminosity_distance(
    redshifts: &[f64],
    trajectory: &Trajectory,
    policy: OutOfRangePolicy,
) -> QuintResult<Vec<f64>> {
    let table = ComovingDistance::from_trajectory(trajectory, policy)?;
    redshifts.iter().map(|&z| table.luminosity(z)).collect()
}
