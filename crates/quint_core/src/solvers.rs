use crate::error::{QuintError, QuintResult};
use crate::expansion::{CosmologyParams, ExpansionState, ExpansionSystem};
use crate::traits::{DynamicalSystem, Scalar, Steppable};
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};

/// Classic fourth-order Runge-Kutta stepper over the scale factor.
///
/// Each call advances `a` by exactly `da`; the stage buffers are reused
/// across steps so a full integration allocates once.
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    trial: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            trial: vec![z; dim],
        }
    }
}

/// Writes `base + weight * slope` into `out`.
fn offset_state<T: Scalar>(base: &[T], slope: &[T], weight: T, out: &mut [T]) {
    for ((o, &b), &k) in out.iter_mut().zip(base).zip(slope) {
        *o = b + weight * k;
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, a: &mut T, state: &mut [T], da: T) {
        let half_da = da * T::constant(0.5);
        let two = T::constant(2.0);
        let a0 = *a;

        system.apply(a0, state, &mut self.k1);

        offset_state(state, &self.k1, half_da, &mut self.trial);
        system.apply(a0 + half_da, &self.trial, &mut self.k2);

        offset_state(state, &self.k2, half_da, &mut self.trial);
        system.apply(a0 + half_da, &self.trial, &mut self.k3);

        offset_state(state, &self.k3, da, &mut self.trial);
        system.apply(a0 + da, &self.trial, &mut self.k4);

        let weight = da * T::constant(1.0 / 6.0);
        for (i, x) in state.iter_mut().enumerate() {
            *x = *x + weight * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *a = a0 + da;
    }
}

/// Scale-factor span and resolution of a fixed-step integration.
///
/// Accuracy is governed entirely by `steps`: both the RK4 relaxation
/// transient and the rectangle-rule distance integral improve roughly
/// linearly with the step size, while cost grows linearly with `steps`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSettings {
    pub a_start: f64,
    pub a_end: f64,
    pub steps: usize,
}

impl IntegrationSettings {
    /// Span used when scoring supernova data: `[1e-4, 1]` with 4000 samples.
    pub fn likelihood() -> Self {
        Self {
            a_start: 1e-4,
            a_end: 1.0,
            steps: 4000,
        }
    }

    /// Coarser span for present-epoch checks: `[1e-3, 1]` with 2000 samples.
    pub fn present_epoch() -> Self {
        Self {
            a_start: 1e-3,
            a_end: 1.0,
            steps: 2000,
        }
    }

    pub fn validate(&self) -> QuintResult<()> {
        if self.steps < 2 {
            return Err(QuintError::TooFewSteps { steps: self.steps });
        }
        let (a0, a1) = (self.a_start, self.a_end);
        if !a0.is_finite() || !a1.is_finite() || a0 <= 0.0 || a0 >= a1 {
            return Err(QuintError::InvalidBounds { a0, a1 });
        }
        Ok(())
    }

    /// Evenly spaced grid from `a_start` to `a_end`, both endpoints exact.
    pub fn grid(&self) -> QuintResult<Vec<f64>> {
        self.validate()?;
        let n = self.steps;
        let spacing = (self.a_end - self.a_start) / (n - 1) as f64;
        let mut grid: Vec<f64> = (0..n)
            .map(|i| self.a_start + i as f64 * spacing)
            .collect();
        grid[n - 1] = self.a_end;
        Ok(grid)
    }
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self::likelihood()
    }
}

/// Integrates the expansion equations from `a0` to `a1` over `n` samples.
pub fn integrate(
    a0: f64,
    a1: f64,
    initial_state: ExpansionState,
    params: &CosmologyParams,
    n: usize,
) -> QuintResult<Trajectory> {
    let settings = IntegrationSettings {
        a_start: a0,
        a_end: a1,
        steps: n,
    };
    integrate_with(&settings, initial_state, params)
}

pub fn integrate_with(
    settings: &IntegrationSettings,
    initial_state: ExpansionState,
    params: &CosmologyParams,
) -> QuintResult<Trajectory> {
    let grid = settings.grid()?;
    let system = ExpansionSystem::new(*params);
    let da = grid[1] - grid[0];

    let mut stepper = RK4::new(ExpansionState::DIMENSION);
    let mut state = initial_state.to_array();
    let mut states = Vec::with_capacity(grid.len());
    states.push(initial_state);

    for &a_i in &grid[..grid.len() - 1] {
        let mut a = a_i;
        stepper.step(&system, &mut a, &mut state, da);
        states.push(ExpansionState::from_array(state));
    }

    Trajectory::new(grid, states)
}

/// Seam through which the likelihood obtains expansion histories.
pub trait ExpansionIntegrator {
    fn integrate(
        &self,
        settings: &IntegrationSettings,
        initial_state: ExpansionState,
        params: &CosmologyParams,
    ) -> QuintResult<Trajectory>;
}

/// Fixed-step RK4 integration of [`ExpansionSystem`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4Integrator;

impl ExpansionIntegrator for Rk4Integrator {
    fn integrate(
        &self,
        settings: &IntegrationSettings,
        initial_state: ExpansionState,
        params: &CosmologyParams,
    ) -> QuintResult<Trajectory> {
        integrate_with(settings, initial_state, params)
    }
}

#[cfg(test)]
mod tests {
    use super::{integrate, IntegrationSettings, Steppable, RK4};
    use crate::error::{QuintError, QuintResult};
    use crate::expansion::{CosmologyParams, ExpansionState, ExpansionSystem};
    use crate::traits::DynamicalSystem;

    struct Decay {
        rate: f64,
    }

    impl DynamicalSystem<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _s: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -self.rate * x[0];
        }
    }

    fn lcdm_like() -> CosmologyParams {
        CosmologyParams::new(0.7, 1.549, 0.3)
    }

    #[test]
    fn rk4_step_matches_exponential_decay() {
        let system = Decay { rate: 2.0 };
        let mut stepper = RK4::new(1);
        let mut s = 0.0;
        let mut x = [1.0];
        for _ in 0..100 {
            stepper.step(&system, &mut s, &mut x, 0.01);
        }
        assert!((s - 1.0).abs() < 1e-12);
        assert!((x[0] - (-2.0_f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn integrate_returns_requested_even_grid() {
        let n = 257;
        let trajectory = integrate(
            1e-3,
            1.0,
            ExpansionState::new(0.0, 0.0, 1.0),
            &lcdm_like(),
            n,
        )
        .expect("integration should succeed");

        let grid = trajectory.scale_factors();
        assert_eq!(trajectory.len(), n);
        assert_eq!(trajectory.states().len(), n);
        assert_eq!(grid[0], 1e-3);
        assert_eq!(grid[n - 1], 1.0);
        let spacing = (1.0 - 1e-3) / (n - 1) as f64;
        for pair in grid.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!((pair[1] - pair[0] - spacing).abs() < 1e-12);
        }
    }

    #[test]
    fn integrate_keeps_initial_state_first() {
        let initial = ExpansionState::new(0.1, -0.2, 1.0);
        let trajectory = integrate(1e-2, 1.0, initial, &lcdm_like(), 50).expect("integrate");
        assert_eq!(trajectory.states()[0], initial);
    }

    #[test]
    fn present_epoch_rate_is_normalised() {
        let settings = IntegrationSettings::present_epoch();
        let trajectory = integrate(
            settings.a_start,
            settings.a_end,
            ExpansionState::new(0.0, 0.0, 1.0),
            &lcdm_like(),
            settings.steps,
        )
        .expect("integrate");
        let final_rate = trajectory.final_state().e;
        // Relaxation lag leaves the model at roughly 1.050 today.
        assert!(
            (final_rate - 1.0).abs() < 0.06,
            "final E = {final_rate}"
        );
    }

    #[test]
    fn residual_shrinks_monotonically_without_field_energy() {
        let params = CosmologyParams::new(1e-9, 1.0, 0.3);
        let system = ExpansionSystem::new(params);
        let a0 = 0.2_f64;
        let start = 2.0 * system.constraint_rate(a0, 0.0, 0.0);
        let trajectory = integrate(a0, 1.0, ExpansionState::new(0.0, 0.0, start), &params, 2000)
            .expect("integrate");

        let residuals: Vec<f64> = trajectory
            .iter()
            .map(|(a, s)| (s.e - system.constraint_rate(a, s.c, s.cp)).abs())
            .collect();
        for (i, pair) in residuals.windows(2).enumerate() {
            assert!(
                pair[1] <= pair[0],
                "residual grew at sample {}: {} -> {}",
                i + 1,
                pair[0],
                pair[1]
            );
        }
        assert!(residuals[residuals.len() - 1] < 0.05 * residuals[0]);
    }

    #[test]
    fn integrate_is_deterministic() {
        let params = lcdm_like().with_field(0.05, -0.1);
        let run = || {
            integrate(1e-4, 1.0, params.initial_state(), &params, 4000).expect("integrate")
        };
        let first = run();
        let second = run();
        assert_eq!(first, second);
    }

    fn assert_err_contains<T: std::fmt::Debug>(result: QuintResult<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn grid_rejects_degenerate_settings() {
        let empty = IntegrationSettings {
            steps: 0,
            ..IntegrationSettings::present_epoch()
        };
        assert_eq!(empty.grid().unwrap_err(), QuintError::TooFewSteps { steps: 0 });
        assert_err_contains(
            IntegrationSettings {
                steps: 1,
                ..IntegrationSettings::likelihood()
            }
            .grid(),
            "at least 2 samples",
        );
        assert_err_contains(
            IntegrationSettings {
                a_start: 0.5,
                a_end: 0.5,
                steps: 10,
            }
            .grid(),
            "0 < a0 < a1",
        );
        assert_eq!(IntegrationSettings::present_epoch().grid().map(|g| g.len()), Ok(2000));
    }

    #[test]
    fn integrate_rejects_malformed_requests() {
        let params = lcdm_like();
        let state = ExpansionState::new(0.0, 0.0, 1.0);
        assert_eq!(
            integrate(1e-3, 1.0, state, &params, 1).unwrap_err(),
            QuintError::TooFewSteps { steps: 1 }
        );
        assert_err_contains(integrate(1e-3, 1.0, state, &params, 0), "got 0");
        assert!(matches!(
            integrate(1.0, 1e-3, state, &params, 10),
            Err(QuintError::InvalidBounds { .. })
        ));
        assert!(matches!(
            integrate(0.0, 1.0, state, &params, 10),
            Err(QuintError::InvalidBounds { .. })
        ));
        assert!(matches!(
            integrate(1e-3, f64::NAN, state, &params, 10),
            Err(QuintError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn divergent_parameters_are_not_rejected() {
        let params = CosmologyParams::new(4.9, 4.9, 0.01).with_field(5.0, 50.0);
        let trajectory = integrate(1e-4, 1.0, params.initial_state(), &params, 400);
        assert!(trajectory.is_ok());
    }
}
