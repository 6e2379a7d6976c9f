//! Prior-gated posterior and the seam to an external ensemble sampler.
//!
//! The sampler only ever sees a [`LogDensity`]: a pure function from a
//! fixed-length parameter vector to a log-probability. Its proposal
//! mechanics live outside this crate.

use crate::dataset::Dataset;
use crate::error::{QuintError, QuintResult};
use crate::likelihood::{LikelihoodEvaluator, LikelihoodSettings, PriorBounds, Theta};
use crate::solvers::ExpansionIntegrator;
use serde::{Deserialize, Serialize};

/// Scalar objective over a flat parameter vector.
pub trait LogDensity {
    fn dimension(&self) -> usize;

    /// Log-probability of `x`. Errors only when `x` has the wrong length.
    fn log_density(&self, x: &[f64]) -> QuintResult<f64>;
}

impl<'a, I: ExpansionIntegrator> LogDensity for LikelihoodEvaluator<'a, I> {
    fn dimension(&self) -> usize {
        Theta::DIMENSION
    }

    fn log_density(&self, x: &[f64]) -> QuintResult<f64> {
        self.log_likelihood_slice(x)
    }
}

/// Flat prior over [`PriorBounds`] plus the supernova likelihood.
#[derive(Debug, Clone)]
pub struct Posterior<'a, I = crate::solvers::Rk4Integrator> {
    likelihood: LikelihoodEvaluator<'a, I>,
    prior: PriorBounds,
}

impl<'a> Posterior<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self::with_settings(dataset, LikelihoodSettings::default())
    }

    pub fn with_settings(dataset: &'a Dataset, settings: LikelihoodSettings) -> Self {
        Self {
            likelihood: LikelihoodEvaluator::with_settings(dataset, settings),
            prior: settings.prior,
        }
    }
}

impl<'a, I: ExpansionIntegrator> Posterior<'a, I> {
    pub fn from_evaluator(likelihood: LikelihoodEvaluator<'a, I>) -> Self {
        let prior = likelihood.settings().prior;
        Self { likelihood, prior }
    }

    pub fn likelihood(&self) -> &LikelihoodEvaluator<'a, I> {
        &self.likelihood
    }

    pub fn log_prior(&self, theta: &Theta) -> f64 {
        self.prior.log_prior(theta)
    }

    /// `log_prior + log_likelihood`, skipping the likelihood when the prior rejects.
    pub fn log_probability(&self, theta: &Theta) -> f64 {
        let lp = self.log_prior(theta);
        if !lp.is_finite() {
            return f64::NEG_INFINITY;
        }
        lp + self.likelihood.log_likelihood(theta)
    }
}

impl<'a, I: ExpansionIntegrator> LogDensity for Posterior<'a, I> {
    fn dimension(&self) -> usize {
        Theta::DIMENSION
    }

    fn log_density(&self, x: &[f64]) -> QuintResult<f64> {
        let theta = Theta::try_from(x)?;
        Ok(self.log_probability(&theta))
    }
}

/// Raw sampler output, stored row-major as `[step][walker][dim]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleChain {
    walkers: usize,
    dimension: usize,
    values: Vec<f64>,
}

impl SampleChain {
    pub fn new(walkers: usize, dimension: usize) -> Self {
        Self {
            walkers,
            dimension,
            values: Vec::new(),
        }
    }

    /// Appends one ensemble position (all walkers at a single step).
    pub fn push_step(&mut self, positions: &[Vec<f64>]) -> QuintResult<()> {
        if positions.len() != self.walkers {
            return Err(QuintError::DimensionMismatch {
                expected: self.walkers,
                actual: positions.len(),
            });
        }
        for walker in positions {
            if walker.len() != self.dimension {
                return Err(QuintError::DimensionMismatch {
                    expected: self.dimension,
                    actual: walker.len(),
                });
            }
        }
        for walker in positions {
            self.values.extend_from_slice(walker);
        }
        Ok(())
    }

    pub fn steps(&self) -> usize {
        let stride = self.walkers * self.dimension;
        if stride == 0 {
            0
        } else {
            self.values.len() / stride
        }
    }

    pub fn walkers(&self) -> usize {
        self.walkers
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Samples after the first `discard` steps, one row per (step, walker).
    pub fn flat(&self, discard: usize) -> Vec<&[f64]> {
        let start = discard.min(self.steps()) * self.walkers * self.dimension;
        if self.dimension == 0 {
            return Vec::new();
        }
        self.values[start..].chunks(self.dimension).collect()
    }

    pub fn raw(&self) -> &[f64] {
        &self.values
    }
}

/// An ensemble sampler driven by a [`LogDensity`].
pub trait PosteriorSampler {
    fn run(
        &mut self,
        target: &dyn LogDensity,
        initial: &[Vec<f64>],
        steps: usize,
    ) -> QuintResult<SampleChain>;
}

/// Starting positions `center + spread * deviate` for each walker.
///
/// `deviates` holds `walkers * center.len()` unit deviates, walker-major.
pub fn walker_ball(
    center: &[f64],
    spread: f64,
    walkers: usize,
    deviates: &[f64],
) -> QuintResult<Vec<Vec<f64>>> {
    let dim = center.len();
    if deviates.len() != walkers * dim {
        return Err(QuintError::WalkerDeviates {
            expected: walkers * dim,
            actual: deviates.len(),
        });
    }
    Ok((0..walkers)
        .map(|w| {
            let row = &deviates[w * dim..(w + 1) * dim];
            center
                .iter()
                .zip(row)
                .map(|(c, d)| c + spread * d)
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{walker_ball, LogDensity, Posterior, PosteriorSampler, SampleChain};
    use crate::dataset::Dataset;
    use crate::error::{QuintError, QuintResult};
    use crate::likelihood::{LikelihoodEvaluator, Theta};

    /// Greedy coordinate walker; enough to exercise the sampler seam.
    struct CoordinateSearch {
        step: f64,
    }

    impl PosteriorSampler for CoordinateSearch {
        fn run(
            &mut self,
            target: &dyn LogDensity,
            initial: &[Vec<f64>],
            steps: usize,
        ) -> QuintResult<SampleChain> {
            let mut chain = SampleChain::new(initial.len(), target.dimension());
            let mut positions = initial.to_vec();
            let mut scores = positions
                .iter()
                .map(|p| target.log_density(p))
                .collect::<QuintResult<Vec<f64>>>()?;
            for step in 0..steps {
                let axis = step % target.dimension();
                for (pos, score) in positions.iter_mut().zip(scores.iter_mut()) {
                    for sign in [1.0, -1.0] {
                        let mut proposal = pos.clone();
                        proposal[axis] += sign * self.step;
                        let candidate = target.log_density(&proposal)?;
                        if candidate > *score {
                            *pos = proposal;
                            *score = candidate;
                        }
                    }
                }
                chain.push_step(&positions)?;
            }
            Ok(chain)
        }
    }

    fn dataset() -> Dataset {
        let truth = Theta::reference();
        let z = vec![0.02, 0.2, 0.6, 1.1];
        let template = Dataset::new(z.clone(), vec![0.0; 4], vec![0.1; 4]).unwrap();
        let mu = LikelihoodEvaluator::new(&template).predict(&truth).unwrap();
        Dataset::new(z, mu, vec![0.1; 4]).unwrap()
    }

    #[test]
    fn posterior_adds_flat_prior_to_likelihood() {
        let data = dataset();
        let posterior = Posterior::new(&data);
        let theta = Theta {
            m: 0.2,
            ..Theta::reference()
        };
        assert_eq!(posterior.log_prior(&theta), 0.0);
        assert_eq!(
            posterior.log_probability(&theta),
            posterior.likelihood().log_likelihood(&theta)
        );
    }

    #[test]
    fn posterior_short_circuits_outside_prior() {
        let data = dataset();
        let posterior = Posterior::new(&data);
        let theta = Theta {
            om: 1.5,
            ..Theta::reference()
        };
        assert_eq!(posterior.log_prior(&theta), f64::NEG_INFINITY);
        assert_eq!(posterior.log_probability(&theta), f64::NEG_INFINITY);
    }

    #[test]
    fn log_density_rejects_wrong_length() {
        let data = dataset();
        let posterior = Posterior::new(&data);
        assert_eq!(posterior.dimension(), 6);
        assert_eq!(
            posterior.log_density(&[0.1; 7]).unwrap_err(),
            QuintError::DimensionMismatch {
                expected: 6,
                actual: 7
            }
        );
    }

    #[test]
    fn sampler_seam_drives_walkers_uphill() {
        let data = dataset();
        let posterior = Posterior::new(&data);
        let mut start = Theta::reference().to_array().to_vec();
        start[5] = 0.4;
        let deviates = vec![0.0; 2 * 6];
        let initial = walker_ball(&start, 1e-2, 2, &deviates).unwrap();
        let initial_score = posterior.log_density(&initial[0]).unwrap();

        let mut sampler = CoordinateSearch { step: 0.1 };
        let chain = sampler.run(&posterior, &initial, 30).expect("sampler run");

        assert_eq!(chain.steps(), 30);
        assert_eq!(chain.walkers(), 2);
        let last = chain.flat(29);
        assert_eq!(last.len(), 2);
        for row in last {
            let score = posterior.log_density(row).unwrap();
            assert!(
                score > initial_score,
                "walker ended at {score}, started at {initial_score}"
            );
        }
    }

    #[test]
    fn sample_chain_flattens_after_discard() {
        let mut chain = SampleChain::new(2, 2);
        chain.push_step(&[vec![0.0, 1.0], vec![2.0, 3.0]]).unwrap();
        chain.push_step(&[vec![4.0, 5.0], vec![6.0, 7.0]]).unwrap();
        assert_eq!(chain.steps(), 2);
        assert_eq!(chain.flat(0).len(), 4);
        assert_eq!(chain.flat(1), vec![&[4.0, 5.0][..], &[6.0, 7.0][..]]);
        assert!(chain.flat(5).is_empty());
        assert_eq!(chain.raw().len(), 8);
    }

    #[test]
    fn sample_chain_rejects_misshapen_step() {
        let mut chain = SampleChain::new(2, 3);
        assert!(chain.push_step(&[vec![0.0; 3]]).is_err());
        assert!(chain.push_step(&[vec![0.0; 3], vec![0.0; 2]]).is_err());
        assert_eq!(chain.steps(), 0);
    }

    #[test]
    fn walker_ball_offsets_each_walker() {
        let ball = walker_ball(&[1.0, 2.0], 0.5, 2, &[1.0, -1.0, 0.0, 2.0]).unwrap();
        assert_eq!(ball, vec![vec![1.5, 1.5], vec![1.0, 3.0]]);
        assert!(matches!(
            walker_ball(&[1.0, 2.0], 0.5, 2, &[1.0]),
            Err(QuintError::WalkerDeviates {
                expected: 4,
                actual: 1
            })
        ));
    }

    #[test]
    fn walker_ball_keeps_one_row_per_walker_for_empty_center() {
        let ball = walker_ball(&[], 0.5, 3, &[]).unwrap();
        assert_eq!(ball, vec![Vec::<f64>::new(); 3]);
        assert!(walker_ball(&[1.0], 0.5, 0, &[]).unwrap().is_empty());
    }
}
