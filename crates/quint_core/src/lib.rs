//! The `quint_core` crate is the numerical engine behind the quintessence supernova fit.
//! Every entry point is a pure computation over in-memory arrays, so a sampler may call
//! it from many threads against one shared [`Dataset`].
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (ODE right-hand sides), `Steppable` (Solvers).
//! - **Expansion**: the scalar-field / expansion-rate equations in the scale factor, with a relaxed Friedmann constraint.
//! - **Solvers**: fixed-step RK4 integration producing a `Trajectory`.
//! - **Distance**: comoving and luminosity distances from a trajectory.
//! - **Likelihood / Posterior**: distance-modulus chi-square, prior gate and the sampler-facing `LogDensity`.

pub mod dataset;
pub mod distance;
pub mod error;
pub mod expansion;
pub mod likelihood;
pub mod posterior;
pub mod potential;
pub mod solvers;
pub mod traits;
pub mod trajectory;

pub use dataset::Dataset;
pub use error::{QuintError, QuintResult};
pub use expansion::{CosmologyParams, ExpansionState};
pub use likelihood::{log_likelihood, LikelihoodEvaluator, LikelihoodSettings, Theta};
pub use solvers::{integrate, IntegrationSettings};
pub use trajectory::Trajectory;
