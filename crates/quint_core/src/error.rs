use thiserror::Error;

/// Result alias for the fit engine.
pub type QuintResult<T> = Result<T, QuintError>;

/// Malformed-input failures. Physically invalid parameters never produce
/// one of these; they are scored as `-inf` instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuintError {
    #[error("integration requires at least 2 samples, got {steps}")]
    TooFewSteps { steps: usize },
    #[error("integration bounds must be finite with 0 < a0 < a1, got a0 = {a0}, a1 = {a1}")]
    InvalidBounds { a0: f64, a1: f64 },
    #[error("parameter vector must have length {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("dataset columns differ in length: z = {z}, mu = {mu}, sigma_mu = {sigma_mu}")]
    ColumnLengthMismatch { z: usize, mu: usize, sigma_mu: usize },
    #[error("dataset is missing column `{0}`")]
    MissingColumn(String),
    #[error("dataset line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
    #[error(
        "trajectory needs at least 2 samples of matching length, got {scale_factors} scale factors and {states} states"
    )]
    TrajectoryShape { scale_factors: usize, states: usize },
    #[error("interpolation needs at least 2 knots with one value each, got {knots} knots and {values} values")]
    TooFewKnots { knots: usize, values: usize },
    #[error("redshift {z} lies outside the integrated range [{min}, {max}]")]
    RedshiftOutOfRange { z: f64, min: f64, max: f64 },
    #[error("walker spread has {actual} deviates, expected {expected}")]
    WalkerDeviates { expected: usize, actual: usize },
}
