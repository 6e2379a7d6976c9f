use crate::error::{QuintError, QuintResult};
use crate::expansion::ExpansionState;
use serde::{Deserialize, Serialize};

/// Scale-factor samples paired with the integrated state at each sample.
///
/// Deserialization goes through [`Trajectory::new`], so a trajectory handed
/// back across a serialization boundary is held to the same shape rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrajectoryParts")]
pub struct Trajectory {
    scale_factors: Vec<f64>,
    states: Vec<ExpansionState>,
}

#[derive(Deserialize)]
struct TrajectoryParts {
    scale_factors: Vec<f64>,
    states: Vec<ExpansionState>,
}

impl TryFrom<TrajectoryParts> for Trajectory {
    type Error = QuintError;

    fn try_from(parts: TrajectoryParts) -> QuintResult<Self> {
        Self::new(parts.scale_factors, parts.states)
    }
}

impl Trajectory {
    pub fn new(scale_factors: Vec<f64>, states: Vec<ExpansionState>) -> QuintResult<Self> {
        if scale_factors.len() != states.len() || scale_factors.len() < 2 {
            return Err(QuintError::TrajectoryShape {
                scale_factors: scale_factors.len(),
                states: states.len(),
            });
        }
        Ok(Self {
            scale_factors,
            states,
        })
    }

    /// Builds a trajectory carrying only an expansion history; field entries are zero.
    pub fn from_expansion_rates(scale_factors: Vec<f64>, rates: &[f64]) -> QuintResult<Self> {
        let states = rates
            .iter()
            .map(|&e| ExpansionState::new(0.0, 0.0, e))
            .collect();
        Self::new(scale_factors, states)
    }

    pub fn len(&self) -> usize {
        self.scale_factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scale_factors.is_empty()
    }

    pub fn scale_factors(&self) -> &[f64] {
        &self.scale_factors
    }

    pub fn states(&self) -> &[ExpansionState] {
        &self.states
    }

    pub fn expansion_rates(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.e).collect()
    }

    pub fn final_state(&self) -> ExpansionState {
        self.states[self.states.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &ExpansionState)> + '_ {
        self.scale_factors.iter().copied().zip(self.states.iter())
    }
}
