use std::path::Path;

use crate::error::CheckpointError;
use crate::game::{ActionKind, BoardDims, Observation};

/// Per-cell, per-action-kind value estimates for one observation.
///
/// Layout is `[cells, 2]` flattened: the value of `kind` on `cell` lives at
/// `cell * 2 + kind.index()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable {
    dims: BoardDims,
    values: Vec<f32>,
}

impl ValueTable {
    /// Returns `None` when `values` does not hold exactly `cells * 2` entries.
    pub fn new(dims: BoardDims, values: Vec<f32>) -> Option<Self> {
        if values.len() != dims.num_actions() {
            return None;
        }
        Some(ValueTable { dims, values })
    }

    pub fn dims(&self) -> BoardDims {
        self.dims
    }

    pub fn value(&self, cell: usize, kind: ActionKind) -> f32 {
        self.values[cell * ActionKind::COUNT + kind.index()]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Greedy choice: the higher-valued kind per cell, then the cell whose
    /// chosen value is largest. Ties go to the first occurrence (Reveal
    /// before Flag, lower cell index first).
    pub fn best_action(&self) -> (usize, ActionKind, f32) {
        let mut best = (0, ActionKind::Reveal, f32::NEG_INFINITY);
        for (cell, pair) in self.values.chunks_exact(ActionKind::COUNT).enumerate() {
            let (kind, value) = if pair[1] > pair[0] {
                (ActionKind::Flag, pair[1])
            } else {
                (ActionKind::Reveal, pair[0])
            };
            if value > best.2 {
                best = (cell, kind, value);
            }
        }
        best
    }

    /// Largest value over both cells and action kinds.
    pub fn max_value(&self) -> f32 {
        self.values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }
}

/// A trainable function approximator from observations to value tables.
///
/// The learner keeps two instances: a policy estimator that receives
/// gradient steps, and a target estimator that only supplies bootstrapped
/// targets and changes solely through [`snapshot_parameters_from`].
///
/// [`snapshot_parameters_from`]: ValueEstimator::snapshot_parameters_from
pub trait ValueEstimator {
    /// Board shape this estimator was built for.
    fn dims(&self) -> BoardDims;

    /// Evaluate a single observation. Must not change parameters.
    fn evaluate(&self, observation: &Observation) -> ValueTable;

    /// Evaluate several observations at once. Must not change parameters.
    fn evaluate_batch(&self, observations: &[&Observation]) -> Vec<ValueTable>;

    /// One gradient-descent step pulling the value of each taken action
    /// towards its target. `action_indices` use the [`ValueTable`] layout.
    /// Returns the loss before the step.
    fn apply_gradient_step(
        &mut self,
        states: &[&Observation],
        action_indices: &[usize],
        targets: &[f32],
    ) -> f32;

    /// Overwrite this estimator's parameters with a copy of `other`'s.
    fn snapshot_parameters_from(&mut self, other: &Self);
}

/// An estimator whose parameters can be written to and read back from a
/// checkpoint directory.
pub trait PersistentEstimator: ValueEstimator {
    fn save_to_dir(&self, dir: &Path) -> Result<(), CheckpointError>;
    fn load_from_dir(&mut self, dir: &Path) -> Result<(), CheckpointError>;
}
