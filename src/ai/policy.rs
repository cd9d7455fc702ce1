use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::ai::estimator::ValueEstimator;
use crate::error::CoordinateError;
use crate::game::{Action, ActionKind, BoardDims, Observation};

/// Epsilon-greedy action selection with multiplicative epsilon decay.
///
/// With probability `epsilon` a uniformly random cell and action kind are
/// chosen without consulting the estimator; otherwise the estimator's
/// greedy action is taken. `decay` moves epsilon to
/// `max(floor, epsilon * decay_factor)` and is never undone.
pub struct EpsilonGreedy {
    dims: BoardDims,
    epsilon: f32,
    decay_factor: f32,
    floor: f32,
    rng: StdRng,
}

impl EpsilonGreedy {
    pub fn new(dims: BoardDims, start: f32, decay_factor: f32, floor: f32) -> Self {
        Self::with_rng(dims, start, decay_factor, floor, StdRng::from_os_rng())
    }

    pub fn with_rng(
        dims: BoardDims,
        start: f32,
        decay_factor: f32,
        floor: f32,
        rng: StdRng,
    ) -> Self {
        EpsilonGreedy {
            dims,
            epsilon: start.max(floor),
            decay_factor,
            floor,
            rng,
        }
    }

    /// Choose an action for `observation`.
    pub fn select_action<E: ValueEstimator>(
        &mut self,
        observation: &Observation,
        estimator: &E,
    ) -> Result<Action, CoordinateError> {
        if self.rng.random_range(0.0..1.0) < self.epsilon {
            return self.random_action();
        }
        self.greedy_action(observation, estimator)
    }

    /// Uniformly random cell and kind.
    pub fn random_action(&mut self) -> Result<Action, CoordinateError> {
        let pos = self.rng.random_range(0..self.dims.cells());
        let kind = if self.rng.random_range(0..ActionKind::COUNT) == 0 {
            ActionKind::Reveal
        } else {
            ActionKind::Flag
        };
        let coord = self.dims.flat_to_coord(pos)?;
        Ok(Action::new(coord, kind))
    }

    /// The estimator's highest-valued (cell, kind) pair.
    pub fn greedy_action<E: ValueEstimator>(
        &self,
        observation: &Observation,
        estimator: &E,
    ) -> Result<Action, CoordinateError> {
        let (cell, kind, _) = estimator.evaluate(observation).best_action();
        let coord = self.dims.flat_to_coord(cell)?;
        Ok(Action::new(coord, kind))
    }

    /// Apply one multiplicative decay step.
    pub fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.decay_factor).max(self.floor);
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Restore a previously reached exploration rate, e.g. when resuming from
    /// a checkpoint. Clamped to `[floor, 1]`.
    pub fn restore_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(self.floor, 1.0);
    }
}
