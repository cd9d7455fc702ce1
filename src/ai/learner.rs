use tracing::debug;

use crate::ai::agent::{Transition, UpdateMetrics};
use crate::ai::estimator::ValueEstimator;
use crate::error::CoordinateError;
use crate::game::Observation;
use crate::training::replay_buffer::ReplayMemory;

/// Temporal-difference learner with a policy and a target estimator.
///
/// The target starts as a parameter copy of the policy. With
/// `target_sync_interval == 0` it is never refreshed afterwards; otherwise
/// it is re-copied after every `target_sync_interval` gradient steps.
pub struct Learner<E: ValueEstimator> {
    policy: E,
    target: E,
    batch_size: usize,
    gamma: f32,
    target_sync_interval: usize,
    step_count: usize,
}

impl<E: ValueEstimator> Learner<E> {
    pub fn new(
        policy: E,
        mut target: E,
        batch_size: usize,
        gamma: f32,
        target_sync_interval: usize,
    ) -> Self {
        target.snapshot_parameters_from(&policy);
        Learner {
            policy,
            target,
            batch_size,
            gamma,
            target_sync_interval,
            step_count: 0,
        }
    }

    /// Sample a batch and take one gradient step on the policy estimator.
    ///
    /// Returns `Ok(None)` without touching any parameters while the memory
    /// holds fewer than `batch_size` transitions.
    pub fn optimize(
        &mut self,
        memory: &mut ReplayMemory,
    ) -> Result<Option<UpdateMetrics>, CoordinateError> {
        if memory.len() < self.batch_size {
            return Ok(None);
        }
        let batch = memory
            .sample(self.batch_size)
            .expect("memory holds at least batch_size transitions");

        let dims = self.policy.dims();
        let action_indices = batch
            .iter()
            .map(|t| dims.action_index(&t.action))
            .collect::<Result<Vec<_>, _>>()?;
        let targets = bootstrapped_targets(&self.target, &batch, self.gamma);
        let states: Vec<&Observation> = batch.iter().map(|t| &t.state).collect();

        let loss = self
            .policy
            .apply_gradient_step(&states, &action_indices, &targets);
        self.step_count += 1;

        let mut target_synced = false;
        if self.target_sync_interval > 0 && self.step_count % self.target_sync_interval == 0 {
            self.target.snapshot_parameters_from(&self.policy);
            target_synced = true;
            debug!(step = self.step_count, "target estimator resynced");
        }

        Ok(Some(UpdateMetrics {
            loss,
            target_synced,
        }))
    }

    pub fn policy_estimator(&self) -> &E {
        &self.policy
    }

    pub fn policy_estimator_mut(&mut self) -> &mut E {
        &mut self.policy
    }

    pub fn target_estimator(&self) -> &E {
        &self.target
    }

    pub fn target_estimator_mut(&mut self) -> &mut E {
        &mut self.target
    }

    /// Re-copy the target from the policy, e.g. after loading weights.
    pub fn sync_target(&mut self) {
        self.target.snapshot_parameters_from(&self.policy);
    }

    /// Number of gradient steps applied so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn set_step_count(&mut self, steps: usize) {
        self.step_count = steps;
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }
}

/// `reward + gamma * max_a Q_target(next_state, a)` per transition, with the
/// continuation value forced to zero for terminal transitions.
pub fn bootstrapped_targets<E: ValueEstimator>(
    target: &E,
    batch: &[&Transition],
    gamma: f32,
) -> Vec<f32> {
    let next_states: Vec<&Observation> = batch
        .iter()
        .filter_map(|t| t.next_state.as_ref())
        .collect();
    let mut continuation = if next_states.is_empty() {
        Vec::new()
    } else {
        target.evaluate_batch(&next_states)
    }
    .into_iter()
    .map(|table| table.max_value());

    batch
        .iter()
        .map(|t| {
            let next_value = if t.is_terminal() {
                0.0
            } else {
                continuation.next().unwrap_or(0.0)
            };
            t.reward + gamma * next_value
        })
        .collect()
}
