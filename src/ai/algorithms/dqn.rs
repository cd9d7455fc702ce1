use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ai::agent::{Transition, UpdateMetrics};
use crate::ai::burn_estimator::EstimatorConfig;
use crate::ai::estimator::{PersistentEstimator, ValueEstimator};
use crate::ai::learner::Learner;
use crate::ai::policy::EpsilonGreedy;
use crate::checkpoint::{CheckpointMetadata, CheckpointMetrics, DqnTrainingState};
use crate::error::{CheckpointError, CoordinateError};
use crate::game::{Action, BoardDims, Observation};
use crate::training::replay_buffer::ReplayMemory;

/// When the exploration rate decays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayCadence {
    /// Once after every action selection.
    Step,
    /// Once at the end of every episode.
    Episode,
}

/// DQN hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub learning_rate: f64,
    pub weight_decay: f32,
    pub batch_size: usize,
    pub gamma: f32,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
    pub epsilon_decay_cadence: DecayCadence,
    pub memory_capacity: usize,
    /// Gradient steps between target resyncs. 0 keeps the initial copy forever.
    pub target_sync_interval: usize,
    pub hidden_size: usize,
    pub dropout: f64,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            learning_rate: 1e-3,
            weight_decay: 1e-4,
            batch_size: 32,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            epsilon_decay_cadence: DecayCadence::Episode,
            memory_capacity: 10_000,
            target_sync_interval: 0,
            hidden_size: 512,
            dropout: 0.3,
        }
    }
}

impl DqnConfig {
    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig {
            learning_rate: self.learning_rate,
            weight_decay: self.weight_decay,
            hidden_size: self.hidden_size,
            dropout: self.dropout,
            ..Default::default()
        }
    }
}

/// DQN agent: epsilon-greedy policy, replay memory, and a learner holding
/// the policy and target estimators.
pub struct DqnAgent<E: ValueEstimator> {
    policy: EpsilonGreedy,
    learner: Learner<E>,
    memory: ReplayMemory,
    config: DqnConfig,
    dims: BoardDims,
    episode_count: usize,
    action_count: usize,
}

impl<E: ValueEstimator> DqnAgent<E> {
    /// Build an agent. `policy_estimator` and `target_estimator` must be
    /// shaped alike; the target is overwritten with the policy's parameters.
    /// A `seed` makes exploration and replay sampling reproducible.
    pub fn new(
        config: DqnConfig,
        policy_estimator: E,
        target_estimator: E,
        seed: Option<u64>,
    ) -> Self {
        let dims = policy_estimator.dims();
        let (policy_rng, memory_rng) = match seed {
            Some(s) => (StdRng::seed_from_u64(s), StdRng::seed_from_u64(s.wrapping_add(1))),
            None => (StdRng::from_os_rng(), StdRng::from_os_rng()),
        };
        let policy = EpsilonGreedy::with_rng(
            dims,
            config.epsilon_start,
            config.epsilon_decay,
            config.epsilon_min,
            policy_rng,
        );
        let learner = Learner::new(
            policy_estimator,
            target_estimator,
            config.batch_size,
            config.gamma,
            config.target_sync_interval,
        );
        let memory = ReplayMemory::with_rng(config.memory_capacity, memory_rng);

        DqnAgent {
            policy,
            learner,
            memory,
            config,
            dims,
            episode_count: 0,
            action_count: 0,
        }
    }

    /// Choose the next action for `observation`.
    pub fn select_action(&mut self, observation: &Observation) -> Result<Action, CoordinateError> {
        let action = self
            .policy
            .select_action(observation, self.learner.policy_estimator())?;
        self.action_count += 1;
        if self.config.epsilon_decay_cadence == DecayCadence::Step {
            self.policy.decay();
        }
        Ok(action)
    }

    /// Greedy action with no exploration and no decay.
    pub fn greedy_action(&self, observation: &Observation) -> Result<Action, CoordinateError> {
        self.policy
            .greedy_action(observation, self.learner.policy_estimator())
    }

    /// Store a transition and run one optimization step.
    pub fn observe(&mut self, transition: Transition) -> Result<Option<UpdateMetrics>, CoordinateError> {
        self.memory.push(transition);
        self.learner.optimize(&mut self.memory)
    }

    /// Close out an episode: bump the counter and apply per-episode decay.
    pub fn finish_episode(&mut self) {
        self.episode_count += 1;
        if self.config.epsilon_decay_cadence == DecayCadence::Episode {
            self.policy.decay();
        }
    }

    pub fn dims(&self) -> BoardDims {
        self.dims
    }

    pub fn epsilon(&self) -> f32 {
        self.policy.epsilon()
    }

    pub fn episode_count(&self) -> usize {
        self.episode_count
    }

    pub fn step_count(&self) -> usize {
        self.learner.step_count()
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn learner(&self) -> &Learner<E> {
        &self.learner
    }

    pub fn learner_mut(&mut self) -> &mut Learner<E> {
        &mut self.learner
    }

    /// Export current training state for checkpointing.
    pub fn training_state(&self) -> DqnTrainingState {
        DqnTrainingState {
            epsilon: self.policy.epsilon(),
            step_count: self.learner.step_count(),
            episode_count: self.episode_count,
            action_count: self.action_count,
        }
    }

    /// Restore training state from a checkpoint.
    pub fn restore_training_state(&mut self, state: &DqnTrainingState) {
        self.policy.restore_epsilon(state.epsilon);
        self.learner.set_step_count(state.step_count);
        self.episode_count = state.episode_count;
        self.action_count = state.action_count;
    }

    pub fn training_state_json(&self) -> Result<String, CheckpointError> {
        Ok(serde_json::to_string_pretty(&self.training_state())?)
    }

    pub fn restore_training_state_json(&mut self, json: &str) -> Result<(), CheckpointError> {
        let state: DqnTrainingState = serde_json::from_str(json)?;
        self.restore_training_state(&state);
        Ok(())
    }

    pub fn build_checkpoint_metadata(
        &self,
        metrics: &CheckpointMetrics,
        episode: usize,
        timestamp: u64,
    ) -> CheckpointMetadata {
        CheckpointMetadata {
            episode,
            timestamp,
            algorithm: "DQN".to_string(),
            board: self.dims,
            metrics: metrics.clone(),
            hyperparameters: self.config.clone(),
        }
    }
}

const POLICY_DIR: &str = "policy";
const TARGET_DIR: &str = "target";

impl<E: PersistentEstimator> DqnAgent<E> {
    /// Write both estimators under `dir`.
    pub fn save_weights_to_dir(&self, dir: &Path) -> Result<(), CheckpointError> {
        self.learner
            .policy_estimator()
            .save_to_dir(&dir.join(POLICY_DIR))?;
        self.learner
            .target_estimator()
            .save_to_dir(&dir.join(TARGET_DIR))
    }

    /// Load both estimators from `dir`. The target is loaded as saved, not
    /// resynced from the policy.
    pub fn load_weights_from_dir(&mut self, dir: &Path) -> Result<(), CheckpointError> {
        self.learner
            .policy_estimator_mut()
            .load_from_dir(&dir.join(POLICY_DIR))?;
        self.learner
            .target_estimator_mut()
            .load_from_dir(&dir.join(TARGET_DIR))
    }
}
