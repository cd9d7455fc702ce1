use serde::{Deserialize, Serialize};

use crate::ai::DqnConfig;
use crate::game::BoardDims;

/// Metrics snapshot at checkpoint time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    pub win_rate: f32,
    pub average_reward: f32,
    pub average_episode_length: f32,
    pub current_loss: f32,
    pub training_steps: usize,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub episode: usize,
    pub timestamp: u64,
    pub algorithm: String,
    pub board: BoardDims,
    pub metrics: CheckpointMetrics,
    pub hyperparameters: DqnConfig,
}

/// Counters written to training_state.json so a resumed run picks up where
/// the last one stopped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DqnTrainingState {
    pub epsilon: f32,
    pub step_count: usize,
    pub episode_count: usize,
    #[serde(default)]
    pub action_count: usize,
}
