//! Training infrastructure: the episode loop, replay memory, and rolling
//! metrics.

pub mod metrics;
pub mod replay_buffer;
pub mod trainer;

pub use metrics::{EpisodeResult, TrainingMetrics};
pub use replay_buffer::ReplayMemory;
pub use trainer::{Trainer, TrainerConfig, TrainingSummary};
