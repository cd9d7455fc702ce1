use std::path::Path;

use tracing::warn;

use crate::ai::DqnConfig;
use crate::checkpoint::CheckpointManagerConfig;
use crate::env::ServerConfig;
use crate::error::ConfigError;
use crate::game::BoardDims;
use crate::training::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seeds exploration and replay sampling. Unset draws from the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub board: BoardDims,
    pub dqn: DqnConfig,
    pub training: TrainerConfig,
    pub server: ServerConfig,
    pub checkpoint: CheckpointManagerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            seed: None,
            board: BoardDims::new(16, 16),
            dqn: DqnConfig::default(),
            training: TrainerConfig::default(),
            server: ServerConfig::default(),
            checkpoint: CheckpointManagerConfig::default(),
        }
    }
}

fn invalid(msg: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Validation(msg.into()))
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board.rows == 0 || self.board.cols == 0 {
            return invalid("board.rows and board.cols must be > 0");
        }

        let dqn = &self.dqn;
        if dqn.learning_rate <= 0.0 {
            return invalid("dqn.learning_rate must be > 0");
        }
        if dqn.weight_decay < 0.0 {
            return invalid("dqn.weight_decay must be >= 0");
        }
        if dqn.batch_size == 0 {
            return invalid("dqn.batch_size must be > 0");
        }
        if !(0.0..1.0).contains(&dqn.gamma) {
            return invalid("dqn.gamma must be in [0, 1)");
        }
        if !(0.0..=1.0).contains(&dqn.epsilon_start) {
            return invalid("dqn.epsilon_start must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&dqn.epsilon_min) {
            return invalid("dqn.epsilon_min must be in [0, 1]");
        }
        if dqn.epsilon_min > dqn.epsilon_start {
            return invalid("dqn.epsilon_min must be <= dqn.epsilon_start");
        }
        if dqn.epsilon_decay <= 0.0 || dqn.epsilon_decay > 1.0 {
            return invalid("dqn.epsilon_decay must be in (0, 1]");
        }
        if dqn.memory_capacity < dqn.batch_size {
            return invalid("dqn.memory_capacity must be >= dqn.batch_size");
        }
        if dqn.hidden_size == 0 {
            return invalid("dqn.hidden_size must be > 0");
        }
        if !(0.0..1.0).contains(&dqn.dropout) {
            return invalid("dqn.dropout must be in [0, 1)");
        }

        if self.training.num_episodes == 0 {
            return invalid("training.num_episodes must be > 0");
        }
        if self.training.log_interval == 0 {
            return invalid("training.log_interval must be > 0");
        }
        if self.training.max_consecutive_failures == 0 {
            return invalid("training.max_consecutive_failures must be >= 1");
        }

        if self.server.address.is_empty() {
            return invalid("server.address must not be empty");
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}
