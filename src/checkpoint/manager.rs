use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::ai::{DqnAgent, PersistentEstimator};
use crate::checkpoint::metadata::{CheckpointMetadata, CheckpointMetrics};
use crate::error::CheckpointError;

const LATEST_LINK: &str = "latest";
const METADATA_FILE: &str = "metadata.json";
const TRAINING_STATE_FILE: &str = "training_state.json";

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    pub checkpoint_dir: PathBuf,
    pub keep_last_n: usize,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            checkpoint_dir: PathBuf::from("checkpoints"),
            keep_last_n: 5,
        }
    }
}

/// A checkpoint read back from disk. Weights stay on disk under `path`
/// until [`CheckpointManager::restore`] loads them into an agent.
#[derive(Debug)]
pub struct CheckpointData {
    pub path: PathBuf,
    pub metadata: CheckpointMetadata,
    pub training_state_json: String,
}

/// Saves, loads, lists and prunes `checkpoint_{episode:07}` directories.
pub struct CheckpointManager {
    config: CheckpointManagerConfig,
}

impl CheckpointManager {
    pub fn new(config: CheckpointManagerConfig) -> Result<Self, CheckpointError> {
        fs::create_dir_all(&config.checkpoint_dir)?;
        Ok(CheckpointManager { config })
    }

    pub fn checkpoint_dir(&self) -> &Path {
        &self.config.checkpoint_dir
    }

    /// Write a checkpoint for `agent` at `episode`. The directory is built
    /// under a `.tmp` name and renamed into place once complete.
    pub fn save<E: PersistentEstimator>(
        &self,
        agent: &DqnAgent<E>,
        metrics: &CheckpointMetrics,
        episode: usize,
    ) -> Result<PathBuf, CheckpointError> {
        let dir_name = format!("checkpoint_{:07}", episode);
        let tmp_dir = self.config.checkpoint_dir.join(format!("{}.tmp", dir_name));
        let final_dir = self.config.checkpoint_dir.join(&dir_name);

        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }
        fs::create_dir_all(&tmp_dir)?;

        agent.save_weights_to_dir(&tmp_dir)?;
        fs::write(tmp_dir.join(TRAINING_STATE_FILE), agent.training_state_json()?)?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let metadata = agent.build_checkpoint_metadata(metrics, episode, timestamp);
        fs::write(
            tmp_dir.join(METADATA_FILE),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&tmp_dir, &final_dir)?;

        self.update_latest_symlink(&dir_name)?;
        self.prune_old_checkpoints()?;

        info!(episode, path = %final_dir.display(), "checkpoint saved");
        Ok(final_dir)
    }

    /// Read metadata and training state from a checkpoint directory.
    pub fn load(&self, dir: &Path) -> Result<CheckpointData, CheckpointError> {
        let metadata = read_metadata(&dir.join(METADATA_FILE))?;
        let ts_path = dir.join(TRAINING_STATE_FILE);
        let training_state_json =
            fs::read_to_string(&ts_path).map_err(|e| CheckpointError::MetadataRead {
                path: ts_path,
                source: e,
            })?;

        Ok(CheckpointData {
            path: dir.to_path_buf(),
            metadata,
            training_state_json,
        })
    }

    /// Follow the `latest` symlink and load what it points at.
    pub fn load_latest(&self) -> Result<CheckpointData, CheckpointError> {
        let latest_link = self.config.checkpoint_dir.join(LATEST_LINK);
        if latest_link.symlink_metadata().is_err() {
            return Err(CheckpointError::NoLatestSymlink(
                self.config.checkpoint_dir.clone(),
            ));
        }
        let resolved = fs::read_link(&latest_link)?;
        let target = if resolved.is_relative() {
            self.config.checkpoint_dir.join(resolved)
        } else {
            resolved
        };
        self.load(&target)
    }

    /// Load weights and training counters from `data` into `agent`.
    pub fn restore<E: PersistentEstimator>(
        &self,
        data: &CheckpointData,
        agent: &mut DqnAgent<E>,
    ) -> Result<(), CheckpointError> {
        agent.load_weights_from_dir(&data.path)?;
        agent.restore_training_state_json(&data.training_state_json)?;
        info!(
            episode = data.metadata.episode,
            epsilon = agent.epsilon(),
            "resumed from checkpoint"
        );
        Ok(())
    }

    /// List all checkpoints sorted by episode (ascending).
    pub fn list_checkpoints(&self) -> Result<Vec<(PathBuf, CheckpointMetadata)>, CheckpointError> {
        let mut results = Vec::new();
        for entry in fs::read_dir(&self.config.checkpoint_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() || entry.file_type()?.is_symlink() {
                continue;
            }
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if !name_str.starts_with("checkpoint_") || name_str.ends_with(".tmp") {
                continue;
            }
            let meta_path = path.join(METADATA_FILE);
            if meta_path.exists() {
                let metadata = read_metadata(&meta_path)?;
                results.push((path, metadata));
            }
        }
        results.sort_by_key(|(_, m)| m.episode);
        Ok(results)
    }

    /// Delete all but the newest `keep_last_n` checkpoints. 0 keeps everything.
    fn prune_old_checkpoints(&self) -> Result<(), CheckpointError> {
        if self.config.keep_last_n == 0 {
            return Ok(());
        }
        let checkpoints = self.list_checkpoints()?;
        let excess = checkpoints.len().saturating_sub(self.config.keep_last_n);
        for (path, meta) in checkpoints.iter().take(excess) {
            debug!(episode = meta.episode, "pruning checkpoint");
            fs::remove_dir_all(path)?;
        }
        Ok(())
    }

    fn update_latest_symlink(&self, dir_name: &str) -> Result<(), CheckpointError> {
        let link_path = self.config.checkpoint_dir.join(LATEST_LINK);
        if link_path.symlink_metadata().is_ok() {
            fs::remove_file(&link_path)?;
        }
        std::os::unix::fs::symlink(dir_name, &link_path)?;
        Ok(())
    }
}

fn read_metadata(path: &Path) -> Result<CheckpointMetadata, CheckpointError> {
    let json = fs::read_to_string(path).map_err(|e| CheckpointError::MetadataRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| CheckpointError::MetadataParse {
        path: path.to_path_buf(),
        source: e,
    })
}
