use std::time::Instant;

use tracing::{debug, info, warn};

use crate::ai::{DqnAgent, PersistentEstimator, Transition, ValueEstimator};
use crate::checkpoint::{CheckpointManager, CheckpointMetrics};
use crate::env::{GameService, MinesweeperEnv};
use crate::error::TrainingError;
use crate::game::{GameStatus, Observation};
use crate::training::metrics::{EpisodeResult, Throughput, TrainingMetrics};

/// Trainer configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_episodes: usize,
    pub log_interval: usize,
    /// Episodes between checkpoints. 0 disables checkpointing.
    pub checkpoint_interval: usize,
    /// Steps after which an episode is cut short. 0 means no limit.
    pub max_steps_per_episode: usize,
    pub max_consecutive_failures: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_episodes: 50_000,
            log_interval: 100,
            checkpoint_interval: 1000,
            max_steps_per_episode: 0,
            max_consecutive_failures: 3,
        }
    }
}

/// Totals for one call to [`Trainer::train`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub aborted_episodes: usize,
    pub wins: usize,
    pub final_epsilon: f32,
}

/// Runs episodes against a game service: reset, then select, act, store
/// and learn until the game ends.
pub struct Trainer {
    config: TrainerConfig,
    checkpoint_manager: Option<CheckpointManager>,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Trainer {
            config,
            checkpoint_manager: None,
        }
    }

    pub fn with_checkpoints(config: TrainerConfig, manager: CheckpointManager) -> Self {
        Trainer {
            config,
            checkpoint_manager: Some(manager),
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run `num_episodes` episodes, continuing from the agent's episode count.
    ///
    /// A failed remote call aborts only the current episode. Training stops
    /// with [`TrainingError::Environment`] once `max_consecutive_failures`
    /// episodes in a row have been aborted.
    pub fn train<E, S>(
        &self,
        agent: &mut DqnAgent<E>,
        env: &mut MinesweeperEnv<S>,
    ) -> Result<TrainingSummary, TrainingError>
    where
        E: PersistentEstimator,
        S: GameService,
    {
        let window = self.config.log_interval.max(1);
        let mut metrics = TrainingMetrics::with_capacity(window.max(100));
        let mut throughput = Throughput::new();
        let mut consecutive_failures = 0;
        let mut aborted_episodes = 0;

        let start_episode = agent.episode_count() + 1;
        let end_episode = agent.episode_count() + self.config.num_episodes;
        info!(
            "Starting DQN training on a {}x{} board for {} episodes (episodes {}..{})",
            agent.dims().rows,
            agent.dims().cols,
            self.config.num_episodes,
            start_episode,
            end_episode
        );

        for episode in start_episode..=end_episode {
            match self.run_episode(agent, env) {
                Ok(result) => {
                    consecutive_failures = 0;
                    debug!(
                        episode,
                        reward = result.total_reward,
                        steps = result.steps,
                        status = ?result.status,
                        "episode finished"
                    );
                    if let Some(loss) = result.mean_loss {
                        metrics.record_episode_loss(loss);
                    }
                    metrics.record_episode(result);
                }
                Err(TrainingError::Env(source)) => {
                    consecutive_failures += 1;
                    aborted_episodes += 1;
                    warn!(episode, consecutive_failures, error = %source, "episode aborted");
                    if consecutive_failures >= self.config.max_consecutive_failures {
                        return Err(TrainingError::Environment {
                            failures: consecutive_failures,
                            source,
                        });
                    }
                }
                Err(e) => return Err(e),
            }
            throughput.record_episode();

            if episode % window == 0 {
                info!(
                    "Episode {}/{} | eps: {:.3} | loss: {:.4} | win_rate({}): {:.1}% | avg_reward: {:.2} | avg_len: {:.1} | {:.1} eps/s",
                    episode,
                    end_episode,
                    agent.epsilon(),
                    metrics.average_loss(window),
                    window,
                    metrics.win_rate(window) * 100.0,
                    metrics.average_reward(window),
                    metrics.average_length(window),
                    throughput.episodes_per_sec(),
                );
                throughput.reset_window();
            }

            if self.config.checkpoint_interval > 0 && episode % self.config.checkpoint_interval == 0 {
                if let Some(manager) = &self.checkpoint_manager {
                    let started = Instant::now();
                    let ckpt_metrics = CheckpointMetrics {
                        win_rate: metrics.win_rate(window),
                        average_reward: metrics.average_reward(window),
                        average_episode_length: metrics.average_length(window),
                        current_loss: metrics.average_loss(window),
                        training_steps: agent.step_count(),
                    };
                    if let Err(e) = manager.save(agent, &ckpt_metrics, episode) {
                        warn!(episode, error = %e, "checkpoint failed");
                    }
                    throughput.record_overhead(started.elapsed());
                }
            }
        }

        let summary = TrainingSummary {
            episodes: self.config.num_episodes,
            aborted_episodes,
            wins: metrics.total_wins(),
            final_epsilon: agent.epsilon(),
        };
        info!(
            "Training complete. Episodes: {} | wins: {} | aborted: {} | eps: {:.3}",
            summary.episodes, summary.wins, summary.aborted_episodes, summary.final_epsilon
        );
        Ok(summary)
    }

    /// Play one episode to its end, storing every transition and running
    /// one optimization step after each.
    ///
    /// Returns [`TrainingError::Env`] if a remote call fails; transitions
    /// stored before the failure stay in replay memory. The agent's episode
    /// counter advances either way.
    pub fn run_episode<E, S>(
        &self,
        agent: &mut DqnAgent<E>,
        env: &mut MinesweeperEnv<S>,
    ) -> Result<EpisodeResult, TrainingError>
    where
        E: ValueEstimator,
        S: GameService,
    {
        let mut result = EpisodeResult {
            total_reward: 0.0,
            steps: 0,
            status: GameStatus::Playing,
            mean_loss: None,
        };
        let mut losses = Vec::new();
        let played = self.play_steps(agent, env, &mut result, &mut losses);
        agent.finish_episode();
        played?;

        if !losses.is_empty() {
            result.mean_loss = Some(losses.iter().sum::<f32>() / losses.len() as f32);
        }
        Ok(result)
    }

    fn play_steps<E, S>(
        &self,
        agent: &mut DqnAgent<E>,
        env: &mut MinesweeperEnv<S>,
        result: &mut EpisodeResult,
        losses: &mut Vec<f32>,
    ) -> Result<(), TrainingError>
    where
        E: ValueEstimator,
        S: GameService,
    {
        let mut state = env.reset()?;
        check_dims(agent, &state)?;

        loop {
            let action = agent.select_action(&state)?;
            let outcome = env.step(&action)?;
            if let Some(next) = &outcome.next_observation {
                check_dims(agent, next)?;
            }

            result.steps += 1;
            result.total_reward += outcome.reward;
            result.status = outcome.status;

            let truncated = self.config.max_steps_per_episode > 0
                && result.steps >= self.config.max_steps_per_episode;

            let transition = Transition {
                state,
                action,
                next_state: outcome.next_observation.clone(),
                reward: outcome.reward,
            };
            if let Some(update) = agent.observe(transition)? {
                losses.push(update.loss);
            }

            match outcome.next_observation {
                Some(next) if !truncated => state = next,
                Some(_) => {
                    debug!(steps = result.steps, "episode truncated");
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }
}

fn check_dims<E: ValueEstimator>(
    agent: &DqnAgent<E>,
    observation: &Observation,
) -> Result<(), TrainingError> {
    let expected = agent.dims();
    let actual = observation.dims();
    if expected != actual {
        return Err(TrainingError::BoardMismatch {
            rows: expected.rows,
            cols: expected.cols,
            actual_rows: actual.rows,
            actual_cols: actual.cols,
        });
    }
    Ok(())
}
