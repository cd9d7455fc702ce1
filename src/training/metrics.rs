use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::game::GameStatus;

/// Result of a single episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeResult {
    pub total_reward: f32,
    pub steps: usize,
    /// Last status reported by the service. `Playing` when the episode was
    /// truncated.
    pub status: GameStatus,
    /// Mean loss over the gradient steps taken during the episode.
    pub mean_loss: Option<f32>,
}

impl EpisodeResult {
    pub fn is_win(&self) -> bool {
        self.status == GameStatus::Won
    }
}

/// Rolling-window statistics over recent episodes.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    episode_losses: VecDeque<f32>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
    total_wins: usize,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            episode_losses: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
            total_wins: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        if result.is_win() {
            self.total_wins += 1;
        }
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    /// Record the mean loss of an episode that took at least one gradient step.
    pub fn record_episode_loss(&mut self, loss: f32) {
        self.episode_losses.push_back(loss);
        if self.episode_losses.len() > self.capacity {
            self.episode_losses.pop_front();
        }
    }

    fn recent(&self, last_n: usize) -> impl Iterator<Item = &EpisodeResult> {
        self.episode_results.iter().rev().take(last_n)
    }

    fn window(&self, last_n: usize) -> usize {
        self.episode_results.len().min(last_n)
    }

    /// Fraction of the last N episodes that ended in a win.
    pub fn win_rate(&self, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        let wins = self.recent(n).filter(|r| r.is_win()).count();
        wins as f32 / n as f32
    }

    /// Average total reward over the last N episodes.
    pub fn average_reward(&self, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.recent(n).map(|r| r.total_reward).sum();
        sum / n as f32
    }

    /// Average episode length in steps over the last N episodes.
    pub fn average_length(&self, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self.recent(n).map(|r| r.steps).sum();
        total as f32 / n as f32
    }

    /// Average of the per-episode mean losses over the last N training episodes.
    pub fn average_loss(&self, last_n: usize) -> f32 {
        let n = self.episode_losses.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.episode_losses.iter().rev().take(n).sum();
        sum / n as f32
    }

    pub fn latest_loss(&self) -> Option<f32> {
        self.episode_losses.back().copied()
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_wins(&self) -> usize {
        self.total_wins
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Episode throughput between log lines.
pub struct Throughput {
    window_start: Instant,
    window_count: usize,
    window_overhead: Duration, // checkpoint time excluded from throughput
}

impl Throughput {
    pub fn new() -> Self {
        Throughput {
            window_start: Instant::now(),
            window_count: 0,
            window_overhead: Duration::ZERO,
        }
    }

    pub fn record_episode(&mut self) {
        self.window_count += 1;
    }

    pub fn record_overhead(&mut self, d: Duration) {
        self.window_overhead += d;
    }

    /// Episodes per second since the last `reset_window` call.
    pub fn episodes_per_sec(&self) -> f32 {
        let net = self.window_start.elapsed().saturating_sub(self.window_overhead);
        if net.is_zero() {
            return 0.0;
        }
        self.window_count as f32 / net.as_secs_f32()
    }

    pub fn reset_window(&mut self) {
        self.window_start = Instant::now();
        self.window_count = 0;
        self.window_overhead = Duration::ZERO;
    }
}

impl Default for Throughput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: GameStatus, reward: f32, steps: usize) -> EpisodeResult {
        EpisodeResult {
            total_reward: reward,
            steps,
            status,
            mean_loss: None,
        }
    }

    #[test]
    fn test_win_rate() {
        let mut m = TrainingMetrics::new();
        for _ in 0..3 {
            m.record_episode(result(GameStatus::Won, 1.0, 10));
        }
        for _ in 0..7 {
            m.record_episode(result(GameStatus::Lost, -1.0, 4));
        }
        assert!((m.win_rate(10) - 0.3).abs() < 1e-6);
        assert_eq!(m.win_rate(5), 0.0);
        assert_eq!(m.total_wins(), 3);
    }

    #[test]
    fn test_truncated_episode_is_not_a_win() {
        let mut m = TrainingMetrics::new();
        m.record_episode(result(GameStatus::Playing, 0.5, 100));
        assert_eq!(m.win_rate(10), 0.0);
    }

    #[test]
    fn test_average_reward_and_length() {
        let mut m = TrainingMetrics::new();
        m.record_episode(result(GameStatus::Lost, -1.0, 20));
        m.record_episode(result(GameStatus::Won, 2.0, 30));
        assert!((m.average_reward(10) - 0.5).abs() < 1e-6);
        assert!((m.average_length(10) - 25.0).abs() < 1e-6);
        assert!((m.average_length(1) - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_average_loss() {
        let mut m = TrainingMetrics::new();
        assert_eq!(m.latest_loss(), None);
        m.record_episode_loss(1.0);
        m.record_episode_loss(3.0);
        m.record_episode_loss(8.0);
        assert!((m.average_loss(10) - 4.0).abs() < 1e-6);
        assert!((m.average_loss(2) - 5.5).abs() < 1e-6);
        assert_eq!(m.latest_loss(), Some(8.0));
    }

    #[test]
    fn test_window_caps_but_total_does_not() {
        let mut m = TrainingMetrics::with_capacity(2);
        m.record_episode(result(GameStatus::Won, 1.0, 1));
        m.record_episode(result(GameStatus::Lost, 0.0, 1));
        m.record_episode(result(GameStatus::Lost, 0.0, 1));
        assert_eq!(m.total_episodes(), 3);
        assert_eq!(m.win_rate(100), 0.0);
    }

    #[test]
    fn test_overhead_excluded_from_throughput() {
        let mut t = Throughput::new();
        for _ in 0..10 {
            t.record_episode();
        }
        t.record_overhead(Duration::from_secs(9999));
        assert_eq!(t.episodes_per_sec(), 0.0);

        t.reset_window();
        t.record_episode();
        std::thread::sleep(Duration::from_millis(5));
        assert!(t.episodes_per_sec() > 0.0);
    }
}
