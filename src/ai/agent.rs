use crate::game::{Action, Observation};

/// A single step of experience for RL training.
///
/// `next_state` is `None` exactly when the episode ended on this step; such
/// transitions never contribute a bootstrapped value.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Observation,
    pub action: Action,
    pub next_state: Option<Observation>,
    pub reward: f32,
}

impl Transition {
    pub fn is_terminal(&self) -> bool {
        self.next_state.is_none()
    }
}

/// Metrics returned from a training update.
#[derive(Debug, Clone, Default)]
pub struct UpdateMetrics {
    pub loss: f32,
    pub target_synced: bool,
}
