//! The learning side of the agent: transitions, the value-estimator
//! capability and its burn implementation, epsilon-greedy selection, the
//! temporal-difference learner, and the DQN agent that ties them together.

mod agent;
pub mod algorithms;
mod burn_estimator;
pub(crate) mod estimator;
pub mod learner;
pub mod networks;
mod policy;
pub mod state_encoding;

pub use agent::{Transition, UpdateMetrics};
pub use algorithms::{DecayCadence, DqnAgent, DqnConfig};
pub use burn_estimator::{BurnEstimator, EstimatorConfig};
pub use estimator::{PersistentEstimator, ValueEstimator, ValueTable};
pub use learner::{bootstrapped_targets, Learner};
pub use networks::{QNetwork, QNetworkConfig};
pub use policy::EpsilonGreedy;
