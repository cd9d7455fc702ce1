mod dqn;

pub use dqn::{DecayCadence, DqnAgent, DqnConfig};
