//! Board-side vocabulary shared by the agent and the environment: board
//! dimensions and the flat-index/coordinate mapping, observations, actions,
//! and the game-state codes reported by the service.

mod action;
mod board;
mod status;

pub use action::{Action, ActionKind};
pub use board::{BoardDims, Coord, Observation};
pub use status::GameStatus;
