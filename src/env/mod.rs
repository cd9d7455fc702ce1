//! The agent's view of the remote game: the service contract, a TCP client
//! speaking length-prefixed JSON, and the adapter that turns replies into
//! environment steps.

mod adapter;
mod client;
pub mod protocol;
mod service;

pub use adapter::{MinesweeperEnv, StepOutcome};
pub use client::{ServerConfig, TcpGameClient};
pub use service::{GameService, MoveResponse};
