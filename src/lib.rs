//! # ML Minesweeper
//!
//! A deep Q-learning agent that learns to play Minesweeper against a remote
//! game service, built on the Burn ML framework.
//!
//! ## Modules
//!
//! - [`game`]: Board dimensions, observations, actions, game status codes
//! - [`ai`]: Value estimators, epsilon-greedy policy, TD learner, DQN agent
//! - [`env`]: Game-service contract, TCP client, environment adapter
//! - [`training`]: Episode loop, replay memory, metrics collection
//! - [`checkpoint`]: Model persistence and versioning
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod env;
pub mod error;
pub mod game;
pub mod training;
