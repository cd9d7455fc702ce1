#![recursion_limit = "256"]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use burn::backend::Autodiff;
use burn::tensor::backend::Backend;
use clap::Parser;
use tracing::info;
use tracing_subscriber::prelude::*;

use ml_minesweeper::ai::{BurnEstimator, DqnAgent};
use ml_minesweeper::checkpoint::CheckpointManager;
use ml_minesweeper::config::AppConfig;
use ml_minesweeper::env::{MinesweeperEnv, TcpGameClient};
use ml_minesweeper::error::CheckpointError;
use ml_minesweeper::training::Trainer;

#[cfg(feature = "wgpu")]
type InferBackend = burn::backend::Wgpu<f32, i32>;
#[cfg(not(feature = "wgpu"))]
type InferBackend = burn::backend::NdArray<f32>;
type TrainBackend = Autodiff<InferBackend>;

/// Train a Minesweeper agent against a running game service.
#[derive(Parser)]
#[command(name = "train", about = "Train a Minesweeper DQN agent")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Override game service address (host:port)
    #[arg(long)]
    server: Option<String>,

    /// Seed exploration and replay sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Resume training from the latest checkpoint
    #[arg(long)]
    resume: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::filter::LevelFilter::from_level(cli.log_level))
        .init();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // CLI overrides
    if let Some(episodes) = cli.episodes {
        app_config.training.num_episodes = episodes;
    }
    if let Some(lr) = cli.lr {
        app_config.dqn.learning_rate = lr;
    }
    if let Some(server) = cli.server {
        app_config.server.address = server;
    }
    if cli.seed.is_some() {
        app_config.seed = cli.seed;
    }
    app_config
        .validate()
        .context("validating configuration after command-line overrides")?;

    let device = <TrainBackend as Backend>::Device::default();
    let estimator_config = app_config.dqn.estimator_config();
    let policy = BurnEstimator::<TrainBackend>::new(
        app_config.board,
        estimator_config.clone(),
        device.clone(),
    );
    let target = BurnEstimator::<TrainBackend>::new(app_config.board, estimator_config, device);
    let mut agent = DqnAgent::new(app_config.dqn.clone(), policy, target, app_config.seed);

    let manager = CheckpointManager::new(app_config.checkpoint.clone()).with_context(|| {
        format!(
            "creating checkpoint directory {}",
            app_config.checkpoint.checkpoint_dir.display()
        )
    })?;

    if cli.resume {
        match manager.load_latest() {
            Ok(data) => {
                if data.metadata.board != app_config.board {
                    bail!(
                        "checkpoint was trained on a {}x{} board, config asks for {}x{}",
                        data.metadata.board.rows,
                        data.metadata.board.cols,
                        app_config.board.rows,
                        app_config.board.cols
                    );
                }
                manager
                    .restore(&data, &mut agent)
                    .with_context(|| format!("restoring checkpoint {}", data.path.display()))?;
                info!("Resumed from episode {}", data.metadata.episode);
            }
            Err(CheckpointError::NoLatestSymlink(dir)) => {
                info!("No checkpoint found in {}, starting fresh", dir.display());
            }
            Err(e) => return Err(e).context("loading latest checkpoint"),
        }
    }

    let client = TcpGameClient::connect(&app_config.server)
        .with_context(|| format!("connecting to game service at {}", app_config.server.address))?;
    let mut env = MinesweeperEnv::new(client);

    let trainer = Trainer::with_checkpoints(app_config.training.clone(), manager);
    trainer
        .train(&mut agent, &mut env)
        .context("training aborted")?;

    Ok(())
}
