//! End-to-end training against a small Minesweeper game served over TCP.

use std::io::BufReader;
use std::net::TcpListener;
use std::thread;

use burn::backend::{Autodiff, NdArray};

use ml_minesweeper::ai::{BurnEstimator, DqnAgent, DqnConfig, ValueEstimator};
use ml_minesweeper::checkpoint::{CheckpointManager, CheckpointManagerConfig};
use ml_minesweeper::env::protocol::{read_frame, write_frame, Request, Response};
use ml_minesweeper::env::{MinesweeperEnv, MoveResponse, ServerConfig, TcpGameClient};
use ml_minesweeper::game::{BoardDims, Observation};
use ml_minesweeper::training::{Trainer, TrainerConfig};

type TestBackend = Autodiff<NdArray>;

const ROWS: usize = 3;
const COLS: usize = 3;
const MINES: [(usize, usize); 2] = [(0, 0), (2, 1)];
const UNKNOWN: f32 = -1.0;
const FLAGGED: f32 = -2.0;

/// Minimal game: fixed mines, reveal shows the neighbour count.
struct Game {
    cells: Vec<f32>,
}

impl Game {
    fn new() -> Self {
        Game {
            cells: vec![UNKNOWN; ROWS * COLS],
        }
    }

    fn is_mine(x: usize, y: usize) -> bool {
        MINES.contains(&(x, y))
    }

    fn neighbours(x: usize, y: usize) -> f32 {
        MINES
            .iter()
            .filter(|&&(mx, my)| mx.abs_diff(x) <= 1 && my.abs_diff(y) <= 1 && (mx, my) != (x, y))
            .count() as f32
    }

    fn board(&self) -> Vec<Vec<f32>> {
        self.cells.chunks(COLS).map(|r| r.to_vec()).collect()
    }

    fn apply(&mut self, x: usize, y: usize, action: u32) -> Response {
        if x >= COLS || y >= ROWS || action > 1 {
            return Response::Error {
                message: format!("invalid move ({x}, {y}, {action})"),
            };
        }
        let idx = y * COLS + x;
        let (reward, state) = if action == 1 {
            self.cells[idx] = if self.cells[idx] == FLAGGED { UNKNOWN } else { FLAGGED };
            (-0.05, 0)
        } else if Self::is_mine(x, y) {
            (-1.0, 2)
        } else if self.cells[idx] >= 0.0 {
            (-0.1, 0)
        } else {
            self.cells[idx] = Self::neighbours(x, y);
            let safe_left = (0..ROWS * COLS)
                .filter(|&i| !Self::is_mine(i % COLS, i / COLS) && self.cells[i] < 0.0)
                .count();
            if safe_left == 0 {
                (1.0, 1)
            } else {
                (0.1, 0)
            }
        };
        Response::Moved(MoveResponse {
            board: self.board(),
            reward,
            state,
        })
    }
}

/// Serves one client; the handle yields (resets, game-ending replies).
fn spawn_game_server() -> (ServerConfig, thread::JoinHandle<(usize, usize)>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let mut game = Game::new();
        let mut resets = 0;
        let mut games_ended = 0;
        // Serve until the client hangs up.
        while let Ok(request) = read_frame::<_, Request>(&mut reader) {
            let response = match request {
                Request::Reset => {
                    resets += 1;
                    game = Game::new();
                    Response::Board { board: game.board() }
                }
                Request::MakeMove { x, y, action } => game.apply(x as usize, y as usize, action),
            };
            if matches!(&response, Response::Moved(m) if m.state != 0) {
                games_ended += 1;
            }
            if write_frame(&mut writer, &response).is_err() {
                break;
            }
        }
        (resets, games_ended)
    });
    (
        ServerConfig {
            address,
            ..Default::default()
        },
        handle,
    )
}

fn dqn_config() -> DqnConfig {
    DqnConfig {
        batch_size: 4,
        memory_capacity: 200,
        hidden_size: 16,
        ..Default::default()
    }
}

fn new_agent(seed: u64) -> DqnAgent<BurnEstimator<TestBackend>> {
    let dims = BoardDims::new(ROWS, COLS);
    let config = dqn_config();
    let policy = BurnEstimator::new(dims, config.estimator_config(), Default::default());
    let target = BurnEstimator::new(dims, config.estimator_config(), Default::default());
    DqnAgent::new(config, policy, target, Some(seed))
}

fn trainer_config(num_episodes: usize, checkpoint_interval: usize) -> TrainerConfig {
    TrainerConfig {
        num_episodes,
        log_interval: 1,
        checkpoint_interval,
        max_steps_per_episode: 25,
        max_consecutive_failures: 1,
    }
}

#[test]
fn trains_against_tcp_game_service() {
    let (server_config, server) = spawn_game_server();
    let mut env = MinesweeperEnv::new(TcpGameClient::connect(&server_config).unwrap());
    let mut agent = new_agent(42);

    let summary = Trainer::new(trainer_config(6, 0))
        .train(&mut agent, &mut env)
        .unwrap();

    assert_eq!(summary.episodes, 6);
    assert_eq!(summary.aborted_episodes, 0);
    assert_eq!(agent.episode_count(), 6);
    assert!(agent.memory().len() >= 6);
    assert!(agent.step_count() >= 1);
    assert!((agent.epsilon() - 0.995f32.powi(6)).abs() < 1e-5);

    drop(env);
    let (resets, games_ended) = server.join().unwrap();
    assert_eq!(resets, 6);

    // Nothing was evicted, so each finished game left exactly one
    // transition without a next state.
    let terminal = agent.memory().iter().filter(|t| t.is_terminal()).count();
    assert_eq!(terminal, games_ended);
    assert!(agent.memory().len() < dqn_config().memory_capacity);
}

#[test]
fn resumes_from_latest_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint_config = CheckpointManagerConfig {
        checkpoint_dir: dir.path().to_path_buf(),
        keep_last_n: 2,
    };

    let (server_config, server) = spawn_game_server();
    let mut env = MinesweeperEnv::new(TcpGameClient::connect(&server_config).unwrap());
    let mut agent = new_agent(7);
    let manager = CheckpointManager::new(checkpoint_config.clone()).unwrap();
    Trainer::with_checkpoints(trainer_config(4, 2), manager)
        .train(&mut agent, &mut env)
        .unwrap();
    drop(env);
    server.join().unwrap();

    let manager = CheckpointManager::new(checkpoint_config).unwrap();
    let data = manager.load_latest().unwrap();
    assert_eq!(data.metadata.episode, 4);
    assert_eq!(data.metadata.board, BoardDims::new(ROWS, COLS));

    let mut resumed = new_agent(99);
    manager.restore(&data, &mut resumed).unwrap();
    assert_eq!(resumed.episode_count(), 4);
    assert_eq!(resumed.step_count(), agent.step_count());
    assert!((resumed.epsilon() - agent.epsilon()).abs() < 1e-6);

    let obs = Observation::new(BoardDims::new(ROWS, COLS), vec![UNKNOWN; ROWS * COLS]).unwrap();
    let original = agent.learner().policy_estimator().evaluate(&obs);
    let restored = resumed.learner().policy_estimator().evaluate(&obs);
    for (a, b) in original.as_slice().iter().zip(restored.as_slice()) {
        assert!((a - b).abs() < 1e-4, "{a} vs {b}");
    }
}
