use std::path::PathBuf;

/// A board coordinate or flat cell index outside the board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinateError {
    #[error("flat position {pos} out of range (board has {cells} cells)")]
    FlatOutOfRange { pos: usize, cells: usize },

    #[error("coordinates ({x}, {y}) out of range for a {cols}x{rows} board")]
    CoordOutOfRange {
        x: usize,
        y: usize,
        cols: usize,
        rows: usize,
    },
}

/// Errors raised by the replay memory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("cannot sample {requested} transitions, memory holds {available}")]
    InsufficientData { requested: usize, available: usize },
}

/// Failures talking to the remote game service.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("failed to connect to game service at {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("I/O error talking to game service: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed message from game service: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("game service rejected request: {0}")]
    Service(String),
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no 'latest' symlink found in {0}")]
    NoLatestSymlink(PathBuf),

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to save model: {0}")]
    ModelSave(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("agent produced an invalid action: {0}")]
    Coordinate(#[from] CoordinateError),

    #[error("observation is {actual_rows}x{actual_cols}, agent expects {rows}x{cols}")]
    BoardMismatch {
        rows: usize,
        cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("episode aborted: {0}")]
    Env(#[from] EnvError),

    #[error("giving up after {failures} consecutive failed episodes: {source}")]
    Environment { failures: usize, source: EnvError },

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
