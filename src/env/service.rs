use crate::error::EnvError;
use crate::game::ActionKind;

/// Reply to a move: the visible board as rows, the reward, and the raw
/// game-state code (0 while the game is in progress).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MoveResponse {
    pub board: Vec<Vec<f32>>,
    pub reward: f32,
    pub state: i32,
}

/// Request/response contract of the remote Minesweeper service.
pub trait GameService {
    /// Apply `kind` at column `x`, row `y`.
    fn make_move(&mut self, x: usize, y: usize, kind: ActionKind) -> Result<MoveResponse, EnvError>;

    /// Start a fresh game and return its board as rows.
    fn reset(&mut self) -> Result<Vec<Vec<f32>>, EnvError>;
}

impl<S: GameService + ?Sized> GameService for Box<S> {
    fn make_move(&mut self, x: usize, y: usize, kind: ActionKind) -> Result<MoveResponse, EnvError> {
        (**self).make_move(x, y, kind)
    }

    fn reset(&mut self) -> Result<Vec<Vec<f32>>, EnvError> {
        (**self).reset()
    }
}
