/// Game-state code reported by the service after each move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
    /// Any other non-zero code. Still terminal.
    Finished(i32),
}

impl GameStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => GameStatus::Playing,
            1 => GameStatus::Won,
            2 => GameStatus::Lost,
            other => GameStatus::Finished(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            GameStatus::Playing => 0,
            GameStatus::Won => 1,
            GameStatus::Lost => 2,
            GameStatus::Finished(code) => code,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != GameStatus::Playing
    }
}
