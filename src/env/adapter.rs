use crate::env::service::GameService;
use crate::error::EnvError;
use crate::game::{Action, GameStatus, Observation};

/// What one environment step produced.
///
/// `next_observation` is `None` on terminal steps even though the service
/// still sends a final board; that board is kept in `final_board` for
/// reporting only.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub next_observation: Option<Observation>,
    pub reward: f32,
    pub terminal: bool,
    pub status: GameStatus,
    pub final_board: Option<Observation>,
}

/// Turns the game service's request/response contract into
/// `(observation, reward, terminal)` steps.
pub struct MinesweeperEnv<S: GameService> {
    service: S,
}

impl<S: GameService> MinesweeperEnv<S> {
    pub fn new(service: S) -> Self {
        MinesweeperEnv { service }
    }

    /// Ask the service for a fresh board.
    pub fn reset(&mut self) -> Result<Observation, EnvError> {
        let rows = self.service.reset()?;
        to_observation(&rows)
    }

    /// Send `action` and translate the reply.
    pub fn step(&mut self, action: &Action) -> Result<StepOutcome, EnvError> {
        let resp = self
            .service
            .make_move(action.coord.x, action.coord.y, action.kind)?;
        let status = GameStatus::from_code(resp.state);
        let terminal = status.is_terminal();

        // A terminal board is informational, so a missing one is tolerated.
        let (next_observation, final_board) = if terminal {
            (None, Observation::from_rows(&resp.board))
        } else {
            (Some(to_observation(&resp.board)?), None)
        };
        Ok(StepOutcome {
            next_observation,
            reward: resp.reward,
            terminal,
            status,
            final_board,
        })
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }
}

fn to_observation(rows: &[Vec<f32>]) -> Result<Observation, EnvError> {
    Observation::from_rows(rows)
        .ok_or_else(|| EnvError::Protocol("board is empty or its rows differ in length".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::service::MoveResponse;
    use crate::game::{ActionKind, BoardDims, Coord};

    #[derive(Default)]
    struct Recorder {
        moves: Vec<(usize, usize, ActionKind)>,
        replies: Vec<MoveResponse>,
    }

    impl GameService for Recorder {
        fn make_move(
            &mut self,
            x: usize,
            y: usize,
            kind: ActionKind,
        ) -> Result<MoveResponse, EnvError> {
            self.moves.push((x, y, kind));
            if self.replies.is_empty() {
                return Err(EnvError::Protocol("no scripted reply".into()));
            }
            Ok(self.replies.remove(0))
        }

        fn reset(&mut self) -> Result<Vec<Vec<f32>>, EnvError> {
            Ok(vec![vec![-1.0; 3]; 2])
        }
    }

    fn reply(state: i32, reward: f32) -> MoveResponse {
        MoveResponse {
            board: vec![vec![0.0, 1.0, -1.0], vec![-1.0, -1.0, -1.0]],
            reward,
            state,
        }
    }

    #[test]
    fn test_reset_returns_board() {
        let mut env = MinesweeperEnv::new(Recorder::default());
        let obs = env.reset().unwrap();
        assert_eq!(obs.dims(), BoardDims::new(2, 3));
    }

    #[test]
    fn test_in_progress_step_keeps_next_observation() {
        let mut env = MinesweeperEnv::new(Recorder {
            replies: vec![reply(0, 0.3)],
            ..Default::default()
        });
        let action = Action::new(Coord::new(2, 1), ActionKind::Flag);
        let out = env.step(&action).unwrap();
        assert!(!out.terminal);
        assert_eq!(out.status, GameStatus::Playing);
        assert_eq!(out.reward, 0.3);
        assert_eq!(out.next_observation.unwrap().get(1, 0).unwrap(), 1.0);
        assert_eq!(env.service().moves, vec![(2, 1, ActionKind::Flag)]);
    }

    #[test]
    fn test_terminal_step_hides_next_observation() {
        let mut env = MinesweeperEnv::new(Recorder {
            replies: vec![reply(2, -1.0), reply(1, 1.0)],
            ..Default::default()
        });
        let action = Action::new(Coord::new(0, 0), ActionKind::Reveal);

        let lost = env.step(&action).unwrap();
        assert!(lost.terminal);
        assert_eq!(lost.status, GameStatus::Lost);
        assert!(lost.next_observation.is_none());
        assert!(lost.final_board.is_some());

        let won = env.step(&action).unwrap();
        assert!(won.terminal);
        assert_eq!(won.status, GameStatus::Won);
    }

    #[test]
    fn test_ragged_board_is_protocol_error() {
        let mut bad = reply(0, 0.0);
        bad.board[1].pop();
        let mut env = MinesweeperEnv::new(Recorder {
            replies: vec![bad],
            ..Default::default()
        });
        let action = Action::new(Coord::new(0, 0), ActionKind::Reveal);
        assert!(matches!(env.step(&action), Err(EnvError::Protocol(_))));
    }

    #[test]
    fn test_terminal_step_without_board_keeps_reward() {
        let mut env = MinesweeperEnv::new(Recorder {
            replies: vec![MoveResponse {
                board: vec![],
                reward: -1.0,
                state: 2,
            }],
            ..Default::default()
        });
        let action = Action::new(Coord::new(0, 0), ActionKind::Reveal);
        let out = env.step(&action).unwrap();
        assert!(out.terminal);
        assert_eq!(out.status, GameStatus::Lost);
        assert_eq!(out.reward, -1.0);
        assert!(out.next_observation.is_none());
        assert!(out.final_board.is_none());
    }

    #[test]
    fn test_service_failure_propagates() {
        let mut env = MinesweeperEnv::new(Recorder::default());
        let action = Action::new(Coord::new(0, 0), ActionKind::Reveal);
        assert!(env.step(&action).is_err());
    }
}
