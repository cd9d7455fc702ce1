use std::fmt;

use crate::game::board::Coord;

/// What to do with the selected cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Reveal,
    Flag,
}

impl ActionKind {
    pub const COUNT: usize = 2;

    /// Wire and value-table index of this kind.
    pub fn index(self) -> usize {
        match self {
            ActionKind::Reveal => 0,
            ActionKind::Flag => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ActionKind::Reveal),
            1 => Some(ActionKind::Flag),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Reveal => write!(f, "reveal"),
            ActionKind::Flag => write!(f, "flag"),
        }
    }
}

/// A move: a cell plus what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    pub coord: Coord,
    pub kind: ActionKind,
}

impl Action {
    pub fn new(coord: Coord, kind: ActionKind) -> Self {
        Action { coord, kind }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.kind, self.coord.x, self.coord.y)
    }
}
