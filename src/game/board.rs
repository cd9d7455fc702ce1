use crate::error::CoordinateError;
use crate::game::action::{Action, ActionKind};

/// A cell position on the board. `x` is the column, `y` is the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub fn new(x: usize, y: usize) -> Self {
        Coord { x, y }
    }
}

/// Board dimensions, and the bijection between flat cell indices and
/// `(x, y)` coordinates. Flat indices are row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoardDims {
    pub rows: usize,
    pub cols: usize,
}

impl BoardDims {
    pub fn new(rows: usize, cols: usize) -> Self {
        BoardDims { rows, cols }
    }

    /// Number of cells on the board.
    pub fn cells(&self) -> usize {
        self.rows * self.cols
    }

    /// Number of (cell, action-kind) pairs, i.e. the estimator's output width.
    pub fn num_actions(&self) -> usize {
        self.cells() * ActionKind::COUNT
    }

    /// Convert a flat cell index into board coordinates.
    pub fn flat_to_coord(&self, pos: usize) -> Result<Coord, CoordinateError> {
        if pos >= self.cells() {
            return Err(CoordinateError::FlatOutOfRange {
                pos,
                cells: self.cells(),
            });
        }
        let row = pos / self.cols;
        let col = pos % self.cols;
        Ok(Coord { x: col, y: row })
    }

    /// Convert board coordinates into a flat cell index.
    pub fn coord_to_flat(&self, x: usize, y: usize) -> Result<usize, CoordinateError> {
        if x >= self.cols || y >= self.rows {
            return Err(CoordinateError::CoordOutOfRange {
                x,
                y,
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok(y * self.cols + x)
    }

    /// Index of `action` in a flattened `[cells, 2]` value layout.
    pub fn action_index(&self, action: &Action) -> Result<usize, CoordinateError> {
        let cell = self.coord_to_flat(action.coord.x, action.coord.y)?;
        Ok(cell * ActionKind::COUNT + action.kind.index())
    }
}

/// Immutable snapshot of the visible board, one scalar per cell, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    dims: BoardDims,
    cells: Vec<f32>,
}

impl Observation {
    /// Build an observation from row-major cell values. Returns `None` when
    /// the value count does not match the dimensions.
    pub fn new(dims: BoardDims, cells: Vec<f32>) -> Option<Self> {
        if cells.len() != dims.cells() {
            return None;
        }
        Some(Observation { dims, cells })
    }

    /// Build an observation from a list of rows. All rows must have the same
    /// non-zero length.
    pub fn from_rows(rows: &[Vec<f32>]) -> Option<Self> {
        let cols = rows.first().map(Vec::len)?;
        if cols == 0 || rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let dims = BoardDims::new(rows.len(), cols);
        let cells = rows.iter().flatten().copied().collect();
        Some(Observation { dims, cells })
    }

    /// An all-zero observation, mostly useful in tests.
    pub fn zeros(dims: BoardDims) -> Self {
        Observation {
            dims,
            cells: vec![0.0; dims.cells()],
        }
    }

    pub fn dims(&self) -> BoardDims {
        self.dims
    }

    pub fn get(&self, x: usize, y: usize) -> Result<f32, CoordinateError> {
        let idx = self.dims.coord_to_flat(x, y)?;
        Ok(self.cells[idx])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.cells
    }
}
