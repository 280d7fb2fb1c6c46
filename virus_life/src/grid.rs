// grid.rs - Grid type for the Virus Life automaton

use std::fmt;

use crate::cell::Cell;
use crate::error::GridError;

// Default board size
pub const DEFAULT_ROWS: usize = 40;
pub const DEFAULT_COLS: usize = 80;

// Neighbor offsets in visiting order: NW, N, NE, W, E, SW, S, SE
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    ( 0, -1),          ( 0, 1),
    ( 1, -1), ( 1, 0), ( 1, 1),
];

/// Per-state cell counts of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Census {
    pub dead: usize,
    pub alive: usize,
    pub virus: usize,
}

impl Census {
    pub fn total(&self) -> usize {
        self.dead + self.alive + self.virus
    }
}

/// Rectangular board of cells stored row-major.
///
/// Dimensions are at least 1x1 and never change after construction; every
/// constructor validates them, so indexing inside `rows x cols` is always in
/// bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            cells: vec![Cell::Dead; DEFAULT_ROWS * DEFAULT_COLS],
        }
    }
}

impl Grid {
    /// Creates an all-dead grid.
    pub fn new(rows: usize, cols: usize) -> Result<Self, GridError> {
        let len = checked_len(rows, cols)?;
        Ok(Self { rows, cols, cells: vec![Cell::Dead; len] })
    }

    /// Builds a grid from a row-major cell buffer.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<Cell>) -> Result<Self, GridError> {
        let grid = Self { rows, cols, cells };
        grid.validate()?;
        Ok(grid)
    }

    /// Builds a grid from nested rows, rejecting empty or ragged input.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, GridError> {
        let cols = match rows.first() {
            Some(first) => first.len(),
            None => return Err(GridError::invalid("grid has no rows")),
        };
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != cols) {
            return Err(GridError::invalid(format!(
                "row {} has {} cells, expected {}",
                i,
                row.len(),
                cols
            )));
        }
        let height = rows.len();
        Self::from_cells(height, cols, rows.into_iter().flatten().collect())
    }

    /// Parses the text rendering produced by `Display` (`.` dead, `#` alive, `v` virus).
    /// Blank lines and surrounding whitespace are ignored.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let mut rows = Vec::new();
        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let row = line
                .chars()
                .map(|c| {
                    Cell::from_glyph(c)
                        .ok_or_else(|| GridError::invalid(format!("unknown cell glyph {:?}", c)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    /// Checks the dimension invariants.
    pub fn validate(&self) -> Result<(), GridError> {
        let len = checked_len(self.rows, self.cols)?;
        if self.cells.len() != len {
            return Err(GridError::invalid(format!(
                "{} cells for a {}x{} grid",
                self.cells.len(),
                self.rows,
                self.cols
            )));
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major view of every cell.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn row(&self, row: usize) -> Option<&[Cell]> {
        (row < self.rows).then(|| &self.cells[row * self.cols..(row + 1) * self.cols])
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.cols)
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.index_of(row, col).map(|i| self.cells[i])
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) -> Result<(), GridError> {
        let i = self.checked_index(row, col)?;
        self.cells[i] = cell;
        Ok(())
    }

    /// Left-click seeding: alive cells die, anything else comes alive.
    pub fn toggle_alive(&mut self, row: usize, col: usize) -> Result<Cell, GridError> {
        self.toggle(row, col, Cell::Alive)
    }

    /// Right-click seeding: virus cells die, anything else becomes a virus.
    pub fn toggle_virus(&mut self, row: usize, col: usize) -> Result<Cell, GridError> {
        self.toggle(row, col, Cell::Virus)
    }

    fn toggle(&mut self, row: usize, col: usize, target: Cell) -> Result<Cell, GridError> {
        let i = self.checked_index(row, col)?;
        let next = if self.cells[i] == target { Cell::Dead } else { target };
        self.cells[i] = next;
        Ok(next)
    }

    /// Kills every cell.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::Dead);
    }

    /// Overwrites every cell, visiting them in row-major order.
    pub fn fill_with(&mut self, mut f: impl FnMut(usize, usize) -> Cell) {
        let cols = self.cols;
        for (i, cell) in self.cells.iter_mut().enumerate() {
            *cell = f(i / cols, i % cols);
        }
    }

    /// Flat row-major index of a cell, as used by list-style front ends.
    pub fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        self.in_bounds(row, col).then(|| row * self.cols + col)
    }

    /// Inverse of `index_of`.
    pub fn position_of(&self, index: usize) -> Option<(usize, usize)> {
        (index < self.cells.len()).then(|| (index / self.cols, index % self.cols))
    }

    fn checked_index(&self, row: usize, col: usize) -> Result<usize, GridError> {
        self.index_of(row, col).ok_or(GridError::OutOfBounds {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// In-bounds Moore neighbors of a cell, no wraparound.
    pub fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
            let r = row.checked_add_signed(dr)?;
            let c = col.checked_add_signed(dc)?;
            self.in_bounds(r, c).then_some((r, c))
        })
    }

    pub fn census(&self) -> Census {
        self.cells.iter().fold(Census::default(), |mut census, cell| {
            match cell {
                Cell::Dead => census.dead += 1,
                Cell::Alive => census.alive += 1,
                Cell::Virus => census.virus += 1,
            }
            census
        })
    }

    /// Fraction of non-dead cells.
    pub fn population_ratio(&self) -> f64 {
        let census = self.census();
        (census.alive + census.virus) as f64 / self.cells.len() as f64
    }
}

pub(crate) fn checked_len(rows: usize, cols: usize) -> Result<usize, GridError> {
    if rows == 0 || cols == 0 {
        return Err(GridError::invalid(format!("empty bounds {}x{}", rows, cols)));
    }
    rows.checked_mul(cols)
        .ok_or_else(|| GridError::invalid(format!("{}x{} overflows", rows, cols)))
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.iter_rows() {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
