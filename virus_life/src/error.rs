// error.rs - Error types for grids and the save file format

use thiserror::Error;

/// Errors raised while building, validating or addressing a grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Zero rows/cols, ragged rows, or a buffer that doesn't match its dimensions.
    #[error("invalid grid: {reason}")]
    InvalidGrid { reason: String },

    /// A seeding operation addressed a cell outside the grid.
    #[error("cell ({row}, {col}) is outside a {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

impl GridError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        GridError::InvalidGrid { reason: reason.into() }
    }
}

/// Errors raised while reading or writing the binary save format.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("negative dimension in header: {rows}x{cols}")]
    NegativeDimension { rows: i32, cols: i32 },

    /// `index` is the row-major position of the offending byte.
    #[error("unknown cell state {code} at index {index}")]
    UnknownState { code: u8, index: usize },

    #[error("{0} trailing bytes after cell data")]
    TrailingBytes(usize),

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Errors raised by the scheduling task and its handle.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("driver task has stopped")]
    Closed,

    #[error("driver task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Grid(#[from] GridError),
}
