// codec.rs - Binary save format
//
// Layout: rows (i32, little-endian), cols (i32, little-endian), then one
// state byte per cell in row-major order (0 = dead, 1 = alive, 2 = virus).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use log::info;

use crate::cell::Cell;
use crate::error::{CodecError, GridError};
use crate::grid::{self, Grid};

pub const HEADER_LEN: usize = 8;

/// Serializes a grid into a fresh buffer.
pub fn encode(grid: &Grid) -> Result<Vec<u8>, CodecError> {
    let rows = header_dimension(grid.rows())?;
    let cols = header_dimension(grid.cols())?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + grid.cells().len());
    bytes.extend_from_slice(&rows.to_le_bytes());
    bytes.extend_from_slice(&cols.to_le_bytes());
    bytes.extend(grid.cells().iter().map(|cell| cell.code()));
    Ok(bytes)
}

fn header_dimension(len: usize) -> Result<i32, CodecError> {
    i32::try_from(len)
        .map_err(|_| GridError::invalid(format!("dimension {} does not fit the save header", len)).into())
}

pub fn write_grid<W: Write>(grid: &Grid, mut writer: W) -> Result<(), CodecError> {
    writer.write_all(&encode(grid)?)?;
    writer.flush()?;
    Ok(())
}

/// Reads a grid, stopping right after its last cell byte.
pub fn read_grid<R: Read>(mut reader: R) -> Result<Grid, CodecError> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;
    let rows = i32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let cols = i32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if rows < 0 || cols < 0 {
        return Err(CodecError::NegativeDimension { rows, cols });
    }
    let (rows, cols) = (rows as usize, cols as usize);
    let len = grid::checked_len(rows, cols)?;

    // Grow with the data actually present instead of trusting the header
    let mut codes = Vec::new();
    reader.take(len as u64).read_to_end(&mut codes)?;
    if codes.len() < len {
        return Err(io::Error::from(ErrorKind::UnexpectedEof).into());
    }

    let cells = codes
        .into_iter()
        .enumerate()
        .map(|(index, code)| Cell::from_code(code).ok_or(CodecError::UnknownState { code, index }))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Grid::from_cells(rows, cols, cells)?)
}

/// Deserializes a complete buffer, rejecting trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<Grid, CodecError> {
    let mut rest = bytes;
    let grid = read_grid(&mut rest)?;
    if !rest.is_empty() {
        return Err(CodecError::TrailingBytes(rest.len()));
    }
    Ok(grid)
}

pub fn save(grid: &Grid, path: impl AsRef<Path>) -> Result<(), CodecError> {
    let path = path.as_ref();
    write_grid(grid, BufWriter::new(File::create(path)?))?;
    info!("saved {}x{} grid to {}", grid.rows(), grid.cols(), path.display());
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<Grid, CodecError> {
    let path = path.as_ref();
    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;
    let grid = decode(&bytes)?;
    info!("loaded {}x{} grid from {}", grid.rows(), grid.cols(), path.display());
    Ok(grid)
}
