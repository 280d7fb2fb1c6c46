// cell.rs - Cell states and their on-disk byte codes

use std::fmt;

/// State of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Cell {
    #[default]
    Dead = 0,
    Alive = 1,
    Virus = 2,
}

impl Cell {
    pub const ALL: [Cell; 3] = [Cell::Dead, Cell::Alive, Cell::Virus];

    /// Byte code used by the save format.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Cell> {
        match code {
            0 => Some(Cell::Dead),
            1 => Some(Cell::Alive),
            2 => Some(Cell::Virus),
            _ => None,
        }
    }

    pub fn is_alive(self) -> bool {
        self == Cell::Alive
    }

    pub fn is_virus(self) -> bool {
        self == Cell::Virus
    }

    /// Glyph used by the text rendering of a grid.
    pub fn glyph(self) -> char {
        match self {
            Cell::Dead => '.',
            Cell::Alive => '#',
            Cell::Virus => 'v',
        }
    }

    pub fn from_glyph(glyph: char) -> Option<Cell> {
        Cell::ALL.into_iter().find(|cell| cell.glyph() == glyph)
    }
}

impl TryFrom<u8> for Cell {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Cell::from_code(code).ok_or(code)
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> u8 {
        cell.code()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}
