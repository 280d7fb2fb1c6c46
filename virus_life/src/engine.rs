// engine.rs - Generation step for the Virus Life automaton
//
// Every cell is computed from the same snapshot of the current grid. Virus
// victims are collected while scanning and applied once the scan is done, so
// an infection always overrides the victim's own Alive/Dead transition no
// matter where the victim sits in scan order.

use log::debug;
use rand::Rng;

use crate::cell::Cell;
use crate::error::GridError;
use crate::grid::Grid;

/// What the neighbor-count lookup does to an Alive or Dead cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Die,
    Keep,
    Birth,
}

/// Neighbor-count lookup table for Alive and Dead cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    table: [Outcome; 9],
}

impl Rule {
    /// 0-1 die, 2 keep, 3 birth, 4-8 die.
    pub const VIRUS_LIFE: Rule = Rule {
        table: [
            Outcome::Die,   // 0
            Outcome::Die,   // 1
            Outcome::Keep,  // 2
            Outcome::Birth, // 3
            Outcome::Die,   // 4
            Outcome::Die,   // 5
            Outcome::Die,   // 6
            Outcome::Die,   // 7
            Outcome::Die,   // 8
        ],
    };

    pub fn outcome(&self, live_neighbors: usize) -> Outcome {
        debug_assert!(live_neighbors <= 8, "more than 8 Moore neighbors");
        self.table[live_neighbors.min(8)]
    }

    /// Next state of a cell, ignoring infections from neighboring viruses.
    pub fn transition(&self, current: Cell, live_neighbors: usize) -> Cell {
        match current {
            // A virus lives on while it has something to infect
            Cell::Virus if live_neighbors > 0 => Cell::Virus,
            Cell::Virus => Cell::Dead,
            _ => match self.outcome(live_neighbors) {
                Outcome::Die => Cell::Dead,
                Outcome::Keep => current,
                Outcome::Birth => Cell::Alive,
            },
        }
    }
}

/// Result of scanning the Moore neighborhood of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Neighborhood {
    /// Positions of Alive neighbors in visiting order (NW, N, NE, W, E, SW, S, SE).
    pub alive: Vec<(usize, usize)>,
    /// Number of Virus neighbors. Not used by the rule.
    pub viruses: usize,
}

impl Neighborhood {
    pub fn scan(grid: &Grid, row: usize, col: usize) -> Self {
        let mut hood = Neighborhood::default();
        for (r, c) in grid.neighbors(row, col) {
            match grid.get(r, c) {
                Some(Cell::Alive) => hood.alive.push((r, c)),
                Some(Cell::Virus) => hood.viruses += 1,
                _ => {}
            }
        }
        hood
    }

    pub fn live_count(&self) -> usize {
        self.alive.len()
    }

    /// Picks a live neighbor uniformly at random, drawing from `rng` only
    /// when there is at least one.
    pub fn pick_victim<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(usize, usize)> {
        if self.alive.is_empty() {
            return None;
        }
        Some(self.alive[rng.gen_range(0..self.alive.len())])
    }
}

/// Computes the next generation of `grid`.
pub fn step<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> Result<Grid, GridError> {
    grid.validate()?;

    let rule = Rule::VIRUS_LIFE;
    let (rows, cols) = (grid.rows(), grid.cols());
    let mut next = Vec::with_capacity(rows * cols);
    let mut infections = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let current = grid.cells()[row * cols + col];
            let hood = Neighborhood::scan(grid, row, col);
            next.push(rule.transition(current, hood.live_count()));

            if current.is_virus() {
                if let Some(victim) = hood.pick_victim(rng) {
                    infections.push(victim);
                }
            }
        }
    }

    // Infections win over the victim's own transition
    for &(r, c) in &infections {
        next[r * cols + c] = Cell::Virus;
    }

    debug!("step {}x{}: {} infections", rows, cols, infections.len());
    Grid::from_cells(rows, cols, next)
}

/// Applies `step` `generations` times.
pub fn step_n<R: Rng + ?Sized>(grid: &Grid, generations: usize, rng: &mut R) -> Result<Grid, GridError> {
    let mut current = grid.clone();
    for _ in 0..generations {
        current = step(&current, rng)?;
    }
    Ok(current)
}
