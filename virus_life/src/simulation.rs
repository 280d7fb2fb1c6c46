// simulation.rs - Single owner of the running board
//
// The current grid is only replaced by whole generations: `advance` steps a
// snapshot and swaps the result in, so readers never observe a half-updated
// board.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use log::{debug, info};
use rand::Rng;

use crate::engine;
use crate::error::GridError;
use crate::grid::Grid;
use crate::patterns::{self, Pattern};

// Number of recent generations remembered for cycle detection
pub const HISTORY_LEN: usize = 10;

/// Result of one `Simulation::advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub generation: u64,
    /// The new grid matches one of the last `HISTORY_LEN` grids.
    pub cycle_detected: bool,
}

pub struct Simulation<R> {
    grid: Grid,
    rng: R,
    generation: u64,
    grid_history: [u64; HISTORY_LEN],
    history_count: usize,
}

impl<R: Rng> Simulation<R> {
    pub fn new(grid: Grid, rng: R) -> Self {
        let mut sim = Self {
            grid,
            rng,
            generation: 0,
            grid_history: [0; HISTORY_LEN],
            history_count: 0,
        };
        sim.reset_history();
        sim
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Steps the current grid once and swaps in the result.
    pub fn advance(&mut self) -> Result<StepOutcome, GridError> {
        let next = engine::step(&self.grid, &mut self.rng)?;
        self.grid = next;
        self.generation += 1;

        let cycle_detected = self.check_for_cycle();
        if cycle_detected {
            info!("cycle detected at generation {}", self.generation);
        }
        debug!("generation {}: {:?}", self.generation, self.grid.census());
        Ok(StepOutcome { generation: self.generation, cycle_detected })
    }

    pub fn hash_grid(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.grid.hash(&mut hasher);
        hasher.finish()
    }

    fn check_for_cycle(&mut self) -> bool {
        let current_hash = self.hash_grid();
        let known = self.history_count.min(HISTORY_LEN);
        if self.grid_history[..known].contains(&current_hash) {
            return true;
        }
        self.grid_history[self.history_count % HISTORY_LEN] = current_hash;
        self.history_count += 1;
        false
    }

    // Seeding restarts the generation count and forgets old boards
    fn reset_history(&mut self) {
        self.generation = 0;
        self.grid_history = [0; HISTORY_LEN];
        self.grid_history[0] = self.hash_grid();
        self.history_count = 1;
    }

    pub fn toggle_alive(&mut self, row: usize, col: usize) -> Result<(), GridError> {
        self.grid.toggle_alive(row, col)?;
        self.reset_history();
        Ok(())
    }

    pub fn toggle_virus(&mut self, row: usize, col: usize) -> Result<(), GridError> {
        self.grid.toggle_virus(row, col)?;
        self.reset_history();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.grid.clear();
        self.reset_history();
    }

    pub fn apply_pattern(&mut self, pattern: &Pattern) -> usize {
        let placed = patterns::apply_pattern_centered(&mut self.grid, pattern);
        self.reset_history();
        placed
    }

    pub fn randomize(&mut self, alive_ratio: f64, virus_ratio: f64) {
        patterns::random_fill(&mut self.grid, &mut self.rng, alive_ratio, virus_ratio);
        self.reset_history();
    }

    /// Swaps in a whole new board, e.g. one restored from a save file.
    pub fn replace_grid(&mut self, grid: Grid) -> Result<(), GridError> {
        grid.validate()?;
        self.grid = grid;
        self.reset_history();
        Ok(())
    }
}
