// patterns.rs - Named seed patterns and random fills

use rand::Rng;

use crate::cell::Cell;
use crate::grid::Grid;

/// A named set of live cells, as (row, col) offsets from the pattern's top-left corner.
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

impl Pattern {
    /// Bounding box as (rows, cols).
    pub fn size(&self) -> (usize, usize) {
        let rows = self.cells.iter().map(|&(r, _)| r + 1).max().unwrap_or(0);
        let cols = self.cells.iter().map(|&(_, c)| c + 1).max().unwrap_or(0);
        (rows, cols)
    }
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "Glider",
        cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
    },
    Pattern {
        name: "Blinker",
        cells: &[(0, 0), (0, 1), (0, 2)],
    },
    Pattern {
        name: "Toad",
        cells: &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            // Top half
            (0, 2), (0, 3), (0, 4), (0, 8), (0, 9), (0, 10),
            (2, 0), (2, 5), (2, 7), (2, 12),
            (3, 0), (3, 5), (3, 7), (3, 12),
            (4, 0), (4, 5), (4, 7), (4, 12),
            (5, 2), (5, 3), (5, 4), (5, 8), (5, 9), (5, 10),
            // Bottom half (mirrored)
            (7, 2), (7, 3), (7, 4), (7, 8), (7, 9), (7, 10),
            (8, 0), (8, 5), (8, 7), (8, 12),
            (9, 0), (9, 5), (9, 7), (9, 12),
            (10, 0), (10, 5), (10, 7), (10, 12),
            (12, 2), (12, 3), (12, 4), (12, 8), (12, 9), (12, 10),
        ],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(0, 2), (1, 1), (1, 2), (2, 0), (2, 1)],
    },
    Pattern {
        name: "Gosper Glider Gun",
        cells: &[
            (4, 0), (4, 1), (5, 0), (5, 1),
            (4, 10), (5, 10), (6, 10), (3, 11), (7, 11), (2, 12), (8, 12),
            (2, 13), (8, 13), (5, 14), (3, 15), (7, 15), (4, 16), (5, 16),
            (6, 16), (5, 17), (2, 20), (3, 20), (4, 20), (2, 21), (3, 21),
            (4, 21), (1, 22), (5, 22), (0, 24), (1, 24), (5, 24), (6, 24),
            (2, 34), (3, 34), (2, 35), (3, 35),
        ],
    },
];

/// Case-insensitive lookup by name.
pub fn find_pattern(name: &str) -> Option<&'static Pattern> {
    PATTERNS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Clears the grid and stamps `pattern` with its top-left corner at `origin`.
/// Cells falling outside the grid are skipped; returns how many were placed.
pub fn apply_pattern(grid: &mut Grid, pattern: &Pattern, origin: (usize, usize)) -> usize {
    grid.clear();

    let mut placed = 0;
    for &(row, col) in pattern.cells {
        if grid.set(origin.0 + row, origin.1 + col, Cell::Alive).is_ok() {
            placed += 1;
        }
    }
    placed
}

/// Like `apply_pattern`, centering the pattern's bounding box on the grid.
pub fn apply_pattern_centered(grid: &mut Grid, pattern: &Pattern) -> usize {
    let (rows, cols) = pattern.size();
    let origin = (
        grid.rows().saturating_sub(rows) / 2,
        grid.cols().saturating_sub(cols) / 2,
    );
    apply_pattern(grid, pattern, origin)
}

/// Clears the grid and fills each cell independently: alive with probability
/// `alive_ratio`, virus with probability `virus_ratio`, dead otherwise.
/// Ratios are clamped so that they sum to at most 1.
pub fn random_fill<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R, alive_ratio: f64, virus_ratio: f64) {
    let alive = alive_ratio.clamp(0.0, 1.0);
    let virus = virus_ratio.clamp(0.0, 1.0 - alive);

    grid.fill_with(|_, _| {
        let roll: f64 = rng.gen_range(0.0..1.0);
        if roll < alive {
            Cell::Alive
        } else if roll < alive + virus {
            Cell::Virus
        } else {
            Cell::Dead
        }
    });
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::engine;

    #[test]
    fn test_lookup() {
        assert_eq!(find_pattern("glider").map(|p| p.name), Some("Glider"));
        assert_eq!(find_pattern("GOSPER GLIDER GUN").map(|p| p.size()), Some((9, 36)));
        assert!(find_pattern("spaceship").is_none());
    }

    #[test]
    fn test_patterns_have_unique_cells() {
        for pattern in PATTERNS {
            let mut cells = pattern.cells.to_vec();
            cells.sort();
            cells.dedup();
            assert_eq!(cells.len(), pattern.cells.len(), "{}", pattern.name);
        }
    }

    #[test]
    fn test_apply_clears_and_clips() {
        let mut grid = Grid::new(4, 4).unwrap();
        grid.toggle_virus(0, 0).unwrap();
        let blinker = find_pattern("blinker").unwrap();
        assert_eq!(apply_pattern(&mut grid, blinker, (1, 2)), 2);
        assert_eq!(grid.census().alive, 2);
        assert_eq!(grid.get(0, 0), Some(Cell::Dead));
    }

    #[test]
    fn test_pulsar_has_period_three() {
        let mut grid = Grid::new(17, 17).unwrap();
        let pulsar = find_pattern("pulsar").unwrap();
        assert_eq!(apply_pattern_centered(&mut grid, pulsar), 48);
        let mut rng = StdRng::seed_from_u64(0);
        let later = engine::step_n(&grid, 3, &mut rng).unwrap();
        assert_eq!(later, grid);
        assert_ne!(engine::step(&grid, &mut rng).unwrap(), grid);
    }

    #[test]
    fn test_glider_moves() {
        let mut grid = Grid::new(8, 8).unwrap();
        apply_pattern(&mut grid, find_pattern("glider").unwrap(), (0, 0));
        let mut rng = StdRng::seed_from_u64(0);
        let later = engine::step_n(&grid, 4, &mut rng).unwrap();

        let mut shifted = Grid::new(8, 8).unwrap();
        apply_pattern(&mut shifted, find_pattern("glider").unwrap(), (1, 1));
        assert_eq!(later, shifted);
    }

    #[test]
    fn test_random_fill() {
        let mut a = Grid::new(20, 20).unwrap();
        let mut b = Grid::new(20, 20).unwrap();
        random_fill(&mut a, &mut StdRng::seed_from_u64(9), 0.3, 0.1);
        random_fill(&mut b, &mut StdRng::seed_from_u64(9), 0.3, 0.1);
        assert_eq!(a, b);

        let census = a.census();
        assert!(census.alive > 0 && census.virus > 0 && census.dead > 0);

        random_fill(&mut a, &mut StdRng::seed_from_u64(9), 1.0, 0.5);
        assert_eq!(a.census().alive, 400);
    }
}
