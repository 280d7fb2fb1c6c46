// lib.rs - Virus Life: a Game of Life variant with an infectious third state
//
// `engine::step` is the whole automaton: a pure function from one grid to the
// next. Everything else here feeds it (seeding, save files) or drives it
// (the `Simulation` owner and the tokio `driver`).

pub mod cell;
pub mod codec;
pub mod driver;
pub mod engine;
pub mod error;
pub mod grid;
pub mod patterns;
pub mod simulation;

pub use cell::Cell;
pub use driver::{Command, Driver, DriverConfig, DriverHandle, Snapshot};
pub use engine::{Neighborhood, Rule, step};
pub use error::{CodecError, DriverError, GridError};
pub use grid::{Census, Grid};
pub use patterns::{PATTERNS, Pattern};
pub use simulation::{Simulation, StepOutcome};
