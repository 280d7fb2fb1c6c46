// main.rs - Headless runner for Virus Life
//
// Seeds a board, lets the driver step it on a timer and prints each
// generation as text.

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use simple_logger::SimpleLogger;
use virus_life::{Driver, DriverConfig, Grid, Simulation, Snapshot, codec, patterns};

mod config;

use config::{RunConfig, USAGE};

fn main() -> Result<()> {
    let config = match RunConfig::from_args(std::env::args().skip(1))? {
        Some(config) => config,
        None => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    let level: log::LevelFilter = config
        .log_level
        .parse()
        .map_err(|_| anyhow!("unknown log level {:?}", config.log_level))?;
    SimpleLogger::new()
        .with_level(level)
        .init()
        .map_err(|e| anyhow!("initializing logger: {}", e))?;

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(run(config))
}

fn initial_simulation(config: &RunConfig) -> Result<Simulation<StdRng>> {
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let grid = match &config.load {
        Some(path) => codec::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Grid::new(config.rows, config.cols)?,
    };
    let mut sim = Simulation::new(grid, rng);

    if let Some(name) = &config.pattern {
        let pattern = patterns::find_pattern(name).ok_or_else(|| {
            let known: Vec<_> = patterns::PATTERNS.iter().map(|p| p.name).collect();
            anyhow!("unknown pattern {:?}, expected one of {}", name, known.join(", "))
        })?;
        let placed = sim.apply_pattern(pattern);
        if placed < pattern.cells.len() {
            warn!("{} only fits {} of {} cells", pattern.name, placed, pattern.cells.len());
        }
    } else if config.random_fill {
        sim.randomize(config.alive_ratio, config.virus_ratio);
    }
    Ok(sim)
}

fn print_snapshot(snap: &Snapshot) {
    let census = snap.grid.census();
    println!(
        "Generation {} | alive {} | virus {} | dead {} | population {:.1}%",
        snap.generation,
        census.alive,
        census.virus,
        census.dead,
        snap.grid.population_ratio() * 100.0,
    );
    print!("{}", snap.grid);
    println!();
}

async fn run(config: RunConfig) -> Result<()> {
    let sim = initial_simulation(&config)?;
    info!(
        "starting {}x{} board, {} generations every {:?}",
        sim.grid().rows(),
        sim.grid().cols(),
        config.generations,
        config.interval()
    );

    let mut handle = Driver::spawn(
        sim,
        DriverConfig {
            interval: config.interval(),
            running: config.generations > 0,
            stop_on_cycle: config.stop_on_cycle,
            max_generations: Some(config.generations),
            report_generations: true,
        },
    );
    let mut generations = handle
        .take_generations()
        .ok_or_else(|| anyhow!("driver is not reporting generations"))?;

    let mut last = handle.snapshot();
    if config.print_boards {
        print_snapshot(&last);
    }

    // The driver pauses itself at the limit or on a cycle
    while last.running {
        let Some(snap) = generations.recv().await else { break };
        if config.print_boards {
            print_snapshot(&snap);
        }
        last = snap;
    }

    if last.generation < config.generations {
        info!("stopped early at generation {}", last.generation);
    }

    let last = handle.shutdown().await?;
    if let Some(path) = &config.save {
        codec::save(&last.grid, path).with_context(|| format!("saving {}", path.display()))?;
    }
    Ok(())
}
