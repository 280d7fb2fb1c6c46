// driver.rs - Timer-driven and manual stepping of a Simulation
//
// The driver task is the only owner of the simulation. Callers steer it with
// commands over an mpsc channel and watch its output through a watch channel;
// it sleeps in `select!` until either a command or the next tick arrives.

use std::time::Duration;

use log::{debug, info, warn};
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::error::{DriverError, GridError};
use crate::grid::Grid;
use crate::simulation::Simulation;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Advance one generation now, running or not.
    Step,
    Run,
    Pause,
    /// Flip between running and paused.
    Toggle,
    SetInterval(Duration),
    ToggleAlive(usize, usize),
    ToggleVirus(usize, usize),
    Shutdown,
}

/// What subscribers see after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub generation: u64,
    pub grid: Grid,
    pub running: bool,
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Delay between generations while running.
    pub interval: Duration,
    /// Start ticking right away instead of waiting for `Run`.
    pub running: bool,
    /// Pause when a generation repeats a recent one.
    pub stop_on_cycle: bool,
    /// Never advance past this generation.
    pub max_generations: Option<u64>,
    /// Queue a snapshot for every generation, see `DriverHandle::take_generations`.
    pub report_generations: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            running: false,
            stop_on_cycle: false,
            max_generations: None,
            report_generations: false,
        }
    }
}

pub struct Driver;

impl Driver {
    /// Moves `sim` into a new tokio task. Must be called from within a runtime.
    pub fn spawn<R>(sim: Simulation<R>, config: DriverConfig) -> DriverHandle
    where
        R: Rng + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let running = config.running && !at_limit(&sim, &config);
        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot(&sim, running));
        let (generation_tx, generation_rx) = if config.report_generations {
            let (tx, rx) = mpsc::unbounded_channel();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };
        let outputs = Outputs { snapshots: snapshot_tx, generations: generation_tx };
        let task = tokio::spawn(drive(sim, config, command_rx, outputs));
        DriverHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            generations: generation_rx,
            task,
        }
    }
}

pub struct DriverHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    generations: Option<mpsc::UnboundedReceiver<Snapshot>>,
    task: JoinHandle<Result<Snapshot, GridError>>,
}

impl DriverHandle {
    pub async fn send(&self, command: Command) -> Result<(), DriverError> {
        self.commands.send(command).await.map_err(|_| DriverError::Closed)
    }

    pub async fn step(&self) -> Result<(), DriverError> {
        self.send(Command::Step).await
    }

    pub async fn run(&self) -> Result<(), DriverError> {
        self.send(Command::Run).await
    }

    pub async fn pause(&self) -> Result<(), DriverError> {
        self.send(Command::Pause).await
    }

    pub async fn set_interval(&self, interval: Duration) -> Result<(), DriverError> {
        self.send(Command::SetInterval(interval)).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Every generation in order, unlike `subscribe` which only keeps the
    /// latest. `None` unless `report_generations` was set, or if already taken.
    pub fn take_generations(&mut self) -> Option<mpsc::UnboundedReceiver<Snapshot>> {
        self.generations.take()
    }

    /// Waits until the published generation reaches `generation`.
    pub async fn wait_for_generation(&self, generation: u64) -> Result<Snapshot, DriverError> {
        let mut rx = self.snapshots.clone();
        let snap = rx
            .wait_for(|s| s.generation >= generation)
            .await
            .map_err(|_| DriverError::Closed)?;
        Ok(snap.clone())
    }

    /// Stops the task and returns the final state.
    pub async fn shutdown(self) -> Result<Snapshot, DriverError> {
        // The task may already be gone; its result still tells us why
        let _ = self.commands.send(Command::Shutdown).await;
        Ok(self.task.await??)
    }
}

fn snapshot<R: Rng>(sim: &Simulation<R>, running: bool) -> Snapshot {
    Snapshot {
        generation: sim.generation(),
        grid: sim.grid().clone(),
        running,
    }
}

fn at_limit<R: Rng>(sim: &Simulation<R>, config: &DriverConfig) -> bool {
    config.max_generations.is_some_and(|max| sim.generation() >= max)
}

struct Outputs {
    snapshots: watch::Sender<Snapshot>,
    generations: Option<mpsc::UnboundedSender<Snapshot>>,
}

impl Outputs {
    fn publish(&self, snap: Snapshot) {
        self.snapshots.send_replace(snap);
    }

    fn publish_generation(&self, snap: Snapshot) {
        if let Some(tx) = &self.generations {
            // A dropped receiver only means nobody is listening
            let _ = tx.send(snap.clone());
        }
        self.publish(snap);
    }
}

// Advances once and returns whether the driver should keep running
fn advance<R: Rng>(sim: &mut Simulation<R>, config: &DriverConfig, running: bool) -> Result<bool, GridError> {
    let outcome = sim.advance()?;
    if outcome.cycle_detected && config.stop_on_cycle {
        info!("pausing on cycle at generation {}", outcome.generation);
        return Ok(false);
    }
    if at_limit(sim, config) {
        info!("reached generation limit {}", outcome.generation);
        return Ok(false);
    }
    Ok(running)
}

fn new_ticker(period: Duration) -> Interval {
    let period = period.max(MIN_INTERVAL);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn drive<R: Rng>(
    mut sim: Simulation<R>,
    config: DriverConfig,
    mut commands: mpsc::Receiver<Command>,
    outputs: Outputs,
) -> Result<Snapshot, GridError> {
    let mut running = config.running && !at_limit(&sim, &config);
    let mut ticker = new_ticker(config.interval);
    info!("driver started (interval {:?}, running {})", config.interval, running);

    loop {
        tokio::select! {
            command = commands.recv() => {
                // Every handle dropped means nobody can steer us any more
                let Some(command) = command else { break };
                debug!("driver command {:?}", command);
                match command {
                    Command::Step if at_limit(&sim, &config) => {
                        debug!("ignoring step at generation limit");
                    }
                    Command::Step => {
                        running = advance(&mut sim, &config, running)?;
                        outputs.publish_generation(snapshot(&sim, running));
                        continue;
                    }
                    Command::Run | Command::Toggle if !running && at_limit(&sim, &config) => {
                        debug!("not starting at generation limit");
                    }
                    Command::Run => {
                        if !running {
                            running = true;
                            ticker.reset();
                        }
                    }
                    Command::Pause => running = false,
                    Command::Toggle => {
                        running = !running;
                        if running {
                            ticker.reset();
                        }
                    }
                    Command::SetInterval(interval) => ticker = new_ticker(interval),
                    Command::ToggleAlive(row, col) => {
                        if let Err(e) = sim.toggle_alive(row, col) {
                            warn!("ignoring toggle: {}", e);
                        }
                    }
                    Command::ToggleVirus(row, col) => {
                        if let Err(e) = sim.toggle_virus(row, col) {
                            warn!("ignoring toggle: {}", e);
                        }
                    }
                    Command::Shutdown => break,
                }
                outputs.publish(snapshot(&sim, running));
            }
            _ = ticker.tick(), if running => {
                running = advance(&mut sim, &config, running)?;
                outputs.publish_generation(snapshot(&sim, running));
            }
        }
    }

    info!("driver stopped at generation {}", sim.generation());
    let last = snapshot(&sim, false);
    outputs.publish(last.clone());
    Ok(last)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::cell::Cell;
    use crate::patterns::find_pattern;

    fn glider_sim() -> Simulation<StdRng> {
        let mut sim = Simulation::new(Grid::new(30, 30).unwrap(), StdRng::seed_from_u64(3));
        sim.apply_pattern(find_pattern("glider").unwrap());
        sim
    }

    fn config(interval_ms: u64, running: bool) -> DriverConfig {
        DriverConfig {
            interval: Duration::from_millis(interval_ms),
            running,
            ..DriverConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_step() {
        let handle = Driver::spawn(glider_sim(), config(100, false));
        assert_eq!(handle.snapshot().generation, 0);

        handle.step().await.unwrap();
        let snap = handle.wait_for_generation(1).await.unwrap();
        assert_eq!(snap.generation, 1);
        assert!(!snap.running);

        // Paused drivers don't tick on their own
        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(handle.snapshot().generation, 1);

        handle.send(Command::Toggle).await.unwrap();
        let snap = handle.wait_for_generation(2).await.unwrap();
        assert!(snap.running);

        let last = handle.shutdown().await.unwrap();
        assert!(last.generation >= 2);
        assert!(!last.running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_on_interval() {
        let start = Instant::now();
        let handle = Driver::spawn(glider_sim(), config(100, true));
        handle.wait_for_generation(3).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(400), "{:?}", elapsed);

        handle.pause().await.unwrap();
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(handle.snapshot().generation, 3);
        assert!(!handle.snapshot().running);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_interval() {
        let handle = Driver::spawn(glider_sim(), config(1000, false));
        handle.set_interval(Duration::from_millis(10)).await.unwrap();
        let start = Instant::now();
        handle.run().await.unwrap();
        handle.wait_for_generation(5).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(100));
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_clamped() {
        let handle = Driver::spawn(glider_sim(), config(1000, false));
        handle.set_interval(Duration::ZERO).await.unwrap();
        let start = Instant::now();
        handle.run().await.unwrap();
        handle.wait_for_generation(5).await.unwrap();
        assert!(start.elapsed() >= 5 * MIN_INTERVAL, "{:?}", start.elapsed());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_with_zero_interval() {
        let handle = Driver::spawn(
            glider_sim(),
            DriverConfig { interval: Duration::ZERO, running: true, ..DriverConfig::default() },
        );
        let snap = handle.wait_for_generation(5).await.unwrap();
        assert!(snap.running);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_generation_limit() {
        let handle = Driver::spawn(
            glider_sim(),
            DriverConfig { max_generations: Some(4), ..config(10, true) },
        );
        let mut rx = handle.subscribe();
        let snap = rx.wait_for(|s| !s.running).await.unwrap().clone();
        assert_eq!(snap.generation, 4);

        // Neither ticking, stepping nor restarting goes past the limit
        handle.step().await.unwrap();
        handle.run().await.unwrap();
        handle.send(Command::Toggle).await.unwrap();
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(handle.snapshot().generation, 4);
        assert!(!handle.snapshot().running);

        let last = handle.shutdown().await.unwrap();
        assert_eq!(last.generation, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_of_zero_never_starts() {
        let handle = Driver::spawn(
            glider_sim(),
            DriverConfig { max_generations: Some(0), ..config(10, true) },
        );
        assert!(!handle.snapshot().running);
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.shutdown().await.unwrap().generation, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_every_generation() {
        let mut expected = glider_sim();
        let mut handle = Driver::spawn(
            glider_sim(),
            DriverConfig {
                interval: MIN_INTERVAL,
                running: true,
                max_generations: Some(20),
                report_generations: true,
                ..DriverConfig::default()
            },
        );
        let mut generations = handle.take_generations().unwrap();
        assert!(handle.take_generations().is_none());

        let mut seen = Vec::new();
        while let Some(snap) = generations.recv().await {
            expected.advance().unwrap();
            assert_eq!(&snap.grid, expected.grid());
            seen.push(snap.generation);
            if !snap.running {
                break;
            }
        }
        assert_eq!(seen, (1..=20).collect::<Vec<_>>());
        assert_eq!(handle.shutdown().await.unwrap().generation, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generations_not_reported_by_default() {
        let mut handle = Driver::spawn(glider_sim(), config(10, false));
        assert!(handle.take_generations().is_none());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_on_cycle() {
        let block = Grid::parse("....\n.##.\n.##.\n....").unwrap();
        let sim = Simulation::new(block, StdRng::seed_from_u64(3));
        let handle = Driver::spawn(
            sim,
            DriverConfig { stop_on_cycle: true, ..config(50, true) },
        );
        let mut rx = handle.subscribe();
        let snap = rx.wait_for(|s| !s.running).await.unwrap().clone();
        assert_eq!(snap.generation, 1);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggles_through_commands() {
        let sim = Simulation::new(Grid::new(3, 3).unwrap(), StdRng::seed_from_u64(3));
        let handle = Driver::spawn(sim, DriverConfig::default());
        handle.send(Command::ToggleAlive(0, 0)).await.unwrap();
        handle.send(Command::ToggleVirus(1, 1)).await.unwrap();
        // Out of bounds is logged and ignored
        handle.send(Command::ToggleVirus(9, 9)).await.unwrap();

        let last = handle.shutdown().await.unwrap();
        assert_eq!(last.grid.get(0, 0), Some(Cell::Alive));
        assert_eq!(last.grid.get(1, 1), Some(Cell::Virus));
        assert_eq!(last.generation, 0);
    }
}
