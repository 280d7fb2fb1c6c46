// config.rs - Run settings from a JSON file and command-line flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use virus_life::grid::{DEFAULT_COLS, DEFAULT_ROWS};

pub const USAGE: &str = "\
usage: virus_life_run [options]
  --config FILE       read settings from a JSON file (flags override it)
  --load FILE         start from a saved board
  --save FILE         save the final board
  --pattern NAME      seed a named pattern (Glider, Pulsar, ...)
  --random SEED       seed a random board
  --rows N --cols N   board size for fresh boards
  --generations N     how many generations to run
  --interval MS       delay between generations
  --stop-on-cycle     stop early when the board repeats
  --quiet             only log warnings, don't print boards
  --help              show this message";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub rows: usize,
    pub cols: usize,
    pub interval_ms: u64,
    pub generations: u64,
    /// Seeds both the random fill and virus victim choice; entropy when absent.
    pub seed: Option<u64>,
    pub alive_ratio: f64,
    pub virus_ratio: f64,
    pub pattern: Option<String>,
    pub random_fill: bool,
    pub stop_on_cycle: bool,
    pub log_level: String,
    pub print_boards: bool,
    pub load: Option<PathBuf>,
    pub save: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            interval_ms: 1000,
            generations: 10,
            seed: None,
            alive_ratio: 0.3,
            virus_ratio: 0.02,
            pattern: None,
            random_fill: false,
            stop_on_cycle: false,
            log_level: "info".to_string(),
            print_boards: true,
            load: None,
            save: None,
        }
    }
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Builds the config from command-line arguments (without the program
    /// name). Returns `None` when `--help` was requested.
    pub fn from_args<I>(args: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        if args.iter().any(|a| a == "--help" || a == "-h") {
            return Ok(None);
        }

        // The config file is the base layer, so find it first
        let mut config = match args.iter().position(|a| a == "--config") {
            Some(i) => {
                let path = args.get(i + 1).ok_or_else(|| anyhow!("--config needs a value"))?;
                Self::from_file(Path::new(path))?
            }
            None => Self::default(),
        };

        let mut iter = args.into_iter();
        while let Some(flag) = iter.next() {
            let mut value = || iter.next().ok_or_else(|| anyhow!("{} needs a value", flag));
            match flag.as_str() {
                "--config" => {
                    value()?;
                }
                "--load" => config.load = Some(PathBuf::from(value()?)),
                "--save" => config.save = Some(PathBuf::from(value()?)),
                "--pattern" => config.pattern = Some(value()?),
                "--random" => {
                    config.seed = Some(parse_number(&flag, &value()?)?);
                    config.random_fill = true;
                }
                "--rows" => config.rows = parse_number(&flag, &value()?)?,
                "--cols" => config.cols = parse_number(&flag, &value()?)?,
                "--generations" => config.generations = parse_number(&flag, &value()?)?,
                "--interval" => config.interval_ms = parse_number(&flag, &value()?)?,
                "--stop-on-cycle" => config.stop_on_cycle = true,
                "--quiet" => {
                    config.print_boards = false;
                    config.log_level = "warn".to_string();
                }
                other => bail!("unknown argument {:?}\n{}", other, USAGE),
            }
        }

        config.validate()?;
        Ok(Some(config))
    }

    pub fn validate(&self) -> Result<()> {
        if self.pattern.is_some() && self.random_fill {
            bail!("--pattern and --random are mutually exclusive");
        }
        if !(0.0..=1.0).contains(&self.alive_ratio) || !(0.0..=1.0).contains(&self.virus_ratio) {
            bail!("alive_ratio and virus_ratio must be within 0..=1");
        }
        self.log_level
            .parse::<log::LevelFilter>()
            .map_err(|_| anyhow!("unknown log level {:?}", self.log_level))?;
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| anyhow!("{} expects a number, got {:?}", flag, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_args(args(&[])).unwrap().unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!((config.rows, config.cols), (40, 80));
        assert_eq!(config.interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_flags() {
        let config = RunConfig::from_args(args(&[
            "--random", "42", "--generations", "3", "--interval", "5", "--quiet", "--save", "out.bin",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert!(config.random_fill);
        assert_eq!(config.generations, 3);
        assert_eq!(config.interval_ms, 5);
        assert!(!config.print_boards);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.save, Some(PathBuf::from("out.bin")));
    }

    #[test]
    fn test_bad_flags() {
        assert!(RunConfig::from_args(args(&["--rows"])).is_err());
        assert!(RunConfig::from_args(args(&["--rows", "many"])).is_err());
        assert!(RunConfig::from_args(args(&["--frobnicate"])).is_err());
        assert!(RunConfig::from_args(args(&["--pattern", "glider", "--random", "1"])).is_err());
        assert!(RunConfig::from_args(args(&["--help"])).unwrap().is_none());
    }

    #[test]
    fn test_json_partial() {
        let config: RunConfig =
            serde_json::from_str(r#"{ "rows": 12, "pattern": "Pulsar", "stop_on_cycle": true }"#).unwrap();
        assert_eq!(config.rows, 12);
        assert_eq!(config.cols, DEFAULT_COLS);
        assert_eq!(config.pattern.as_deref(), Some("Pulsar"));
        assert!(config.stop_on_cycle);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_file_then_flags() {
        let path = std::env::temp_dir().join(format!("virus_life_run_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "generations": 50, "interval_ms": 20 }"#).unwrap();
        let config = RunConfig::from_args(args(&[
            "--config",
            path.to_str().unwrap(),
            "--generations",
            "7",
        ]))
        .unwrap()
        .unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.generations, 7);
        assert_eq!(config.interval_ms, 20);
    }
}
