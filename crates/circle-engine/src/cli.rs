//! Command-line interface.
//!
//! Flags override the YAML file and the `CIRCLE_HOST` / `CIRCLE_PORT`
//! environment variables; anything left unset keeps its configured value.

use std::path::{Path, PathBuf};

use circle_core::config::ScenarioConfig;
use clap::Parser;

/// Config file picked up from the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_PATH: &str = "circle-config.yaml";

/// Keep a bounded population of autopilot vehicles around a traffic circle.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "circle-engine", version, about)]
pub struct Cli {
    /// Simulator host.
    #[arg(long)]
    pub host: Option<String>,

    /// Simulator port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Scenario random seed. Numbers are used as-is; any other text is
    /// hashed to a fixed number. A random seed is drawn and logged if
    /// omitted.
    #[arg(short, long, value_parser = parse_seed)]
    pub seed: Option<u64>,

    /// Client timeout in seconds.
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Maximum number of live agents.
    #[arg(short = 'n', long)]
    pub num_agents: Option<usize>,

    /// YAML configuration file.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stop after this many cycles (0 runs until killed).
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Destroy existing agents matching the actor filter before starting.
    #[arg(long)]
    pub clear_existing: bool,

    /// Print the map's spawn points as JSON lines and exit.
    #[arg(long)]
    pub list_spawn_points: bool,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Turn a `--seed` value into a `u64`.
///
/// Decimal numbers map to themselves. Anything else goes through 64-bit
/// FNV-1a, so `--seed event4` names the same run on every build and
/// platform.
///
/// # Errors
///
/// Returns an error for an empty value.
pub fn parse_seed(value: &str) -> Result<u64, String> {
    if value.is_empty() {
        return Err("seed must not be empty".to_owned());
    }
    Ok(value.parse().unwrap_or_else(|_| fnv1a(value.as_bytes())))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

impl Cli {
    /// The config file to load: `--config`, else `circle-config.yaml` if it
    /// exists in the working directory.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            let fallback = Path::new(DEFAULT_CONFIG_PATH);
            fallback.exists().then(|| fallback.to_path_buf())
        })
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub const fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Overwrite `config` with every flag that was given.
    pub fn apply_to(&self, config: &mut ScenarioConfig) {
        if let Some(host) = &self.host {
            config.client.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.client.port = port;
        }
        if let Some(seed) = self.seed {
            config.scenario.seed = Some(seed);
        }
        if let Some(timeout) = self.timeout {
            config.client.timeout_secs = timeout;
        }
        if let Some(num_agents) = self.num_agents {
            config.population.max_agents = num_agents;
        }
        if let Some(max_cycles) = self.max_cycles {
            config.runner.max_cycles = max_cycles;
        }
    }
}
