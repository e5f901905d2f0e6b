//! Configuration loading and typed config structures for the scenario.
//!
//! The configuration lives in `circle-config.yaml` next to the binary's
//! working directory. Every field has a default, so an empty file (or no
//! file at all) yields the stock traffic circle scenario. Command-line
//! flags are layered on top by the engine binary.

use std::path::Path;
use std::time::Duration;

use circle_sim::{LocalWorldConfig, SimError};
use circle_types::Location;
use serde::Deserialize;

/// Environment variable overriding `client.host`.
pub const HOST_ENV: &str = "CIRCLE_HOST";

/// Environment variable overriding `client.port`.
pub const PORT_ENV: &str = "CIRCLE_PORT";

/// Spawn points around the traffic circle used when none are configured.
pub const TRAFFIC_CIRCLE_SPAWN_POINTS: &[usize] = &[
    8, 112, 113, 120, 121, 122, 123, 210, 211, 218, 219, 229, 247, 248,
];

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of range or inconsistent with another.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level scenario configuration.
///
/// Mirrors the structure of `circle-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario identity and seed.
    #[serde(default)]
    pub scenario: ScenarioSection,

    /// Simulator connection settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Population controller settings.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Eviction sweep settings.
    #[serde(default)]
    pub eviction: EvictionConfig,

    /// Driver loop settings.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Embedded simulator settings.
    #[serde(default)]
    pub simulator: LocalWorldConfig,
}

impl ScenarioConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the connection:
    /// - `CIRCLE_HOST` overrides `client.host`
    /// - `CIRCLE_PORT` overrides `client.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_file_with(path, |key| std::env::var(key).ok())
    }

    /// Load a YAML file, then apply connection overrides from `lookup`
    /// instead of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`ScenarioConfig::from_file`].
    pub fn from_file_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_overrides_from(lookup)?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply `CIRCLE_HOST` / `CIRCLE_PORT` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `CIRCLE_PORT` is not a port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply connection overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the port value is not a port number.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV) {
            self.client.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.client.port = port.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("{PORT_ENV}={port:?} is not a port number: {e}"),
            })?;
        }
        Ok(())
    }

    /// Check cross-field and range constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.client.timeout_secs;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(invalid(format!(
                "client.timeout_secs must be positive, got {timeout}"
            )));
        }

        let (min, max) = (self.population.pause_min_secs, self.population.pause_max_secs);
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
            return Err(invalid(format!(
                "population pause bounds must be non-negative, got [{min}, {max}]"
            )));
        }
        if min > max {
            return Err(invalid(format!(
                "population.pause_min_secs ({min}) exceeds pause_max_secs ({max})"
            )));
        }

        if self.population.spawn_point_indices.is_empty() {
            return Err(invalid(
                "population.spawn_point_indices must not be empty".to_owned(),
            ));
        }
        if self.population.actor_filter.is_empty() {
            return Err(invalid("population.actor_filter must not be empty".to_owned()));
        }

        let radius = self.eviction.radius_m;
        if !radius.is_finite() || radius < 0.0 {
            return Err(invalid(format!(
                "eviction.radius_m must be non-negative, got {radius}"
            )));
        }
        if !self.eviction.center.is_finite() {
            return Err(invalid("eviction.center must be finite".to_owned()));
        }

        self.simulator.validate().map_err(|e| match e {
            SimError::InvalidConfig { reason } => invalid(reason),
            other => invalid(other.to_string()),
        })
    }
}

const fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

/// Scenario identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScenarioSection {
    /// Scene name used in logs.
    #[serde(default = "default_scenario_name")]
    pub name: String,

    /// Map the scenario is designed for.
    #[serde(default = "default_map_name")]
    pub map: String,

    /// Random seed; `None` draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ScenarioSection {
    fn default() -> Self {
        Self {
            name: default_scenario_name(),
            map: default_map_name(),
            seed: None,
        }
    }
}

/// Simulator connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    /// Simulator host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Simulator port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// The timeout as a [`Duration`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the timeout is not a positive
    /// finite number of seconds.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.timeout_secs)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .ok_or_else(|| {
                invalid(format!(
                    "client.timeout_secs must be positive, got {}",
                    self.timeout_secs
                ))
            })
    }
}

/// Population controller settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Maximum number of live tracked agents.
    #[serde(default = "default_max_agents")]
    pub max_agents: usize,

    /// Wildcard filter selecting spawnable blueprints and tracked actors.
    #[serde(default = "default_actor_filter")]
    pub actor_filter: String,

    /// Value written to every spawned actor's `role_name` attribute.
    #[serde(default = "default_role_name")]
    pub role_name: String,

    /// Indices into the map's spawn points that may be used.
    #[serde(default = "default_spawn_point_indices")]
    pub spawn_point_indices: Vec<usize>,

    /// Shortest pause between spawn attempts, in seconds.
    #[serde(default = "default_pause_min_secs")]
    pub pause_min_secs: f64,

    /// Longest pause between spawn attempts, in seconds.
    #[serde(default = "default_pause_max_secs")]
    pub pause_max_secs: f64,

    /// Cap on spawn attempts in one population pass (0 = until full).
    #[serde(default)]
    pub max_attempts_per_cycle: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            max_agents: default_max_agents(),
            actor_filter: default_actor_filter(),
            role_name: default_role_name(),
            spawn_point_indices: default_spawn_point_indices(),
            pause_min_secs: default_pause_min_secs(),
            pause_max_secs: default_pause_max_secs(),
            max_attempts_per_cycle: 0,
        }
    }
}

/// Eviction sweep settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvictionConfig {
    /// Centre of the area of interest.
    #[serde(default)]
    pub center: Location,

    /// Agents farther than this from the centre are evicted, in meters.
    #[serde(default = "default_radius_m")]
    pub radius_m: f64,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            center: Location::ORIGIN,
            radius_m: default_radius_m(),
        }
    }
}

/// Driver loop settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunnerConfig {
    /// Stop after this many cycles (0 = run until killed).
    #[serde(default)]
    pub max_cycles: u64,
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_scenario_name() -> String {
    "traffic-circle".to_owned()
}

fn default_map_name() -> String {
    "Town03".to_owned()
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    2000
}

const fn default_timeout_secs() -> f64 {
    3.0
}

const fn default_max_agents() -> usize {
    10
}

fn default_actor_filter() -> String {
    "vehicle.*".to_owned()
}

fn default_role_name() -> String {
    "autopilot".to_owned()
}

fn default_spawn_point_indices() -> Vec<usize> {
    TRAFFIC_CIRCLE_SPAWN_POINTS.to_vec()
}

const fn default_pause_min_secs() -> f64 {
    2.0
}

const fn default_pause_max_secs() -> f64 {
    6.0
}

const fn default_radius_m() -> f64 {
    100.0
}
