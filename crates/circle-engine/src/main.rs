//! Traffic circle scenario engine.
//!
//! Serves an in-process simulator on the configured endpoint, connects to
//! it, and runs the actor lifecycle loop: keep `max_agents` autopilot
//! vehicles alive around the traffic circle and evict the ones that leave
//! the eviction zone.
//!
//! # Startup Sequence
//!
//! 1. Parse command-line flags
//! 2. Initialize structured logging (tracing)
//! 3. Load configuration (`circle-config.yaml`, environment, then flags)
//! 4. Seed the scenario RNG
//! 5. Serve the local world on `host:port`
//! 6. Connect a client to it
//! 7. Optionally list spawn points and exit
//! 8. Optionally clear pre-existing agents
//! 9. Run the driver loop
//! 10. Log the result

mod cli;
mod error;

use std::io::Write;
use std::path::Path;

use circle_core::config::ScenarioConfig;
use circle_core::eviction::remove_all_actors;
use circle_core::rng::ScenarioRng;
use circle_core::runner::{self, ScenarioRunner};
use circle_sim::{ActorWorld, Client, Endpoint, LocalWorld, SimulatorHub, TownMap, World};
use circle_types::Transform;
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::EngineError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step or the run itself fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Parse flags.
    let cli = Cli::parse();

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("circle-engine starting");

    // 3. Load configuration.
    let config = load_config(&cli, |key| std::env::var(key).ok())?;
    info!(
        scene = config.scenario.name,
        host = config.client.host,
        port = config.client.port,
        timeout_secs = config.client.timeout_secs,
        max_agents = config.population.max_agents,
        max_cycles = config.runner.max_cycles,
        "Configuration loaded"
    );

    // 4. Seed the scenario RNG.
    let rng = ScenarioRng::new(config.scenario.seed);
    if config.scenario.seed.is_none() {
        info!(seed = rng.seed(), "No seed given, drew one at random");
    }

    // 5. Serve the local world.
    let hub = SimulatorHub::new();
    let endpoint = Endpoint::new(&config.client.host, config.client.port);
    let simulator = hub
        .serve(endpoint, LocalWorld::town03(config.simulator.clone()))
        .await?;
    info!(endpoint = %simulator.endpoint(), "Local world served");

    // 6. Connect.
    let client = Client::connect(
        &hub,
        &config.client.host,
        config.client.port,
        config.client.timeout()?,
    )
    .await?;
    let world = client.world();

    // 7. Spawn point listing.
    if cli.list_spawn_points {
        list_spawn_points(&world).await?;
        simulator.stop();
        return Ok(());
    }

    // 8. Clear leftovers.
    if cli.clear_existing {
        let removed = remove_all_actors(&world, &config.population.actor_filter)
            .await
            .map_err(EngineError::from)?;
        info!(count = removed.len(), "Existing agents cleared");
    }

    // 9. Run.
    let scenario = ScenarioRunner::prepare(world, &config, rng)
        .await
        .map_err(EngineError::from)?;
    info!(run_id = %scenario.run_id(), "Entering driver loop");
    let result = scenario.run().await.map_err(EngineError::from)?;

    // 10. Log results.
    runner::log_run_end(&result);
    simulator.stop();
    info!("circle-engine shutdown complete");

    Ok(())
}

/// Build the effective configuration.
///
/// Precedence, highest first: flags, `CIRCLE_HOST` / `CIRCLE_PORT` as seen
/// through `lookup`, the YAML file, built-in defaults.
fn load_config<F>(cli: &Cli, lookup: F) -> Result<ScenarioConfig, EngineError>
where
    F: Fn(&str) -> Option<String>,
{
    build_config(cli.config_path().as_deref(), cli, lookup)
}

fn build_config<F>(
    path: Option<&Path>,
    cli: &Cli,
    lookup: F,
) -> Result<ScenarioConfig, EngineError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = if let Some(path) = path {
        info!(path = %path.display(), "Loading config file");
        ScenarioConfig::from_file_with(path, lookup)?
    } else {
        info!("Config file not found, using defaults");
        let mut config = ScenarioConfig::default();
        config.apply_overrides_from(lookup)?;
        config
    };
    cli.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

/// One line of `--list-spawn-points` output.
#[derive(Debug, Serialize)]
struct SpawnPointLine<'a> {
    index: usize,
    transform: &'a Transform,
}

/// Print every spawn point of the map as one JSON object per line on
/// stdout.
async fn list_spawn_points(world: &World) -> Result<(), EngineError> {
    let map = world.map().await?;
    let stdout = std::io::stdout();
    let count = write_spawn_points(&map, &mut stdout.lock())?;
    info!(map = map.name, count, "Spawn points listed");
    Ok(())
}

/// Write one JSON object per spawn point. Returns the number of lines.
fn write_spawn_points<W: Write>(map: &TownMap, out: &mut W) -> Result<usize, EngineError> {
    let mut count = 0_usize;
    for (index, transform) in map.spawn_points().iter().enumerate() {
        let line = serde_json::to_string(&SpawnPointLine { index, transform }).map_err(|e| {
            EngineError::Output {
                message: format!("failed to encode spawn point {index}: {e}"),
            }
        })?;
        writeln!(out, "{line}").map_err(|e| EngineError::Output {
            message: format!("failed to write spawn point {index}: {e}"),
        })?;
        count = index.saturating_add(1);
    }
    out.flush().map_err(|e| EngineError::Output {
        message: format!("failed to flush spawn points: {e}"),
    })?;
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use circle_core::config::{HOST_ENV, PORT_ENV};
    use clap::Parser;
    use tempfile::TempDir;

    use super::*;

    const YAML: &str = "\
client:
  host: yaml-host
  port: 3000
population:
  max_agents: 12
runner:
  max_cycles: 40
";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn yaml_file(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("circle-config.yaml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("circle-engine").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn yaml_values_replace_defaults() {
        let dir = TempDir::new().unwrap();
        let path = yaml_file(&dir, YAML);
        let config = build_config(Some(path.as_path()), &cli(&[]), env(&[])).unwrap();

        assert_eq!(config.client.host, "yaml-host");
        assert_eq!(config.client.port, 3000);
        assert_eq!(config.population.max_agents, 12);
        assert_eq!(config.runner.max_cycles, 40);
        assert_eq!(config.simulator, ScenarioConfig::default().simulator);
    }

    #[test]
    fn environment_overrides_yaml() {
        let dir = TempDir::new().unwrap();
        let path = yaml_file(&dir, YAML);
        let config = build_config(
            Some(path.as_path()),
            &cli(&[]),
            env(&[(HOST_ENV, "env-host"), (PORT_ENV, "4000")]),
        )
        .unwrap();

        assert_eq!(config.client.host, "env-host");
        assert_eq!(config.client.port, 4000);
        assert_eq!(config.population.max_agents, 12);
    }

    #[test]
    fn flags_override_environment_and_yaml() {
        let dir = TempDir::new().unwrap();
        let path = yaml_file(&dir, YAML);
        let config = build_config(
            Some(path.as_path()),
            &cli(&["--host", "flag-host", "-n", "2"]),
            env(&[(HOST_ENV, "env-host"), (PORT_ENV, "4000")]),
        )
        .unwrap();

        assert_eq!(config.client.host, "flag-host");
        assert_eq!(config.client.port, 4000);
        assert_eq!(config.population.max_agents, 2);
        assert_eq!(config.runner.max_cycles, 40);
    }

    #[test]
    fn explicit_config_flag_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = yaml_file(&dir, YAML);
        let path_arg = path.to_str().unwrap();
        let config = load_config(&cli(&["-c", path_arg]), env(&[])).unwrap();
        assert_eq!(config.client.host, "yaml-host");
    }

    #[test]
    fn environment_applies_without_a_file() {
        let config = build_config(None, &cli(&[]), env(&[(PORT_ENV, "2100")])).unwrap();
        let defaults = ScenarioConfig::default();
        assert_eq!(config.client.port, 2100);
        assert_eq!(config.client.host, defaults.client.host);
        assert_eq!(config.population, defaults.population);
    }

    #[test]
    fn bad_environment_port_is_a_config_error() {
        let result = build_config(None, &cli(&[]), env(&[(PORT_ENV, "not-a-port")]));
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    #[test]
    fn unbounded_speed_in_yaml_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = yaml_file(&dir, "simulator:\n  max_speed_mps: .inf\n");
        let result = build_config(Some(path.as_path()), &cli(&[]), env(&[]));
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        let result = build_config(Some(path.as_path()), &cli(&[]), env(&[]));
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    fn assert_json_lines(output: &[u8], expected: usize) {
        let text = std::str::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), expected);
        for (expected_index, line) in lines.iter().enumerate() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(
                value.get("index").and_then(serde_json::Value::as_u64),
                Some(u64::try_from(expected_index).unwrap())
            );
            let location = value
                .get("transform")
                .and_then(|t| t.get("location"))
                .unwrap();
            assert!(location.get("x").and_then(serde_json::Value::as_f64).is_some());
        }
    }

    #[test]
    fn every_spawn_point_line_is_json() {
        let map = TownMap::town03();
        let mut out = Vec::new();
        let count = write_spawn_points(&map, &mut out).unwrap();
        assert_eq!(count, map.spawn_points().len());
        assert_json_lines(&out, count);
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_points_read_over_a_client_are_json() {
        let config = ScenarioConfig::default();
        let hub = SimulatorHub::new();
        let simulator = hub
            .serve(
                Endpoint::new(&config.client.host, config.client.port),
                LocalWorld::town03(config.simulator.clone()),
            )
            .await
            .unwrap();
        let client = Client::connect(
            &hub,
            &config.client.host,
            config.client.port,
            Duration::from_secs(3),
        )
        .await
        .unwrap();

        let map = client.world().map().await.unwrap();
        let mut out = Vec::new();
        let count = write_spawn_points(&map, &mut out).unwrap();
        assert_eq!(count, 265);
        assert_json_lines(&out, count);
        simulator.stop();
    }
}
