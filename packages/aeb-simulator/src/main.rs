//! main.rs — AEB/ACC scenario simulator entry point
//!
//! Loads a scenario set from `config.toml` (or a built-in preset), runs each
//! scenario as an independent closed-loop episode, and reports:
//!   1. a one-line result summary per scenario via tracing
//!   2. optional full per-tick telemetry as JSON, one file per scenario,
//!      for downstream plotting/report tooling
//!
//! Configuration errors (target behind ego, malformed speed profiles, …) are
//! surfaced before any episode starts and fail the run.

mod acc;
mod aeb;
mod episode;
mod presets;
mod target;
mod vehicle;

use std::path::PathBuf;

use aeb_types::ScenarioConfig;
use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

use episode::{run_episode, EpisodeParams};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "aeb-sim", about = "Closed-loop AEB/ACC rear-end scenario simulator")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Run only the named scenario from the config
    #[arg(long)]
    scenario: Option<String>,
    /// Run a built-in preset instead of the config file
    #[arg(long)]
    preset: Option<String>,
    /// Write per-scenario telemetry JSON into this directory
    #[arg(long)]
    telemetry_dir: Option<PathBuf>,
    /// Override the episode horizon, in ticks
    #[arg(long)]
    horizon: Option<u32>,
}

// ── Config structs ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FullConfig {
    simulation: EpisodeParams,
    #[serde(default)]
    scenarios: Vec<NamedScenario>,
}

#[derive(Debug, Deserialize)]
struct NamedScenario {
    name: String,
    #[serde(flatten)]
    scenario: ScenarioConfig,
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aeb_sim=info,aeb_simulator=info".into()),
        )
        .init();

    let args = Args::parse();

    let (params, run_list) = build_run_list(&args)?;

    info!(
        "🚗 aeb-sim — {} scenario(s), dt={}s, horizon={} ticks",
        run_list.len(),
        params.dt_s,
        params.horizon_ticks
    );

    if let Some(dir) = &args.telemetry_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating telemetry dir {}", dir.display()))?;
    }

    let mut collisions = 0usize;
    for (name, scenario) in &run_list {
        let result = run_episode(scenario, params)
            .with_context(|| format!("scenario '{name}' rejected"))?;

        if result.collision_occurred {
            collisions += 1;
            info!("💥 {name}: {}", result.summary());
        } else {
            info!("✅ {name}: {}", result.summary());
        }

        if let Some(dir) = &args.telemetry_dir {
            let path = dir.join(format!("{name}.json"));
            let json = serde_json::to_string_pretty(&result)
                .context("serializing episode result")?;
            std::fs::write(&path, json)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }

    info!(
        "done: {collisions}/{} scenario(s) ended in collision",
        run_list.len()
    );
    Ok(())
}

/// Resolve CLI args into episode parameters and the (name, scenario) list.
fn build_run_list(args: &Args) -> anyhow::Result<(EpisodeParams, Vec<(String, ScenarioConfig)>)> {
    let mut params = EpisodeParams::default();

    let run_list = if let Some(preset_name) = &args.preset {
        let scenario = presets::by_name(preset_name).with_context(|| {
            format!(
                "unknown preset '{preset_name}' (available: {})",
                presets::PRESET_NAMES.join(", ")
            )
        })?;
        vec![(preset_name.clone(), scenario)]
    } else {
        let config_str = std::fs::read_to_string(&args.config)
            .unwrap_or_else(|_| include_str!("../config.toml").to_string());
        let cfg: FullConfig = toml::from_str(&config_str)
            .with_context(|| format!("parsing {}", args.config))?;

        params = cfg.simulation;

        let mut list: Vec<_> = cfg
            .scenarios
            .into_iter()
            .map(|s| (s.name, s.scenario))
            .collect();
        if let Some(only) = &args.scenario {
            list.retain(|(name, _)| name == only);
            if list.is_empty() {
                warn!("no scenario named '{only}' in {}", args.config);
            }
        }
        list
    };

    if let Some(horizon) = args.horizon {
        params.horizon_ticks = horizon;
    }

    Ok((params, run_list))
}
