//! Engine binary for the Tickworld simulation.
//!
//! Wires configuration, logging, the demo world and a controller for the
//! player character, then runs the tick loop until the goal is reached.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tickworld-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Pick a controller: the LLM runner when `LLM_BACKEND` is set (typed
//!    answers on stdin when it is `human`), otherwise a scripted walkthrough
//! 4. Build the demo world
//! 5. Run the tick loop
//! 6. Log the result

mod error;
mod scenario;
mod simulation;
mod stdin;

use std::path::Path;
use std::sync::Arc;

use tickworld_core::config::LoggingConfig;
use tickworld_core::{
    AiController, Controller, GoalFlag, HumanPrompt, Prompt, RuleBook, SimulationConfig,
};
use tickworld_runner::{LlmPrompt, RunnerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::stdin::StdinLines;

/// Where the configuration file is looked up, relative to the working
/// directory.
const CONFIG_PATH: &str = "tickworld-config.yaml";

/// `LLM_BACKEND` value that hands every decision to the terminal.
const HUMAN_BACKEND: &str = "human";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, runner setup or world construction
/// fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        from_file,
        width = config.world.width,
        height = config.world.height,
        tick_rate_hz = config.world.tick_rate_hz,
        "tickworld-engine starting"
    );

    // 3. Pick the controller for the player character.
    let flag = GoalFlag::new();
    let controller = player_controller(&config, &flag)?;

    // 4. Build the demo world.
    let mut world = scenario::demo_world(&config.world, &flag, controller)?;
    info!(
        characters = world.characters().count(),
        objects = world.objects().count(),
        goal = scenario::GOAL,
        "demo world created"
    );

    // 5. Run.
    let summary = simulation::run(&mut world, &flag, &config.world).await;

    // 6. Log results.
    info!(
        end_reason = ?summary.end_reason,
        total_ticks = summary.ticks,
        elapsed_ms = summary.elapsed.as_millis(),
        "tickworld-engine shutdown complete"
    );
    Ok(())
}

/// Load `tickworld-config.yaml`, falling back to defaults when it is absent.
///
/// Returns whether the file was found, for logging once tracing is up.
fn load_config() -> Result<(SimulationConfig, bool), EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// An AI controller when `LLM_BACKEND` is set, the walkthrough otherwise.
fn player_controller(
    config: &SimulationConfig,
    flag: &GoalFlag,
) -> Result<Controller, EngineError> {
    let Some(backend) = std::env::var_os("LLM_BACKEND") else {
        info!("LLM_BACKEND not set, using scripted walkthrough");
        return Ok(scenario::walkthrough().into());
    };

    let prompt: Arc<dyn Prompt> = if backend == HUMAN_BACKEND {
        info!("AI controller enabled, decisions are typed on stdin");
        Arc::new(HumanPrompt::new(StdinLines::spawn()))
    } else {
        let runner_config = RunnerConfig::from_env()?;
        let prompt = LlmPrompt::from_config(&runner_config)?;
        info!(
            model = %runner_config.backend.model,
            max_corrections = runner_config.max_corrections,
            "AI controller enabled"
        );
        Arc::new(prompt)
    };
    let ai = AiController::new(
        scenario::GOAL,
        flag.clone(),
        prompt,
        RuleBook,
        tokio::runtime::Handle::current(),
    )
    .with_retry_policy(config.ai.retry_policy())
    .with_max_failed_turns(config.ai.max_failed_turns);
    Ok(ai.into())
}
