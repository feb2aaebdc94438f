//! Fixed-rate tick loop.
//!
//! Ticks the world on a tokio interval so that AI turns spawned on the same
//! runtime make progress between ticks. Runs until the goal flag is raised
//! or the configured tick limit is reached.

use std::time::Duration;

use tickworld_core::config::WorldConfig;
use tickworld_core::{GoalFlag, World};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// How often character positions are logged, in ticks.
const PROGRESS_EVERY: u64 = 100;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The goal flag was raised.
    GoalReached,
    /// `max_ticks` elapsed first.
    TickLimit,
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Why the loop stopped.
    pub end_reason: EndReason,
    /// Ticks performed.
    pub ticks: u64,
    /// Wall-clock (or paused-clock) time spent.
    pub elapsed: Duration,
}

/// Tick `world` at `config.tick_rate_hz` until `flag` is set or the tick
/// limit is reached.
pub async fn run(world: &mut World, flag: &GoalFlag, config: &WorldConfig) -> Summary {
    let dt = config.tick_seconds();
    let mut interval = tokio::time::interval(config.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();

    info!(
        tick_rate_hz = config.tick_rate_hz,
        max_ticks = config.max_ticks,
        "entering tick loop"
    );

    let end_reason = loop {
        interval.tick().await;
        world.tick(dt);

        if world.ticks().checked_rem(PROGRESS_EVERY) == Some(0) {
            for character in world.characters() {
                debug!(
                    tick = world.ticks(),
                    character = %character.id(),
                    x = character.position().x,
                    y = character.position().y,
                    action = character.action().map(|a| a.kind().as_str()),
                    "progress"
                );
            }
        }

        if flag.is_set() {
            break EndReason::GoalReached;
        }
        if config.max_ticks > 0 && world.ticks() >= config.max_ticks {
            warn!(max_ticks = config.max_ticks, "tick limit reached before the goal");
            break EndReason::TickLimit;
        }
    };

    Summary {
        end_reason,
        ticks: world.ticks(),
        elapsed: started.elapsed(),
    }
}
