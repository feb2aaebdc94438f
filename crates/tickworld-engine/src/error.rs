//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup so `main` can
//! propagate with `?`. The tick loop itself cannot fail: domain errors stay
//! inside the world and reach controllers as diagnostics.

use tickworld_core::{ConfigError, WorldError};
use tickworld_runner::RunnerError;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The demo world could not be built with the configured grid.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The configured grid cannot hold the demo layout.
    #[error("the demo world needs at least {min_width} x {min_height} cells, got {width} x {height}")]
    GridTooSmall {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
        /// Narrowest usable width.
        min_width: u32,
        /// Shortest usable height.
        min_height: u32,
    },

    /// The LLM runner was configured but could not be set up.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: RunnerError,
    },
}
