//! Core simulation engine for Tickworld.
//!
//! A deterministic, single-threaded, tick-based world: characters on a grid
//! perform multi-tick actions (walking, interacting with objects, asking
//! each other questions) chosen by controllers. Controllers can be scripted,
//! driven by typed commands, or driven by an external decision source that
//! answers with high latency; the latter runs off the simulation thread and
//! is polled every tick, so the world keeps advancing while it waits.
//!
//! # Modules
//!
//! - [`ids`]: type-safe entity identifiers
//! - [`geometry`]: cells, footprints, facing
//! - [`grid`] / [`navigator`]: occlusion and A* pathfinding
//! - [`interaction`]: object rules (open, pick up, shop, give, win)
//! - [`object`], [`character`]: entities
//! - [`action`]: the prepare/tick action protocol
//! - [`controller`]: decision sources, including AI orchestration
//! - [`retry`]: backoff for external calls
//! - [`world`]: the composition root and tick loop
//! - [`config`]: YAML configuration

pub mod action;
pub mod character;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod ids;
pub mod interaction;
pub mod navigator;
pub mod object;
pub mod retry;
pub mod world;

pub use action::{Action, ActionKind, ActiveAction};
pub use character::Character;
pub use config::{ConfigError, SimulationConfig};
pub use controller::{
    AiController, AiStatus, Console, Controller, Database, HumanController, HumanPrompt, LineInput,
    Prompt, RuleBook, ScriptedController, TurnMemory,
};
pub use error::{ActionError, PathError, PromptError, WorldError};
pub use geometry::{Direction, Footprint, Point, Position};
pub use ids::{CharacterId, ObjectId};
pub use interaction::{GoalFlag, Interaction};
pub use object::{Object, ObjectType};
pub use retry::{RetryError, RetryPolicy};
pub use world::World;
