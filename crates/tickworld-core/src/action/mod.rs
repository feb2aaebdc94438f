//! The multi-tick action protocol.
//!
//! Controllers decide an [`Action`]; the world turns it into an
//! [`ActiveAction`] by calling [`Action::prepare`] exactly once, then ticks
//! the active action every frame until it reports completion. Only
//! [`ActiveAction`] can be ticked, so an unprepared action can never run.
//!
//! Failures never abort the simulation. They are recorded on the active
//! action as an [`ActionError`] and handed to the character's controller
//! together with its next decision.

mod ask;
mod interact;
mod walk;

pub use ask::{Answer, Ask};
pub use interact::Interact;
pub use walk::Walk;

use std::fmt;

use tracing::debug;

use crate::error::ActionError;
use crate::ids::CharacterId;
use crate::world::World;

/// A decision made by a controller, not yet bound to a character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Do nothing. With `finish` set, complete after one tick so the
    /// controller is consulted again; otherwise idle forever.
    Idle {
        /// Whether the idle completes on its first tick.
        finish: bool,
    },
    /// Walk next to an object or character.
    Walk {
        /// Id of the object or character to walk to.
        target: String,
    },
    /// Use an inventory item on an adjacent object or character.
    Interact {
        /// Item from the inventory.
        item: String,
        /// Id of the object or character.
        target: String,
    },
    /// Walk to another character and wait for their answer to a question.
    Ask {
        /// Id of the character to ask.
        target: String,
        /// The question.
        question: String,
    },
}

impl Action {
    /// Idle forever.
    pub const fn idle() -> Self {
        Self::Idle { finish: false }
    }

    /// Idle for one tick and then ask the controller again.
    pub const fn suspend() -> Self {
        Self::Idle { finish: true }
    }

    /// Walk next to `target`.
    pub fn walk(target: impl Into<String>) -> Self {
        Self::Walk {
            target: target.into(),
        }
    }

    /// Use `item` on `target`.
    pub fn interact(item: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Interact {
            item: item.into(),
            target: target.into(),
        }
    }

    /// Ask `target` a question.
    pub fn ask(target: impl Into<String>, question: impl Into<String>) -> Self {
        Self::Ask {
            target: target.into(),
            question: question.into(),
        }
    }

    /// Bind the decision to character `id`, validating it against the world.
    ///
    /// Validation failures do not prevent preparation: they are recorded on
    /// the returned action, which then completes on its first tick.
    pub fn prepare(self, world: &mut World, id: &CharacterId) -> ActiveAction {
        debug!(character = %id, action = %self, "preparing action");
        match self {
            Self::Idle { finish } => ActiveAction::Idle { finish },
            Self::Walk { target } => ActiveAction::Walk(Walk::prepare(world, id, target)),
            Self::Interact { item, target } => {
                ActiveAction::Interact(Interact::prepare(world, id, item, target))
            }
            Self::Ask { target, question } => {
                ActiveAction::Ask(Ask::prepare(world, id, target, question))
            }
        }
    }
}

impl fmt::Display for Action {
    /// Formats the action in the command syntax players type.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle { .. } => f.write_str("idle"),
            Self::Walk { target } => write!(f, "walk {target}"),
            Self::Interact { item, target } => write!(f, "interact {item} {target}"),
            Self::Ask { target, question } => write!(f, "ask {target} {question}"),
        }
    }
}

/// Discriminant of an [`ActiveAction`], for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// [`ActiveAction::Idle`].
    Idle,
    /// [`ActiveAction::Walk`].
    Walk,
    /// [`ActiveAction::Interact`].
    Interact,
    /// [`ActiveAction::Ask`].
    Ask,
    /// [`ActiveAction::Answer`].
    Answer,
}

impl ActionKind {
    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walk => "walk",
            Self::Interact => "interact",
            Self::Ask => "ask",
            Self::Answer => "answer",
        }
    }
}

/// A prepared action, owned by the character performing it.
#[derive(Debug)]
pub enum ActiveAction {
    /// Doing nothing.
    Idle {
        /// Whether the idle completes on its first tick.
        finish: bool,
    },
    /// Following a path.
    Walk(Walk),
    /// Applying an interaction.
    Interact(Interact),
    /// Asking another character.
    Ask(Ask),
    /// Waiting to answer a question; installed by another character's [`Ask`].
    Answer(Answer),
}

impl ActiveAction {
    /// Advance by `dt` seconds. Returns whether the action is complete.
    ///
    /// The action must not be stored on character `id` while it ticks; the
    /// world takes it out first so the action can mutate the character.
    pub fn tick(&mut self, world: &mut World, id: &CharacterId, dt: f64) -> bool {
        match self {
            Self::Idle { finish } => *finish,
            Self::Walk(walk) => walk.tick(world, id, dt),
            Self::Interact(interact) => interact.tick(world, id),
            Self::Ask(ask) => ask.tick(world, id, dt),
            Self::Answer(answer) => answer.tick(world, id),
        }
    }

    /// The error recorded so far, if any.
    pub const fn error(&self) -> Option<&ActionError> {
        match self {
            Self::Idle { .. } | Self::Answer(_) => None,
            Self::Walk(walk) => walk.error(),
            Self::Interact(interact) => interact.error(),
            Self::Ask(ask) => ask.error(),
        }
    }

    /// Move the recorded error out of the action.
    pub fn take_error(&mut self) -> Option<ActionError> {
        match self {
            Self::Idle { .. } | Self::Answer(_) => None,
            Self::Walk(walk) => walk.take_error(),
            Self::Interact(interact) => interact.take_error(),
            Self::Ask(ask) => ask.take_error(),
        }
    }

    /// Which kind of action this is.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Idle { .. } => ActionKind::Idle,
            Self::Walk(_) => ActionKind::Walk,
            Self::Interact(_) => ActionKind::Interact,
            Self::Ask(_) => ActionKind::Ask,
            Self::Answer(_) => ActionKind::Answer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_command_syntax() {
        assert_eq!(Action::walk("door").to_string(), "walk door");
        assert_eq!(
            Action::interact("key", "door").to_string(),
            "interact key door"
        );
        assert_eq!(
            Action::ask("blue", "Where is the key?").to_string(),
            "ask blue Where is the key?"
        );
        assert_eq!(Action::suspend().to_string(), "idle");
    }

    #[test]
    fn idle_finish_controls_completion() {
        let mut world = World::new(4, 4);
        let id = CharacterId::new("red");
        let mut forever = Action::idle().prepare(&mut world, &id);
        let mut once = Action::suspend().prepare(&mut world, &id);
        assert!(!forever.tick(&mut world, &id, 1.0));
        assert!(once.tick(&mut world, &id, 1.0));
        assert_eq!(once.kind(), ActionKind::Idle);
        assert!(once.error().is_none());
    }
}
