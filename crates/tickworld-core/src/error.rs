//! Error types for the `tickworld-core` crate.
//!
//! [`WorldError`] is returned by the setup API. [`PathError`] and
//! [`ActionError`] are domain diagnostics: they never abort the simulation,
//! they are recorded on the failing action and handed to the character's
//! controller on its next decision, so their `Display` text is written for
//! the agent that reads it. [`PromptError`] is the failure type of the
//! external decision source.

use crate::geometry::Position;
use crate::ids::{CharacterId, ObjectId};

/// Errors raised while building or mutating the world through its setup API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// A character with this id already exists.
    #[error("character '{0}' already exists")]
    DuplicateCharacter(CharacterId),

    /// An object with this id already exists.
    #[error("object '{0}' already exists")]
    DuplicateObject(ObjectId),

    /// An object type with this name is already registered.
    #[error("object type '{0}' is already registered")]
    DuplicateType(String),

    /// The object refers to a type that was never registered.
    #[error("unknown object type '{0}'")]
    UnknownType(String),

    /// No character with this id exists.
    #[error("no such character '{0}'")]
    UnknownCharacter(CharacterId),

    /// The occluding object would overlap another occluding object.
    #[error("object '{object}' overlaps '{other}' at {cell}")]
    Overlap {
        /// The object being added.
        object: ObjectId,
        /// The object already occupying the cell.
        other: ObjectId,
        /// The first shared cell.
        cell: Position,
    },

    /// The entity would be placed outside the grid.
    #[error("'{id}' at {position} is outside the world")]
    OutOfBounds {
        /// The entity being placed.
        id: String,
        /// The requested position.
        position: Position,
    },
}

/// Pathfinding diagnostics reported by the navigator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Neither an object nor a character has this id.
    #[error("No such object or character '{0}'")]
    NoSuchTarget(String),

    /// The target is only reachable by going through a removable object.
    #[error("Cannot reach '{target}' because '{blocker}' is blocking the path")]
    Blocked {
        /// The requested target.
        target: String,
        /// The first object standing in the way.
        blocker: ObjectId,
    },

    /// The target cannot be reached at all.
    #[error("'{0}' is unreachable")]
    Unreachable(String),
}

/// Failures recorded on an action during preparation or ticking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// Walking to the target failed.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The character does not carry the item it tried to use.
    #[error("Cannot interact with '{target}' because you do not have '{item}'")]
    MissingItem {
        /// The interaction target.
        target: String,
        /// The missing item.
        item: String,
    },

    /// The interaction target does not exist.
    #[error("Cannot interact with '{0}' because it does not exist")]
    NoSuchTarget(String),

    /// The interaction target is not adjacent to the character.
    #[error("Cannot interact with '{0}' because it is too far away")]
    TooFar(String),

    /// The target has no interaction attached.
    #[error("Cannot interact with '{0}' because it is not interactable")]
    NotInteractable(String),

    /// The interaction rule rejected the attempt.
    #[error("{0}")]
    Interaction(String),

    /// `ask` was given an empty question.
    #[error("Cannot ask an empty question")]
    EmptyQuestion,

    /// The ask target is not a character.
    #[error("Cannot ask '{0}' because they are not a character")]
    NotACharacter(String),

    /// A character tried to ask itself.
    #[error("Cannot ask yourself a question")]
    AskSelf,

    /// The ask target is already answering someone else.
    #[error("'{0}' is busy answering another question")]
    Busy(CharacterId),

    /// The ask target stopped listening before answering.
    #[error("'{0}' is no longer listening")]
    NotListening(CharacterId),
}

impl ActionError {
    /// The object named by a [`PathError::Blocked`] diagnostic, if this is one.
    pub const fn blocker(&self) -> Option<&ObjectId> {
        match self {
            Self::Path(PathError::Blocked { blocker, .. }) => Some(blocker),
            _ => None,
        }
    }
}

/// Errors from the external decision source behind [`crate::controller::Prompt`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    /// The request could not be delivered or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend asked the caller to slow down.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The response could not be understood even after corrections.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A prompt template failed to render.
    #[error("template error: {0}")]
    Template(String),

    /// The decision source is misconfigured.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PromptError {
    /// Whether retrying the same call may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::RateLimited(_) | Self::Timeout(_) | Self::Malformed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_errors_read_as_sentences() {
        let err = PathError::Blocked {
            target: "goal".to_owned(),
            blocker: ObjectId::new("door"),
        };
        assert_eq!(
            err.to_string(),
            "Cannot reach 'goal' because 'door' is blocking the path"
        );
        assert_eq!(
            PathError::NoSuchTarget("x".to_owned()).to_string(),
            "No such object or character 'x'"
        );
    }

    #[test]
    fn action_error_wraps_path_error_transparently() {
        let err = ActionError::from(PathError::Unreachable("goal".to_owned()));
        assert_eq!(err.to_string(), "'goal' is unreachable");
        assert!(err.blocker().is_none());
    }

    #[test]
    fn blocker_is_exposed() {
        let err = ActionError::from(PathError::Blocked {
            target: "goal".to_owned(),
            blocker: ObjectId::new("door"),
        });
        assert_eq!(err.blocker().map(ObjectId::as_str), Some("door"));
    }

    #[test]
    fn only_delivery_failures_are_transient() {
        assert!(PromptError::Timeout("slow".to_owned()).is_transient());
        assert!(PromptError::Malformed("junk".to_owned()).is_transient());
        assert!(!PromptError::Config("no key".to_owned()).is_transient());
        assert!(!PromptError::Template("bad".to_owned()).is_transient());
    }
}
