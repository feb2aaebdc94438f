//! Decision sources for characters.
//!
//! A [`Controller`] is consulted whenever a character's action completes. It
//! receives the error of that action (if any) and returns the next
//! [`Action`]. Controllers that cannot decide yet return
//! [`Action::suspend`], which completes after one tick so they are polled
//! again on the next frame; the simulation itself never waits.

mod ai;
mod human;
mod human_prompt;
mod scripted;

pub use ai::{AiController, AiStatus, Database, EXHAUSTED_PLAN, Prompt, RuleBook, TurnMemory};
pub use human::{Console, HumanController, LineInput, parse_command};
pub use human_prompt::HumanPrompt;
pub use scripted::ScriptedController;

use crate::action::Action;
use crate::error::ActionError;
use crate::ids::CharacterId;
use crate::world::World;

/// The answer given when a controller has nothing better to say.
pub const NON_ANSWER: &str = "I don't know.";

/// Decides what a character does next.
#[derive(Debug)]
pub enum Controller {
    /// Replays a fixed list of actions.
    Scripted(ScriptedController),
    /// Reads typed commands from a line input.
    Human(HumanController),
    /// Plans and acts through an external decision source.
    Ai(Box<AiController>),
}

impl Controller {
    /// The next action for character `id`, given the error of the action
    /// that just completed.
    pub fn next_action(
        &mut self,
        world: &World,
        id: &CharacterId,
        error: Option<&ActionError>,
    ) -> Action {
        match self {
            Self::Scripted(c) => c.next_action(id, error),
            Self::Human(c) => c.next_action(world, id, error),
            Self::Ai(c) => c.next_action(world, id, error),
        }
    }

    /// Answer a question put by another character. An empty string means
    /// the answer is not ready yet.
    pub fn answer(&mut self, question: &str) -> String {
        match self {
            Self::Scripted(c) => c.answer(question),
            Self::Human(c) => c.answer(question),
            Self::Ai(c) => c.answer(question),
        }
    }
}

impl Default for Controller {
    /// An empty script: the character idles forever.
    fn default() -> Self {
        Self::Scripted(ScriptedController::default())
    }
}

impl From<ScriptedController> for Controller {
    fn from(controller: ScriptedController) -> Self {
        Self::Scripted(controller)
    }
}

impl From<HumanController> for Controller {
    fn from(controller: HumanController) -> Self {
        Self::Human(controller)
    }
}

impl From<AiController> for Controller {
    fn from(controller: AiController) -> Self {
        Self::Ai(Box::new(controller))
    }
}
