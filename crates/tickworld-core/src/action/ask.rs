//! Conversations between characters.
//!
//! An [`Ask`] and the [`Answer`] it installs on the asked character form a
//! pair that only ever talks through the world's character map: the asker
//! looks its partner up by id each tick and never holds a reference to it.
//! The asked character's previous action is parked inside the [`Answer`]
//! and put back by the asker once the answer has been collected.

use tracing::debug;

use crate::action::{ActiveAction, Walk};
use crate::error::ActionError;
use crate::ids::CharacterId;
use crate::world::World;

/// Walk to another character, ask a question and wait for the reply.
#[derive(Debug)]
pub struct Ask {
    target: CharacterId,
    question: String,
    walk: Option<Walk>,
    answer: Option<String>,
    error: Option<ActionError>,
}

impl Ask {
    /// Validate the question and target, plan the walk, and install an
    /// [`Answer`] on the target.
    ///
    /// Nothing is installed when validation or path planning fails; the
    /// error is reported on the first tick instead.
    pub fn prepare(world: &mut World, id: &CharacterId, target: String, question: String) -> Self {
        let target = CharacterId::new(target);
        let mut ask = Self {
            target,
            question,
            walk: None,
            answer: None,
            error: None,
        };
        if let Err(err) = ask.install(world, id) {
            debug!(character = %id, target = %ask.target, error = %err, "ask rejected");
            ask.error = Some(err);
        }
        ask
    }

    fn install(&mut self, world: &mut World, id: &CharacterId) -> Result<(), ActionError> {
        if self.question.trim().is_empty() {
            return Err(ActionError::EmptyQuestion);
        }
        if &self.target == id {
            return Err(ActionError::AskSelf);
        }
        let Some(partner) = world.character(self.target.as_str()) else {
            return Err(ActionError::NotACharacter(self.target.to_string()));
        };
        if matches!(partner.action(), Some(ActiveAction::Answer(_))) {
            return Err(ActionError::Busy(self.target.clone()));
        }

        let mut walk = Walk::prepare(world, id, self.target.to_string());
        if walk.has_failed() {
            return Err(walk
                .take_error()
                .unwrap_or_else(|| ActionError::NotListening(self.target.clone())));
        }
        self.walk = Some(walk);

        if let Some(partner) = world.character_mut(self.target.as_str()) {
            let previous = partner.take_action();
            partner.settle();
            partner.set_action(Some(ActiveAction::Answer(Answer {
                asker: id.clone(),
                previous: previous.map(Box::new),
                question: None,
                answer: String::new(),
            })));
        }
        debug!(character = %id, target = %self.target, "answer installed");
        Ok(())
    }

    /// Walk first, then publish the question and wait for a non-empty answer.
    pub fn tick(&mut self, world: &mut World, id: &CharacterId, dt: f64) -> bool {
        if self.error.is_some() {
            return true;
        }
        if let Some(walk) = self.walk.as_mut() {
            if !walk.tick(world, id, dt) {
                return false;
            }
            self.walk = None;
        }

        let reply = {
            let Some(partner) = world.character_mut(self.target.as_str()) else {
                self.error = Some(ActionError::NotListening(self.target.clone()));
                return true;
            };
            let Some(ActiveAction::Answer(pending)) = partner.action_mut() else {
                self.error = Some(ActionError::NotListening(self.target.clone()));
                return true;
            };
            if &pending.asker != id {
                self.error = Some(ActionError::NotListening(self.target.clone()));
                return true;
            }
            if pending.question.is_none() {
                debug!(character = %id, target = %self.target, question = %self.question, "question asked");
                pending.question = Some(self.question.clone());
                return false;
            }
            if pending.answer.is_empty() {
                return false;
            }
            let reply = std::mem::take(&mut pending.answer);
            let previous = pending.previous.take();
            partner.set_action(previous.map(|boxed| *boxed));
            reply
        };

        debug!(character = %id, target = %self.target, answer = %reply, "question answered");
        if let Some(asker) = world.character_mut(id.as_str()) {
            asker.set_last_answer(reply.clone());
        }
        self.answer = Some(reply);
        true
    }

    /// The character being asked.
    pub const fn target(&self) -> &CharacterId {
        &self.target
    }

    /// The answer, once received.
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub(crate) const fn error(&self) -> Option<&ActionError> {
        self.error.as_ref()
    }

    pub(crate) fn take_error(&mut self) -> Option<ActionError> {
        self.error.take()
    }
}

/// Installed on an asked character; never completes on its own.
///
/// Each tick, once a question has been published and no answer is stored
/// yet, the owning character's controller is consulted. An empty reply
/// means it is not ready.
#[derive(Debug)]
pub struct Answer {
    asker: CharacterId,
    previous: Option<Box<ActiveAction>>,
    question: Option<String>,
    answer: String,
}

impl Answer {
    /// Poll the owner's controller for an answer.
    pub fn tick(&mut self, world: &mut World, id: &CharacterId) -> bool {
        let Some(question) = self.question.as_deref() else {
            return false;
        };
        if !self.answer.is_empty() {
            return false;
        }
        if let Some(character) = world.character_mut(id.as_str()) {
            self.answer = character.controller_mut().answer(question);
        }
        false
    }

    /// The character waiting for this answer.
    pub const fn asker(&self) -> &CharacterId {
        &self.asker
    }

    /// The published question, if the asker has arrived.
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    /// The action that was interrupted, until it is given back.
    pub fn previous(&self) -> Option<&ActiveAction> {
        self.previous.as_deref()
    }

    /// Give back the action that was interrupted.
    pub fn into_previous(self) -> Option<ActiveAction> {
        self.previous.map(|boxed| *boxed)
    }
}
