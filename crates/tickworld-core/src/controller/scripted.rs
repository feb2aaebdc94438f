//! Fixed action scripts for tests, demos and non-player characters.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::action::Action;
use crate::controller::NON_ANSWER;
use crate::error::ActionError;
use crate::ids::CharacterId;

/// Replays a fixed sequence of actions, then idles forever.
///
/// Errors are logged and otherwise ignored: the script moves on.
#[derive(Debug, Clone, Default)]
pub struct ScriptedController {
    actions: VecDeque<Action>,
    answers: VecDeque<String>,
}

impl ScriptedController {
    /// A controller that performs `actions` in order.
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
            answers: VecDeque::new(),
        }
    }

    /// Reply to questions with these answers, in order.
    #[must_use]
    pub fn with_answers<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answers = answers.into_iter().map(Into::into).collect();
        self
    }

    /// Actions not yet handed out.
    pub fn remaining(&self) -> usize {
        self.actions.len()
    }

    pub(crate) fn next_action(&mut self, id: &CharacterId, error: Option<&ActionError>) -> Action {
        if let Some(error) = error {
            warn!(character = %id, %error, "scripted action failed");
        }
        match self.actions.pop_front() {
            Some(action) => {
                debug!(character = %id, %action, "next scripted action");
                action
            }
            None => Action::idle(),
        }
    }

    pub(crate) fn answer(&mut self, _question: &str) -> String {
        self.answers
            .pop_front()
            .unwrap_or_else(|| NON_ANSWER.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_then_idles() {
        let id = CharacterId::new("red");
        let mut script =
            ScriptedController::new([Action::walk("door"), Action::interact("key", "door")]);
        assert_eq!(script.next_action(&id, None), Action::walk("door"));
        assert_eq!(script.remaining(), 1);
        let err = ActionError::TooFar("door".to_owned());
        assert_eq!(
            script.next_action(&id, Some(&err)),
            Action::interact("key", "door")
        );
        assert_eq!(script.next_action(&id, None), Action::idle());
        assert_eq!(script.next_action(&id, None), Action::idle());
    }

    #[test]
    fn answers_in_order_then_shrugs() {
        let mut script = ScriptedController::default().with_answers(["north"]);
        assert_eq!(script.answer("Where?"), "north");
        assert_eq!(script.answer("Where?"), NON_ANSWER);
    }
}
