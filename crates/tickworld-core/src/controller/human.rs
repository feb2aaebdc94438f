//! A controller driven by typed commands.
//!
//! Input arrives through a [`LineInput`], which never blocks: `accept`
//! returns `None` until a full line has been submitted. [`Console`] is the
//! in-memory implementation a UI feeds keystrokes into.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::action::Action;
use crate::error::ActionError;
use crate::ids::CharacterId;
use crate::world::World;

/// Usage shown after an unrecognised command.
const USAGE: &str =
    "Invalid command, must be one of: walk <target>, interact <item> <target>, ask <target> <question>";

/// A line-buffered, non-blocking text channel to a person.
pub trait LineInput: fmt::Debug {
    /// Show text to the user.
    fn print(&mut self, text: &str);

    /// The submitted line, if one is ready.
    fn accept(&mut self) -> Option<String>;
}

#[derive(Debug, Default)]
struct ConsoleState {
    display: String,
    input: String,
    waiting: bool,
    submitted: bool,
}

/// In-memory console shared between a [`HumanController`] and whatever
/// renders it. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct Console {
    state: Arc<Mutex<ConsoleState>>,
}

impl Console {
    /// An empty console.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the console has prompted and is waiting for a line.
    pub fn waiting(&self) -> bool {
        let state = self.state();
        state.waiting && !state.submitted
    }

    /// Type text into the pending line. Ignored unless waiting.
    pub fn feed(&self, text: &str) {
        let mut state = self.state();
        if state.waiting {
            state.input.push_str(text);
            state.display.push_str(text);
        }
    }

    /// Finish the pending line. Ignored unless waiting.
    pub fn submit(&self) {
        let mut state = self.state();
        if state.waiting {
            state.waiting = false;
            state.submitted = true;
        }
    }

    /// Delete the last typed character.
    pub fn pop(&self) {
        let mut state = self.state();
        if !state.submitted && state.input.pop().is_some() {
            state.display.pop();
        }
    }

    /// Everything printed and typed since the last accepted line.
    pub fn display(&self) -> String {
        self.state().display.clone()
    }

    /// Reset to an empty, non-waiting console.
    pub fn clear(&self) {
        *self.state() = ConsoleState::default();
    }
}

impl LineInput for Console {
    fn print(&mut self, text: &str) {
        self.state().display.push_str(text);
    }

    fn accept(&mut self) -> Option<String> {
        let mut state = self.state();
        if !state.submitted {
            state.waiting = true;
            return None;
        }
        let line = std::mem::take(&mut state.input);
        state.display.clear();
        state.submitted = false;
        Some(line)
    }
}

/// Parse `walk <target>`, `interact <item> <target>` or
/// `ask <target> <question...>`.
pub fn parse_command(line: &str) -> Result<Action, String> {
    let mut words = line.split_whitespace();
    let verb = words.next();
    let args: Vec<&str> = words.collect();
    match (verb, args.as_slice()) {
        (Some("walk"), [target]) => Ok(Action::walk(*target)),
        (Some("interact"), [item, target]) => Ok(Action::interact(*item, *target)),
        (Some("ask"), [target, question @ ..]) if !question.is_empty() => {
            Ok(Action::ask(*target, question.join(" ")))
        }
        _ => Err(USAGE.to_owned()),
    }
}

/// Maps typed commands to actions.
#[derive(Debug)]
pub struct HumanController {
    input: Box<dyn LineInput>,
    prompted: bool,
    question: Option<String>,
}

impl HumanController {
    /// A controller reading from `input`.
    pub fn new(input: impl LineInput + 'static) -> Self {
        Self {
            input: Box::new(input),
            prompted: false,
            question: None,
        }
    }

    pub(crate) fn next_action(
        &mut self,
        world: &World,
        id: &CharacterId,
        error: Option<&ActionError>,
    ) -> Action {
        if !self.prompted {
            let status = match error {
                Some(error) => error.to_string(),
                None => {
                    let items: Vec<&str> = world
                        .character(id.as_str())
                        .map(|c| c.inventory().iter().map(String::as_str).collect())
                        .unwrap_or_default();
                    format!("Inventory: {}", items.join(", "))
                }
            };
            self.input.print(&status);
            self.input.print("\n> ");
            self.prompted = true;
        }

        let Some(line) = self.input.accept() else {
            return Action::suspend();
        };
        self.prompted = false;
        match parse_command(&line) {
            Ok(action) => {
                debug!(character = %id, %action, "command accepted");
                action
            }
            Err(usage) => {
                self.input.print(&usage);
                self.input.print("\n> ");
                self.prompted = true;
                Action::suspend()
            }
        }
    }

    pub(crate) fn answer(&mut self, question: &str) -> String {
        if self.question.as_deref() != Some(question) {
            self.input.print(question);
            self.input.print("\n> ");
            self.question = Some(question.to_owned());
        }
        match self.input.accept() {
            Some(line) if !line.trim().is_empty() => {
                self.question = None;
                line.trim().to_owned()
            }
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Character;
    use crate::geometry::Position;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("walk door"), Ok(Action::walk("door")));
        assert_eq!(
            parse_command("  interact key  door "),
            Ok(Action::interact("key", "door"))
        );
        assert_eq!(
            parse_command("ask blue where is the key?"),
            Ok(Action::ask("blue", "where is the key?"))
        );
        assert!(parse_command("ask blue").is_err());
        assert!(parse_command("walk").is_err());
        assert!(parse_command("dance wildly").is_err());
        assert!(parse_command("").is_err());
    }

    #[test]
    fn console_only_takes_input_while_waiting() {
        let mut console = Console::new();
        console.feed("ignored");
        assert_eq!(console.accept(), None);
        assert!(console.waiting());
        console.feed("walk doorx");
        console.pop();
        console.submit();
        assert!(!console.waiting());
        assert_eq!(console.accept().as_deref(), Some("walk door"));
        assert_eq!(console.display(), "");
    }

    #[test]
    fn human_prompts_once_and_suspends_until_submitted() {
        let mut world = World::new(4, 4);
        let character = Character::new("red", Position::new(0, 0)).with_items(["hand"]);
        let id = character.id().clone();
        let _ = world.add_character(character);

        let console = Console::new();
        let mut human = HumanController::new(console.clone());
        assert_eq!(human.next_action(&world, &id, None), Action::suspend());
        assert_eq!(human.next_action(&world, &id, None), Action::suspend());
        assert_eq!(console.display(), "Inventory: hand\n> ");

        console.feed("walk nowhere");
        console.submit();
        assert_eq!(human.next_action(&world, &id, None), Action::walk("nowhere"));

        let err = ActionError::NotInteractable("rock".to_owned());
        assert_eq!(human.next_action(&world, &id, Some(&err)), Action::suspend());
        assert!(console.display().starts_with("Cannot interact with 'rock'"));
    }

    #[test]
    fn invalid_command_is_reported() {
        let world = World::new(4, 4);
        let id = CharacterId::new("red");
        let console = Console::new();
        let mut human = HumanController::new(console.clone());
        assert_eq!(human.next_action(&world, &id, None), Action::suspend());
        console.feed("jump");
        console.submit();
        assert_eq!(human.next_action(&world, &id, None), Action::suspend());
        assert!(console.display().contains("Invalid command"));
    }

    #[test]
    fn answers_wait_for_a_line() {
        let console = Console::new();
        let mut human = HumanController::new(console.clone());
        assert_eq!(human.answer("Where is the key?"), "");
        assert_eq!(human.answer("Where is the key?"), "");
        assert_eq!(console.display(), "Where is the key?\n> ");
        console.feed("Under the rock");
        console.submit();
        assert_eq!(human.answer("Where is the key?"), "Under the rock");
    }
}
