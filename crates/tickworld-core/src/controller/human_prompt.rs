//! A [`Prompt`] answered by a person.
//!
//! Stands in for a language model so the AI turn flow can be stepped through
//! by hand. Every call prints what the model would see to a [`LineInput`]
//! and polls it for lines: task lists are entered one task per line and
//! ended with an empty line, actions use the same commands as the
//! [`HumanController`](super::HumanController).

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::debug;

use crate::action::Action;
use crate::controller::ai::{Prompt, TurnMemory};
use crate::controller::human::{LineInput, parse_command};
use crate::error::PromptError;

/// How often the input is checked for a submitted line.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Asks a person to plan, act and reevaluate.
#[derive(Debug)]
pub struct HumanPrompt<I> {
    input: Mutex<I>,
}

impl<I: LineInput + Send> HumanPrompt<I> {
    /// A prompt reading from `input`.
    pub const fn new(input: I) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }

    fn input(&self) -> MutexGuard<'_, I> {
        self.input.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn show(&self, lines: &[String]) {
        let mut input = self.input();
        for line in lines {
            input.print(line);
            input.print("\n");
        }
    }

    async fn read_line(&self) -> String {
        loop {
            let line = self.input().accept();
            if let Some(line) = line {
                return line;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Lines until the first empty one.
    async fn read_tasks(&self) -> Vec<String> {
        self.show(&["Enter tasks, one per line. Enter an empty line to finish.".to_owned()]);
        let mut tasks = Vec::new();
        loop {
            let line = self.read_line().await;
            let task = line.trim();
            if task.is_empty() {
                return tasks;
            }
            tasks.push(task.to_owned());
        }
    }

    async fn read_action(&self) -> Action {
        self.show(&["Enter action:".to_owned()]);
        loop {
            match parse_command(&self.read_line().await) {
                Ok(action) => return action,
                Err(usage) => self.show(&[usage]),
            }
        }
    }
}

fn situation(context: &[String], inventory: &[String]) -> Vec<String> {
    vec![
        format!("Context: {}", context.join(" | ")),
        format!("Inventory: {}", inventory.join(", ")),
    ]
}

impl<I: LineInput + Send> Prompt for HumanPrompt<I> {
    fn plan<'a>(
        &'a self,
        context: &'a [String],
        inventory: &'a [String],
        goal: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, PromptError>> {
        async move {
            let mut lines = situation(context, inventory);
            lines.push(format!("Goal: {goal}"));
            self.show(&lines);
            let tasks = self.read_tasks().await;
            debug!(tasks = tasks.len(), "plan entered");
            Ok(tasks)
        }
        .boxed()
    }

    fn execute<'a>(
        &'a self,
        context: &'a [String],
        inventory: &'a [String],
        plan: &'a [String],
        memory: &'a TurnMemory,
    ) -> BoxFuture<'a, Result<(TurnMemory, Action), PromptError>> {
        async move {
            let mut lines = situation(context, inventory);
            lines.push(format!(
                "Task: {}",
                plan.first().map_or("(none)", String::as_str)
            ));
            self.show(&lines);
            let action = self.read_action().await;
            debug!(%action, "action entered");
            Ok((memory.clone(), action))
        }
        .boxed()
    }

    fn reevaluate<'a>(
        &'a self,
        context: &'a [String],
        memory: &'a TurnMemory,
        plan: &'a [String],
        goal: &'a str,
        error: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<String>, PromptError>> {
        async move {
            let lines = vec![
                format!("Context: {}", context.join(" | ")),
                format!("Memory: {}", memory.notes().join(" | ")),
                format!("Plan: {}", plan.join(" | ")),
                format!("Goal: {goal}"),
                error.map_or_else(
                    || "The last action succeeded.".to_owned(),
                    |error| format!("Error: {error}"),
                ),
            ];
            self.show(&lines);
            Ok(self.read_tasks().await)
        }
        .boxed()
    }

    fn fix<'a>(
        &'a self,
        context: &'a [String],
        inventory: &'a [String],
        task: &'a str,
        action: &'a str,
        error: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, PromptError>> {
        async move {
            let mut lines = situation(context, inventory);
            lines.push(format!("Task: {task}"));
            lines.push(format!("Action: {action}"));
            lines.push(format!("Error: {error}"));
            self.show(&lines);
            Ok(self.read_tasks().await)
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::controller::Console;

    /// Wait for the prompt to ask for a line, then type it.
    async fn type_line(console: &Console, text: &str) -> String {
        while !console.waiting() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let shown = console.display();
        console.feed(text);
        console.submit();
        shown
    }

    #[tokio::test(start_paused = true)]
    async fn plan_reads_tasks_until_an_empty_line() {
        let console = Console::new();
        let prompt = Arc::new(HumanPrompt::new(console.clone()));
        let task = tokio::spawn({
            let prompt = Arc::clone(&prompt);
            async move {
                prompt
                    .plan(&["There is a 'door' named 'door'.".to_owned()], &[], "Open the door")
                    .await
            }
        });

        let shown = type_line(&console, "Find the key").await;
        assert!(shown.contains("Goal: Open the door"));
        assert!(shown.contains("one per line"));
        type_line(&console, "Open the door").await;
        type_line(&console, "").await;

        assert_eq!(
            task.await.unwrap().unwrap(),
            vec!["Find the key".to_owned(), "Open the door".to_owned()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn execute_repeats_until_the_command_parses() {
        let console = Console::new();
        let prompt = Arc::new(HumanPrompt::new(console.clone()));
        let task = tokio::spawn({
            let prompt = Arc::clone(&prompt);
            async move {
                let mut memory = TurnMemory::new();
                memory.push("'walk key' succeeded");
                prompt
                    .execute(&[], &["key".to_owned()], &["Open the door".to_owned()], &memory)
                    .await
            }
        });

        let shown = type_line(&console, "dance").await;
        assert!(shown.contains("Task: Open the door"));
        assert!(shown.contains("Inventory: key"));
        let shown = type_line(&console, "interact key door").await;
        assert!(shown.contains("Invalid command"));

        let (memory, action) = task.await.unwrap().unwrap();
        assert_eq!(action, Action::interact("key", "door"));
        assert_eq!(memory.notes(), ["'walk key' succeeded".to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn fix_shows_the_failure() {
        let console = Console::new();
        let prompt = Arc::new(HumanPrompt::new(console.clone()));
        let task = tokio::spawn({
            let prompt = Arc::clone(&prompt);
            async move {
                prompt
                    .fix(
                        &[],
                        &[],
                        "Touch the goal",
                        "walk goal",
                        "Cannot reach 'goal' because 'door' is blocking the path",
                    )
                    .await
            }
        });

        let shown = type_line(&console, "Open the door").await;
        assert!(shown.contains("Action: walk goal"));
        assert!(shown.contains("Error: Cannot reach 'goal'"));
        type_line(&console, "").await;

        assert_eq!(task.await.unwrap().unwrap(), vec!["Open the door".to_owned()]);
    }
}
