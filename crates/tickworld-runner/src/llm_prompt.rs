//! The LLM-backed decision source.
//!
//! [`LlmPrompt`] renders a template, sends it to a [`Completion`] source and
//! parses the answer. An answer that does not parse is sent back together
//! with a corrective instruction, up to `max_corrections` times; after that
//! the call fails with [`PromptError::Malformed`] and the caller's retry
//! policy takes over.

use std::fmt;

use futures::FutureExt;
use futures::future::BoxFuture;
use tickworld_core::{Action, Prompt, PromptError, TurnMemory};
use tracing::{debug, warn};

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::llm::LlmBackend;
use crate::parse::{
    ACTION_CORRECTION, LIST_CORRECTION, ListPolicy, parse_action, parse_task_list,
};
use crate::prompt::{PromptEngine, RenderedPrompt};

/// Anything that turns a conversation into a completion.
pub trait Completion: Send + Sync {
    /// The text of the next assistant message.
    fn complete<'a>(
        &'a self,
        prompt: &'a RenderedPrompt,
    ) -> BoxFuture<'a, Result<String, RunnerError>>;
}

impl Completion for LlmBackend {
    fn complete<'a>(
        &'a self,
        prompt: &'a RenderedPrompt,
    ) -> BoxFuture<'a, Result<String, RunnerError>> {
        Self::complete(self, prompt).boxed()
    }
}

/// A [`Prompt`] answered by a language model.
pub struct LlmPrompt<C = LlmBackend> {
    completion: C,
    engine: PromptEngine,
    max_corrections: u32,
}

impl<C> fmt::Debug for LlmPrompt<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmPrompt")
            .field("max_corrections", &self.max_corrections)
            .finish_non_exhaustive()
    }
}

impl LlmPrompt {
    /// Build the backend and templates described by `config`.
    pub fn from_config(config: &RunnerConfig) -> Result<Self, RunnerError> {
        let engine = PromptEngine::new(config.templates_dir.as_deref())?;
        let backend = LlmBackend::new(config)?;
        debug!(
            backend = backend.name(),
            model = %config.backend.model,
            "LLM prompt configured"
        );
        Ok(Self::new(backend, engine, config.max_corrections))
    }
}

impl<C: Completion> LlmPrompt<C> {
    /// A prompt over any completion source.
    pub const fn new(completion: C, engine: PromptEngine, max_corrections: u32) -> Self {
        Self {
            completion,
            engine,
            max_corrections,
        }
    }

    /// Send `prompt` until `parse` accepts the answer or corrections run out.
    async fn converse<T>(
        &self,
        call: &'static str,
        mut prompt: RenderedPrompt,
        correction: &str,
        parse: impl Fn(&str) -> Result<T, RunnerError> + Send,
    ) -> Result<T, PromptError> {
        let mut corrections: u32 = 0;
        loop {
            let answer = self.completion.complete(&prompt).await?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(err) if corrections < self.max_corrections => {
                    corrections = corrections.saturating_add(1);
                    warn!(call, corrections, error = %err, "malformed LLM answer, correcting");
                    prompt.push_correction(answer, format!("{err}. {correction}"));
                }
                Err(err) => {
                    warn!(call, corrections, error = %err, "malformed LLM answer, giving up");
                    return Err(PromptError::Malformed(format!("{call}: {err}")));
                }
            }
        }
    }
}

impl<C: Completion> Prompt for LlmPrompt<C> {
    fn plan<'a>(
        &'a self,
        context: &'a [String],
        inventory: &'a [String],
        goal: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, PromptError>> {
        async move {
            let prompt = self.engine.plan(context, inventory, goal)?;
            self.converse("plan", prompt, LIST_CORRECTION, |raw| {
                parse_task_list(raw, ListPolicy::NonEmpty)
            })
            .await
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
            let prompt = self
                .engine
                .execute(context, inventory, plan, memory.notes())?;
            let action = self
                .converse("execute", prompt, ACTION_CORRECTION, parse_action)
                .await?;
            let mut memory = memory.clone();
            if let Some(task) = plan.first() {
                memory.push(format!("For '{task}' I chose '{action}'"));
            }
            Ok((memory, action))
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
            let prompt = self
                .engine
                .reevaluate(context, memory.notes(), plan, goal, error)?;
            self.converse("reevaluate", prompt, LIST_CORRECTION, |raw| {
                parse_task_list(raw, ListPolicy::AllowDone)
            })
            .await
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
            let prompt = self.engine.fix(context, inventory, task, action, error)?;
            self.converse("fix", prompt, LIST_CORRECTION, |raw| {
                parse_task_list(raw, ListPolicy::AllowDone)
            })
            .await
        }
        .boxed()
    }
}
