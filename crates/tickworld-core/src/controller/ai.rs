//! AI orchestration: plan, execute, reevaluate.
//!
//! An [`AiController`] keeps a task list (the plan) and a [`TurnMemory`]. A
//! *turn* turns the outcome of the last action into the next one by calling
//! the external [`Prompt`]:
//!
//! - the first turn asks for a plan;
//! - a path blocked by a removable object asks for a fix, whose tasks are
//!   put in front of the plan;
//! - every other outcome asks for a reevaluation, which replaces the plan;
//! - an empty plan while the goal is unmet forces one more reevaluation,
//!   and so does the turn after a failed one (which keeps the plan it had
//!   reached when it failed);
//! - finally the head task is executed into an [`Action`].
//!
//! Turns are slow, so they run as tasks on a tokio runtime. The controller
//! hands out [`Action::suspend`] while a turn is in flight and polls the
//! turn's result channel on every tick without blocking. Context is
//! gathered from the [`Database`] on the simulation thread before the turn
//! is spawned; the turn owns copies of everything it reads.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, error, info, warn};

use crate::action::Action;
use crate::controller::NON_ANSWER;
use crate::error::{ActionError, PromptError};
use crate::ids::CharacterId;
use crate::interaction::GoalFlag;
use crate::retry::{RetryError, RetryPolicy, retry};
use crate::world::World;

/// Reevaluation error used when the plan ran dry before the goal was met.
pub const EXHAUSTED_PLAN: &str = "There are no tasks left, but the goal has not been achieved.";

/// Notes kept between turns, oldest first.
const MAX_NOTES: usize = 64;

/// What the agent remembers between turns.
///
/// Opaque to the controller: the [`Prompt`] decides what goes in, the
/// controller only appends action outcomes and answers it received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnMemory {
    notes: Vec<String>,
}

impl TurnMemory {
    /// An empty memory.
    pub const fn new() -> Self {
        Self { notes: Vec::new() }
    }

    /// Append a note, forgetting the oldest once full.
    pub fn push(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
        if self.notes.len() > MAX_NOTES {
            let excess = self.notes.len().saturating_sub(MAX_NOTES);
            self.notes.drain(..excess);
        }
    }

    /// All notes, oldest first.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Whether nothing has been remembered yet.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Source of context for a turn.
pub trait Database {
    /// Context relevant to `task`, most relevant first.
    fn query(&self, world: &World, task: &str, error: Option<&ActionError>) -> Vec<String>;
}

/// A [`Database`] that returns everything: every rule, every object and
/// every other character.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBook;

impl Database for RuleBook {
    fn query(&self, world: &World, _task: &str, _error: Option<&ActionError>) -> Vec<String> {
        let rules = world.interactions().map(|(_, rule)| rule.rule());
        let objects = world
            .objects()
            .map(|o| format!("There is a '{}' named '{}'.", o.kind(), o.id()));
        let characters = world
            .characters()
            .map(|c| format!("There is a character named '{}'.", c.id()));
        rules.chain(objects).chain(characters).collect()
    }
}

/// The external decision source.
///
/// Implementations are called from spawned turn tasks, so they and their
/// futures must be `Send`.
pub trait Prompt: Send + Sync {
    /// Break the goal into an ordered task list.
    fn plan<'a>(
        &'a self,
        context: &'a [String],
        inventory: &'a [String],
        goal: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, PromptError>>;

    /// Turn the head of the plan into an action, updating memory.
    fn execute<'a>(
        &'a self,
        context: &'a [String],
        inventory: &'a [String],
        plan: &'a [String],
        memory: &'a TurnMemory,
    ) -> BoxFuture<'a, Result<(TurnMemory, Action), PromptError>>;

    /// Produce the remaining task list after the last action.
    fn reevaluate<'a>(
        &'a self,
        context: &'a [String],
        memory: &'a TurnMemory,
        plan: &'a [String],
        goal: &'a str,
        error: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<String>, PromptError>>;

    /// Tasks that deal with whatever made `action` fail for `task`.
    fn fix<'a>(
        &'a self,
        context: &'a [String],
        inventory: &'a [String],
        task: &'a str,
        action: &'a str,
        error: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, PromptError>>;
}

/// What an [`AiController`] is doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiStatus {
    /// No turn in flight.
    Idle,
    /// A turn is waiting on the decision source.
    InFlight,
    /// Too many turns failed; the controller has given up.
    Stalled(String),
}

/// Which prompt starts a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TurnKind {
    Plan,
    Reevaluate { error: Option<String> },
    Fix { task: String, action: String, error: String },
    Exhausted,
}

impl TurnKind {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Reevaluate { .. } => "reevaluate",
            Self::Fix { .. } => "fix",
            Self::Exhausted => "exhausted",
        }
    }
}

/// Everything a turn reads, owned so the turn can run on another thread.
#[derive(Debug)]
struct TurnInput {
    kind: TurnKind,
    context: Vec<String>,
    inventory: Vec<String>,
    plan: Vec<String>,
    memory: TurnMemory,
    goal: String,
}

#[derive(Debug)]
struct TurnOutput {
    plan: Vec<String>,
    memory: TurnMemory,
    action: Option<Action>,
}

/// A turn that ran out of retries, with the plan it had reached.
#[derive(Debug)]
struct TurnFailure {
    plan: Vec<String>,
    error: RetryError<PromptError>,
}

type TurnResult = Result<TurnOutput, TurnFailure>;

/// Attach the current plan to a failed call.
fn keep_plan<T>(
    result: Result<T, RetryError<PromptError>>,
    plan: &[String],
) -> Result<T, TurnFailure> {
    result.map_err(|error| TurnFailure {
        plan: plan.to_vec(),
        error,
    })
}

/// Drives a character from a goal through an external [`Prompt`].
pub struct AiController {
    goal: String,
    flag: GoalFlag,
    prompt: Arc<dyn Prompt>,
    database: Box<dyn Database>,
    runtime: Handle,
    policy: RetryPolicy,
    max_failed_turns: u32,
    plan: Vec<String>,
    memory: TurnMemory,
    pending: Option<oneshot::Receiver<TurnResult>>,
    last_action: Option<Action>,
    planned: bool,
    recover: bool,
    failed_turns: u32,
    stalled: Option<String>,
}

impl fmt::Debug for AiController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiController")
            .field("goal", &self.goal)
            .field("plan", &self.plan)
            .field("in_flight", &self.pending.is_some())
            .field("failed_turns", &self.failed_turns)
            .field("stalled", &self.stalled)
            .finish_non_exhaustive()
    }
}

impl AiController {
    /// A controller pursuing `goal` until `flag` is raised.
    ///
    /// Turns are spawned on `runtime`.
    pub fn new(
        goal: impl Into<String>,
        flag: GoalFlag,
        prompt: Arc<dyn Prompt>,
        database: impl Database + 'static,
        runtime: Handle,
    ) -> Self {
        Self {
            goal: goal.into(),
            flag,
            prompt,
            database: Box::new(database),
            runtime,
            policy: RetryPolicy::default(),
            max_failed_turns: 3,
            plan: Vec::new(),
            memory: TurnMemory::new(),
            pending: None,
            last_action: None,
            planned: false,
            recover: false,
            failed_turns: 0,
            stalled: None,
        }
    }

    /// Use this retry policy for every external call.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stall after this many consecutive failed turns.
    #[must_use]
    pub fn with_max_failed_turns(mut self, max_failed_turns: u32) -> Self {
        self.max_failed_turns = max_failed_turns.max(1);
        self
    }

    /// The goal.
    pub fn goal(&self) -> &str {
        &self.goal
    }

    /// Remaining tasks, next first.
    pub fn plan(&self) -> &[String] {
        &self.plan
    }

    /// Memory carried between turns.
    pub const fn memory(&self) -> &TurnMemory {
        &self.memory
    }

    /// Consecutive failed turns.
    pub const fn failed_turns(&self) -> u32 {
        self.failed_turns
    }

    /// Current activity.
    pub fn status(&self) -> AiStatus {
        if let Some(reason) = &self.stalled {
            AiStatus::Stalled(reason.clone())
        } else if self.pending.is_some() {
            AiStatus::InFlight
        } else {
            AiStatus::Idle
        }
    }

    pub(crate) fn next_action(
        &mut self,
        world: &World,
        id: &CharacterId,
        error: Option<&ActionError>,
    ) -> Action {
        if self.stalled.is_some() {
            return Action::idle();
        }
        if self.flag.is_set() {
            self.pending = None;
            info!(character = %id, goal = %self.goal, "goal fulfilled");
            return Action::idle();
        }

        if let Some(pending) = self.pending.as_mut() {
            let result = match pending.try_recv() {
                Err(TryRecvError::Empty) => return Action::suspend(),
                Err(TryRecvError::Closed) => Err(TurnFailure {
                    plan: self.plan.clone(),
                    error: RetryError::Permanent(PromptError::Transport(
                        "turn task ended without a result".to_owned(),
                    )),
                }),
                Ok(result) => result,
            };
            self.pending = None;
            return self.finish_turn(id, result);
        }

        self.start_turn(world, id, error);
        Action::suspend()
    }

    pub(crate) fn answer(&mut self, _question: &str) -> String {
        NON_ANSWER.to_owned()
    }

    fn start_turn(&mut self, world: &World, id: &CharacterId, error: Option<&ActionError>) {
        let last = self.last_action.take();
        if let Some(last) = &last {
            let outcome = error.map_or_else(|| "succeeded".to_owned(), |e| format!("failed: {e}"));
            self.memory.push(format!("'{last}' {outcome}"));
            if let (Action::Ask { target, .. }, None) = (last, error)
                && let Some(answer) = world.character(id.as_str()).and_then(|c| c.last_answer())
            {
                self.memory.push(format!("'{target}' answered: {answer}"));
            }
        }

        let kind = if self.recover {
            TurnKind::Exhausted
        } else if !self.planned {
            TurnKind::Plan
        } else if let (Some(error), Some(last)) = (error.filter(|e| e.blocker().is_some()), &last) {
            TurnKind::Fix {
                task: self.plan.first().cloned().unwrap_or_else(|| self.goal.clone()),
                action: last.to_string(),
                error: error.to_string(),
            }
        } else {
            TurnKind::Reevaluate {
                error: error.map(ToString::to_string),
            }
        };

        let task = self.plan.first().map_or(self.goal.as_str(), String::as_str);
        let context = self.database.query(world, task, error);
        let inventory: Vec<String> = world
            .character(id.as_str())
            .map(|c| c.inventory().iter().cloned().collect())
            .unwrap_or_default();

        info!(character = %id, turn = kind.as_str(), tasks = self.plan.len(), "AI turn started");
        let input = TurnInput {
            kind,
            context,
            inventory,
            plan: self.plan.clone(),
            memory: self.memory.clone(),
            goal: self.goal.clone(),
        };

        let (tx, rx) = oneshot::channel();
        let prompt = Arc::clone(&self.prompt);
        let policy = self.policy;
        let character = id.clone();
        self.runtime.spawn(async move {
            let result = run_turn(prompt.as_ref(), &policy, input).await;
            if tx.send(result).is_err() {
                debug!(character = %character, "turn result discarded");
            }
        });
        self.pending = Some(rx);
    }

    fn finish_turn(&mut self, id: &CharacterId, result: TurnResult) -> Action {
        match result {
            Ok(output) => {
                self.plan = output.plan;
                self.memory = output.memory;
                self.planned = true;
                self.recover = false;
                self.failed_turns = 0;
                match output.action {
                    Some(action) => {
                        info!(character = %id, %action, tasks = self.plan.len(), "AI turn finished");
                        self.last_action = Some(action.clone());
                        action
                    }
                    None => {
                        warn!(character = %id, "AI turn produced no tasks");
                        Action::suspend()
                    }
                }
            }
            Err(TurnFailure { plan, error: err }) => {
                self.plan = plan;
                self.failed_turns = self.failed_turns.saturating_add(1);
                self.recover = true;
                error!(
                    character = %id,
                    failed_turns = self.failed_turns,
                    tasks = self.plan.len(),
                    error = %err,
                    "AI turn failed"
                );
                if self.failed_turns >= self.max_failed_turns {
                    error!(character = %id, "AI controller stalled");
                    self.stalled = Some(err.to_string());
                    Action::idle()
                } else {
                    Action::suspend()
                }
            }
        }
    }
}

/// Run one turn against the decision source, retrying every call.
async fn run_turn(prompt: &dyn Prompt, policy: &RetryPolicy, input: TurnInput) -> TurnResult {
    let TurnInput {
        kind,
        context,
        inventory,
        mut plan,
        memory,
        goal,
    } = input;

    match &kind {
        TurnKind::Plan => {
            plan = keep_plan(
                retry(policy, "plan", |_| prompt.plan(&context, &inventory, &goal)).await,
                &plan,
            )?;
        }
        TurnKind::Reevaluate { error } => {
            plan = keep_plan(
                retry(policy, "reevaluate", |_| {
                    prompt.reevaluate(&context, &memory, &plan, &goal, error.as_deref())
                })
                .await,
                &plan,
            )?;
        }
        TurnKind::Fix {
            task,
            action,
            error,
        } => {
            let mut fixes = keep_plan(
                retry(policy, "fix", |_| prompt.fix(&context, &inventory, task, action, error))
                    .await,
                &plan,
            )?;
            fixes.append(&mut plan);
            plan = fixes;
        }
        TurnKind::Exhausted => {}
    }

    // A failed turn recovers through the same reevaluation as a plan that ran dry.
    if kind == TurnKind::Exhausted || plan.is_empty() {
        plan = keep_plan(
            retry(policy, "reevaluate", |_| {
                prompt.reevaluate(&context, &memory, &plan, &goal, Some(EXHAUSTED_PLAN))
            })
            .await,
            &plan,
        )?;
    }
    if plan.is_empty() {
        return Ok(TurnOutput {
            plan,
            memory,
            action: None,
        });
    }

    let (memory, action) = keep_plan(
        retry(policy, "execute", |_| {
            prompt.execute(&context, &inventory, &plan, &memory)
        })
        .await,
        &plan,
    )?;
    Ok(TurnOutput {
        plan,
        memory,
        action: Some(action),
    })
}
