//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates are read from a directory when one is configured, so operators
//! can tune the wording without recompiling; otherwise the copies built into
//! the binary are used. Every call renders the `system` template plus one
//! call-specific template (`plan`, `execute`, `reevaluate`, `fix`) into a
//! [`RenderedPrompt`].

use std::path::Path;

use minijinja::{Environment, Value, context};

use crate::error::RunnerError;

/// Template names, in the order they are loaded.
const TEMPLATES: [(&str, &str); 5] = [
    ("system", include_str!("../templates/system.j2")),
    ("plan", include_str!("../templates/plan.j2")),
    ("execute", include_str!("../templates/execute.j2")),
    ("reevaluate", include_str!("../templates/reevaluate.j2")),
    ("fix", include_str!("../templates/fix.j2")),
];

/// Who wrote a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The prompt side.
    User,
    /// The model side.
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Author of the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

/// A rendered conversation ready to send to an LLM backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System message describing the world and the answer formats.
    pub system: String,
    /// Conversation so far; starts with the rendered request.
    pub messages: Vec<Message>,
}

impl RenderedPrompt {
    /// A conversation with a single user request.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            messages: vec![Message {
                role: Role::User,
                content: user.into(),
            }],
        }
    }

    /// Append the model's rejected answer and a corrective instruction.
    pub fn push_correction(&mut self, answer: impl Into<String>, instruction: impl Into<String>) {
        self.messages.push(Message {
            role: Role::Assistant,
            content: answer.into(),
        });
        self.messages.push(Message {
            role: Role::User,
            content: instruction.into(),
        });
    }
}

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Load every template from `dir`, or use the built-in copies.
    ///
    /// The directory must contain `system.j2`, `plan.j2`, `execute.j2`,
    /// `reevaluate.j2` and `fix.j2`.
    pub fn new(dir: Option<&Path>) -> Result<Self, RunnerError> {
        let mut env = Environment::new();
        for (name, builtin) in TEMPLATES {
            let source = match dir {
                Some(dir) => load_template(dir, name)?,
                None => builtin.to_owned(),
            };
            env.add_template_owned(name, source)
                .map_err(|e| RunnerError::Template(format!("failed to add {name} template: {e}")))?;
        }
        Ok(Self { env })
    }

    /// The built-in templates.
    pub fn builtin() -> Result<Self, RunnerError> {
        Self::new(None)
    }

    /// Ask for a task list achieving `goal`.
    pub fn plan(
        &self,
        context: &[String],
        inventory: &[String],
        goal: &str,
    ) -> Result<RenderedPrompt, RunnerError> {
        self.render("plan", context! { context, inventory, goal })
    }

    /// Ask for the action carrying out the head of `plan`.
    pub fn execute(
        &self,
        context: &[String],
        inventory: &[String],
        plan: &[String],
        memory: &[String],
    ) -> Result<RenderedPrompt, RunnerError> {
        let task = plan.first().map_or("", String::as_str);
        self.render(
            "execute",
            context! { context, inventory, plan, memory, task },
        )
    }

    /// Ask for the remaining task list after the last action.
    pub fn reevaluate(
        &self,
        context: &[String],
        memory: &[String],
        plan: &[String],
        goal: &str,
        error: Option<&str>,
    ) -> Result<RenderedPrompt, RunnerError> {
        self.render(
            "reevaluate",
            context! { context, memory, plan, goal, error },
        )
    }

    /// Ask for tasks dealing with a failed action.
    pub fn fix(
        &self,
        context: &[String],
        inventory: &[String],
        task: &str,
        action: &str,
        error: &str,
    ) -> Result<RenderedPrompt, RunnerError> {
        self.render(
            "fix",
            context! { context, inventory, task, action, error },
        )
    }

    fn render(&self, name: &str, ctx: Value) -> Result<RenderedPrompt, RunnerError> {
        let system = self.render_one("system", &ctx)?;
        let user = self.render_one(name, &ctx)?;
        Ok(RenderedPrompt::new(system.trim(), user.trim()))
    }

    fn render_one(&self, name: &str, ctx: &Value) -> Result<String, RunnerError> {
        self.env
            .get_template(name)
            .map_err(|e| RunnerError::Template(format!("missing {name} template: {e}")))?
            .render(ctx)
            .map_err(|e| RunnerError::Template(format!("{name} render failed: {e}")))
    }
}

/// Read a template file from disk.
fn load_template(dir: &Path, name: &str) -> Result<String, RunnerError> {
    let path = dir.join(format!("{name}.j2"));
    std::fs::read_to_string(&path)
        .map_err(|e| RunnerError::Template(format!("failed to read {}: {e}", path.display())))
}
