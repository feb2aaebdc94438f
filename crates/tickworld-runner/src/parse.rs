//! LLM response parsing into task lists and actions.
//!
//! Both parsers are strict about shape and lenient about decoration: a
//! response wrapped in a markdown code block, or JSON with trailing commas,
//! is accepted; a list with a missing or out-of-order number is not. A
//! rejection carries a message written for the model, so the caller can
//! send it back as a correction.

use serde::Deserialize;
use tickworld_core::Action;

use crate::error::RunnerError;

/// What a task-list answer may contain besides numbered tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPolicy {
    /// At least one task is required.
    NonEmpty,
    /// `DONE` or an empty answer stands for an empty list.
    AllowDone,
}

/// Instruction sent back when a task list is rejected.
pub const LIST_CORRECTION: &str = "Answer only with a numbered list: one task per line, \
numbered 1., 2., 3. and so on, with no other text.";

/// Instruction sent back when an action is rejected.
pub const ACTION_CORRECTION: &str = "Answer only with one JSON object such as \
{\"action\": \"walk\", \"target\": \"door\"}, \
{\"action\": \"interact\", \"item\": \"key\", \"target\": \"door\"} or \
{\"action\": \"ask\", \"target\": \"blue\", \"question\": \"Where is the key?\"}.";

/// Parse a numbered task list.
///
/// Every non-blank line must read `<n>. <task>` (or `<n>) <task>`) with `n`
/// counting up from 1.
pub fn parse_task_list(raw: &str, policy: ListPolicy) -> Result<Vec<String>, RunnerError> {
    let text = extract_codeblock(raw).unwrap_or(raw).trim();

    if text.is_empty() || is_done(text) {
        return match policy {
            ListPolicy::AllowDone => Ok(Vec::new()),
            ListPolicy::NonEmpty => Err(RunnerError::Parse(
                "expected at least one task".to_owned(),
            )),
        };
    }

    let mut tasks = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let expected = tasks.len().saturating_add(1);
        let task = numbered_item(line, expected).ok_or_else(|| {
            RunnerError::Parse(format!("expected task {expected}, found '{line}'"))
        })?;
        tasks.push(task.to_owned());
    }
    Ok(tasks)
}

fn is_done(text: &str) -> bool {
    text.trim_end_matches('.').eq_ignore_ascii_case("done")
}

/// The text of `line` if it is item number `expected`.
fn numbered_item(line: &str, expected: usize) -> Option<&str> {
    let digits = line.find(|c: char| !c.is_ascii_digit())?;
    let number: usize = line.get(..digits)?.parse().ok()?;
    let rest = line.get(digits..)?;
    let task = rest
        .strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))?
        .trim();
    (number == expected && !task.is_empty()).then_some(task)
}

/// The JSON shape of an action answer.
#[derive(Debug, Deserialize)]
struct RawAction {
    action: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    item: Option<String>,
    #[serde(default)]
    question: Option<String>,
}

/// Parse an action answer.
///
/// Attempts several recovery strategies before giving up:
/// 1. Direct deserialization
/// 2. The contents of a markdown code block
/// 3. The outermost `{ ... }` span of the text
///
/// Each candidate is also retried with trailing commas stripped.
pub fn parse_action(raw: &str) -> Result<Action, RunnerError> {
    let trimmed = raw.trim();
    let candidates = [
        Some(trimmed),
        extract_codeblock(trimmed),
        outermost_object(trimmed),
    ];

    let mut last_error = None;
    for candidate in candidates.into_iter().flatten() {
        let parsed = serde_json::from_str::<RawAction>(candidate)
            .or_else(|_| serde_json::from_str::<RawAction>(&strip_trailing_commas(candidate)));
        match parsed {
            Ok(raw_action) => return convert_action(raw_action),
            Err(e) => last_error = Some(e),
        }
    }

    Err(RunnerError::Parse(last_error.map_or_else(
        || "empty answer".to_owned(),
        |e| format!("answer is not an action object: {e}"),
    )))
}

fn convert_action(raw: RawAction) -> Result<Action, RunnerError> {
    let field = |value: Option<String>, name: &str| {
        value
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                RunnerError::Parse(format!("'{}' requires a '{name}' field", raw.action))
            })
    };

    match raw.action.trim().to_lowercase().as_str() {
        "walk" | "move" => Ok(Action::walk(field(raw.target, "target")?)),
        "interact" | "use" => Ok(Action::interact(
            field(raw.item, "item")?,
            field(raw.target, "target")?,
        )),
        "ask" => Ok(Action::ask(
            field(raw.target, "target")?,
            field(raw.question, "question")?,
        )),
        other => Err(RunnerError::Parse(format!(
            "unknown action '{other}', expected walk, interact or ask"
        ))),
    }
}

/// The contents of the first markdown code block, language tag dropped.
fn extract_codeblock(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = text.get(open.checked_add(3)?..)?;
    let body_start = after_fence.find('\n')?.checked_add(1)?;
    let body = after_fence.get(body_start..)?;
    let close = body.find("```")?;
    body.get(..close).map(str::trim)
}

/// The span from the first `{` to the last `}`.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| text.get(start..=end)).flatten()
}

/// Strip trailing commas before closing braces and brackets.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ',' {
            let rest = chars.clone().find(|n| !n.is_whitespace());
            if matches!(rest, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}
