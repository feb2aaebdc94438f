//! Error types for the LLM runner.
//!
//! [`RunnerError`] covers configuration, HTTP plumbing, templates and
//! response parsing. Everything leaving the crate through the `Prompt`
//! trait is converted into a core [`PromptError`] so the AI controller can
//! decide whether to retry.

use tickworld_core::PromptError;

/// Errors that can occur while talking to an LLM backend.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Failed to load or render a prompt template.
    #[error("template error: {0}")]
    Template(String),

    /// The backend could not be reached or returned a failure status.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// The backend answered 429.
    #[error("LLM backend rate limited: {0}")]
    RateLimited(String),

    /// The request exceeded its deadline.
    #[error("LLM request timed out: {0}")]
    Timeout(String),

    /// The response did not have the expected shape.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<RunnerError> for PromptError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::Config(msg) => Self::Config(msg),
            RunnerError::Template(msg) => Self::Template(msg),
            RunnerError::LlmBackend(msg) => Self::Transport(msg),
            RunnerError::RateLimited(msg) => Self::RateLimited(msg),
            RunnerError::Timeout(msg) => Self::Timeout(msg),
            RunnerError::Parse(msg) => Self::Malformed(msg),
            RunnerError::Serde(e) => Self::Malformed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_keeps_retry_semantics() {
        assert!(PromptError::from(RunnerError::RateLimited("429".to_owned())).is_transient());
        assert!(PromptError::from(RunnerError::Timeout("15s".to_owned())).is_transient());
        assert!(PromptError::from(RunnerError::LlmBackend("502".to_owned())).is_transient());
        assert!(!PromptError::from(RunnerError::Config("no key".to_owned())).is_transient());
        assert!(!PromptError::from(RunnerError::Template("bad".to_owned())).is_transient());
        assert_eq!(
            PromptError::from(RunnerError::Parse("no list".to_owned())),
            PromptError::Malformed("no list".to_owned())
        );
    }
}
