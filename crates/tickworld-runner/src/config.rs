//! Configuration for the LLM runner.
//!
//! All configuration is loaded from environment variables: which backend to
//! talk to, how to authenticate, and how patient to be with it.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::RunnerError;

/// Default per-request deadline.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

/// Default number of corrective re-prompts per call.
const DEFAULT_MAX_CORRECTIONS: u32 = 2;

/// Complete runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// The LLM backend to call.
    pub backend: LlmBackendConfig,
    /// Deadline for a single HTTP request.
    pub request_timeout: Duration,
    /// How many times a malformed answer is sent back for correction.
    pub max_corrections: u32,
    /// Directory holding prompt templates; built-in templates otherwise.
    pub templates_dir: Option<PathBuf>,
}

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The wire format the backend speaks.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
}

/// Supported LLM wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions (`OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    /// Parse a backend name as written in `LLM_BACKEND`.
    pub fn parse(name: &str) -> Result<Self, RunnerError> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(RunnerError::Config(format!("unknown backend type: {other}"))),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from the process environment.
    ///
    /// Required variables:
    /// - `LLM_BACKEND` -- `openai`, `deepseek`, `ollama`, `anthropic` or `claude`
    /// - `LLM_API_URL` -- API base URL
    /// - `LLM_API_KEY` -- API key
    /// - `LLM_MODEL` -- model name
    ///
    /// Optional variables:
    /// - `LLM_REQUEST_TIMEOUT_MS` -- per-request deadline (default 15000)
    /// - `LLM_MAX_CORRECTIONS` -- corrective re-prompts per call (default 2)
    /// - `TEMPLATES_DIR` -- prompt template directory (default: built-in)
    pub fn from_env() -> Result<Self, RunnerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RunnerError> {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| RunnerError::Config(format!("missing required env var {name}")))
        };

        let backend = LlmBackendConfig {
            backend_type: BackendType::parse(&required("LLM_BACKEND")?)?,
            api_url: required("LLM_API_URL")?.trim_end_matches('/').to_owned(),
            api_key: required("LLM_API_KEY")?,
            model: required("LLM_MODEL")?,
        };

        let request_timeout_ms: u64 = lookup("LLM_REQUEST_TIMEOUT_MS")
            .map_or(Ok(DEFAULT_REQUEST_TIMEOUT_MS), |v| v.trim().parse())
            .map_err(|e| RunnerError::Config(format!("invalid LLM_REQUEST_TIMEOUT_MS: {e}")))?;

        let max_corrections: u32 = lookup("LLM_MAX_CORRECTIONS")
            .map_or(Ok(DEFAULT_MAX_CORRECTIONS), |v| v.trim().parse())
            .map_err(|e| RunnerError::Config(format!("invalid LLM_MAX_CORRECTIONS: {e}")))?;

        let templates_dir = lookup("TEMPLATES_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            backend,
            request_timeout: Duration::from_millis(request_timeout_ms),
            max_corrections,
            templates_dir,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("LLM_BACKEND", "Claude"),
        ("LLM_API_URL", "https://api.anthropic.com/v1/"),
        ("LLM_API_KEY", "sk-test"),
        ("LLM_MODEL", "small-model"),
    ];

    #[test]
    fn required_variables_with_defaults() {
        let config = RunnerConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.backend.backend_type, BackendType::Anthropic);
        assert_eq!(config.backend.api_url, "https://api.anthropic.com/v1");
        assert_eq!(config.request_timeout, Duration::from_millis(15_000));
        assert_eq!(config.max_corrections, 2);
        assert!(config.templates_dir.is_none());
    }

    #[test]
    fn optional_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("LLM_BACKEND", "ollama"),
            ("LLM_REQUEST_TIMEOUT_MS", "500"),
            ("LLM_MAX_CORRECTIONS", "0"),
            ("TEMPLATES_DIR", "/srv/templates"),
        ]);
        let config = RunnerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.backend.backend_type, BackendType::OpenAi);
        assert_eq!(config.request_timeout, Duration::from_millis(500));
        assert_eq!(config.max_corrections, 0);
        assert_eq!(config.templates_dir, Some(PathBuf::from("/srv/templates")));
    }

    #[test]
    fn missing_or_invalid_values_are_config_errors() {
        let partial: Vec<_> = REQUIRED.iter().copied().take(3).collect();
        let err = RunnerConfig::from_lookup(lookup(&partial)).unwrap_err();
        assert!(err.to_string().contains("LLM_MODEL"));

        let mut vars = REQUIRED.to_vec();
        vars.push(("LLM_BACKEND", "carrier-pigeon"));
        assert!(matches!(
            RunnerConfig::from_lookup(lookup(&vars)),
            Err(RunnerError::Config(_))
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("LLM_MAX_CORRECTIONS", "many"));
        assert!(matches!(
            RunnerConfig::from_lookup(lookup(&vars)),
            Err(RunnerError::Config(_))
        ));
    }
}
