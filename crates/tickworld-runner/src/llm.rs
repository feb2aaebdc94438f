//! LLM backend abstraction and implementations.
//!
//! Enum dispatch over the supported wire formats: `OpenAI`-compatible chat
//! completions and the Anthropic Messages API. Both go over HTTP via
//! `reqwest` and return the raw text of the first completion; parsing that
//! text is the caller's job.
//!
//! HTTP failures are classified so the retry layer can tell them apart:
//! 429 is [`RunnerError::RateLimited`], an expired deadline is
//! [`RunnerError::Timeout`], a response without text is
//! [`RunnerError::Parse`], anything else is [`RunnerError::LlmBackend`].

use serde_json::{Value, json};
use tracing::debug;

use crate::config::{BackendType, RunnerConfig};
use crate::error::RunnerError;
use crate::prompt::{RenderedPrompt, Role};

/// Completion length cap sent with every request.
const MAX_TOKENS: u32 = 1024;

/// An LLM backend that turns a conversation into a completion.
pub enum LlmBackend {
    /// `OpenAI`-compatible chat completions API.
    OpenAi(HttpBackend),
    /// Anthropic Messages API.
    Anthropic(HttpBackend),
}

impl LlmBackend {
    /// Build the backend described by `config`.
    pub fn new(config: &RunnerConfig) -> Result<Self, RunnerError> {
        let http = HttpBackend::new(config)?;
        Ok(match config.backend.backend_type {
            BackendType::OpenAi => Self::OpenAi(http),
            BackendType::Anthropic => Self::Anthropic(http),
        })
    }

    /// Send the conversation and return the completion text.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, RunnerError> {
        match self {
            Self::OpenAi(http) => {
                let url = format!("{}/chat/completions", http.api_url);
                let request = http
                    .client
                    .post(url)
                    .bearer_auth(&http.api_key)
                    .json(&openai_body(&http.model, prompt));
                extract_openai_content(&send(request, self.name()).await?)
            }
            Self::Anthropic(http) => {
                let url = format!("{}/messages", http.api_url);
                let request = http
                    .client
                    .post(url)
                    .header("x-api-key", &http.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&anthropic_body(&http.model, prompt));
                extract_anthropic_content(&send(request, self.name()).await?)
            }
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }
}

/// Connection details shared by both wire formats.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpBackend {
    fn new(config: &RunnerConfig) -> Result<Self, RunnerError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RunnerError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: config.backend.api_url.clone(),
            api_key: config.backend.api_key.clone(),
            model: config.backend.model.clone(),
        })
    }
}

/// Send a request and decode the JSON body, classifying failures.
async fn send(request: reqwest::RequestBuilder, backend: &str) -> Result<Value, RunnerError> {
    let response = request.send().await.map_err(|e| classify(&e, backend))?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(RunnerError::RateLimited(format!("{backend} returned {status}")));
    }
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(RunnerError::LlmBackend(format!(
            "{backend} returned {status}: {error_body}"
        )));
    }

    let json: Value = response
        .json()
        .await
        .map_err(|e| classify(&e, backend))?;
    debug!(backend, "LLM response received");
    Ok(json)
}

fn classify(err: &reqwest::Error, backend: &str) -> RunnerError {
    if err.is_timeout() {
        RunnerError::Timeout(format!("{backend} request: {err}"))
    } else if err.is_decode() {
        RunnerError::Parse(format!("{backend} response body: {err}"))
    } else {
        RunnerError::LlmBackend(format!("{backend} request failed: {err}"))
    }
}

const fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Chat completions body: the system prompt is the first message.
fn openai_body(model: &str, prompt: &RenderedPrompt) -> Value {
    let mut messages = vec![json!({"role": "system", "content": prompt.system})];
    messages.extend(
        prompt
            .messages
            .iter()
            .map(|m| json!({"role": role_name(m.role), "content": m.content})),
    );
    json!({
        "model": model,
        "messages": messages,
        "temperature": 0.2,
        "max_tokens": MAX_TOKENS,
    })
}

/// Messages API body: the system prompt is a top-level field.
fn anthropic_body(model: &str, prompt: &RenderedPrompt) -> Value {
    let messages: Vec<Value> = prompt
        .messages
        .iter()
        .map(|m| json!({"role": role_name(m.role), "content": m.content}))
        .collect();
    json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "system": prompt.system,
        "messages": messages,
    })
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &Value) -> Result<String, RunnerError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            RunnerError::Parse("OpenAI response missing choices[0].message.content".to_owned())
        })
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &Value) -> Result<String, RunnerError> {
    json.get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| {
            blocks
                .iter()
                .find(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        })
        .and_then(|b| b.get("text"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| RunnerError::Parse("Anthropic response has no text block".to_owned()))
}
