//! LLM-backed decision source for Tickworld AI characters.
//!
//! [`LlmPrompt`] implements the core `Prompt` trait on top of an HTTP
//! language model:
//!
//! - [`config`]: environment-driven backend configuration
//! - [`llm`]: `OpenAI`-compatible and Anthropic wire formats over `reqwest`
//! - [`prompt`]: `minijinja` templates for the plan, execute, reevaluate and
//!   fix calls
//! - [`parse`]: numbered task lists and JSON actions, with recovery
//! - [`llm_prompt`]: the correction loop tying them together

pub mod config;
pub mod error;
pub mod llm;
pub mod llm_prompt;
pub mod parse;
pub mod prompt;

pub use config::{BackendType, LlmBackendConfig, RunnerConfig};
pub use error::RunnerError;
pub use llm::LlmBackend;
pub use llm_prompt::{Completion, LlmPrompt};
pub use prompt::{PromptEngine, RenderedPrompt};
