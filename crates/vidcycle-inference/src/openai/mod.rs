//! OpenAI-compatible generation backend.
//!
//! Works with any OpenAI-compatible chat completions endpoint: the OpenAI
//! cloud API, Azure OpenAI, or a local server such as Ollama, vLLM or
//! LM Studio.
//!
//! # Example
//!
//! ```rust,no_run
//! use vidcycle_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! // From environment variables; `None` when nothing is configured
//! let backend = OpenAIBackend::from_env_if_configured().unwrap();
//!
//! // Or with custom config
//! let config = OpenAIConfig {
//!     base_url: "http://localhost:11434/v1".to_string(),
//!     api_key: None,
//!     gen_model: "llama3".to_string(),
//!     ..Default::default()
//! };
//! let backend = OpenAIBackend::new(config).unwrap();
//! ```

mod backend;
mod error;
mod types;

pub use backend::{
    OpenAIBackend, OpenAIConfig, DEFAULT_GEN_MODEL, DEFAULT_OPENAI_URL, DEFAULT_TIMEOUT_SECS,
};
pub use error::{to_vidcycle_error, OpenAIErrorCode};
pub use types::*;
