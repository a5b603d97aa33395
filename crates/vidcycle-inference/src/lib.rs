//! # vidcycle-inference
//!
//! Text-completion oracle backends for vidcycle.
//!
//! This crate provides:
//! - An OpenAI-compatible chat completions backend
//! - Extraction of JSON objects from free-form model replies
//! - A mock backend for tests (feature `mock`)
//!
//! # Feature Flags
//!
//! - `mock`: Enable the mock backend for downstream tests

pub mod json;
pub mod openai;

// Mock generation backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use vidcycle_core::*;

pub use json::{extract_json_object, parse_json_reply, strip_code_fences};
pub use openai::{OpenAIBackend, OpenAIConfig};
