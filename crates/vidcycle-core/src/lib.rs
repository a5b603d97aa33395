//! # vidcycle-core
//!
//! Core types, traits, and the retention policy for the vidcycle label and
//! retention lifecycle engine.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other vidcycle crates depend on.

pub mod config;
pub mod defaults;
pub mod deletion;
pub mod error;
pub mod labels;
pub mod logging;
pub mod models;
pub mod retention;
pub mod traits;
pub mod vocabulary;

// Re-export commonly used types at crate root
pub use config::EngineConfig;
pub use deletion::{DeletionStep, StepOutcome, DELETION_PIPELINE};
pub use error::{Error, Result};
pub use labels::{normalize_label_name, validate_create_request, validate_label_name};
pub use models::*;
pub use retention::{compute_expiration, expiration_for_assignments, expiration_for_labels};
pub use traits::*;
pub use vocabulary::LabelVocabulary;
