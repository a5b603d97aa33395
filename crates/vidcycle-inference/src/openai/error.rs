//! OpenAI-specific error handling.

use vidcycle_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError)
    }
}

/// Convert an OpenAI error into a vidcycle error.
///
/// Everything maps to `Inference` so callers treat it as an upstream
/// failure; only the message prefix differs.
pub fn to_vidcycle_error(code: OpenAIErrorCode, message: &str) -> Error {
    let prefix = match code {
        OpenAIErrorCode::AuthenticationError => "Authentication failed: ",
        OpenAIErrorCode::RateLimitExceeded => "Rate limit exceeded: ",
        OpenAIErrorCode::ModelNotFound => "Model not found: ",
        OpenAIErrorCode::ContextLengthExceeded => "Transcript too long for model: ",
        OpenAIErrorCode::ServerError => "Server error: ",
        OpenAIErrorCode::Unknown => "",
    };
    Error::Inference(format!("{}{}", prefix, message))
}
