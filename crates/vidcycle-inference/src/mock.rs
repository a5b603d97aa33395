//! Mock generation backend for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vidcycle_inference::mock::MockGenerationBackend;
//!
//! let oracle = MockGenerationBackend::new()
//!     .with_fixed_response(r#"{"should_promote": false, "reason": "too specific"}"#);
//! let reply = oracle.generate("anything").await?;
//! assert_eq!(oracle.generate_call_count(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use vidcycle_core::{Error, GenerationBackend, Result};

/// Mock oracle returning canned replies and recording every prompt.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<MockConfig>,
    queued: Arc<Mutex<VecDeque<Result<String>>>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    default_response: String,
    /// `(needle, reply)` pairs matched against system + user prompt.
    routed: Vec<(String, String)>,
    failure: Option<String>,
    latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            default_response: "Mock response".to_string(),
            routed: Vec::new(),
            failure: None,
            latency_ms: 0,
        }
    }
}

/// One recorded oracle call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub system: String,
    pub prompt: String,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            queued: Arc::new(Mutex::new(VecDeque::new())),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply used when nothing queued or routed matches.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Reply with `output` whenever the system or user prompt contains `needle`.
    pub fn with_response_containing(
        mut self,
        needle: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .routed
            .push((needle.into(), output.into()));
        self
    }

    /// Fail every call with an inference error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).failure = Some(message.into());
        self
    }

    /// Set simulated latency for every call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Queue a reply consumed by the next call, ahead of routed replies.
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.queued).push_back(Ok(response.into()));
    }

    /// Queue a failure consumed by the next call.
    pub fn push_failure(&self, message: impl Into<String>) {
        lock(&self.queued).push_back(Err(Error::Inference(message.into())));
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        lock(&self.call_log).clone()
    }

    pub fn generate_call_count(&self) -> usize {
        lock(&self.call_log).len()
    }

    fn reply_for(&self, system: &str, prompt: &str) -> Result<String> {
        if let Some(queued) = lock(&self.queued).pop_front() {
            return queued;
        }
        if let Some(message) = &self.config.failure {
            return Err(Error::Inference(message.clone()));
        }
        let routed = self
            .config
            .routed
            .iter()
            .find(|(needle, _)| system.contains(needle.as_str()) || prompt.contains(needle.as_str()));
        Ok(routed
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.config.default_response.clone()))
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        lock(&self.call_log).push(MockCall {
            system: system.to_string(),
            prompt: prompt.to_string(),
        });
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }
        self.reply_for(system, prompt)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
