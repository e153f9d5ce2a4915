//! Mock generation backend for deterministic testing.
//!
//! Records every call so tests can assert properties like "creation with
//! `useAI=false` never reaches the AI client".

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use jotter_core::{Error, GenerationBackend, Result};

/// A single recorded generation call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub prompt: String,
    pub max_tokens: u32,
}

/// Mock generation backend with a fixed response, an optional failure
/// switch, and a call log.
#[derive(Clone, Default)]
pub struct MockBackend {
    response: String,
    fail: bool,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockBackend {
    /// Create a mock that answers every prompt with an empty completion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the completion text returned for every call.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }

    /// Make every call fail with an inference error.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of generation calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        self.calls.lock().unwrap().push(MockCall {
            prompt: prompt.to_string(),
            max_tokens,
        });
        if self.fail {
            return Err(Error::Inference("mock failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
