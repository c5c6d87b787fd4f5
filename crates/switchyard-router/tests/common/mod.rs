//! Shared test doubles for the integration suites.

// Not every suite uses every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use switchyard_router::core::{
    BackendError, BackendResult, Provider, TextGeneration, TextRequest, TextResponse, Usage,
};
use switchyard_router::{CircuitBreakerConfig, RetryConfig, RouterSettings};

/// One scripted step of a mock backend.
#[derive(Clone)]
pub enum Step {
    Succeed,
    Fail(BackendError),
}

/// Text-generation backend that replays a script, then repeats its final
/// step forever. Call counts are observable from the test.
pub struct MockText {
    name: &'static str,
    script: Vec<Step>,
    probe_error: Option<BackendError>,
    calls: AtomicUsize,
}

impl MockText {
    pub fn scripted(name: &'static str, script: Vec<Step>) -> Arc<Self> {
        assert!(!script.is_empty(), "script must have at least one step");
        Arc::new(Self {
            name,
            script,
            probe_error: None,
            calls: AtomicUsize::new(0),
        })
    }

    /// Always succeeds.
    pub fn ok(name: &'static str) -> Arc<Self> {
        Self::scripted(name, vec![Step::Succeed])
    }

    /// Always fails with the given error.
    pub fn failing(name: &'static str, error: BackendError) -> Arc<Self> {
        Self::scripted(name, vec![Step::Fail(error)])
    }

    /// Healthy backend whose standalone probe fails.
    pub fn with_broken_probe(name: &'static str, error: BackendError) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: vec![Step::Succeed],
            probe_error: Some(error),
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of invoke calls observed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider<TextGeneration> for MockText {
    fn name(&self) -> &str {
        self.name
    }

    async fn invoke(&self, _request: TextRequest) -> BackendResult<TextResponse> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .get(index)
            .unwrap_or_else(|| self.script.last().expect("script is non-empty"));
        match step {
            Step::Succeed => Ok(TextResponse {
                text: format!("{} says hi", self.name),
                model: None,
                usage: Some(Usage {
                    prompt_tokens: 7,
                    completion_tokens: 3,
                    total_tokens: 10,
                    cost: None,
                }),
            }),
            Step::Fail(error) => Err(error.clone()),
        }
    }

    async fn probe(&self) -> BackendResult<()> {
        match &self.probe_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Settings with millisecond-scale backoff so chains run fast, and a
/// low breaker threshold tests can trip deliberately.
pub fn fast_settings(max_retries: u32, failure_threshold: u32) -> RouterSettings {
    RouterSettings {
        retry: RetryConfig {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 4,
            jitter: false,
            ..Default::default()
        },
        breaker: CircuitBreakerConfig::default()
            .with_failure_threshold(failure_threshold)
            .with_recovery_timeout(Duration::from_millis(50)),
    }
}

pub fn server_error() -> BackendError {
    BackendError::Server("internal error".into())
}
