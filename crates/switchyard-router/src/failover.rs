//! The attempt chain: ordered candidates, circuit-breaker gates, and the
//! per-candidate retry loop.
//!
//! Both execution entry points funnel through [`run_chain`]. Failover
//! execution passes the whole candidate list; load-balanced execution
//! passes exactly the one selected provider, which is what makes that path
//! "one gated, retry-governed attempt chain with no fallthrough".

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use switchyard_core::{BackendError, Capability, CapabilityKind, Provider, ResponseMeta, Usage};

use crate::circuit_breaker::CircuitBreaker;
use crate::error::{RouterError, RouterResult};
use crate::events::{EventSink, RouterEvent};
use crate::retry::RetryConfig;
use crate::stats::StatsTracker;

/// Mutable per-provider execution state, created at registration.
#[derive(Debug)]
pub(crate) struct ProviderRuntime {
    pub stats: StatsTracker,
    pub breaker: CircuitBreaker,
}

/// One entry in the chain: handle plus its runtime state.
pub(crate) struct Candidate<C: Capability> {
    pub name: String,
    pub provider: Arc<dyn Provider<C>>,
    pub runtime: Arc<ProviderRuntime>,
}

/// Outcome of a routed call.
#[derive(Debug, Clone)]
pub struct ExecutionReport<R> {
    pub response: R,
    /// Provider that actually served the call.
    pub provider: String,
    /// Usage summary from the serving response, when the backend reports one.
    pub usage: Option<Usage>,
    /// Wall-clock time for the whole chain, including skips and retries.
    pub execution_time: Duration,
    /// Retries consumed on the serving provider.
    pub retries: u32,
    /// True when the serving provider was not the first candidate.
    pub failover_used: bool,
    /// First candidate in the chain, present when failover occurred.
    pub original_provider: Option<String>,
}

pub(crate) async fn run_chain<C: Capability>(
    kind: CapabilityKind,
    candidates: &[Candidate<C>],
    request: &C::Request,
    retry: &RetryConfig,
    events: &EventSink,
) -> RouterResult<ExecutionReport<C::Response>> {
    let started = Instant::now();
    let first_name = candidates.first().map(|c| c.name.clone());
    let mut attempted = 0usize;
    let mut skipped = 0usize;
    let mut last_error = None;

    for candidate in candidates {
        // An open circuit skips the candidate silently: no attempt, no
        // stats, no retry budget consumed.
        if !candidate.runtime.breaker.can_execute() {
            debug!(%kind, provider = %candidate.name, "circuit open, skipping candidate");
            skipped += 1;
            continue;
        }

        match attempt_candidate(kind, candidate, request, retry, events).await {
            Ok((response, retries)) => {
                let failover_used = first_name.as_deref() != Some(candidate.name.as_str());
                let original_provider = if failover_used { first_name } else { None };
                return Ok(ExecutionReport {
                    usage: response.usage().cloned(),
                    response,
                    provider: candidate.name.clone(),
                    execution_time: started.elapsed(),
                    retries,
                    failover_used,
                    original_provider,
                });
            }
            Err(error) => {
                attempted += 1;
                last_error = Some(error);
            }
        }
    }

    Err(RouterError::Exhausted {
        kind,
        attempted,
        skipped,
        last_error,
    })
}

/// Retry loop against a single candidate. Returns the response and the
/// number of retries consumed, or the last error once the candidate is
/// exhausted. Stats and breaker are updated exactly once, on the terminal
/// outcome.
async fn attempt_candidate<C: Capability>(
    kind: CapabilityKind,
    candidate: &Candidate<C>,
    request: &C::Request,
    retry: &RetryConfig,
    events: &EventSink,
) -> Result<(C::Response, u32), BackendError> {
    let mut attempt = 0u32;
    loop {
        let attempt_started = Instant::now();
        match candidate.provider.invoke(request.clone()).await {
            Ok(response) => {
                candidate.runtime.stats.record_success(attempt_started.elapsed());
                emit_transition(candidate.runtime.breaker.record_success(), kind, candidate, events);
                if attempt > 0 {
                    debug!(%kind, provider = %candidate.name, attempt, "call succeeded after retry");
                }
                return Ok((response, attempt));
            }
            Err(error) => {
                let error_kind = error.kind();
                events.emit(RouterEvent::ExecutionError {
                    kind,
                    provider: candidate.name.clone(),
                    error_kind,
                    message: error.to_string(),
                });
                if retry.should_retry(attempt, error_kind) {
                    let delay = retry.delay_for(attempt);
                    warn!(
                        %kind,
                        provider = %candidate.name,
                        %error_kind,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                warn!(
                    %kind,
                    provider = %candidate.name,
                    %error_kind,
                    attempts = attempt + 1,
                    "candidate exhausted: {error}"
                );
                candidate.runtime.stats.record_failure(error_kind);
                emit_transition(candidate.runtime.breaker.record_failure(), kind, candidate, events);
                return Err(error);
            }
        }
    }
}

fn emit_transition<C: Capability>(
    transition: Option<crate::circuit_breaker::Transition>,
    kind: CapabilityKind,
    candidate: &Candidate<C>,
    events: &EventSink,
) {
    use crate::circuit_breaker::CircuitState;
    match transition {
        Some(t) if t.to == CircuitState::Open => {
            warn!(%kind, provider = %candidate.name, "circuit opened");
            events.emit(RouterEvent::CircuitOpened {
                kind,
                provider: candidate.name.clone(),
            });
        }
        Some(t) if t.to == CircuitState::Closed => {
            debug!(%kind, provider = %candidate.name, "circuit closed");
            events.emit(RouterEvent::CircuitClosed {
                kind,
                provider: candidate.name.clone(),
            });
        }
        _ => {}
    }
}

impl ProviderRuntime {
    pub(crate) fn new(breaker: CircuitBreaker) -> Self {
        Self {
            stats: StatsTracker::new(),
            breaker,
        }
    }
}
