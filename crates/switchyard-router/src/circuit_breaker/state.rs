//! Circuit breaker state machine.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::config::CircuitBreakerConfig;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Normal operation, attempts allowed.
    Closed,
    /// Attempts blocked until the recovery deadline passes.
    Open,
    /// One trial attempt allowed; its outcome decides the next state.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("closed"),
            CircuitState::Open => f.write_str("open"),
            CircuitState::HalfOpen => f.write_str("half-open"),
        }
    }
}

/// An observable state transition, returned so the caller can emit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CircuitState,
    pub to: CircuitState,
}

/// Point-in-time view of a breaker, for observability.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    /// Time left until a half-open probe is permitted, when open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_in: Option<Duration>,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    total_outcomes: u64,
    last_failure_at: Option<Instant>,
    next_attempt_at: Option<Instant>,
}

/// Per-provider circuit breaker.
///
/// All operations take one short critical section, so the lazy open to
/// half-open recomputation and the counter updates are a single atomic
/// step with respect to concurrent callers.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                total_outcomes: 0,
                last_failure_at: None,
                next_attempt_at: None,
            }),
        }
    }

    /// Current state, recomputing the lazy open to half-open transition.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        Self::refresh(&mut inner);
        inner.state
    }

    /// Gate check: is this provider eligible for an attempt right now?
    ///
    /// Closed and half-open are eligible; open is not until the recovery
    /// deadline passes, at which point this very check flips the state to
    /// half-open and admits the probe.
    pub fn can_execute(&self) -> bool {
        !matches!(self.state(), CircuitState::Open)
    }

    /// Record a successful terminal outcome.
    pub fn record_success(&self) -> Option<Transition> {
        let mut inner = self.inner.lock();
        Self::refresh(&mut inner);
        inner.total_outcomes += 1;
        inner.consecutive_failures = 0;
        match inner.state {
            CircuitState::Closed => None,
            // A half-open probe succeeded; an open breaker whose gate was
            // bypassed recovers the same way.
            CircuitState::HalfOpen | CircuitState::Open => {
                let from = inner.state;
                inner.state = CircuitState::Closed;
                inner.next_attempt_at = None;
                Some(Transition {
                    from,
                    to: CircuitState::Closed,
                })
            }
        }
    }

    /// Record a failed terminal outcome.
    pub fn record_failure(&self) -> Option<Transition> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        Self::refresh(&mut inner);
        inner.total_outcomes += 1;
        inner.consecutive_failures += 1;
        inner.last_failure_at = Some(now);
        match inner.state {
            CircuitState::Closed => {
                if inner.consecutive_failures >= self.config.failure_threshold
                    && inner.total_outcomes >= u64::from(self.config.minimum_requests)
                {
                    inner.state = CircuitState::Open;
                    inner.next_attempt_at = Some(now + self.config.recovery_timeout);
                    Some(Transition {
                        from: CircuitState::Closed,
                        to: CircuitState::Open,
                    })
                } else {
                    None
                }
            }
            // The half-open probe failed; back to open with a fresh deadline.
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.next_attempt_at = Some(now + self.config.recovery_timeout);
                Some(Transition {
                    from: CircuitState::HalfOpen,
                    to: CircuitState::Open,
                })
            }
            CircuitState::Open => None,
        }
    }

    /// Observability snapshot.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let mut inner = self.inner.lock();
        Self::refresh(&mut inner);
        let retry_in = match inner.state {
            CircuitState::Open => inner
                .next_attempt_at
                .map(|at| at.saturating_duration_since(Instant::now())),
            _ => None,
        };
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            retry_in,
        }
    }

    // Lazy transition: open becomes half-open once the deadline passes.
    fn refresh(inner: &mut Inner) {
        if inner.state == CircuitState::Open {
            let due = inner
                .next_attempt_at
                .is_none_or(|at| Instant::now() >= at);
            if due {
                inner.state = CircuitState::HalfOpen;
            }
        }
    }
}
