//! Per-provider statistics.
//!
//! One tracker per registered provider, updated on every terminal attempt
//! outcome. Latency percentiles come from a fixed-size uniform reservoir
//! (Vitter's Algorithm R) over success latencies: exact until the reservoir
//! fills, an unbiased sample after.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use switchyard_core::ErrorKind;

const RESERVOIR_CAPACITY: usize = 256;

/// Consistent snapshot of one provider's statistics.
///
/// `Default` is the zeroed snapshot returned for never-seen keys.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderStats {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    /// Running average over success latencies, in milliseconds.
    pub avg_latency_ms: f64,
    /// Estimated latency percentiles, 0.0 while no successes were observed.
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub error_counts: HashMap<ErrorKind, u64>,
    pub last_request: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
}

impl ProviderStats {
    /// Observed failure ratio, `failures / max(requests, 1)`.
    pub fn failure_ratio(&self) -> f64 {
        self.failures as f64 / (self.requests.max(1)) as f64
    }
}

#[derive(Debug, Default)]
struct Reservoir {
    samples: Vec<f64>,
    seen: u64,
}

impl Reservoir {
    fn observe(&mut self, value: f64) {
        self.seen += 1;
        if self.samples.len() < RESERVOIR_CAPACITY {
            self.samples.push(value);
        } else {
            let slot = rand::thread_rng().gen_range(0..self.seen);
            if (slot as usize) < RESERVOIR_CAPACITY {
                self.samples[slot as usize] = value;
            }
        }
    }

    fn quantile(sorted: &[f64], q: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }
        let index = ((sorted.len() - 1) as f64 * q).round() as usize;
        sorted[index]
    }

    fn percentiles(&self) -> (f64, f64, f64) {
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        (
            Self::quantile(&sorted, 0.50),
            Self::quantile(&sorted, 0.95),
            Self::quantile(&sorted, 0.99),
        )
    }
}

#[derive(Debug, Default)]
struct Inner {
    requests: u64,
    successes: u64,
    failures: u64,
    avg_latency_ms: f64,
    reservoir: Reservoir,
    error_counts: HashMap<ErrorKind, u64>,
    last_request: Option<DateTime<Utc>>,
    last_success: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
}

/// Mutex-guarded statistics tracker for one provider.
#[derive(Debug, Default)]
pub struct StatsTracker {
    inner: Mutex<Inner>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful terminal outcome with its observed latency.
    pub fn record_success(&self, latency: Duration) {
        let now = Utc::now();
        let latency_ms = latency.as_secs_f64() * 1_000.0;
        let mut inner = self.inner.lock();
        inner.requests += 1;
        inner.successes += 1;
        inner.last_request = Some(now);
        inner.last_success = Some(now);
        // Incremental mean over successes only.
        let n = inner.successes as f64;
        inner.avg_latency_ms += (latency_ms - inner.avg_latency_ms) / n;
        inner.reservoir.observe(latency_ms);
    }

    /// Record a failed terminal outcome of the classified kind.
    pub fn record_failure(&self, kind: ErrorKind) {
        let now = Utc::now();
        let mut inner = self.inner.lock();
        inner.requests += 1;
        inner.failures += 1;
        inner.last_request = Some(now);
        inner.last_failure = Some(now);
        *inner.error_counts.entry(kind).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> ProviderStats {
        let inner = self.inner.lock();
        let (p50, p95, p99) = inner.reservoir.percentiles();
        ProviderStats {
            requests: inner.requests,
            successes: inner.successes,
            failures: inner.failures,
            avg_latency_ms: inner.avg_latency_ms,
            p50_latency_ms: p50,
            p95_latency_ms: p95,
            p99_latency_ms: p99,
            error_counts: inner.error_counts.clone(),
            last_request: inner.last_request,
            last_success: inner.last_success,
            last_failure: inner.last_failure,
        }
    }
}
