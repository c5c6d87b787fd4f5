//! Switchyard Router - resilient multi-backend call routing.
//!
//! A [`Switchyard`] lets an application call one of several interchangeable
//! backends for a capability (text generation, transcription, speech
//! synthesis, image generation, embeddings) through one surface, while the
//! router handles failure, degradation, and traffic distribution:
//!
//! ```text
//! caller
//!   |
//!   v
//! Switchyard -> ProviderRegistry<C> -> failover chain / load balancer
//!                                          |
//!                          per candidate:  circuit breaker gate
//!                                          retry loop (backoff + jitter)
//!                                          provider invoke
//!                                          statistics + breaker update
//! ```
//!
//! - Failover execution walks the configured provider order and returns the
//!   first success; candidates behind an open circuit are skipped without
//!   consuming retry budget.
//! - Load-balanced execution selects one provider (round-robin, weighted,
//!   least-latency, or least-errors) and runs a single gated attempt chain
//!   against it.
//! - Every terminal outcome feeds per-provider statistics (counts, running
//!   average latency, reservoir percentiles, error-kind counts) and the
//!   provider's circuit breaker.
//! - State transitions and execution errors are observable through a
//!   broadcast event stream ([`Switchyard::subscribe`]).
//!
//! Backend contracts (the `Provider` trait, capability types, the failure
//! taxonomy) live in `switchyard-core`.

pub mod balance;
pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod events;
pub mod failover;
pub mod hub;
pub mod registry;
pub mod retry;
pub mod stats;

pub use balance::{LoadBalancer, Member, Strategy};
pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::{BalancerSection, MemberSpec, RouterConfig};
pub use error::{RouterError, RouterResult};
pub use events::RouterEvent;
pub use failover::ExecutionReport;
pub use hub::{HealthRecord, Switchyard};
pub use registry::{HealthReport, ProviderRegistry, RegisterOptions, RouterSettings};
pub use retry::RetryConfig;
pub use stats::ProviderStats;

// The core contracts, re-exported so applications can depend on one crate.
pub use switchyard_core as core;
pub use switchyard_core::{
    BackendError, BackendResult, Capability, CapabilityKind, Embedding, ErrorKind, ImageGeneration,
    Provider, SpeechToText, TextGeneration, TextToSpeech, Usage,
};
