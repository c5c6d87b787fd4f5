//! Caller-visible router errors.

use switchyard_core::{BackendError, CapabilityKind};
use thiserror::Error;

/// Errors surfaced by registry and execution operations.
///
/// Candidate-level failures (a provider exhausting its retry budget) are
/// not errors at this level; they advance the failover chain. Only total
/// exhaustion, registration conflicts, malformed configuration, and
/// unknown-provider lookups reach the caller.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The (kind, name) key is taken and `replace` was not requested.
    #[error("provider '{name}' is already registered for {kind}")]
    AlreadyRegistered { kind: CapabilityKind, name: String },

    /// No provider with that name is registered for the kind.
    #[error("no provider named '{name}' is registered for {kind}")]
    UnknownProvider { kind: CapabilityKind, name: String },

    /// No providers at all are registered for the kind.
    #[error("no providers registered for {kind}")]
    NoProviders { kind: CapabilityKind },

    /// Load-balanced execution was requested before any group was set.
    #[error("load balancing is not configured for {kind}")]
    LoadBalancingNotConfigured { kind: CapabilityKind },

    /// Malformed or inconsistent configuration; nothing was applied.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every candidate was skipped or exhausted.
    #[error(
        "all providers for {kind} failed ({attempted} attempted, {skipped} skipped by open circuits){}",
        .last_error
            .as_ref()
            .map(|e| format!("; last error: {e}"))
            .unwrap_or_default()
    )]
    Exhausted {
        kind: CapabilityKind,
        attempted: usize,
        skipped: usize,
        /// Last underlying backend error, absent when every candidate was
        /// skipped without an attempt.
        last_error: Option<BackendError>,
    },
}

pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_names_the_last_error() {
        let err = RouterError::Exhausted {
            kind: CapabilityKind::TextGeneration,
            attempted: 2,
            skipped: 1,
            last_error: Some(BackendError::Server("boom".into())),
        };
        let text = err.to_string();
        assert!(text.contains("text-generation"));
        assert!(text.contains("2 attempted"));
        assert!(text.contains("1 skipped"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn exhausted_without_attempts_omits_last_error() {
        let err = RouterError::Exhausted {
            kind: CapabilityKind::Embedding,
            attempted: 0,
            skipped: 3,
            last_error: None,
        };
        assert!(!err.to_string().contains("last error"));
    }
}
