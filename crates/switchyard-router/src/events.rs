//! Observable router events.
//!
//! Events are delivered over a broadcast channel the caller subscribes to
//! and drains explicitly. They exist for observability only; nothing in the
//! router depends on anyone listening, and a lagging subscriber loses old
//! events rather than slowing callers down.

use serde::Serialize;
use switchyard_core::{CapabilityKind, ErrorKind};
use tokio::sync::broadcast;

use crate::balance::Strategy;

const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Everything the router reports about itself.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RouterEvent {
    ProviderRegistered {
        kind: CapabilityKind,
        provider: String,
        replaced: bool,
    },
    ProviderRemoved {
        kind: CapabilityKind,
        provider: String,
    },
    /// A single provider attempt failed (before any retry decision).
    ExecutionError {
        kind: CapabilityKind,
        provider: String,
        error_kind: ErrorKind,
        message: String,
    },
    FailoverConfigured {
        kind: CapabilityKind,
        order: Vec<String>,
    },
    LoadBalancingConfigured {
        kind: CapabilityKind,
        strategy: Strategy,
        providers: Vec<String>,
    },
    CircuitOpened {
        kind: CapabilityKind,
        provider: String,
    },
    CircuitClosed {
        kind: CapabilityKind,
        provider: String,
    },
    ConfigurationLoaded {
        failover_rules: usize,
        load_balancing_rules: usize,
    },
}

/// Shared sending side of the event stream.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: broadcast::Sender<RouterEvent>,
}

impl EventSink {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget: a send with no subscribers is not an error.
    pub(crate) fn emit(&self, event: RouterEvent) {
        tracing::debug!(?event, "router event");
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let sink = EventSink::new();
        let mut rx = sink.subscribe();
        sink.emit(RouterEvent::CircuitOpened {
            kind: CapabilityKind::TextGeneration,
            provider: "openai".into(),
        });
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, RouterEvent::CircuitOpened { .. }));
    }

    #[test]
    fn emitting_without_subscribers_is_fine() {
        let sink = EventSink::new();
        sink.emit(RouterEvent::ConfigurationLoaded {
            failover_rules: 0,
            load_balancing_rules: 0,
        });
    }

    #[test]
    fn events_serialize_with_a_tag() {
        let json = serde_json::to_value(RouterEvent::ProviderRegistered {
            kind: CapabilityKind::Embedding,
            provider: "local".into(),
            replaced: false,
        })
        .unwrap();
        assert_eq!(json["event"], "provider_registered");
        assert_eq!(json["kind"], "embedding");
    }
}
