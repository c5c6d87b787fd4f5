//! The `Switchyard` façade: five typed registries behind one handle.
//!
//! A `Switchyard` is constructed explicitly by the application's
//! composition root and passed wherever routing is needed. There is no
//! ambient global instance.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;

use switchyard_core::{
    CapabilityKind, Embedding, ImageGeneration, SpeechToText, TextGeneration, TextToSpeech,
};

use crate::config::{MemberSpec, RouterConfig};
use crate::error::RouterResult;
use crate::events::{EventSink, RouterEvent};
use crate::registry::{HealthReport, ProviderRegistry, RouterSettings};

/// One provider's health, tagged with its registry key.
#[derive(Debug, Clone, Serialize)]
pub struct HealthRecord {
    pub kind: CapabilityKind,
    pub provider: String,
    #[serde(flatten)]
    pub report: HealthReport,
}

/// The router façade. Owns one [`ProviderRegistry`] per capability kind and
/// the shared settings and event stream.
pub struct Switchyard {
    settings: Arc<RouterSettings>,
    events: EventSink,
    text_generation: ProviderRegistry<TextGeneration>,
    speech_to_text: ProviderRegistry<SpeechToText>,
    text_to_speech: ProviderRegistry<TextToSpeech>,
    image_generation: ProviderRegistry<ImageGeneration>,
    embedding: ProviderRegistry<Embedding>,
}

impl Default for Switchyard {
    fn default() -> Self {
        Self::new()
    }
}

impl Switchyard {
    /// A router with default retry and circuit-breaker settings.
    pub fn new() -> Self {
        Self::with_settings(RouterSettings::default())
    }

    /// A router with explicit process-wide settings.
    pub fn with_settings(settings: RouterSettings) -> Self {
        let settings = Arc::new(settings);
        let events = EventSink::new();
        Self {
            text_generation: ProviderRegistry::new(Arc::clone(&settings), events.clone()),
            speech_to_text: ProviderRegistry::new(Arc::clone(&settings), events.clone()),
            text_to_speech: ProviderRegistry::new(Arc::clone(&settings), events.clone()),
            image_generation: ProviderRegistry::new(Arc::clone(&settings), events.clone()),
            embedding: ProviderRegistry::new(Arc::clone(&settings), events.clone()),
            settings,
            events,
        }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Subscribe to the router's event stream. Each subscriber gets its own
    /// receiver to drain; lagging subscribers lose old events.
    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.events.subscribe()
    }

    // ========================================================================
    // Typed registry accessors
    // ========================================================================

    pub fn text_generation(&self) -> &ProviderRegistry<TextGeneration> {
        &self.text_generation
    }

    pub fn speech_to_text(&self) -> &ProviderRegistry<SpeechToText> {
        &self.speech_to_text
    }

    pub fn text_to_speech(&self) -> &ProviderRegistry<TextToSpeech> {
        &self.text_to_speech
    }

    pub fn image_generation(&self) -> &ProviderRegistry<ImageGeneration> {
        &self.image_generation
    }

    pub fn embedding(&self) -> &ProviderRegistry<Embedding> {
        &self.embedding
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Apply a configuration document.
    ///
    /// The document is validated as a whole first; if anything in it is
    /// invalid the router is left untouched. Failover and load-balancing
    /// sections replace the current settings for their kinds.
    pub fn load_configuration(&self, config: &RouterConfig) -> RouterResult<()> {
        config.validate()?;

        for (kind, order) in &config.failover {
            self.configure_failover_for(*kind, order.clone())?;
        }
        for (kind, section) in &config.load_balancing {
            let members = section
                .providers
                .iter()
                .cloned()
                .map(MemberSpec::into_member)
                .collect();
            match kind {
                CapabilityKind::TextGeneration => self
                    .text_generation
                    .configure_load_balancing(section.strategy, members)?,
                CapabilityKind::SpeechToText => self
                    .speech_to_text
                    .configure_load_balancing(section.strategy, members)?,
                CapabilityKind::TextToSpeech => self
                    .text_to_speech
                    .configure_load_balancing(section.strategy, members)?,
                CapabilityKind::ImageGeneration => self
                    .image_generation
                    .configure_load_balancing(section.strategy, members)?,
                CapabilityKind::Embedding => self
                    .embedding
                    .configure_load_balancing(section.strategy, members)?,
            }
        }

        info!(
            failover_rules = config.failover.len(),
            load_balancing_rules = config.load_balancing.len(),
            "configuration loaded"
        );
        self.events.emit(RouterEvent::ConfigurationLoaded {
            failover_rules: config.failover.len(),
            load_balancing_rules: config.load_balancing.len(),
        });
        Ok(())
    }

    fn configure_failover_for(&self, kind: CapabilityKind, order: Vec<String>) -> RouterResult<()> {
        match kind {
            CapabilityKind::TextGeneration => self.text_generation.configure_failover(order),
            CapabilityKind::SpeechToText => self.speech_to_text.configure_failover(order),
            CapabilityKind::TextToSpeech => self.text_to_speech.configure_failover(order),
            CapabilityKind::ImageGeneration => self.image_generation.configure_failover(order),
            CapabilityKind::Embedding => self.embedding.configure_failover(order),
        }
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Probe every registered provider across all capability kinds.
    pub async fn check_all_health(&self) -> Vec<HealthRecord> {
        let (text, stt, tts, image, embedding) = futures::join!(
            self.text_generation.check_health_all(),
            self.speech_to_text.check_health_all(),
            self.text_to_speech.check_health_all(),
            self.image_generation.check_health_all(),
            self.embedding.check_health_all(),
        );
        let tagged = |kind: CapabilityKind, reports: Vec<(String, HealthReport)>| {
            reports
                .into_iter()
                .map(move |(provider, report)| HealthRecord {
                    kind,
                    provider,
                    report,
                })
        };
        tagged(CapabilityKind::TextGeneration, text)
            .chain(tagged(CapabilityKind::SpeechToText, stt))
            .chain(tagged(CapabilityKind::TextToSpeech, tts))
            .chain(tagged(CapabilityKind::ImageGeneration, image))
            .chain(tagged(CapabilityKind::Embedding, embedding))
            .collect()
    }

    /// Reset every registry: providers, statistics, breakers, and
    /// configuration. Intended for tests.
    pub fn clear(&self) {
        self.text_generation.clear();
        self.speech_to_text.clear();
        self.text_to_speech.clear();
        self.image_generation.clear();
        self.embedding.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use switchyard_core::{
        BackendResult, EmbeddingRequest, EmbeddingResponse, Provider, TextRequest, TextResponse,
    };

    struct EchoText(&'static str);

    #[async_trait]
    impl Provider<TextGeneration> for EchoText {
        fn name(&self) -> &str {
            self.0
        }

        async fn invoke(&self, request: TextRequest) -> BackendResult<TextResponse> {
            Ok(TextResponse {
                text: request.prompt,
                model: None,
                usage: None,
            })
        }
    }

    struct NullEmbedding;

    #[async_trait]
    impl Provider<Embedding> for NullEmbedding {
        fn name(&self) -> &str {
            "null-embedding"
        }

        async fn invoke(&self, request: EmbeddingRequest) -> BackendResult<EmbeddingResponse> {
            Ok(EmbeddingResponse {
                vectors: vec![vec![0.0]; request.input.len()],
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn registries_are_independent_per_kind() {
        let yard = Switchyard::new();
        yard.text_generation()
            .register(Arc::new(EchoText("echo")))
            .unwrap();
        yard.embedding().register(Arc::new(NullEmbedding)).unwrap();

        assert_eq!(yard.text_generation().names(), ["echo"]);
        assert_eq!(yard.embedding().names(), ["null-embedding"]);
        assert!(yard.image_generation().names().is_empty());
    }

    #[tokio::test]
    async fn check_all_health_tags_kind_and_name() {
        let yard = Switchyard::new();
        yard.text_generation()
            .register(Arc::new(EchoText("echo")))
            .unwrap();
        yard.embedding().register(Arc::new(NullEmbedding)).unwrap();

        let records = yard.check_all_health().await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| {
            r.kind == CapabilityKind::TextGeneration && r.provider == "echo" && r.report.healthy
        }));
        assert!(
            records
                .iter()
                .any(|r| r.kind == CapabilityKind::Embedding && r.provider == "null-embedding")
        );
    }

    #[tokio::test]
    async fn invalid_document_leaves_router_untouched() {
        let yard = Switchyard::new();
        yard.text_generation()
            .register(Arc::new(EchoText("echo")))
            .unwrap();

        let mut rx = yard.subscribe();
        let bad = RouterConfig {
            providers: Default::default(),
            failover: [(CapabilityKind::TextGeneration, vec!["echo".to_string()])].into(),
            load_balancing: Default::default(),
        };
        assert!(yard.load_configuration(&bad).is_err());
        // No FailoverConfigured or ConfigurationLoaded events were emitted.
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn loading_a_document_configures_and_announces() {
        let yard = Switchyard::new();
        yard.text_generation()
            .register(Arc::new(EchoText("a")))
            .unwrap();
        yard.text_generation()
            .register(Arc::new(EchoText("b")))
            .unwrap();

        let mut rx = yard.subscribe();
        let config = RouterConfig::from_yaml_str(
            r#"
providers:
  text-generation: { a: {}, b: {} }
failover:
  text-generation: [b, a]
load_balancing:
  text-generation:
    strategy: round-robin
    providers: [a, b]
"#,
        )
        .unwrap();
        yard.load_configuration(&config).unwrap();

        let mut saw_failover = false;
        let mut saw_balancing = false;
        let mut saw_loaded = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                RouterEvent::FailoverConfigured { order, .. } => {
                    saw_failover = order == ["b", "a"];
                }
                RouterEvent::LoadBalancingConfigured { .. } => saw_balancing = true,
                RouterEvent::ConfigurationLoaded { .. } => saw_loaded = true,
                _ => {}
            }
        }
        assert!(saw_failover && saw_balancing && saw_loaded);

        // The loaded order now drives execution: "b" is first.
        let report = yard
            .text_generation()
            .execute_with_failover(TextRequest::new("ping"))
            .await
            .unwrap();
        assert_eq!(report.provider, "b");
        assert!(!report.failover_used);
    }
}
