//! Capability kinds and the typed capability contract.
//!
//! Each backend capability is a zero-sized marker type binding a concrete
//! request/response pair. Dispatch is fully typed; there is no string-named
//! method lookup anywhere in the router.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Runtime tag for the closed set of backend capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    /// Text generation (chat/completion backends)
    TextGeneration,
    /// Speech-to-text transcription
    SpeechToText,
    /// Text-to-speech synthesis
    TextToSpeech,
    /// Image generation
    ImageGeneration,
    /// Text embedding
    Embedding,
}

impl CapabilityKind {
    /// Every kind, in declaration order.
    pub const ALL: [CapabilityKind; 5] = [
        CapabilityKind::TextGeneration,
        CapabilityKind::SpeechToText,
        CapabilityKind::TextToSpeech,
        CapabilityKind::ImageGeneration,
        CapabilityKind::Embedding,
    ];

    /// Stable wire name (matches the configuration schema).
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::TextGeneration => "text-generation",
            CapabilityKind::SpeechToText => "speech-to-text",
            CapabilityKind::TextToSpeech => "text-to-speech",
            CapabilityKind::ImageGeneration => "image-generation",
            CapabilityKind::Embedding => "embedding",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text-generation" => Ok(CapabilityKind::TextGeneration),
            "speech-to-text" => Ok(CapabilityKind::SpeechToText),
            "text-to-speech" => Ok(CapabilityKind::TextToSpeech),
            "image-generation" => Ok(CapabilityKind::ImageGeneration),
            "embedding" => Ok(CapabilityKind::Embedding),
            other => Err(format!("unknown capability kind: {other}")),
        }
    }
}

/// Binds a capability kind to its typed request and response payloads.
///
/// Requests are `Clone` so a failed attempt can be replayed against the
/// same or another provider.
pub trait Capability: Send + Sync + 'static {
    const KIND: CapabilityKind;

    type Request: Clone + Send + Sync + 'static;
    type Response: ResponseMeta + Send + Sync + 'static;
}

/// Text generation (prompt in, text out).
pub struct TextGeneration;

impl Capability for TextGeneration {
    const KIND: CapabilityKind = CapabilityKind::TextGeneration;
    type Request = TextRequest;
    type Response = TextResponse;
}

/// Speech-to-text transcription.
pub struct SpeechToText;

impl Capability for SpeechToText {
    const KIND: CapabilityKind = CapabilityKind::SpeechToText;
    type Request = TranscriptionRequest;
    type Response = TranscriptionResponse;
}

/// Text-to-speech synthesis.
pub struct TextToSpeech;

impl Capability for TextToSpeech {
    const KIND: CapabilityKind = CapabilityKind::TextToSpeech;
    type Request = SpeechRequest;
    type Response = SpeechResponse;
}

/// Image generation.
pub struct ImageGeneration;

impl Capability for ImageGeneration {
    const KIND: CapabilityKind = CapabilityKind::ImageGeneration;
    type Request = ImageRequest;
    type Response = ImageResponse;
}

/// Text embedding.
pub struct Embedding;

impl Capability for Embedding {
    const KIND: CapabilityKind = CapabilityKind::Embedding;
    type Request = EmbeddingRequest;
    type Response = EmbeddingResponse;
}
