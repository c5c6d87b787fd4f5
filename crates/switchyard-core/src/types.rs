//! Request and response payloads for each capability.
//!
//! The router never looks inside these beyond [`ResponseMeta::usage`];
//! everything else is carried opaquely between the caller and the backend.

use serde::{Deserialize, Serialize};

/// Usage and cost summary a backend may attach to a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    /// Estimated cost in the backend's billing currency, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

/// Access to the usage summary of a capability response.
pub trait ResponseMeta {
    fn usage(&self) -> Option<&Usage>;
}

// ============================================================================
// Text generation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            model: None,
            max_tokens: None,
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
    /// Model that actually served the request, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

// ============================================================================
// Speech-to-text
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    /// Encoded audio payload (container format per `format`).
    pub audio: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

// ============================================================================
// Text-to-speech
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechResponse {
    pub audio: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

// ============================================================================
// Image generation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Number of images to generate (backend default when absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    /// Image URLs or base64 payloads, per the backend's convention.
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

// ============================================================================
// Embedding
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub vectors: Vec<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

macro_rules! impl_response_meta {
    ($($ty:ty),+ $(,)?) => {
        $(impl ResponseMeta for $ty {
            fn usage(&self) -> Option<&Usage> {
                self.usage.as_ref()
            }
        })+
    };
}

impl_response_meta!(
    TextResponse,
    TranscriptionResponse,
    SpeechResponse,
    ImageResponse,
    EmbeddingResponse,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_is_reachable_through_response_meta() {
        let response = TextResponse {
            text: "ok".into(),
            model: None,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
                cost: Some(0.0003),
            }),
        };
        assert_eq!(response.usage().unwrap().total_tokens, 15);
    }

    #[test]
    fn absent_usage_is_none() {
        let response = EmbeddingResponse {
            vectors: vec![vec![0.1, 0.2]],
            usage: None,
        };
        assert!(response.usage().is_none());
    }
}
