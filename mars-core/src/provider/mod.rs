//! The uniform provider contract over dissimilar vendor HTTP APIs
//!
//! Every back-end (Anthropic, OpenAI, Google, Ollama, ...) implements
//! [`Provider`]. The trait is the only cross-vendor surface in MARS: once a
//! `Box<dyn Provider>` is constructed, strategies never again touch
//! vendor-specific request/response shapes.

pub mod anthropic;
pub mod google;
pub mod ollama;
pub mod openai;
pub mod registry;
pub mod retry;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::types::{Message, TokenUsage};

pub use registry::Registry;
pub use retry::{is_transient, RetryConfig};

/// Errors a provider call can fail with.
///
/// The retry wrapper classifies these by inspecting the variant name and
/// message text (see [`retry::is_transient`]); it does not special-case
/// vendors.
#[derive(Debug, thiserror::Error, Clone)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("service unavailable ({status}): {message}")]
    ServiceUnavailable { status: u16, message: String },

    #[error("model error: {0}")]
    Model(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("mid-stream failure: {0}")]
    MidStream(String),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// The text the retry classifier inspects: the variant's display plus
    /// its debug name, so a `ServiceUnavailable { status: 503, .. }` matches
    /// on both "503" and "ServiceUnavailable".
    pub fn classification_text(&self) -> String {
        format!("{:?} {}", self, self)
    }
}

/// A chunk of a streamed response.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    TextDelta(String),
    /// Emitted once the stream is fully drained; usage is only valid here.
    Done { usage: TokenUsage },
}

/// Uniform contract over one model back-end.
///
/// `generate` returns complete content or fails outright. `stream` yields
/// text chunks in order; concatenating every `TextDelta` equals the content
/// `generate` would have produced for the same inputs (modulo model
/// non-determinism). Usage is only meaningful after a stream's `Done` event.
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Stable identifier used in config, registry lookups, and attribution
    /// (e.g. "anthropic").
    fn name(&self) -> &str;

    /// The model used when no override is configured.
    fn default_model(&self) -> &str;

    /// Send `messages` and return the complete response.
    ///
    /// `temperature = None` must not transmit a temperature value to the
    /// back-end; the vendor's own default applies.
    async fn generate(
        &self,
        messages: &[Message],
        model: Option<&str>,
        max_tokens: usize,
        temperature: Option<f32>,
    ) -> Result<(String, TokenUsage), ProviderError>;

    /// Send `messages` and stream the response incrementally.
    ///
    /// The default implementation calls `generate` and replays it as a
    /// single chunk; providers that support real streaming override this.
    async fn stream(
        &self,
        messages: &[Message],
        model: Option<&str>,
        max_tokens: usize,
        temperature: Option<f32>,
    ) -> Result<BoxStream<'static, Result<StreamEvent, ProviderError>>, ProviderError> {
        let (content, usage) = self.generate(messages, model, max_tokens, temperature).await?;
        let events = vec![Ok(StreamEvent::TextDelta(content)), Ok(StreamEvent::Done { usage })];
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_text_includes_variant_and_message() {
        let err = ProviderError::ServiceUnavailable {
            status: 503,
            message: "overloaded".into(),
        };
        let text = err.classification_text();
        assert!(text.contains("ServiceUnavailable"));
        assert!(text.contains("503"));
    }
}
