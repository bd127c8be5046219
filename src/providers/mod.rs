pub mod failover;
pub mod gemini;
mod gemini_types;
pub mod sse;

pub use failover::{FailoverClient, is_rotatable};
pub use gemini::GeminiModel;

use crate::media::MediaPart;
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

/// One generation request: a prompt plus zero or more inline media parts.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub media: Vec<MediaPart>,
}

impl GenerationRequest {
    #[must_use]
    pub fn text_only(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            media: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_media(prompt: impl Into<String>, media: Vec<MediaPart>) -> Self {
        Self {
            prompt: prompt.into(),
            media,
        }
    }
}

/// Incremental text chunks from a streaming generation call.
pub type TokenStream = Pin<Box<dyn Stream<Item = anyhow::Result<String>> + Send>>;

/// The seam the failover layer rotates over: one backend per credential.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<String>;

    /// Acquire a token stream. Errors here are rotation candidates; errors
    /// while consuming the returned stream are the caller's to handle.
    async fn open_stream(&self, request: &GenerationRequest) -> anyhow::Result<TokenStream>;
}
