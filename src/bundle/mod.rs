pub mod authority;

pub use authority::caption_is_authoritative;

use crate::config::ExtractorConfig;
use crate::error::ConfigError;
use crate::media::{MediaEncoder, MediaPart};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything the source resolver knows about a recipe source.
///
/// Every evidence field is independently optional; `platform` and
/// `source_url` are always present. Field order here mirrors the priority
/// order the assembler emits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentBundle {
    pub video_local_path: Option<PathBuf>,
    pub caption: Option<String>,
    pub transcript: Option<String>,
    pub thumbnail_url: Option<String>,
    pub page_text: Option<String>,
    /// schema.org-style metadata scraped from the source page.
    pub structured_data: Option<serde_json::Value>,
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub source_url: String,
}

/// Immutable per-call extraction input, derived from a [`ContentBundle`].
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    pub context_lines: Vec<String>,
    pub media_parts: Vec<MediaPart>,
    pub used_video: bool,
    pub caption_is_authoritative: bool,
}

impl ExtractionContext {
    #[must_use]
    pub fn context_text(&self) -> String {
        self.context_lines.join("\n")
    }
}

/// Fuses the bundle's heterogeneous evidence into one [`ExtractionContext`].
pub struct Assembler {
    encoder: MediaEncoder,
    config: Arc<ExtractorConfig>,
}

impl Assembler {
    pub fn new(config: Arc<ExtractorConfig>) -> Result<Self, ConfigError> {
        let encoder = MediaEncoder::new(&config)?;
        Ok(Self { encoder, config })
    }

    pub fn with_encoder(config: Arc<ExtractorConfig>, encoder: MediaEncoder) -> Self {
        Self { encoder, config }
    }

    /// Assemble context lines and media attachments.
    ///
    /// Never fails: any media problem is logged and the extraction proceeds
    /// with reduced evidence.
    pub async fn assemble(&self, bundle: &ContentBundle) -> ExtractionContext {
        let context_lines = self.build_context_lines(bundle);
        let (media_parts, used_video) = self.attach_media(bundle).await;

        ExtractionContext {
            context_lines,
            media_parts,
            used_video,
            caption_is_authoritative: caption_is_authoritative(bundle.caption.as_deref()),
        }
    }

    fn build_context_lines(&self, bundle: &ContentBundle) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(data) = &bundle.structured_data {
            lines.push(format!("STRUCTURED METADATA: {data}"));
        }
        if let Some(title) = non_empty(bundle.title.as_deref()) {
            lines.push(format!("TITLE: {title}"));
        }
        if let Some(author) = non_empty(bundle.author.as_deref()) {
            lines.push(format!("AUTHOR: {author}"));
        }
        if let Some(caption) = non_empty(bundle.caption.as_deref()) {
            lines.push(format!("CAPTION: {caption}"));
        }
        if let Some(transcript) = non_empty(bundle.transcript.as_deref()) {
            lines.push(format!(
                "TRANSCRIPT: {}",
                truncate_chars(transcript, self.config.transcript_char_limit)
            ));
        }
        if let Some(page_text) = non_empty(bundle.page_text.as_deref()) {
            lines.push(format!(
                "PAGE TEXT: {}",
                truncate_chars(page_text, self.config.page_text_char_limit)
            ));
        }
        lines.push(format!(
            "SOURCE: {} — {}",
            bundle.platform, bundle.source_url
        ));

        lines
    }

    /// Attachment policy: an under-ceiling local video wins; a thumbnail is
    /// attempted only when no video was attached. Never both — the video
    /// already provides visual context and thumbnail CDNs expire.
    async fn attach_media(&self, bundle: &ContentBundle) -> (Vec<MediaPart>, bool) {
        let mut parts = Vec::new();
        let mut used_video = false;

        if let Some(path) = &bundle.video_local_path {
            match tokio::fs::metadata(path).await {
                Ok(meta) if meta.len() < self.config.max_inline_video_bytes => {
                    match self.encoder.video_part(path).await {
                        Ok(part) => {
                            parts.push(part);
                            used_video = true;
                        }
                        Err(error) => {
                            tracing::warn!(path = %path.display(), %error, "Skipping video attachment");
                        }
                    }
                }
                Ok(meta) => {
                    tracing::warn!(
                        path = %path.display(),
                        size = meta.len(),
                        limit = self.config.max_inline_video_bytes,
                        "Video over inline ceiling, continuing without it"
                    );
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Video file not readable");
                }
            }
        }

        if !used_video
            && let Some(url) = non_empty(bundle.thumbnail_url.as_deref())
            && let Some(part) = self.encoder.image_part_best_effort(url).await
        {
            parts.push(part);
        }

        (parts, used_video)
    }
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.filter(|text| !text.trim().is_empty())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
