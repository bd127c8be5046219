use serde::{Deserialize, Serialize};

/// A validated, transport-ready inline media payload.
///
/// Constructed only after encoding (and, for images, signature validation)
/// succeeds, so downstream code can attach it to a generation request without
/// re-checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPart {
    pub mime_type: String,
    /// Base64-encoded payload bytes.
    pub data: String,
}

impl MediaPart {
    #[must_use]
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    #[must_use]
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}
