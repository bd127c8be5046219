use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration for the extraction engine.
///
/// Every knob that was an inline literal in earlier prototypes lives here with
/// a serde default, so deployments can override any of them from a config file
/// while bare `ExtractorConfig::from_env()` keeps working.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Ordered credential pool. Index order is the failover rotation order.
    #[serde(default)]
    pub api_keys: Vec<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Gemini API base. Overridable so tests can point at a local server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Inline-video ceiling. Videos over this are skipped, not rejected.
    #[serde(default = "default_max_inline_video_bytes")]
    pub max_inline_video_bytes: u64,

    #[serde(default = "default_transcript_char_limit")]
    pub transcript_char_limit: usize,

    #[serde(default = "default_page_text_char_limit")]
    pub page_text_char_limit: usize,

    /// Extra attempts for the portion-analysis variant before the sentinel.
    #[serde(default = "default_analysis_retries")]
    pub analysis_retries: u32,

    #[serde(default = "default_analysis_retry_pause_ms")]
    pub analysis_retry_pause_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_max_inline_video_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_transcript_char_limit() -> usize {
    12_000
}

fn default_page_text_char_limit() -> usize {
    10_000
}

fn default_analysis_retries() -> u32 {
    2
}

fn default_analysis_retry_pause_ms() -> u64 {
    1_000
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            model: default_model(),
            base_url: default_base_url(),
            max_inline_video_bytes: default_max_inline_video_bytes(),
            transcript_char_limit: default_transcript_char_limit(),
            page_text_char_limit: default_page_text_char_limit(),
            analysis_retries: default_analysis_retries(),
            analysis_retry_pause_ms: default_analysis_retry_pause_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ExtractorConfig {
    /// Build a config from process environment variables.
    ///
    /// Credentials come from `GEMINI_API_KEY` plus numbered overflow slots
    /// `GEMINI_API_KEY_2` through `GEMINI_API_KEY_9`; empty or
    /// whitespace-only entries are dropped, order is preserved.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut api_keys = Vec::new();
        if let Some(primary) = lookup("GEMINI_API_KEY") {
            api_keys.push(primary);
        }
        for slot in 2..=9 {
            if let Some(key) = lookup(&format!("GEMINI_API_KEY_{slot}")) {
                api_keys.push(key);
            }
        }
        api_keys.retain(|key| !key.trim().is_empty());

        let mut config = Self {
            api_keys,
            ..Self::default()
        };
        if let Some(model) = lookup("GEMINI_MODEL")
            && !model.trim().is_empty()
        {
            config.model = model;
        }
        config
    }

    /// Build an HTTP client carrying the configured timeouts.
    ///
    /// A builder failure propagates rather than degrading to a client without
    /// timeouts; every HTTP-speaking component in the crate goes through here.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))
    }

    /// Fail fast when the credential pool is empty. Called once at pipeline
    /// construction so no network attempt is ever made without a key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_keys.is_empty() {
            return Err(ConfigError::NoCredentials);
        }
        Ok(())
    }
}
