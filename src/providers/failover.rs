use super::{GenerationRequest, GenerativeBackend, TokenStream};
use crate::config::ExtractorConfig;
use crate::error::ConfigError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Classify a provider error as rotation-worthy.
///
/// Quota/rate-limit, credential, and unavailability failures are expected to
/// clear up on a different key; anything else (malformed request, network
/// refusal) would fail identically on every credential, so rotation only
/// burns quota.
#[must_use]
pub fn is_rotatable(err: &anyhow::Error) -> bool {
    const ROTATABLE_MARKERS: &[&str] = &[
        "429",
        "quota",
        "rate limit",
        "resource_exhausted",
        "too many requests",
        "401",
        "403",
        "unauthorized",
        "permission denied",
        "api key",
        "invalid credential",
        "503",
        "unavailable",
        "overloaded",
    ];
    let msg = err.to_string().to_ascii_lowercase();
    ROTATABLE_MARKERS.iter().any(|marker| msg.contains(marker))
}

/// Dispatches generation requests across an ordered credential pool with
/// automatic rotation on rotatable failures.
///
/// `active` is a best-effort affinity hint, not a lock: concurrent callers may
/// race on it and the worst outcome is one extra rotated attempt.
pub struct FailoverClient {
    backends: Vec<Box<dyn GenerativeBackend>>,
    active: AtomicUsize,
    classify: fn(&anyhow::Error) -> bool,
}

impl FailoverClient {
    /// One Gemini backend per configured credential, in pool order.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let backends = config
            .api_keys
            .iter()
            .map(|key| {
                super::GeminiModel::new(key, config)
                    .map(|model| Box::new(model) as Box<dyn GenerativeBackend>)
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Self::new(backends)
    }

    pub fn new(backends: Vec<Box<dyn GenerativeBackend>>) -> Result<Self, ConfigError> {
        if backends.is_empty() {
            return Err(ConfigError::NoCredentials);
        }
        Ok(Self {
            backends,
            active: AtomicUsize::new(0),
            classify: is_rotatable,
        })
    }

    /// Swap in a custom rotation classifier (unit tests drive this with
    /// synthetic error messages).
    pub fn with_classifier(mut self, classify: fn(&anyhow::Error) -> bool) -> Self {
        self.classify = classify;
        self
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.backends.len()
    }

    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active.load(Ordering::Relaxed) % self.backends.len()
    }

    pub async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<String> {
        let pool = self.backends.len();
        let start = self.active_index();
        let mut first_err: Option<anyhow::Error> = None;

        for attempt in 0..pool {
            let idx = (start + attempt) % pool;
            match self.backends[idx].generate(request).await {
                Ok(result) => {
                    if idx != start {
                        self.active.store(idx, Ordering::Relaxed);
                    }
                    return Ok(result);
                }
                Err(err) => {
                    let rotatable = (self.classify)(&err);
                    tracing::warn!(
                        credential = idx,
                        attempt,
                        rotatable,
                        "Generation attempt failed: {err}"
                    );
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                    if !rotatable {
                        break;
                    }
                }
            }
        }

        Err(first_err.unwrap_or_else(|| anyhow::anyhow!("credential pool exhausted")))
    }

    /// Rotation applies only to acquiring the stream handle. Failures while
    /// consuming the stream are the caller's responsibility.
    pub async fn open_stream(&self, request: &GenerationRequest) -> anyhow::Result<TokenStream> {
        let pool = self.backends.len();
        let start = self.active_index();
        let mut first_err: Option<anyhow::Error> = None;

        for attempt in 0..pool {
            let idx = (start + attempt) % pool;
            match self.backends[idx].open_stream(request).await {
                Ok(stream) => {
                    if idx != start {
                        self.active.store(idx, Ordering::Relaxed);
                    }
                    return Ok(stream);
                }
                Err(err) => {
                    let rotatable = (self.classify)(&err);
                    tracing::warn!(
                        credential = idx,
                        attempt,
                        rotatable,
                        "Stream acquisition failed: {err}"
                    );
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                    if !rotatable {
                        break;
                    }
                }
            }
        }

        Err(first_err.unwrap_or_else(|| anyhow::anyhow!("credential pool exhausted")))
    }
}
