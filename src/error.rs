use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `mirepoix`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; provider plumbing continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum MirepoixError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Media acquisition / validation ───────────────────────────────────
    #[error("media: {0}")]
    Media(#[from] MediaError),

    // ── Extraction pipeline ──────────────────────────────────────────────
    #[error("extract: {0}")]
    Extract(#[from] ExtractError),

    // ── Generic fallthrough (wraps anyhow for interop) ───────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Zero usable credentials: every extraction call fails fast, no network
    /// attempt is made.
    #[error("no API credentials configured")]
    NoCredentials,

    #[error("failed to load config: {0}")]
    Load(String),

    /// The HTTP client could not be built with the configured timeouts.
    /// Surfaced instead of falling back to an untimed default client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

// ─── Media errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MediaError {
    /// Bytes do not carry a recognized image signature. Rejects HTML error
    /// pages served by expiring thumbnail CDNs.
    #[error("payload is not a valid image")]
    InvalidImage,

    #[error("video at {path} is {size} bytes, over the {limit}-byte inline ceiling")]
    VideoTooLarge { path: String, size: u64, limit: u64 },

    #[error("invalid media url: {0}")]
    InvalidUrl(String),

    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Extraction errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The model response was not valid JSON even after fence extraction.
    #[error("model response is not valid JSON: {0}")]
    Parse(String),

    /// Provider pool exhausted; carries the first error seen across attempts.
    #[error("provider: {0}")]
    Provider(#[source] anyhow::Error),
}

// ─── Convenience re-exports ──────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, MirepoixError>;
