use super::sniff::{is_known_image, sniff_image_mime, video_mime_for_path};
use super::types::MediaPart;
use crate::config::ExtractorConfig;
use crate::error::{ConfigError, MediaError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::{Path, PathBuf};
use url::Url;

/// Downloads, reads, validates and base64-encodes binary media for inline
/// attachment to a generation request.
pub struct MediaEncoder {
    client: reqwest::Client,
    tmp_dir: PathBuf,
}

impl MediaEncoder {
    pub fn new(config: &ExtractorConfig) -> Result<Self, ConfigError> {
        Self::with_tmp_dir(config, std::env::temp_dir())
    }

    pub fn with_tmp_dir(config: &ExtractorConfig, tmp_dir: PathBuf) -> Result<Self, ConfigError> {
        Ok(Self {
            client: config.http_client()?,
            tmp_dir,
        })
    }

    /// Download remote media bytes.
    ///
    /// The URL is HTML-entity unescaped first (thumbnail URLs are frequently
    /// lifted from embedded page markup). Bytes are spilled to a uniquely
    /// named temp file and read back; the delete is idempotent and failures
    /// to remove are swallowed.
    pub async fn fetch_remote(&self, raw_url: &str) -> Result<Vec<u8>, MediaError> {
        let cleaned = unescape_html_entities(raw_url);
        let parsed =
            Url::parse(&cleaned).map_err(|_| MediaError::InvalidUrl(cleaned.clone()))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|source| MediaError::Download {
                url: cleaned.clone(),
                source,
            })?;
        let body = response.bytes().await.map_err(|source| MediaError::Download {
            url: cleaned,
            source,
        })?;

        let tmp_path = self.tmp_dir.join(format!("mirepoix-dl-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp_path, &body).await?;
        let bytes = tokio::fs::read(&tmp_path).await?;
        let _ = tokio::fs::remove_file(&tmp_path).await;

        Ok(bytes)
    }

    pub async fn read_local(&self, path: &Path) -> Result<Vec<u8>, MediaError> {
        Ok(tokio::fs::read(path).await?)
    }

    /// Build a validated image part from a remote URL.
    pub async fn image_part(&self, url: &str) -> Result<MediaPart, MediaError> {
        let bytes = self.fetch_remote(url).await?;
        let encoded = BASE64.encode(&bytes);
        if !is_known_image(&encoded) {
            return Err(MediaError::InvalidImage);
        }
        let mime = sniff_image_mime(&encoded);
        Ok(MediaPart::new(mime, encoded))
    }

    /// Best-effort image part. Thumbnail CDNs expire and 404 routinely, so a
    /// failure here degrades to `None` and the extraction proceeds text-only.
    pub async fn image_part_best_effort(&self, url: &str) -> Option<MediaPart> {
        match self.image_part(url).await {
            Ok(part) => Some(part),
            Err(error) => {
                tracing::warn!(url, %error, "Skipping thumbnail attachment");
                None
            }
        }
    }

    /// Build a video part from a local file. MIME comes from the extension;
    /// local files are a trusted source, so no signature check.
    pub async fn video_part(&self, path: &Path) -> Result<MediaPart, MediaError> {
        let bytes = self.read_local(path).await?;
        let mime = video_mime_for_path(path);
        Ok(MediaPart::new(mime, BASE64.encode(&bytes)))
    }
}

/// Undo HTML-entity escaping in URLs lifted from page markup.
#[must_use]
pub fn unescape_html_entities(url: &str) -> String {
    url.replace("&amp;", "&")
        .replace("&#38;", "&")
        .replace("&#x26;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JPEG_MAGIC: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];
    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn encoder_with(dir: &tempfile::TempDir) -> MediaEncoder {
        MediaEncoder::with_tmp_dir(&ExtractorConfig::default(), dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn unescape_handles_query_separators() {
        assert_eq!(
            unescape_html_entities("https://cdn.test/thumb.jpg?a=1&amp;b=2&#38;c=3"),
            "https://cdn.test/thumb.jpg?a=1&b=2&c=3"
        );
        assert_eq!(unescape_html_entities("plain"), "plain");
    }

    #[tokio::test]
    async fn fetch_remote_round_trips_bytes_and_cleans_temp_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thumb.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG_MAGIC.to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let encoder = encoder_with(&dir);
        let bytes = encoder
            .fetch_remote(&format!("{}/thumb.jpg", server.uri()))
            .await
            .unwrap();

        assert_eq!(bytes, JPEG_MAGIC);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "temp download file was not removed");
    }

    #[tokio::test]
    async fn image_part_sniffs_png() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thumb"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_MAGIC.to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let encoder = encoder_with(&dir);
        let part = encoder
            .image_part(&format!("{}/thumb", server.uri()))
            .await
            .unwrap();

        assert_eq!(part.mime_type, "image/png");
        assert!(part.data.starts_with("iVBOR"));
    }

    #[tokio::test]
    async fn image_part_rejects_html_error_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thumb"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html>expired token</html>"),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let encoder = encoder_with(&dir);
        let result = encoder.image_part(&format!("{}/thumb", server.uri())).await;

        assert!(matches!(result, Err(MediaError::InvalidImage)));
    }

    #[tokio::test]
    async fn image_part_best_effort_swallows_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thumb"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let encoder = encoder_with(&dir);
        assert!(
            encoder
                .image_part_best_effort(&format!("{}/thumb", server.uri()))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn video_part_uses_extension_mime() {
        let dir = tempfile::tempdir().unwrap();
        let mov_path = dir.path().join("clip.mov");
        std::fs::write(&mov_path, b"not checked").unwrap();

        let encoder = encoder_with(&dir);
        let part = encoder.video_part(&mov_path).await.unwrap();
        assert_eq!(part.mime_type, "video/quicktime");
        assert_eq!(part.data, BASE64.encode(b"not checked"));
    }

    #[tokio::test]
    async fn fetch_remote_rejects_unparseable_url() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = encoder_with(&dir);
        let result = encoder.fetch_remote("not a url").await;
        assert!(matches!(result, Err(MediaError::InvalidUrl(_))));
    }
}
