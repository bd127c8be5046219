use super::gemini_types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use super::sse::{SseBuffer, data_payloads};
use super::{GenerationRequest, GenerativeBackend, TokenStream};
use crate::config::ExtractorConfig;
use crate::error::ConfigError;
use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;

const MAX_OUTPUT_TOKENS: u32 = 8192;
const TEMPERATURE: f64 = 0.2;

/// One Gemini model instance bound to a single API credential.
pub struct GeminiModel {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>, config: &ExtractorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: config.http_client()?,
        })
    }

    fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(1 + request.media.len());
        parts.push(Part::text(request.prompt.clone()));
        for media in &request.media {
            parts.push(Part::inline(media.mime_type.clone(), media.data.clone()));
        }

        GenerateContentRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        }
    }

    fn endpoint(&self, method: &str, query_suffix: &str) -> String {
        format!(
            "{}/models/{}:{method}?key={}{query_suffix}",
            self.base_url, self.model, self.api_key
        )
    }

    fn candidate_text(response: &GenerateContentResponse) -> String {
        response
            .candidates
            .as_ref()
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    fn decode_payload(payload: &str) -> anyhow::Result<String> {
        let parsed: GenerateContentResponse = serde_json::from_str(payload)?;
        if let Some(err) = parsed.error {
            anyhow::bail!("Gemini API error: {}", err.message);
        }
        Ok(Self::candidate_text(&parsed))
    }
}

#[async_trait]
impl GenerativeBackend for GeminiModel {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<String> {
        let url = self.endpoint("generateContent", "");
        let body = Self::build_request(request);

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({status}): {error_text}");
        }

        let result: GenerateContentResponse = response.json().await?;
        if let Some(err) = result.error {
            anyhow::bail!("Gemini API error: {}", err.message);
        }

        let text = Self::candidate_text(&result);
        if text.is_empty() {
            anyhow::bail!("empty response from Gemini");
        }
        Ok(text)
    }

    async fn open_stream(&self, request: &GenerationRequest) -> anyhow::Result<TokenStream> {
        let url = self.endpoint("streamGenerateContent", "&alt=sse");
        let body = Self::build_request(request);

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({status}): {error_text}");
        }

        let mut bytes = response.bytes_stream();
        let stream = try_stream! {
            let mut buffer = SseBuffer::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(anyhow::Error::from)?;
                buffer.push_chunk(&chunk);
                while let Some(frame) = buffer.next_event() {
                    for payload in data_payloads(&frame) {
                        let text = Self::decode_payload(payload)?;
                        if !text.is_empty() {
                            yield text;
                        }
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
