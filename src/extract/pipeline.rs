use super::json;
use super::prompt;
use super::types::{PortionAnalysis, RecipeResult};
use crate::bundle::ExtractionContext;
use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};
use crate::media::MediaPart;
use crate::providers::{FailoverClient, GenerationRequest};
use std::sync::Arc;
use std::time::Duration;

/// Non-streaming extraction entry points.
///
/// Failure policy, one per operation: [`extract`](Self::extract) propagates
/// provider and parse errors and maps a structured `{error}` payload to
/// `Ok(None)`; [`analyze_portions`](Self::analyze_portions) never errors,
/// retrying and then degrading to the empty sentinel because its consumer
/// must always render something.
#[derive(Clone)]
pub struct ExtractionPipeline {
    client: Arc<FailoverClient>,
    config: Arc<ExtractorConfig>,
}

impl ExtractionPipeline {
    pub fn new(config: Arc<ExtractorConfig>) -> Result<Self> {
        let client = Arc::new(FailoverClient::from_config(&config)?);
        Ok(Self { client, config })
    }

    pub fn with_client(config: Arc<ExtractorConfig>, client: Arc<FailoverClient>) -> Self {
        Self { client, config }
    }

    pub(crate) fn client(&self) -> &Arc<FailoverClient> {
        &self.client
    }

    /// Extract a recipe from an assembled context.
    pub async fn extract(&self, context: &ExtractionContext) -> Result<Option<RecipeResult>> {
        let request = GenerationRequest::with_media(
            prompt::batch_prompt(context),
            context.media_parts.clone(),
        );
        let raw = self
            .client
            .generate(&request)
            .await
            .map_err(ExtractError::Provider)?;
        tracing::debug!(chars = raw.len(), "Model response received");
        Ok(json::parse_response::<RecipeResult>(&raw)?)
    }

    /// Analyze a plate photo for portions and calories.
    ///
    /// A structured `{error}` payload (no food visible) short-circuits to the
    /// sentinel without burning retries.
    pub async fn analyze_portions(&self, photo: MediaPart) -> PortionAnalysis {
        let request = GenerationRequest::with_media(prompt::portion_prompt(), vec![photo]);
        let attempts = self.config.analysis_retries + 1;

        for attempt in 0..attempts {
            match self.run_portion_analysis(&request).await {
                Ok(Some(analysis)) => return analysis.with_defaults(),
                Ok(None) => {
                    tracing::debug!("Model reported no food visible");
                    return PortionAnalysis::empty();
                }
                Err(error) => {
                    tracing::warn!(attempt, %error, "Portion analysis attempt failed");
                    if attempt + 1 < attempts {
                        tokio::time::sleep(Duration::from_millis(
                            self.config.analysis_retry_pause_ms,
                        ))
                        .await;
                    }
                }
            }
        }

        PortionAnalysis::empty()
    }

    async fn run_portion_analysis(
        &self,
        request: &GenerationRequest,
    ) -> anyhow::Result<Option<PortionAnalysis>> {
        let raw = self.client.generate(request).await?;
        Ok(json::parse_response::<PortionAnalysis>(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MirepoixError;
    use crate::providers::{GenerativeBackend, TokenStream};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays a script of canned replies, one per call.
    struct ReplayBackend {
        replies: Mutex<VecDeque<anyhow::Result<String>>>,
    }

    impl ReplayBackend {
        fn client(replies: Vec<anyhow::Result<String>>) -> Arc<FailoverClient> {
            let backend = Box::new(Self {
                replies: Mutex::new(replies.into_iter().collect()),
            }) as Box<dyn GenerativeBackend>;
            Arc::new(FailoverClient::new(vec![backend]).unwrap())
        }
    }

    #[async_trait]
    impl GenerativeBackend for ReplayBackend {
        async fn generate(&self, _request: &GenerationRequest) -> anyhow::Result<String> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")))
        }

        async fn open_stream(&self, _request: &GenerationRequest) -> anyhow::Result<TokenStream> {
            anyhow::bail!("not a streaming test backend")
        }
    }

    fn pipeline_with(replies: Vec<anyhow::Result<String>>) -> ExtractionPipeline {
        let config = Arc::new(ExtractorConfig {
            api_keys: vec!["test-key".into()],
            analysis_retry_pause_ms: 1,
            ..ExtractorConfig::default()
        });
        ExtractionPipeline::with_client(config, ReplayBackend::client(replies))
    }

    fn context() -> ExtractionContext {
        ExtractionContext {
            context_lines: vec!["SOURCE: test — https://example.test".into()],
            media_parts: Vec::new(),
            used_video: false,
            caption_is_authoritative: false,
        }
    }

    fn photo() -> MediaPart {
        MediaPart::new("image/jpeg", "/9j/AAAA")
    }

    #[tokio::test]
    async fn extract_parses_fenced_recipe() {
        let pipeline = pipeline_with(vec![Ok(
            "```json\n{\"title\":\"Pasta\",\"confidence\":0.9}\n```".into()
        )]);
        let recipe = pipeline.extract(&context()).await.unwrap().unwrap();
        assert_eq!(recipe.title, "Pasta");
    }

    #[tokio::test]
    async fn extract_maps_error_payload_to_none() {
        let pipeline = pipeline_with(vec![Ok(
            r#"{"error":"no recipe in this video","confidence":0}"#.into(),
        )]);
        assert!(pipeline.extract(&context()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn extract_propagates_provider_failure() {
        let pipeline = pipeline_with(vec![Err(anyhow::anyhow!("400 malformed request"))]);
        let err = pipeline.extract(&context()).await.unwrap_err();
        assert!(matches!(
            err,
            MirepoixError::Extract(ExtractError::Provider(_))
        ));
    }

    #[tokio::test]
    async fn extract_propagates_parse_failure() {
        let pipeline = pipeline_with(vec![Ok("definitely not json".into())]);
        let err = pipeline.extract(&context()).await.unwrap_err();
        assert!(matches!(err, MirepoixError::Extract(ExtractError::Parse(_))));
    }

    #[tokio::test]
    async fn analyze_portions_applies_defaults() {
        let pipeline = pipeline_with(vec![Ok(r#"{
            "detectedItems": [
                {"name": "rice", "estimatedCalories": 200},
                {"name": "curry", "estimatedCalories": 350}
            ],
            "suggestedServings": 0,
            "totalEstimatedCalories": -1,
            "recommendations": []
        }"#
        .into())]);

        let analysis = pipeline.analyze_portions(photo()).await;
        assert_eq!(analysis.suggested_servings, 1);
        assert!((analysis.total_estimated_calories - 550.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn analyze_portions_recovers_on_retry() {
        let pipeline = pipeline_with(vec![
            Ok("garbled".into()),
            Ok(r#"{"detectedItems":[{"name":"soup","estimatedCalories":180}],
                   "suggestedServings":1,"totalEstimatedCalories":180,"recommendations":[]}"#
                .into()),
        ]);

        let analysis = pipeline.analyze_portions(photo()).await;
        assert_eq!(analysis.detected_items.len(), 1);
        assert_eq!(analysis.detected_items[0].name, "soup");
    }

    #[tokio::test]
    async fn analyze_portions_exhausts_retries_into_sentinel() {
        let pipeline = pipeline_with(vec![
            Ok("garbled one".into()),
            Ok("garbled two".into()),
            Ok("garbled three".into()),
        ]);

        let analysis = pipeline.analyze_portions(photo()).await;
        assert_eq!(analysis, PortionAnalysis::empty());
    }

    #[tokio::test]
    async fn analyze_portions_no_food_short_circuits_to_sentinel() {
        let pipeline = pipeline_with(vec![
            Ok(r#"{"error":"no food visible","confidence":0}"#.into()),
            // A retry would consume this and fail the assertion below.
            Ok(r#"{"detectedItems":[{"name":"x","estimatedCalories":1}],
                   "suggestedServings":1,"totalEstimatedCalories":1,"recommendations":[]}"#
                .into()),
        ]);

        let analysis = pipeline.analyze_portions(photo()).await;
        assert_eq!(analysis, PortionAnalysis::empty());
    }

    #[tokio::test]
    async fn pipeline_new_fails_fast_without_credentials() {
        let config = Arc::new(ExtractorConfig::default());
        assert!(ExtractionPipeline::new(config).is_err());
    }
}
