use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use super::{check_dimensions, http_client, read_embedding, EmbeddingModel, EmbeddingRequest};
use crate::config::Settings;
use crate::error::{MatchError, ProviderError};
use crate::models::chunk::EmbeddingVector;

const PROVIDER: &str = "fireworks";

/// Fireworks embedding model via its OpenAI-compatible API. The secondary backend.
///
/// Some Fireworks models require an explicit `dimensions` field and others
/// reject it with a 5xx. When a request carrying `dimensions` gets a server
/// error, it is sent once more without the field.
pub struct FireworksEmbeddingModel {
    model_name: String,
    api_key: Option<String>,
    base_url: String,
    request_dimensions: Option<u32>,
    expected_dimensions: Option<u32>,
    http_client: reqwest::Client,
}

impl FireworksEmbeddingModel {
    pub fn new(
        model_name: &str,
        api_key: Option<String>,
        base_url: &str,
        request_dimensions: Option<u32>,
        expected_dimensions: Option<u32>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            model_name: model_name.to_string(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_dimensions,
            expected_dimensions,
            http_client: http_client(timeout)?,
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            &settings.fireworks_model,
            settings.fireworks_api_key.clone(),
            &settings.fireworks_base_url,
            settings.fireworks_dimensions,
            settings.embedding_dimensions,
            Duration::from_secs(settings.embedding_timeout_secs),
        )
    }

    async fn send(
        &self,
        api_key: &str,
        request: &EmbeddingRequest<'_>,
        retry: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        self.http_client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                retry,
                source,
            })
    }
}

#[async_trait]
impl EmbeddingModel for FireworksEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, MatchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MatchError::Configuration("FIREWORKS_API_KEY is not set".to_string()))?;

        let request = EmbeddingRequest {
            input: text,
            model: &self.model_name,
            dimensions: self.request_dimensions,
        };
        let resp = self.send(api_key, &request, false).await?;

        let vector = if request.dimensions.is_some() && resp.status().is_server_error() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                body = %body,
                dimensions = ?request.dimensions,
                "Fireworks rejected explicit dimensions; retrying without them"
            );

            let retry_request = EmbeddingRequest {
                dimensions: None,
                ..request
            };
            let resp = self.send(api_key, &retry_request, true).await?;
            read_embedding(PROVIDER, true, resp).await?
        } else {
            read_embedding(PROVIDER, false, resp).await?
        };

        check_dimensions(PROVIDER, self.expected_dimensions, vector.dimension());
        Ok(vector)
    }

    fn expected_dimensions(&self) -> Option<u32> {
        self.expected_dimensions
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
