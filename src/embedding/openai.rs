use async_trait::async_trait;
use std::time::Duration;

use super::{check_dimensions, http_client, read_embedding, EmbeddingModel, EmbeddingRequest};
use crate::config::Settings;
use crate::error::{MatchError, ProviderError};
use crate::models::chunk::EmbeddingVector;

const PROVIDER: &str = "openai";

/// OpenAI embedding model via API. The primary backend.
pub struct OpenAIEmbeddingModel {
    model_name: String,
    api_key: Option<String>,
    base_url: String,
    expected_dimensions: Option<u32>,
    http_client: reqwest::Client,
}

impl OpenAIEmbeddingModel {
    pub fn new(
        model_name: &str,
        api_key: Option<String>,
        base_url: &str,
        expected_dimensions: Option<u32>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            model_name: model_name.to_string(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            expected_dimensions,
            http_client: http_client(timeout)?,
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            &settings.openai_model,
            settings.openai_api_key.clone(),
            &settings.openai_base_url,
            settings.embedding_dimensions,
            Duration::from_secs(settings.embedding_timeout_secs),
        )
    }
}

#[async_trait]
impl EmbeddingModel for OpenAIEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, MatchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MatchError::Configuration("OPENAI_API_KEY is not set".to_string()))?;

        let request = EmbeddingRequest {
            input: text,
            model: &self.model_name,
            dimensions: None,
        };

        let resp = self
            .http_client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                retry: false,
                source,
            })?;

        let vector = read_embedding(PROVIDER, false, resp).await?;
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
