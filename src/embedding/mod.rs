pub mod fireworks;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::{EmbeddingProviderKind, Settings};
use crate::error::{MatchError, ProviderError};
use crate::models::chunk::EmbeddingVector;
use fireworks::FireworksEmbeddingModel;
use openai::OpenAIEmbeddingModel;

/// Abstract embedding model interface.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, MatchError>;

    /// Dimensionality the stored vectors are expected to have, if configured.
    fn expected_dimensions(&self) -> Option<u32>;

    /// Short backend name for logs and health output.
    fn provider_name(&self) -> &'static str;
}

/// Pick the configured backend once at startup.
pub fn build_embedding_model(settings: &Settings) -> anyhow::Result<Arc<dyn EmbeddingModel>> {
    let model: Arc<dyn EmbeddingModel> = match settings.embedding_provider {
        EmbeddingProviderKind::OpenAI => Arc::new(OpenAIEmbeddingModel::from_settings(settings)?),
        EmbeddingProviderKind::Fireworks => {
            Arc::new(FireworksEmbeddingModel::from_settings(settings)?)
        }
    };
    Ok(model)
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    pub input: &'a str,
    pub model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
}

pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Turn an HTTP response into a vector, classifying every failure.
pub(crate) async fn read_embedding(
    provider: &'static str,
    retry: bool,
    resp: reqwest::Response,
) -> Result<EmbeddingVector, ProviderError> {
    let status = resp.status();
    let body = resp.text().await.map_err(|source| ProviderError::Transport {
        provider,
        retry,
        source,
    })?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            retry,
            status: status.as_u16(),
            body,
        });
    }

    parse_embedding_body(provider, retry, &body)
}

fn parse_embedding_body(
    provider: &'static str,
    retry: bool,
    body: &str,
) -> Result<EmbeddingVector, ProviderError> {
    let malformed = |reason: String| ProviderError::Malformed {
        provider,
        retry,
        reason,
        payload: body.to_string(),
    };

    let parsed: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    let first = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| malformed("empty data array".to_string()))?;
    if first.embedding.is_empty() {
        return Err(malformed("empty embedding".to_string()));
    }
    Ok(EmbeddingVector::new(first.embedding))
}

/// Log when a provider returns a size other than the configured one.
pub(crate) fn check_dimensions(provider: &'static str, expected: Option<u32>, got: usize) {
    if let Some(expected) = expected {
        if expected as usize != got {
            warn!(
                provider,
                expected,
                got,
                "embedding dimension differs from configured dimensionality"
            );
        }
    }
}
