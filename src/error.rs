use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Failure of an outbound embedding call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed{}: {source}", retry_suffix(.retry))]
    Transport {
        provider: &'static str,
        retry: bool,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} embedding error{}: status={status}, body={body}", retry_suffix(.retry))]
    Status {
        provider: &'static str,
        retry: bool,
        status: u16,
        body: String,
    },
    #[error("Unexpected {provider} response shape{}: {reason} - {payload}", retry_suffix(.retry))]
    Malformed {
        provider: &'static str,
        retry: bool,
        reason: String,
        payload: String,
    },
}

fn retry_suffix(retry: &bool) -> &'static str {
    if *retry {
        " (retry)"
    } else {
        ""
    }
}

/// Failure of a vector store or database round trip.
#[derive(Debug, Error)]
#[error("{operation} failed: {source}")]
pub struct StoreError {
    pub operation: &'static str,
    #[source]
    pub source: sqlx::Error,
}

impl StoreError {
    pub fn new(operation: &'static str, source: sqlx::Error) -> Self {
        Self { operation, source }
    }
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("{0}")]
    Configuration(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Failed to embed any of {chunk_count} chunks: {}", .warnings.join("; "))]
    NoChunksEmbedded {
        chunk_count: usize,
        warnings: Vec<String>,
    },
    #[error("Failed to store any of {chunk_count} chunk embeddings: {}", .warnings.join("; "))]
    NoChunksStored {
        chunk_count: usize,
        warnings: Vec<String>,
    },
}

impl MatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MatchError::Configuration(_)
            | MatchError::Provider(_)
            | MatchError::InvalidInput(_)
            | MatchError::NoChunksEmbedded { .. }
            | MatchError::NoChunksStored { .. } => StatusCode::BAD_REQUEST,
            MatchError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for MatchError {
    fn from(rejection: JsonRejection) -> Self {
        MatchError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for MatchError {
    fn from(rejection: PathRejection) -> Self {
        MatchError::InvalidInput(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for MatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "request rejected");
        }
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
