use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::MatchError;
use crate::matching::pipeline::IndexOutcome;
use crate::models::api::IndexResponse;
use crate::models::chunk::OwnerKind;

/// Embedding (re-)indexing routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/jobs/{job_id}/embeddings", post(index_job))
        .route("/v1/cvs/{cv_id}/embeddings", post(index_cv))
}

fn index_response(owner_id: Uuid, outcome: IndexOutcome) -> Json<IndexResponse> {
    Json(IndexResponse {
        owner_id,
        chunk_count: outcome.chunk_count,
        stored: outcome.stored.len(),
        replaced: outcome.replaced,
        embedding_warnings: outcome.warnings,
    })
}

/// POST /v1/jobs/{job_id}/embeddings
async fn index_job(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<IndexResponse>, MatchError> {
    let Path(job_id) = path?;
    let job = state
        .database
        .get_job(job_id)
        .await?
        .ok_or_else(|| MatchError::NotFound(format!("Job {job_id} not found")))?;
    info!(job_id = %job.id, title = %job.title, "Re-indexing job embeddings");

    let outcome = state
        .pipeline
        .index_owner(OwnerKind::Job, job_id, &job.source_text())
        .await?;
    Ok(index_response(job_id, outcome))
}

/// POST /v1/cvs/{cv_id}/embeddings
async fn index_cv(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<IndexResponse>, MatchError> {
    let Path(cv_id) = path?;
    let cv = state
        .database
        .get_cv(cv_id)
        .await?
        .ok_or_else(|| MatchError::NotFound(format!("CV {cv_id} not found")))?;
    info!(cv_id = %cv.id, filename = %cv.filename, "Re-indexing CV embeddings");

    let text = cv.parsed_text.unwrap_or_default();
    let outcome = state.pipeline.index_owner(OwnerKind::Cv, cv_id, &text).await?;
    Ok(index_response(cv_id, outcome))
}
