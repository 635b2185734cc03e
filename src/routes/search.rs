use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::MatchError;
use crate::matching::pipeline::{MatchOutcome, MatchQuery};
use crate::models::api::{CandidatesRequest, CvMatchRequest, HealthResponse, SearchRequest, SearchResponse};
use crate::models::chunk::OwnerKind;

/// Search and matching routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/rag/search", post(search))
        .route("/v1/rag/cv-match", post(cv_match))
        .route("/v1/jobs/{job_id}/candidates", post(job_candidates))
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        environment: state.settings.environment.clone(),
        embedding_provider: state.pipeline.provider_name().to_string(),
    })
}

/// Upper bound on `top_n` accepted from clients.
pub const MAX_TOP_N: usize = 1000;

fn validate(query: &MatchQuery) -> Result<(), MatchError> {
    if query.top_n == 0 || query.top_n > MAX_TOP_N {
        return Err(MatchError::InvalidInput(format!(
            "top_n must be between 1 and {MAX_TOP_N}"
        )));
    }
    if !query.filters.score_floor.is_finite() {
        return Err(MatchError::InvalidInput("score_floor must be a finite number".to_string()));
    }
    Ok(())
}

async fn run(state: &AppState, text: &str, query: MatchQuery) -> Result<Json<SearchResponse>, MatchError> {
    validate(&query)?;
    let MatchOutcome {
        results,
        diagnostic,
        warnings,
    } = state.pipeline.search(text, &query).await?;
    Ok(Json(SearchResponse {
        results,
        diagnostic,
        warnings,
    }))
}

/// POST /v1/rag/search - Rank active jobs against free text.
async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, MatchError> {
    let Json(req) = payload?;
    if req.query.trim().is_empty() {
        return Err(MatchError::InvalidInput("query must not be empty".to_string()));
    }
    let query = state.match_query(
        OwnerKind::Job,
        req.top_n,
        req.score_floor,
        req.must_contain,
        req.must_not_contain,
    );
    run(&state, &req.query, query).await
}

/// POST /v1/rag/cv-match - Rank active jobs against a CV.
async fn cv_match(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CvMatchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, MatchError> {
    let Json(req) = payload?;
    let text = match (req.cv_id, req.text) {
        (Some(cv_id), _) => {
            let cv = state
                .database
                .get_cv(cv_id)
                .await?
                .ok_or_else(|| MatchError::NotFound(format!("CV {cv_id} not found")))?;
            cv.parsed_text.unwrap_or_default()
        }
        (None, Some(text)) => text,
        (None, None) => {
            return Err(MatchError::InvalidInput(
                "either cv_id or text is required".to_string(),
            ))
        }
    };
    if text.trim().is_empty() {
        return Err(MatchError::InvalidInput("CV text is empty".to_string()));
    }

    let query = state.match_query(
        OwnerKind::Job,
        req.top_n,
        req.score_floor,
        req.must_contain,
        req.must_not_contain,
    );
    run(&state, &text, query).await
}

/// POST /v1/jobs/{job_id}/candidates - Rank CVs against a job.
async fn job_candidates(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CandidatesRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, MatchError> {
    let Path(job_id) = path?;
    let Json(req) = payload?;
    let job = state
        .database
        .get_job(job_id)
        .await?
        .ok_or_else(|| MatchError::NotFound(format!("Job {job_id} not found")))?;

    let query = MatchQuery {
        active_only: false,
        ..state.match_query(
            OwnerKind::Cv,
            req.top_n,
            req.score_floor,
            req.must_contain,
            req.must_not_contain,
        )
    };
    run(&state, &job.source_text(), query).await
}
