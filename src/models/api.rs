use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::candidate::{DiagnosticReport, MatchCandidate};

// ──────────────────────────── Search ────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_n: Option<usize>,
    #[serde(default)]
    pub score_floor: Option<f64>,
    #[serde(default)]
    pub must_contain: Vec<String>,
    #[serde(default)]
    pub must_not_contain: Vec<String>,
}

/// Match a CV against active jobs, either by stored CV id or raw text.
#[derive(Debug, Deserialize)]
pub struct CvMatchRequest {
    #[serde(default)]
    pub cv_id: Option<Uuid>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub top_n: Option<usize>,
    #[serde(default)]
    pub score_floor: Option<f64>,
    #[serde(default)]
    pub must_contain: Vec<String>,
    #[serde(default)]
    pub must_not_contain: Vec<String>,
}

/// Filters for ranking CVs against a job.
#[derive(Debug, Default, Deserialize)]
pub struct CandidatesRequest {
    #[serde(default)]
    pub top_n: Option<usize>,
    #[serde(default)]
    pub score_floor: Option<f64>,
    #[serde(default)]
    pub must_contain: Vec<String>,
    #[serde(default)]
    pub must_not_contain: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<MatchCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<DiagnosticReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

// ──────────────────────────── Indexing ────────────────────────────

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub owner_id: Uuid,
    pub chunk_count: usize,
    pub stored: usize,
    pub replaced: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embedding_warnings: Vec<String>,
}

// ──────────────────────────── Health ────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub environment: String,
    pub embedding_provider: String,
}
