use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A bounded window of source text, produced transiently by the chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub content: String,
    /// Zero-based position of the window within the source text.
    pub order: usize,
}

/// Dense embedding returned by a provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector {
    pub values: Vec<f64>,
}

impl EmbeddingVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of absolute component values. Zero means a degenerate vector.
    pub fn abs_sum(&self) -> f64 {
        self.values.iter().map(|v| v.abs()).sum()
    }
}

/// The entity a stored embedding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Job,
    Cv,
}

impl OwnerKind {
    pub fn embedding_table(&self) -> &'static str {
        match self {
            OwnerKind::Job => "job_embeddings",
            OwnerKind::Cv => "cv_embeddings",
        }
    }

    pub fn owner_table(&self) -> &'static str {
        match self {
            OwnerKind::Job => "jobs",
            OwnerKind::Cv => "cvs",
        }
    }

    pub fn owner_column(&self) -> &'static str {
        match self {
            OwnerKind::Job => "job_id",
            OwnerKind::Cv => "cv_id",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKind::Job => write!(f, "job"),
            OwnerKind::Cv => write!(f, "cv"),
        }
    }
}

/// One persisted chunk embedding. An owner has one row per chunk.
#[derive(Debug, Clone, Serialize)]
pub struct StoredEmbedding {
    pub id: Uuid,
    pub owner_kind: OwnerKind,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}
