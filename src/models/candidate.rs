use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ranked match for one owner entity. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub entity_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub company_id: Option<Uuid>,
    /// `1 - cosine distance`.
    pub score: f64,
}

impl MatchCandidate {
    /// Lowercased title, description and requirements for keyword filtering.
    pub fn searchable_text(&self) -> String {
        let mut text = self.title.to_lowercase();
        for part in [&self.description, &self.requirements].into_iter().flatten() {
            text.push(' ');
            text.push_str(&part.to_lowercase());
        }
        text
    }
}

/// Unscored nearest-neighbour row: entity id and raw cosine distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDistance {
    pub entity_id: Uuid,
    pub distance: Option<f64>,
}

/// Best-effort store introspection attached to empty results.
///
/// Every field is optional: a probe that fails leaves its field `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub stored_embedding_dim: Option<usize>,
    pub query_embedding_dim: Option<usize>,
    pub configured_dim: Option<u32>,
    /// Set when at least two of the three dimensions above are known and disagree.
    pub dimension_mismatch: Option<bool>,
    pub total_embeddings: Option<i64>,
    pub active_with_embeddings: Option<i64>,
    pub low_threshold_sample: Option<Vec<MatchCandidate>>,
    pub query_abs_sum: Option<f64>,
    pub raw_distances: Option<Vec<RawDistance>>,
}
