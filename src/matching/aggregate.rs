use std::collections::HashMap;
use uuid::Uuid;

use crate::models::candidate::MatchCandidate;

/// Nearest-neighbour results for one query chunk.
#[derive(Debug, Clone)]
pub struct ChunkResult {
    pub candidates: Vec<MatchCandidate>,
}

/// Post-merge filters.
#[derive(Debug, Clone, Default)]
pub struct MatchFilters {
    /// Inclusive minimum score.
    pub score_floor: f64,
    /// Keep candidates containing any of these (case-insensitive).
    pub must_contain: Vec<String>,
    /// Drop candidates containing any of these (case-insensitive).
    pub must_not_contain: Vec<String>,
}

fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Merge per-chunk results into one list per entity.
///
/// Each entity keeps its highest score across chunks. Candidates below the
/// score floor or failing the keyword filters are dropped, and the rest are
/// sorted by descending score with first-seen order breaking ties.
pub fn aggregate(chunk_results: &[ChunkResult], filters: &MatchFilters) -> Vec<MatchCandidate> {
    let mut merged: Vec<MatchCandidate> = Vec::new();
    let mut position: HashMap<Uuid, usize> = HashMap::new();

    for candidate in chunk_results.iter().flat_map(|r| r.candidates.iter()) {
        match position.get(&candidate.entity_id) {
            Some(&idx) => {
                if candidate.score > merged[idx].score {
                    merged[idx] = candidate.clone();
                }
            }
            None => {
                position.insert(candidate.entity_id, merged.len());
                merged.push(candidate.clone());
            }
        }
    }

    let include = normalize_keywords(&filters.must_contain);
    let exclude = normalize_keywords(&filters.must_not_contain);

    let mut results: Vec<MatchCandidate> = merged
        .into_iter()
        .filter(|c| c.score >= filters.score_floor)
        .filter(|c| {
            if include.is_empty() && exclude.is_empty() {
                return true;
            }
            let text = c.searchable_text();
            let included = include.is_empty() || include.iter().any(|k| text.contains(k.as_str()));
            let excluded = exclude.iter().any(|k| text.contains(k.as_str()));
            included && !excluded
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results
}
