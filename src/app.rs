use std::sync::Arc;

use crate::config::Settings;
use crate::database::Database;
use crate::matching::aggregate::MatchFilters;
use crate::matching::pipeline::{MatchPipeline, MatchQuery};
use crate::models::chunk::OwnerKind;

/// Shared application state passed to all route handlers.
pub struct AppState {
    pub settings: Settings,
    pub pipeline: MatchPipeline,
    pub database: Arc<dyn Database>,
}

impl AppState {
    /// Fill request overrides in from configured defaults.
    pub fn match_query(
        &self,
        owner: OwnerKind,
        top_n: Option<usize>,
        score_floor: Option<f64>,
        must_contain: Vec<String>,
        must_not_contain: Vec<String>,
    ) -> MatchQuery {
        MatchQuery {
            owner,
            top_n: top_n.unwrap_or(self.settings.default_top_n),
            active_only: true,
            filters: MatchFilters {
                score_floor: score_floor.unwrap_or(self.settings.default_score_floor),
                must_contain,
                must_not_contain,
            },
        }
    }
}
