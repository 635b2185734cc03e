pub mod embeddings;
pub mod search;

use axum::Router;
use std::sync::Arc;

use crate::app::AppState;

/// Build all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(search::routes())
        .merge(embeddings::routes())
        .with_state(state)
}
