use std::future::Future;
use tracing::warn;

use crate::error::StoreError;
use crate::models::candidate::DiagnosticReport;
use crate::models::chunk::{EmbeddingVector, OwnerKind};
use crate::vector_store::VectorStore;

/// Rows returned by the sample and raw-distance probes.
pub const DIAGNOSTIC_SAMPLE_SIZE: usize = 5;

async fn probe<T>(name: &'static str, fut: impl Future<Output = Result<T, StoreError>>) -> Option<T> {
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(probe = name, error = %e, "diagnostic probe failed");
            None
        }
    }
}

/// True when at least two known dimensions disagree; `None` if fewer than two are known.
fn dimensions_disagree(dims: &[Option<usize>]) -> Option<bool> {
    let known: Vec<usize> = dims.iter().flatten().copied().collect();
    if known.len() < 2 {
        return None;
    }
    Some(known.iter().any(|d| *d != known[0]))
}

/// Introspect the store after a query produced no candidates.
///
/// Read-only. Each probe runs independently and a failing probe only leaves
/// its own field empty.
pub async fn diagnose(
    store: &dyn VectorStore,
    sample: &EmbeddingVector,
    owner: OwnerKind,
    configured_dim: Option<u32>,
    active_only: bool,
) -> DiagnosticReport {
    let stored_embedding_dim = probe("sample_dimension", store.sample_dimension(owner))
        .await
        .flatten();
    let total_embeddings = probe("count_embeddings", store.count_embeddings(owner)).await;
    let active_with_embeddings =
        probe("count_active_owners", store.count_active_owners(owner)).await;

    let low_threshold_sample = probe(
        "low_threshold_sample",
        store.query_nearest(sample, owner, DIAGNOSTIC_SAMPLE_SIZE, active_only),
    )
    .await
    .map(|candidates| {
        candidates
            .into_iter()
            .filter(|c| c.score >= 0.0)
            .take(DIAGNOSTIC_SAMPLE_SIZE)
            .collect::<Vec<_>>()
    });

    let raw_distances = probe(
        "raw_distances",
        store.nearest_raw(sample, owner, DIAGNOSTIC_SAMPLE_SIZE),
    )
    .await;

    let query_embedding_dim = Some(sample.dimension());
    let dimension_mismatch = dimensions_disagree(&[
        stored_embedding_dim,
        query_embedding_dim,
        configured_dim.map(|d| d as usize),
    ]);

    DiagnosticReport {
        stored_embedding_dim,
        query_embedding_dim,
        configured_dim,
        dimension_mismatch,
        total_embeddings,
        active_with_embeddings,
        low_threshold_sample,
        query_abs_sum: Some(sample.abs_sum()),
        raw_distances,
    }
}
