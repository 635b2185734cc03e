/// Smallest number of entities fetched per nearest-neighbour query, so that
/// score floors and keyword filters applied afterwards still have candidates.
pub const MIN_CANDIDATE_POOL: usize = 100;

/// Row limit for a nearest-neighbour query serving `top_n` final results.
pub fn candidate_pool(top_n: usize) -> usize {
    top_n.max(MIN_CANDIDATE_POOL)
}

/// Render a vector as a pgvector text literal, e.g. `[0.1,0.2]`.
pub fn to_vector_literal(values: &[f64]) -> String {
    format!(
        "[{}]",
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    )
}

/// Convert a pgvector cosine distance (`<=>`) to a similarity score.
pub fn similarity_from_distance(distance: f64) -> f64 {
    1.0 - distance
}

/// Distance usable for ranking. pgvector yields NaN for zero-norm vectors,
/// which is treated like NULL.
pub fn usable_distance(distance: Option<f64>) -> Option<f64> {
    distance.filter(|d| d.is_finite())
}

/// Clamp a row count into the range of a Postgres `LIMIT` bind.
pub fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
