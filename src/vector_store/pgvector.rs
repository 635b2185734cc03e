use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::candidate::{MatchCandidate, RawDistance};
use crate::models::chunk::{EmbeddingVector, OwnerKind, StoredEmbedding};
use crate::vector_store::utils::{similarity_from_distance, sql_limit, to_vector_literal, usable_distance};
use crate::vector_store::VectorStore;

/// PostgreSQL with pgvector implementation over the `job_embeddings` and
/// `cv_embeddings` tables. Owner tables are managed elsewhere.
pub struct PGVectorStore {
    pool: PgPool,
}

impl PGVectorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Owner columns projected into a `MatchCandidate`, aliased to common names.
fn candidate_columns(owner: OwnerKind) -> &'static str {
    match owner {
        OwnerKind::Job => "o.title, o.description, o.requirements, o.company_id",
        OwnerKind::Cv => {
            "o.filename AS title, o.parsed_text AS description, \
             NULL::text AS requirements, NULL::uuid AS company_id"
        }
    }
}

/// Only jobs carry an active flag.
fn active_filter(owner: OwnerKind, active_only: bool) -> &'static str {
    match (owner, active_only) {
        (OwnerKind::Job, true) => "WHERE o.is_active = TRUE",
        _ => "",
    }
}

fn nearest_sql(owner: OwnerKind, active_only: bool) -> String {
    // DISTINCT ON keeps each owner's closest chunk; the outer query ranks owners.
    format!(
        "SELECT q.id, q.title, q.description, q.requirements, q.company_id, q.distance
         FROM (
             SELECT DISTINCT ON (o.id)
                    o.id, {columns},
                    (e.embedding <=> $1::vector) AS distance
             FROM {embeddings} e
             JOIN {owners} o ON o.id = e.{owner_column}
             {filter}
             ORDER BY o.id, e.embedding <=> $1::vector NULLS LAST
         ) q
         ORDER BY q.distance ASC NULLS LAST
         LIMIT $2",
        columns = candidate_columns(owner),
        embeddings = owner.embedding_table(),
        owners = owner.owner_table(),
        owner_column = owner.owner_column(),
        filter = active_filter(owner, active_only),
    )
}

/// Deletes an owner's rows except the ids bound as `$2`.
fn stale_rows_sql(owner: OwnerKind) -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1 AND NOT (id = ANY($2))",
        owner.embedding_table(),
        owner.owner_column()
    )
}

/// Map one result row; `None` for rows that cannot be scored.
fn candidate_from_row(row: &PgRow) -> Result<Option<MatchCandidate>, sqlx::Error> {
    let Some(distance) = usable_distance(row.try_get("distance")?) else {
        return Ok(None);
    };
    let title: Option<String> = row.try_get("title")?;

    Ok(Some(MatchCandidate {
        entity_id: row.try_get("id")?,
        title: title.unwrap_or_default(),
        description: row.try_get("description")?,
        requirements: row.try_get("requirements")?,
        company_id: row.try_get("company_id")?,
        score: similarity_from_distance(distance),
    }))
}

#[async_trait]
impl VectorStore for PGVectorStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::new("enable pgvector", e))?;
        info!("Enabled pgvector extension");

        for owner in [OwnerKind::Job, OwnerKind::Cv] {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1)",
            )
            .bind(owner.embedding_table())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::new("check embedding table", e))?;

            if exists {
                info!("{} table present", owner.embedding_table());
            } else {
                warn!(
                    "{} table is missing; {} matching will fail until it is created",
                    owner.embedding_table(),
                    owner
                );
            }
        }

        Ok(())
    }

    async fn upsert_embedding(
        &self,
        owner: OwnerKind,
        owner_id: Uuid,
        vector: &EmbeddingVector,
    ) -> Result<StoredEmbedding, StoreError> {
        let id = Uuid::new_v4();
        let sql = format!(
            "INSERT INTO {} (id, {}, created_at, embedding)
             VALUES ($1, $2, CURRENT_TIMESTAMP, $3::vector)
             RETURNING created_at",
            owner.embedding_table(),
            owner.owner_column()
        );

        let created_at: DateTime<Utc> = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(to_vector_literal(&vector.values))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::new("insert embedding", e))?;

        Ok(StoredEmbedding {
            id,
            owner_kind: owner,
            owner_id,
            created_at,
        })
    }

    async fn delete_embeddings(
        &self,
        owner: OwnerKind,
        owner_id: Uuid,
        keep: &[Uuid],
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(&stale_rows_sql(owner))
            .bind(owner_id)
            .bind(keep)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::new("delete embeddings", e))?;

        info!(
            "Deleted {} embeddings for {owner} {owner_id}",
            result.rows_affected()
        );
        Ok(result.rows_affected())
    }

    async fn query_nearest(
        &self,
        vector: &EmbeddingVector,
        owner: OwnerKind,
        top_n: usize,
        active_only: bool,
    ) -> Result<Vec<MatchCandidate>, StoreError> {
        if vector.is_empty() || top_n == 0 {
            return Ok(vec![]);
        }

        let rows = sqlx::query(&nearest_sql(owner, active_only))
            .bind(to_vector_literal(&vector.values))
            .bind(sql_limit(top_n))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::new("nearest-neighbour query", e))?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in &rows {
            match candidate_from_row(row) {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(e) => warn!("Skipping malformed {owner} match row: {e}"),
            }
        }
        Ok(candidates)
    }

    async fn sample_dimension(&self, owner: OwnerKind) -> Result<Option<usize>, StoreError> {
        let sql = format!(
            "SELECT vector_dims(embedding) FROM {} WHERE embedding IS NOT NULL LIMIT 1",
            owner.embedding_table()
        );
        let dims: Option<i32> = sqlx::query_scalar(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::new("sample stored dimension", e))?;
        Ok(dims.map(|d| d as usize))
    }

    async fn count_embeddings(&self, owner: OwnerKind) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", owner.embedding_table());
        sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::new("count embeddings", e))
    }

    async fn count_active_owners(&self, owner: OwnerKind) -> Result<i64, StoreError> {
        let sql = format!(
            "SELECT COUNT(DISTINCT o.id)
             FROM {owners} o
             JOIN {embeddings} e ON e.{owner_column} = o.id
             {filter}",
            owners = owner.owner_table(),
            embeddings = owner.embedding_table(),
            owner_column = owner.owner_column(),
            filter = active_filter(owner, true),
        );
        sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::new("count active owners", e))
    }

    async fn nearest_raw(
        &self,
        vector: &EmbeddingVector,
        owner: OwnerKind,
        limit: usize,
    ) -> Result<Vec<RawDistance>, StoreError> {
        let sql = format!(
            "SELECT e.{owner_column} AS owner_id, (e.embedding <=> $1::vector) AS distance
             FROM {embeddings} e
             ORDER BY distance ASC NULLS LAST
             LIMIT $2",
            owner_column = owner.owner_column(),
            embeddings = owner.embedding_table(),
        );
        let rows = sqlx::query(&sql)
            .bind(to_vector_literal(&vector.values))
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::new("raw distance probe", e))?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                Some(RawDistance {
                    entity_id: row.try_get("owner_id").ok()?,
                    distance: usable_distance(row.try_get("distance").ok()?),
                })
            })
            .collect())
    }
}
