use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::{CvRecord, Database, JobRecord};
use crate::error::StoreError;

/// Open the shared connection pool used by the database and the vector store.
pub async fn connect_pool(uri: &str, pool_size: u32, acquire_timeout_secs: u64) -> anyhow::Result<PgPool> {
    // Strip driver prefixes the native driver does not understand.
    let clean_uri = uri
        .replace("postgresql+psycopg2://", "postgresql://")
        .replace("postgresql+asyncpg://", "postgresql://");

    let pool = PgPoolOptions::new()
        .max_connections(pool_size)
        .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
        .connect(&clean_uri)
        .await?;

    info!("Connected to PostgreSQL (pool_size={pool_size})");
    Ok(pool)
}

/// PostgreSQL access to job and CV rows.
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, title, description, requirements
             FROM jobs
             WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::new("fetch job", e))?;

        row.map(|r| -> Result<JobRecord, sqlx::Error> {
            Ok(JobRecord {
                id: r.try_get("id")?,
                title: r.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
                description: r.try_get("description")?,
                requirements: r.try_get("requirements")?,
            })
        })
        .transpose()
        .map_err(|e| StoreError::new("decode job", e))
    }

    async fn get_cv(&self, cv_id: Uuid) -> Result<Option<CvRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, filename, parsed_text
             FROM cvs
             WHERE id = $1",
        )
        .bind(cv_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::new("fetch cv", e))?;

        row.map(|r| -> Result<CvRecord, sqlx::Error> {
            Ok(CvRecord {
                id: r.try_get("id")?,
                filename: r.try_get::<Option<String>, _>("filename")?.unwrap_or_default(),
                parsed_text: r.try_get("parsed_text")?,
            })
        })
        .transpose()
        .map_err(|e| StoreError::new("decode cv", e))
    }
}
