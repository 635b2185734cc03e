pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;

/// A job posting as read from the `jobs` table.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
}

impl JobRecord {
    /// Text that gets chunked and embedded for this job.
    pub fn source_text(&self) -> String {
        [Some(&self.title), self.description.as_ref(), self.requirements.as_ref()]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// An uploaded CV as read from the `cvs` table.
#[derive(Debug, Clone)]
pub struct CvRecord {
    pub id: Uuid,
    pub filename: String,
    pub parsed_text: Option<String>,
}

/// Read access to the owner rows that embeddings hang off.
#[async_trait]
pub trait Database: Send + Sync {
    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRecord>, StoreError>;

    async fn get_cv(&self, cv_id: Uuid) -> Result<Option<CvRecord>, StoreError>;
}
