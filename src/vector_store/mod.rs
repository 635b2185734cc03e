pub mod pgvector;
pub mod utils;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::candidate::{MatchCandidate, RawDistance};
use crate::models::chunk::{EmbeddingVector, OwnerKind, StoredEmbedding};

/// Abstract vector store interface over per-chunk owner embeddings.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Prepare the store (extensions, sanity checks).
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Insert one chunk embedding for an owner.
    async fn upsert_embedding(
        &self,
        owner: OwnerKind,
        owner_id: Uuid,
        vector: &EmbeddingVector,
    ) -> Result<StoredEmbedding, StoreError>;

    /// Remove an owner's embeddings other than `keep`. Returns the number of rows deleted.
    async fn delete_embeddings(
        &self,
        owner: OwnerKind,
        owner_id: Uuid,
        keep: &[Uuid],
    ) -> Result<u64, StoreError>;

    /// Nearest owners to `vector`, one row per owner (its closest chunk),
    /// ordered by ascending distance with undefined distances last.
    async fn query_nearest(
        &self,
        vector: &EmbeddingVector,
        owner: OwnerKind,
        top_n: usize,
        active_only: bool,
    ) -> Result<Vec<MatchCandidate>, StoreError>;

    /// Dimensionality of one arbitrary stored vector, if any exist.
    async fn sample_dimension(&self, owner: OwnerKind) -> Result<Option<usize>, StoreError>;

    /// Total stored embeddings for the owner kind.
    async fn count_embeddings(&self, owner: OwnerKind) -> Result<i64, StoreError>;

    /// Active owners that have at least one embedding.
    async fn count_active_owners(&self, owner: OwnerKind) -> Result<i64, StoreError>;

    /// Raw per-chunk distances, without joining owners or converting to scores.
    async fn nearest_raw(
        &self,
        vector: &EmbeddingVector,
        owner: OwnerKind,
        limit: usize,
    ) -> Result<Vec<RawDistance>, StoreError>;
}
