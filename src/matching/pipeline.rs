use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chunker::chunk_text;
use crate::config::Settings;
use crate::embedding::EmbeddingModel;
use crate::error::MatchError;
use crate::models::candidate::{DiagnosticReport, MatchCandidate};
use crate::models::chunk::{EmbeddingVector, OwnerKind, StoredEmbedding, TextChunk};
use crate::vector_store::utils::candidate_pool;
use crate::vector_store::VectorStore;

use super::aggregate::{aggregate, ChunkResult, MatchFilters};
use super::diagnostics::diagnose;

/// Parameters for one match run.
#[derive(Debug, Clone)]
pub struct MatchQuery {
    pub owner: OwnerKind,
    pub top_n: usize,
    pub active_only: bool,
    pub filters: MatchFilters,
}

#[derive(Debug)]
pub struct MatchOutcome {
    pub results: Vec<MatchCandidate>,
    /// Present only when `results` is empty.
    pub diagnostic: Option<DiagnosticReport>,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct IndexOutcome {
    pub chunk_count: usize,
    pub stored: Vec<StoredEmbedding>,
    pub replaced: u64,
    pub warnings: Vec<String>,
}

/// Chunk, embed, search and aggregate, shared by every endpoint.
pub struct MatchPipeline {
    embedder: Arc<dyn EmbeddingModel>,
    store: Arc<dyn VectorStore>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl MatchPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingModel>,
        store: Arc<dyn VectorStore>,
        settings: &Settings,
    ) -> Self {
        Self::with_chunking(embedder, store, settings.chunk_size, settings.chunk_overlap)
    }

    pub fn with_chunking(
        embedder: Arc<dyn EmbeddingModel>,
        store: Arc<dyn VectorStore>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.embedder.provider_name()
    }

    fn chunk(&self, text: &str) -> Result<Vec<TextChunk>, MatchError> {
        let chunks = chunk_text(text, self.chunk_size, self.chunk_overlap);
        if chunks.is_empty() {
            return Err(MatchError::InvalidInput("text must not be empty".to_string()));
        }
        debug!(chunks = chunks.len(), chars = text.chars().count(), "chunked input text");
        Ok(chunks)
    }

    /// Embed every chunk. Configuration errors abort; other failures become
    /// warnings unless no chunk succeeds.
    async fn embed_chunks(
        &self,
        chunks: &[TextChunk],
    ) -> Result<(Vec<(TextChunk, EmbeddingVector)>, Vec<String>), MatchError> {
        let mut embedded = Vec::with_capacity(chunks.len());
        let mut warnings = Vec::new();

        for chunk in chunks {
            match self.embedder.embed(&chunk.content).await {
                Ok(vector) => embedded.push((chunk.clone(), vector)),
                Err(e @ MatchError::Configuration(_)) => return Err(e),
                Err(e) => {
                    warn!(chunk = chunk.order, error = %e, "failed to embed chunk");
                    warnings.push(format!("chunk {}: {e}", chunk.order));
                }
            }
        }

        if embedded.is_empty() {
            return Err(MatchError::NoChunksEmbedded {
                chunk_count: chunks.len(),
                warnings,
            });
        }
        Ok((embedded, warnings))
    }

    /// Rank owners of `query.owner` scope against `text`.
    pub async fn search(&self, text: &str, query: &MatchQuery) -> Result<MatchOutcome, MatchError> {
        let chunks = self.chunk(text)?;
        let (embedded, mut warnings) = self.embed_chunks(&chunks).await?;

        let pool = candidate_pool(query.top_n);
        let mut chunk_results = Vec::with_capacity(embedded.len());
        for (chunk, vector) in &embedded {
            match self
                .store
                .query_nearest(vector, query.owner, pool, query.active_only)
                .await
            {
                Ok(candidates) => chunk_results.push(ChunkResult { candidates }),
                Err(e) => {
                    warn!(chunk = chunk.order, error = %e, "nearest-neighbour query failed");
                    warnings.push(format!("chunk {}: {e}", chunk.order));
                }
            }
        }

        let mut results = aggregate(&chunk_results, &query.filters);
        results.truncate(query.top_n);

        let diagnostic = if results.is_empty() {
            let (_, sample) = &embedded[0];
            let report = diagnose(
                self.store.as_ref(),
                sample,
                query.owner,
                self.embedder.expected_dimensions(),
                query.active_only,
            )
            .await;
            info!(
                owner = %query.owner,
                stored_dim = ?report.stored_embedding_dim,
                query_dim = ?report.query_embedding_dim,
                mismatch = ?report.dimension_mismatch,
                total = ?report.total_embeddings,
                "no matches, attached diagnostic"
            );
            Some(report)
        } else {
            None
        };

        Ok(MatchOutcome {
            results,
            diagnostic,
            warnings,
        })
    }

    /// Replace the stored embeddings of one owner with fresh ones for `text`.
    ///
    /// New rows are inserted before the old ones are deleted, so a request
    /// where nothing embeds or nothing stores leaves the previous index in place.
    pub async fn index_owner(
        &self,
        owner: OwnerKind,
        owner_id: Uuid,
        text: &str,
    ) -> Result<IndexOutcome, MatchError> {
        let chunks = self.chunk(text)?;
        let (embedded, mut warnings) = self.embed_chunks(&chunks).await?;

        let mut stored = Vec::with_capacity(embedded.len());
        for (chunk, vector) in &embedded {
            match self.store.upsert_embedding(owner, owner_id, vector).await {
                Ok(row) => stored.push(row),
                Err(e) => {
                    warn!(%owner, %owner_id, chunk = chunk.order, error = %e, "failed to store chunk embedding");
                    warnings.push(format!("chunk {}: {e}", chunk.order));
                }
            }
        }

        if stored.is_empty() {
            return Err(MatchError::NoChunksStored {
                chunk_count: chunks.len(),
                warnings,
            });
        }

        let keep: Vec<Uuid> = stored.iter().map(|row| row.id).collect();
        let replaced = self.store.delete_embeddings(owner, owner_id, &keep).await?;

        info!(
            %owner,
            %owner_id,
            chunks = chunks.len(),
            stored = stored.len(),
            replaced,
            "re-indexed embeddings"
        );

        Ok(IndexOutcome {
            chunk_count: chunks.len(),
            stored,
            replaced,
            warnings,
        })
    }
}
