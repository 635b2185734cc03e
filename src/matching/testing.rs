//! In-memory stand-ins for the embedding API and pgvector, used by tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::database::{CvRecord, Database, JobRecord};
use crate::embedding::EmbeddingModel;
use crate::error::{MatchError, ProviderError, StoreError};
use crate::models::candidate::{MatchCandidate, RawDistance};
use crate::models::chunk::{EmbeddingVector, OwnerKind, StoredEmbedding};
use crate::vector_store::utils::{similarity_from_distance, usable_distance};
use crate::vector_store::VectorStore;

/// Embedder that returns canned vectors keyed by exact input text.
pub struct ScriptedEmbedder {
    vectors: HashMap<String, Vec<f64>>,
    fallback: Option<Vec<f64>>,
    missing_key: bool,
    expected_dimensions: Option<u32>,
    calls: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn new() -> Self {
        Self {
            vectors: HashMap::new(),
            fallback: None,
            missing_key: false,
            expected_dimensions: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f64>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    /// Vector for any text without a scripted entry. Unscripted text fails otherwise.
    pub fn with_fallback(mut self, vector: Vec<f64>) -> Self {
        self.fallback = Some(vector);
        self
    }

    pub fn with_expected_dimensions(mut self, dims: u32) -> Self {
        self.expected_dimensions = Some(dims);
        self
    }

    pub fn missing_key() -> Self {
        Self {
            missing_key: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingModel for ScriptedEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, MatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.missing_key {
            return Err(MatchError::Configuration("SCRIPTED_API_KEY is not set".to_string()));
        }
        self.vectors
            .get(text)
            .or(self.fallback.as_ref())
            .map(|v| EmbeddingVector::new(v.clone()))
            .ok_or_else(|| {
                MatchError::Provider(ProviderError::Status {
                    provider: "scripted",
                    retry: false,
                    status: 503,
                    body: format!("no vector scripted for {text:?}"),
                })
            })
    }

    fn expected_dimensions(&self) -> Option<u32> {
        self.expected_dimensions
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

struct OwnerRow {
    kind: OwnerKind,
    title: String,
    description: Option<String>,
    requirements: Option<String>,
    active: bool,
}

struct EmbeddingRow {
    row: StoredEmbedding,
    vector: EmbeddingVector,
}

#[derive(Default)]
struct State {
    owners: HashMap<Uuid, OwnerRow>,
    embeddings: Vec<EmbeddingRow>,
    /// Mirrors a `vector(n)` column: inserts of any other size fail.
    column_dim: Option<usize>,
    fail_queries: bool,
    fail_counts: bool,
    fail_inserts: bool,
}

/// `VectorStore` over plain vectors with pgvector's cosine-distance semantics.
pub struct MemoryStore {
    state: Mutex<State>,
}

fn store_err(operation: &'static str, message: String) -> StoreError {
    StoreError::new(operation, sqlx::Error::Protocol(message))
}

/// Cosine distance as pgvector's `<=>` computes it: NaN when either vector has zero norm.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    1.0 - dot / (norm_a * norm_b)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_column_dim(dim: usize) -> Self {
        let store = Self::new();
        store.state.lock().unwrap().column_dim = Some(dim);
        store
    }

    pub fn add_job(&self, id: Uuid, title: &str, active: bool) {
        self.add_owner(id, OwnerKind::Job, title, None, active);
    }

    pub fn add_owner(
        &self,
        id: Uuid,
        kind: OwnerKind,
        title: &str,
        description: Option<&str>,
        active: bool,
    ) {
        self.state.lock().unwrap().owners.insert(
            id,
            OwnerRow {
                kind,
                title: title.to_string(),
                description: description.map(str::to_string),
                requirements: None,
                active,
            },
        );
    }

    pub fn add_embedding(&self, kind: OwnerKind, owner_id: Uuid, values: Vec<f64>) {
        self.state.lock().unwrap().embeddings.push(EmbeddingRow {
            row: StoredEmbedding {
                id: Uuid::new_v4(),
                owner_kind: kind,
                owner_id,
                created_at: Utc::now(),
            },
            vector: EmbeddingVector::new(values),
        });
    }

    pub fn embedding_count(&self, kind: OwnerKind, owner_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .embeddings
            .iter()
            .filter(|e| e.row.owner_kind == kind && e.row.owner_id == owner_id)
            .count()
    }

    pub fn fail_queries(&self, fail: bool) {
        self.state.lock().unwrap().fail_queries = fail;
    }

    pub fn fail_counts(&self, fail: bool) {
        self.state.lock().unwrap().fail_counts = fail;
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.state.lock().unwrap().fail_inserts = fail;
    }

    /// Per-chunk distances for `kind`, failing like pgvector on size mismatch.
    /// Undefined distances come back as `None`.
    fn distances(
        state: &State,
        vector: &EmbeddingVector,
        kind: OwnerKind,
        operation: &'static str,
    ) -> Result<Vec<(Uuid, Option<f64>)>, StoreError> {
        if state.fail_queries {
            return Err(store_err(operation, "connection reset".to_string()));
        }
        let mut out = Vec::new();
        for e in state.embeddings.iter().filter(|e| e.row.owner_kind == kind) {
            if e.vector.dimension() != vector.dimension() {
                return Err(store_err(
                    operation,
                    format!(
                        "different vector dimensions {} and {}",
                        e.vector.dimension(),
                        vector.dimension()
                    ),
                ));
            }
            let distance = cosine_distance(&e.vector.values, &vector.values);
            out.push((e.row.owner_id, usable_distance(Some(distance))));
        }
        Ok(out)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_embedding(
        &self,
        owner: OwnerKind,
        owner_id: Uuid,
        vector: &EmbeddingVector,
    ) -> Result<StoredEmbedding, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_inserts {
            return Err(store_err("insert embedding", "insert rejected".to_string()));
        }
        if let Some(dim) = state.column_dim {
            if dim != vector.dimension() {
                return Err(store_err(
                    "insert embedding",
                    format!("expected {dim} dimensions, not {}", vector.dimension()),
                ));
            }
        }
        let stored = StoredEmbedding {
            id: Uuid::new_v4(),
            owner_kind: owner,
            owner_id,
            created_at: Utc::now(),
        };
        state.embeddings.push(EmbeddingRow {
            row: stored.clone(),
            vector: vector.clone(),
        });
        Ok(stored)
    }

    async fn delete_embeddings(
        &self,
        owner: OwnerKind,
        owner_id: Uuid,
        keep: &[Uuid],
    ) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap();
        let before = state.embeddings.len();
        state.embeddings.retain(|e| {
            e.row.owner_kind != owner || e.row.owner_id != owner_id || keep.contains(&e.row.id)
        });
        Ok((before - state.embeddings.len()) as u64)
    }

    async fn query_nearest(
        &self,
        vector: &EmbeddingVector,
        owner: OwnerKind,
        top_n: usize,
        active_only: bool,
    ) -> Result<Vec<MatchCandidate>, StoreError> {
        let state = self.state.lock().unwrap();
        let distances = Self::distances(&state, vector, owner, "nearest-neighbour query")?;

        // Closest chunk per owner, in first-seen order.
        let mut best: Vec<(Uuid, f64)> = Vec::new();
        for (owner_id, distance) in distances {
            let Some(distance) = distance else { continue };
            let Some(row) = state.owners.get(&owner_id) else { continue };
            if row.kind != owner || (owner == OwnerKind::Job && active_only && !row.active) {
                continue;
            }
            match best.iter_mut().find(|(id, _)| *id == owner_id) {
                Some(entry) if distance < entry.1 => entry.1 = distance,
                Some(_) => {}
                None => best.push((owner_id, distance)),
            }
        }
        best.sort_by(|a, b| a.1.total_cmp(&b.1));
        best.truncate(top_n);

        Ok(best
            .into_iter()
            .map(|(id, distance)| {
                let row = &state.owners[&id];
                MatchCandidate {
                    entity_id: id,
                    title: row.title.clone(),
                    description: row.description.clone(),
                    requirements: row.requirements.clone(),
                    company_id: None,
                    score: similarity_from_distance(distance),
                }
            })
            .collect())
    }

    async fn sample_dimension(&self, owner: OwnerKind) -> Result<Option<usize>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .embeddings
            .iter()
            .find(|e| e.row.owner_kind == owner)
            .map(|e| e.vector.dimension()))
    }

    async fn count_embeddings(&self, owner: OwnerKind) -> Result<i64, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_counts {
            return Err(store_err("count embeddings", "statement timeout".to_string()));
        }
        Ok(state.embeddings.iter().filter(|e| e.row.owner_kind == owner).count() as i64)
    }

    async fn count_active_owners(&self, owner: OwnerKind) -> Result<i64, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_counts {
            return Err(store_err("count active owners", "statement timeout".to_string()));
        }
        let mut ids: Vec<Uuid> = state
            .embeddings
            .iter()
            .filter(|e| e.row.owner_kind == owner)
            .map(|e| e.row.owner_id)
            .filter(|id| {
                state
                    .owners
                    .get(id)
                    .is_some_and(|row| owner == OwnerKind::Cv || row.active)
            })
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids.len() as i64)
    }

    async fn nearest_raw(
        &self,
        vector: &EmbeddingVector,
        owner: OwnerKind,
        limit: usize,
    ) -> Result<Vec<RawDistance>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<RawDistance> = Self::distances(&state, vector, owner, "raw distance probe")?
            .into_iter()
            .map(|(entity_id, distance)| RawDistance {
                entity_id,
                distance,
            })
            .collect();
        rows.sort_by(|a, b| match (a.distance, b.distance) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        rows.truncate(limit);
        Ok(rows)
    }
}

/// `Database` over fixed job and CV rows.
#[derive(Default)]
pub struct MemoryDatabase {
    jobs: HashMap<Uuid, JobRecord>,
    cvs: HashMap<Uuid, CvRecord>,
}

impl MemoryDatabase {
    pub fn with_job(mut self, job: JobRecord) -> Self {
        self.jobs.insert(job.id, job);
        self
    }

    pub fn with_cv(mut self, cv: CvRecord) -> Self {
        self.cvs.insert(cv.id, cv);
        self
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.get(&job_id).cloned())
    }

    async fn get_cv(&self, cv_id: Uuid) -> Result<Option<CvRecord>, StoreError> {
        Ok(self.cvs.get(&cv_id).cloned())
    }
}
