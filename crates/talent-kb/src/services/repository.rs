//! Candidate repository: the single entry point over both stores
//!
//! Ingest writes the attribute record first and the vector second. The two
//! stores share no transaction, so a vector failure after the record commit
//! leaves an orphaned record; `audit` reports such drift.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::KbConfig;
use crate::data::{
    BrowseFilter, BrowsePage, Candidate, CandidateId, CandidateProfile, CoreError, JobQuery,
    PageRequest,
};
use crate::embedding::create_embedding_generator;
use crate::storage::{FlatFileIndex, SqliteAttributeStore};
use crate::traits::{AttributeStore, EmbeddingGenerator, IndexStatus, VectorIndex};

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateHit {
    pub candidate: Candidate,
    /// Squared L2 distance between the query and the candidate's vector.
    pub distance: f32,
}

/// Search results in ascending distance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSearch {
    pub status: IndexStatus,
    pub hits: Vec<CandidateHit>,
}

impl CandidateSearch {
    fn empty(status: IndexStatus) -> Self {
        Self {
            status,
            hits: Vec::new(),
        }
    }
}

/// A profile that could not be ingested during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Position of the profile in the submitted batch.
    pub position: usize,
    pub full_name: String,
    pub error: String,
}

/// Outcome of `ingest_many`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub ingested: Vec<CandidateId>,
    pub failures: Vec<BatchFailure>,
}

/// Drift between the two stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Records with no vector: browsable but never returned by search.
    pub orphaned_records: Vec<CandidateId>,
    /// Vectors with no record: silently skipped by search.
    pub orphaned_vectors: Vec<i64>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.orphaned_records.is_empty() && self.orphaned_vectors.is_empty()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Orchestrates the attribute store, the vector index and the embedder.
///
/// Ingests (and resets) are serialised by an internal async mutex. Reads
/// take no repository-level lock.
pub struct CandidateRepository {
    attribute_store: Arc<dyn AttributeStore>,
    vector_index: Arc<dyn VectorIndex>,
    embedding_generator: Arc<dyn EmbeddingGenerator>,
    ingest_lock: Mutex<()>,
}

impl CandidateRepository {
    pub fn new(
        attribute_store: Arc<dyn AttributeStore>,
        vector_index: Arc<dyn VectorIndex>,
        embedding_generator: Arc<dyn EmbeddingGenerator>,
    ) -> Self {
        Self {
            attribute_store,
            vector_index,
            embedding_generator,
            ingest_lock: Mutex::new(()),
        }
    }

    /// Wires the SQLite store, the flat index file and the configured
    /// embedder, and initializes the schema without wiping.
    #[instrument(skip(config), fields(db = %config.db_path.display(), index = %config.index_path.display()))]
    pub async fn open(config: &KbConfig) -> Result<Self, CoreError> {
        let embedding_generator = create_embedding_generator(&config.embedding)?;
        let attribute_store = SqliteAttributeStore::new(&config.db_path, config.max_connections);
        attribute_store.initialize(false).await?;
        let vector_index = FlatFileIndex::open(&config.index_path)?;

        let records = attribute_store.count().await?;
        let vectors = vector_index.len();
        if (records == 0) != (vectors == 0) {
            warn!(
                records,
                vectors,
                "Attribute store and vector index disagree on whether data exists; run an audit or reset"
            );
        }
        if let (Some(expected), Some(actual)) =
            (vector_index.dimension(), embedding_generator.dimensions())
        {
            if expected != actual {
                warn!(
                    index_dimension = expected,
                    embedding_dimension = actual,
                    "Embedding provider does not match the existing index; ingest and search will fail"
                );
            }
        }

        info!(records, vectors, "Candidate repository opened");
        Ok(Self::new(
            Arc::new(attribute_store),
            Arc::new(vector_index),
            embedding_generator,
        ))
    }

    /// Writes one embedded profile to both stores. Caller holds the ingest lock.
    fn commit_vector(&self, id: CandidateId, embedding: &[f32]) -> Result<(), CoreError> {
        let started = Instant::now();
        if let Err(e) = self.vector_index.append(id.get(), embedding) {
            warn!(
                candidate_id = %id,
                error = %e,
                "Vector append failed after the record was stored; record is orphaned"
            );
            return Err(e.into());
        }
        debug!(candidate_id = %id, elapsed_ms = elapsed_ms(started), "Appended vector");
        Ok(())
    }

    async fn commit(
        &self,
        profile: &CandidateProfile,
        embedding: &[f32],
    ) -> Result<CandidateId, CoreError> {
        let started = Instant::now();
        let id = self.attribute_store.insert(profile).await?;
        debug!(candidate_id = %id, elapsed_ms = elapsed_ms(started), "Stored candidate record");
        self.commit_vector(id, embedding)?;
        Ok(id)
    }

    async fn embed_profile(&self, profile: &CandidateProfile) -> Result<Vec<f32>, CoreError> {
        let started = Instant::now();
        let document = profile.embedding_document();
        let embedding = self.embedding_generator.generate_embedding(&document).await?;
        debug!(
            dimensions = embedding.len(),
            elapsed_ms = elapsed_ms(started),
            "Embedded candidate profile"
        );
        Ok(embedding)
    }

    /// Ingests one profile and returns its new id.
    #[instrument(skip(self, profile), fields(full_name = %profile.full_name))]
    pub async fn ingest(&self, profile: CandidateProfile) -> Result<CandidateId, CoreError> {
        let started = Instant::now();
        let profile = profile.into_validated()?;
        let embedding = self.embed_profile(&profile).await?;

        let _guard = self.ingest_lock.lock().await;
        let id = self.commit(&profile, &embedding).await?;
        info!(candidate_id = %id, elapsed_ms = elapsed_ms(started), "Ingested candidate");
        Ok(id)
    }

    /// Like [`ingest`](Self::ingest), but fails with `Busy` instead of
    /// waiting when another ingest is in progress.
    #[instrument(skip(self, profile), fields(full_name = %profile.full_name))]
    pub async fn try_ingest(&self, profile: CandidateProfile) -> Result<CandidateId, CoreError> {
        let started = Instant::now();
        let _guard = self
            .ingest_lock
            .try_lock()
            .map_err(|_| CoreError::Busy("another ingest is in progress".to_string()))?;

        let profile = profile.into_validated()?;
        let embedding = self.embed_profile(&profile).await?;
        let id = self.commit(&profile, &embedding).await?;
        info!(candidate_id = %id, elapsed_ms = elapsed_ms(started), "Ingested candidate");
        Ok(id)
    }

    /// Ingests many profiles with a single batch embedding call.
    ///
    /// Invalid or rejected profiles are recorded in the report and do not
    /// stop the batch. A failed embedding call fails the whole batch before
    /// anything is written.
    #[instrument(skip(self, profiles), fields(batch_size = profiles.len()))]
    pub async fn ingest_many(
        &self,
        profiles: Vec<CandidateProfile>,
    ) -> Result<BatchReport, CoreError> {
        let started = Instant::now();
        let mut report = BatchReport::default();
        let mut accepted = Vec::with_capacity(profiles.len());

        for (position, profile) in profiles.into_iter().enumerate() {
            let full_name = profile.full_name.clone();
            match profile.into_validated() {
                Ok(profile) => accepted.push((position, profile)),
                Err(e) => report.failures.push(BatchFailure {
                    position,
                    full_name,
                    error: e.to_string(),
                }),
            }
        }

        let documents: Vec<String> = accepted
            .iter()
            .map(|(_, profile)| profile.embedding_document())
            .collect();
        let embed_started = Instant::now();
        let embeddings = self.embedding_generator.generate_embeddings(&documents).await?;
        if embeddings.len() != documents.len() {
            return Err(CoreError::EmbeddingError(format!(
                "requested {} embeddings, received {}",
                documents.len(),
                embeddings.len()
            )));
        }
        debug!(
            documents = documents.len(),
            elapsed_ms = elapsed_ms(embed_started),
            "Embedded batch"
        );

        let _guard = self.ingest_lock.lock().await;
        for ((position, profile), embedding) in accepted.into_iter().zip(embeddings) {
            match self.commit(&profile, &embedding).await {
                Ok(id) => report.ingested.push(id),
                Err(e) => {
                    warn!(position, full_name = %profile.full_name, error = %e, "Skipping profile");
                    report.failures.push(BatchFailure {
                        position,
                        full_name: profile.full_name,
                        error: e.to_string(),
                    });
                }
            }
        }
        report.failures.sort_by_key(|f| f.position);

        info!(
            ingested = report.ingested.len(),
            failed = report.failures.len(),
            elapsed_ms = elapsed_ms(started),
            "Batch ingest finished"
        );
        Ok(report)
    }

    /// Semantic search: the `k` candidates nearest to `query`.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn search(&self, query: &str, k: usize) -> Result<CandidateSearch, CoreError> {
        let started = Instant::now();
        let embedding = self.embedding_generator.generate_embedding(query).await?;
        debug!(elapsed_ms = elapsed_ms(started), "Embedded query");

        let search_started = Instant::now();
        let result = self.vector_index.search(&embedding, k)?;
        if result.status == IndexStatus::Unavailable {
            let records = self.attribute_store.count().await?;
            if records > 0 {
                warn!(records, "Vector index is missing while candidate records exist");
            }
            return Ok(CandidateSearch::empty(IndexStatus::Unavailable));
        }
        debug!(
            neighbors = result.neighbors.len(),
            elapsed_ms = elapsed_ms(search_started),
            "Searched vector index"
        );

        let ranked: Vec<_> = result
            .neighbors
            .into_iter()
            .filter(|n| CandidateId(n.id).is_assigned())
            .collect();
        if ranked.is_empty() {
            return Ok(CandidateSearch::empty(IndexStatus::Ready));
        }

        let fetch_started = Instant::now();
        let ids: Vec<CandidateId> = ranked.iter().map(|n| CandidateId(n.id)).collect();
        let mut records = self.attribute_store.get_many(&ids).await?;
        debug!(
            requested = ids.len(),
            found = records.len(),
            elapsed_ms = elapsed_ms(fetch_started),
            "Fetched candidate records"
        );

        let mut hits = Vec::with_capacity(ranked.len());
        for neighbor in ranked {
            match records.remove(&CandidateId(neighbor.id)) {
                Some(candidate) => hits.push(CandidateHit {
                    candidate,
                    distance: neighbor.distance,
                }),
                None => debug!(candidate_id = neighbor.id, "Skipping orphaned vector"),
            }
        }

        info!(hits = hits.len(), elapsed_ms = elapsed_ms(started), "Search finished");
        Ok(CandidateSearch {
            status: IndexStatus::Ready,
            hits,
        })
    }

    /// Searches with the text composed from a job posting.
    pub async fn search_job(&self, job: &JobQuery, k: usize) -> Result<CandidateSearch, CoreError> {
        self.search(&job.to_query_text(), k).await
    }

    /// Structured browse over the attribute store, newest first.
    #[instrument(skip(self))]
    pub async fn browse(
        &self,
        filter: &BrowseFilter,
        page: PageRequest,
    ) -> Result<BrowsePage, CoreError> {
        page.validate()?;
        let started = Instant::now();
        let candidates = self.attribute_store.list_filtered(filter, page).await?;
        let total_count = self.attribute_store.count_filtered(filter).await?;
        debug!(
            returned = candidates.len(),
            total_count,
            elapsed_ms = elapsed_ms(started),
            "Browsed candidates"
        );
        Ok(BrowsePage::new(candidates, total_count, page))
    }

    pub async fn get(&self, id: CandidateId) -> Result<Option<Candidate>, CoreError> {
        Ok(self.attribute_store.get(id).await?)
    }

    pub async fn total_candidate_count(&self) -> Result<u64, CoreError> {
        Ok(self.attribute_store.count().await?)
    }

    /// Wipes both stores together.
    ///
    /// The index goes first. Dropping the table restarts id assignment, so
    /// the store may only be wiped once no vector can still carry an old id.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<(), CoreError> {
        let _guard = self.ingest_lock.lock().await;
        self.vector_index.wipe()?;
        self.attribute_store.initialize(true).await?;
        info!("Candidate stores reset");
        Ok(())
    }

    /// Lists ids present in one store but not the other.
    pub async fn audit(&self) -> Result<ConsistencyReport, CoreError> {
        let records: BTreeSet<i64> = self
            .attribute_store
            .ids()
            .await?
            .into_iter()
            .map(CandidateId::get)
            .collect();
        let vectors: BTreeSet<i64> = self.vector_index.ids()?.into_iter().collect();

        let report = ConsistencyReport {
            orphaned_records: records.difference(&vectors).copied().map(CandidateId).collect(),
            orphaned_vectors: vectors.difference(&records).copied().collect(),
        };
        if !report.is_consistent() {
            warn!(
                orphaned_records = report.orphaned_records.len(),
                orphaned_vectors = report.orphaned_vectors.len(),
                "Candidate stores are out of sync"
            );
        }
        Ok(report)
    }
}
