//! AttributeStore trait definition for the relational candidate records

use async_trait::async_trait;
use std::collections::HashMap;

use crate::data::{
    entities::{Candidate, CandidateProfile},
    errors::StateStoreError,
    filters::{BrowseFilter, PageRequest},
    identifiers::CandidateId,
};

/// Durable store of candidate attribute records.
///
/// The store assigns identifiers: ids are positive, unique, and never
/// reused within one store lifetime (a wipe starts a new lifetime).
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Ensures the schema exists. With `wipe`, all existing records are
    /// discarded first and identifier assignment restarts.
    async fn initialize(&self, wipe: bool) -> Result<(), StateStoreError>;

    /// Inserts a record and returns its newly assigned id.
    ///
    /// Fails with `ConstraintViolation` when the email is already present;
    /// nothing is written in that case.
    async fn insert(&self, profile: &CandidateProfile) -> Result<CandidateId, StateStoreError>;

    /// Fetches one record.
    async fn get(&self, id: CandidateId) -> Result<Option<Candidate>, StateStoreError>;

    /// Fetches the records that exist among `ids`. Missing ids are absent
    /// from the map.
    async fn get_many(
        &self,
        ids: &[CandidateId],
    ) -> Result<HashMap<CandidateId, Candidate>, StateStoreError>;

    /// Number of stored records.
    async fn count(&self) -> Result<u64, StateStoreError>;

    /// One page of records matching `filter`, newest first.
    async fn list_filtered(
        &self,
        filter: &BrowseFilter,
        page: PageRequest,
    ) -> Result<Vec<Candidate>, StateStoreError>;

    /// Number of records matching `filter`, ignoring pagination.
    async fn count_filtered(&self, filter: &BrowseFilter) -> Result<u64, StateStoreError>;

    /// All stored ids in ascending order.
    async fn ids(&self) -> Result<Vec<CandidateId>, StateStoreError>;
}
