//! Persistence Provider: durable candidate records keyed by id.
//!
//! The persisted state is the candidate rows plus, per user, a pointer to the
//! candidate they are currently working on. Writes are last-write-wins.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::candidate::Candidate;

pub mod postgres;
pub mod versioning;

pub use postgres::PgCandidateStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("candidate {id} has schema version {version}, newer than this service understands")]
    UnsupportedVersion { id: Uuid, version: i32 },

    #[error("candidate {id} is corrupt: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Inserts or replaces the record with `candidate.id`.
    async fn upsert(&self, candidate: &Candidate) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Candidate>, StoreError>;

    /// Every loadable candidate, newest first.
    async fn list_all(&self) -> Result<Vec<Candidate>, StoreError>;

    /// Candidates owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Candidate>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn current_candidate(&self, user_id: Uuid) -> Result<Option<Uuid>, StoreError>;

    async fn set_current_candidate(
        &self,
        user_id: Uuid,
        candidate_id: Option<Uuid>,
    ) -> Result<(), StoreError>;
}
