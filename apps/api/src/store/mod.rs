//! The `JobBoardStore` trait: row-level access to the hosted relational store.
//!
//! Core components depend on this abstraction, never on a concrete backend.
//! The production backend is [`postgres::PgStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::matching::filters::{CandidateFilter, JobFilter};
use crate::models::{
    Application, ApplicationStatus, CandidateProfile, ChildEntry, ChildKind, ChildRow, Job,
    RecruiterProfile, SavedJob,
};

pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Row not found: {0}")]
    NotFound(String),

    #[error("Row decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Abstraction over the job board's tables.
///
/// Filtering methods return the full filtered set; ordering and pagination
/// are applied by the matching engine so counts always come from the same
/// predicate as the page.
#[async_trait]
pub trait JobBoardStore: Send + Sync {
    // ── Candidate profiles ────────────────────────────────────────────────

    async fn get_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<CandidateProfile>>;

    async fn insert_profile(&self, profile: &CandidateProfile) -> StoreResult<CandidateProfile>;

    /// Writes every column of the row and bumps `updated_at`.
    async fn update_profile(&self, profile: &CandidateProfile) -> StoreResult<CandidateProfile>;

    async fn filter_candidates(
        &self,
        filter: &CandidateFilter,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<CandidateProfile>>;

    // ── Child collections ─────────────────────────────────────────────────

    async fn insert_child(&self, candidate_id: Uuid, entry: &ChildEntry) -> StoreResult<ChildRow>;

    async fn list_children(&self, candidate_id: Uuid, kind: ChildKind)
        -> StoreResult<Vec<ChildRow>>;

    async fn count_children(&self, candidate_id: Uuid, kind: ChildKind) -> StoreResult<usize>;

    // ── Jobs ──────────────────────────────────────────────────────────────

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>>;

    async fn insert_job(&self, job: &Job) -> StoreResult<Job>;

    async fn update_job(&self, job: &Job) -> StoreResult<Job>;

    /// Returns `false` when no row matched.
    async fn delete_job(&self, id: Uuid) -> StoreResult<bool>;

    async fn filter_jobs(&self, filter: &JobFilter, now: DateTime<Utc>) -> StoreResult<Vec<Job>>;

    // ── Applications ──────────────────────────────────────────────────────

    async fn find_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> StoreResult<Option<Application>>;

    async fn get_application(&self, id: Uuid) -> StoreResult<Option<Application>>;

    async fn insert_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application>;

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application>;

    async fn list_candidate_applications(&self, candidate_id: Uuid)
        -> StoreResult<Vec<Application>>;

    // ── Saved jobs ────────────────────────────────────────────────────────

    async fn find_saved_job(&self, candidate_id: Uuid, job_id: Uuid)
        -> StoreResult<Option<SavedJob>>;

    async fn insert_saved_job(&self, candidate_id: Uuid, job_id: Uuid) -> StoreResult<SavedJob>;

    async fn delete_saved_job(&self, candidate_id: Uuid, job_id: Uuid) -> StoreResult<bool>;

    // ── Recruiters ────────────────────────────────────────────────────────

    async fn get_recruiter_by_user(&self, user_id: Uuid) -> StoreResult<Option<RecruiterProfile>>;
}
