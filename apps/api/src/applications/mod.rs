//! Candidate applications and saved jobs, plus the recruiter's status moves.

pub mod handlers;

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::require_owned_job;
use crate::models::{Application, ApplicationStatus, CandidateProfile, Job};
use crate::session::{Role, SessionContext};
use crate::store::JobBoardStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SavedState {
    pub job_id: Uuid,
    pub saved: bool,
}

async fn require_candidate(
    store: &dyn JobBoardStore,
    session: &SessionContext,
) -> Result<CandidateProfile, AppError> {
    session.require(Role::Candidate)?;
    store
        .get_profile_by_user(session.user_id)
        .await?
        .ok_or_else(|| AppError::Validation("create a profile before applying".to_string()))
}

async fn require_job(store: &dyn JobBoardStore, job_id: Uuid) -> Result<Job, AppError> {
    store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// Check-then-insert: concurrent applies for the same pair can both land.
pub async fn apply_to_job(
    store: &dyn JobBoardStore,
    session: &SessionContext,
    job_id: Uuid,
) -> Result<Application, AppError> {
    let candidate = require_candidate(store, session).await?;
    let job = require_job(store, job_id).await?;
    if !job.accepts_applications(Utc::now().date_naive()) {
        return Err(AppError::Validation(
            "this job is no longer accepting applications".to_string(),
        ));
    }
    if store.find_application(candidate.id, job_id).await?.is_some() {
        return Err(AppError::Conflict("already applied to this job".to_string()));
    }
    let application = store
        .insert_application(candidate.id, job_id, ApplicationStatus::Applied)
        .await?;
    info!("Candidate {} applied to job {job_id}", candidate.id);
    Ok(application)
}

pub async fn toggle_saved_job(
    store: &dyn JobBoardStore,
    session: &SessionContext,
    job_id: Uuid,
) -> Result<SavedState, AppError> {
    let candidate = require_candidate(store, session).await?;
    if store.find_saved_job(candidate.id, job_id).await?.is_some() {
        store.delete_saved_job(candidate.id, job_id).await?;
        return Ok(SavedState { job_id, saved: false });
    }
    require_job(store, job_id).await?;
    store.insert_saved_job(candidate.id, job_id).await?;
    Ok(SavedState { job_id, saved: true })
}

pub async fn update_application_status(
    store: &dyn JobBoardStore,
    session: &SessionContext,
    application_id: Uuid,
    status: ApplicationStatus,
) -> Result<Application, AppError> {
    session.require(Role::Recruiter)?;
    let application = store
        .get_application(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    require_owned_job(store, session, application.job_id).await?;
    if application.status == status {
        return Ok(application);
    }
    let updated = store.update_application_status(application_id, status).await?;
    info!(
        "Application {application_id} moved from {:?} to {:?}",
        application.status, status
    );
    Ok(updated)
}

/// Newest first.
pub async fn list_my_applications(
    store: &dyn JobBoardStore,
    session: &SessionContext,
) -> Result<Vec<Application>, AppError> {
    session.require(Role::Candidate)?;
    let Some(candidate) = store.get_profile_by_user(session.user_id).await? else {
        return Ok(Vec::new());
    };
    let mut applications = store.list_candidate_applications(candidate.id).await?;
    applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(applications)
}
