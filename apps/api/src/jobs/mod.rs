//! Recruiter-side job posting lifecycle: create, duplicate, close, delete.

pub mod handlers;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Job, NewJob, RecruiterProfile};
use crate::session::{Role, SessionContext};
use crate::store::JobBoardStore;

impl NewJob {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        if self.company_name.trim().is_empty() {
            return Err(AppError::Validation("company_name is required".to_string()));
        }
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            if min > max {
                return Err(AppError::Validation(
                    "salary_min cannot exceed salary_max".to_string(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.experience_min, self.experience_max) {
            if min > max {
                return Err(AppError::Validation(
                    "experience_min cannot exceed experience_max".to_string(),
                ));
            }
        }
        if self.salary_min.is_some_and(|s| s < 0) || self.experience_min.is_some_and(|e| e < 0) {
            return Err(AppError::Validation("ranges cannot be negative".to_string()));
        }
        if self.num_positions < 1 {
            return Err(AppError::Validation(
                "num_positions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub async fn require_recruiter(
    store: &dyn JobBoardStore,
    session: &SessionContext,
) -> Result<RecruiterProfile, AppError> {
    session.require(Role::Recruiter)?;
    store
        .get_recruiter_by_user(session.user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("recruiter profile required".to_string()))
}

/// Loads a job the session's recruiter owns. Admins may act on any job.
pub async fn require_owned_job(
    store: &dyn JobBoardStore,
    session: &SessionContext,
    job_id: Uuid,
) -> Result<Job, AppError> {
    session.require(Role::Recruiter)?;
    let job = store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    if session.role == Role::Admin {
        return Ok(job);
    }
    let recruiter = require_recruiter(store, session).await?;
    if job.recruiter_id != recruiter.id {
        return Err(AppError::Forbidden("job belongs to another recruiter".to_string()));
    }
    Ok(job)
}

pub async fn create_job(
    store: &dyn JobBoardStore,
    session: &SessionContext,
    new_job: NewJob,
) -> Result<Job, AppError> {
    new_job.validate()?;
    let recruiter = require_recruiter(store, session).await?;
    let job = store.insert_job(&new_job.into_job(recruiter.id)).await?;
    info!("Recruiter {} posted job {}", recruiter.id, job.id);
    Ok(job)
}

/// Copies a posting as an inactive draft.
pub async fn duplicate_job(
    store: &dyn JobBoardStore,
    session: &SessionContext,
    job_id: Uuid,
) -> Result<Job, AppError> {
    let original = require_owned_job(store, session, job_id).await?;
    let now = Utc::now();
    let copy = Job {
        id: Uuid::new_v4(),
        title: format!("{} (Copy)", original.title),
        is_active: false,
        created_at: now,
        updated_at: now,
        ..original
    };
    let copy = store.insert_job(&copy).await?;
    info!("Duplicated job {job_id} as {}", copy.id);
    Ok(copy)
}

pub async fn close_job(
    store: &dyn JobBoardStore,
    session: &SessionContext,
    job_id: Uuid,
) -> Result<Job, AppError> {
    let mut job = require_owned_job(store, session, job_id).await?;
    if !job.is_active {
        return Ok(job);
    }
    job.is_active = false;
    let job = store.update_job(&job).await?;
    info!("Closed job {job_id}");
    Ok(job)
}

pub async fn delete_job(
    store: &dyn JobBoardStore,
    session: &SessionContext,
    job_id: Uuid,
) -> Result<(), AppError> {
    require_owned_job(store, session, job_id).await?;
    if !store.delete_job(job_id).await? {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }
    info!("Deleted job {job_id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmploymentType, JobVisibility, WorkMode};
    use crate::testing::{candidate_session, recruiter_session, MemoryStore};

    fn new_job() -> NewJob {
        NewJob {
            title: "  Rust Engineer ".to_string(),
            company_name: "Acme Corp".to_string(),
            location: Some("Pune".to_string()),
            employment_type: EmploymentType::FullTime,
            work_mode: WorkMode::Hybrid,
            salary_min: Some(1_000_000),
            salary_max: Some(2_000_000),
            experience_min: Some(2),
            experience_max: Some(5),
            education_required: None,
            skills_required: vec!["Rust".to_string()],
            description: "Build things".to_string(),
            num_positions: 2,
            application_deadline: None,
            visibility: JobVisibility::Public,
            role_category: None,
        }
    }

    #[tokio::test]
    async fn test_create_job_trims_and_activates() {
        let store = MemoryStore::default();
        let session = recruiter_session();
        let recruiter_id = store.ensure_recruiter(session.user_id, false);
        let job = create_job(&store, &session, new_job()).await.unwrap();
        assert_eq!(job.title, "Rust Engineer");
        assert_eq!(job.recruiter_id, recruiter_id);
        assert!(job.is_active);
    }

    #[tokio::test]
    async fn test_candidate_cannot_post_jobs() {
        let store = MemoryStore::default();
        let result = create_job(&store, &candidate_session(), new_job()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_inverted_salary_range_rejected() {
        let mut job = new_job();
        job.salary_min = Some(3_000_000);
        assert!(matches!(job.validate(), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_is_inactive_copy() {
        let store = MemoryStore::default();
        let session = recruiter_session();
        store.ensure_recruiter(session.user_id, false);
        let job = create_job(&store, &session, new_job()).await.unwrap();
        let copy = duplicate_job(&store, &session, job.id).await.unwrap();
        assert_ne!(copy.id, job.id);
        assert_eq!(copy.title, "Rust Engineer (Copy)");
        assert!(!copy.is_active);
        assert_eq!(copy.skills_required, job.skills_required);
    }

    #[tokio::test]
    async fn test_close_then_delete() {
        let store = MemoryStore::default();
        let session = recruiter_session();
        store.ensure_recruiter(session.user_id, false);
        let job = create_job(&store, &session, new_job()).await.unwrap();
        let closed = close_job(&store, &session, job.id).await.unwrap();
        assert!(!closed.is_active);
        delete_job(&store, &session, job.id).await.unwrap();
        assert!(store.get_job(job.id).await.unwrap().is_none());
    }
}
