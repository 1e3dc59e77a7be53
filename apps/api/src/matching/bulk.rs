//! Bulk shortlist over a recruiter's multi-selected candidates.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::require_owned_job;
use crate::models::{ApplicationStatus, Job};
use crate::session::{Role, SessionContext};
use crate::store::{JobBoardStore, StoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct BulkShortlistRequest {
    pub job_id: Uuid,
    pub candidate_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortlistAction {
    /// A new application was created directly in `shortlisted`.
    Created,
    /// An existing application moved to `shortlisted`.
    Promoted,
    /// Already shortlisted; nothing written.
    Unchanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShortlistFailure {
    pub candidate_id: Uuid,
    pub reason: String,
}

/// Partial-success report; never an error for individual failures.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
    pub successful: usize,
    pub total: usize,
    pub failures: Vec<ShortlistFailure>,
}

/// Upsert-like shortlist of one candidate. Check-then-act: two concurrent
/// calls for the same pair can both insert.
pub async fn shortlist_one(
    store: &dyn JobBoardStore,
    candidate_id: Uuid,
    job_id: Uuid,
) -> StoreResult<ShortlistAction> {
    match store.find_application(candidate_id, job_id).await? {
        Some(app) if app.status == ApplicationStatus::Shortlisted => Ok(ShortlistAction::Unchanged),
        Some(app) => {
            store
                .update_application_status(app.id, ApplicationStatus::Shortlisted)
                .await?;
            Ok(ShortlistAction::Promoted)
        }
        None => {
            store
                .insert_application(candidate_id, job_id, ApplicationStatus::Shortlisted)
                .await?;
            Ok(ShortlistAction::Created)
        }
    }
}

/// Shortlists every selected candidate for one of the recruiter's jobs.
/// Each candidate is handled independently and concurrently.
pub async fn bulk_shortlist(
    store: Arc<dyn JobBoardStore>,
    recruiter: &SessionContext,
    request: BulkShortlistRequest,
) -> Result<BulkOutcome, AppError> {
    recruiter.require(Role::Recruiter)?;
    if request.candidate_ids.is_empty() {
        return Err(AppError::Validation("select at least one candidate".to_string()));
    }
    let job: Job = require_owned_job(store.as_ref(), recruiter, request.job_id).await?;

    let mut seen = HashSet::new();
    let candidate_ids: Vec<Uuid> = request
        .candidate_ids
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect();
    let total = candidate_ids.len();

    let mut pending: HashSet<Uuid> = candidate_ids.iter().copied().collect();
    let mut tasks = JoinSet::new();
    for candidate_id in candidate_ids {
        let store = Arc::clone(&store);
        let job_id = job.id;
        tasks.spawn(async move {
            let result = shortlist_one(store.as_ref(), candidate_id, job_id).await;
            (candidate_id, result)
        });
    }

    let mut successful = 0;
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((candidate_id, Ok(_))) => {
                pending.remove(&candidate_id);
                successful += 1;
            }
            Ok((candidate_id, Err(e))) => {
                pending.remove(&candidate_id);
                warn!("Shortlist of candidate {candidate_id} for job {} failed: {e}", job.id);
                failures.push(ShortlistFailure {
                    candidate_id,
                    reason: e.to_string(),
                });
            }
            Err(e) => warn!("Shortlist task for job {} aborted: {e}", job.id),
        }
    }
    // whatever is left belongs to tasks that panicked or were cancelled
    failures.extend(pending.into_iter().map(|candidate_id| ShortlistFailure {
        candidate_id,
        reason: "shortlist task aborted".to_string(),
    }));

    info!(
        "Bulk shortlist for job {}: {successful}/{total} succeeded",
        job.id
    );
    Ok(BulkOutcome {
        successful,
        total,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmploymentType;
    use crate::testing::{job_fixture, recruiter_session, MemoryStore};

    fn setup() -> (Arc<MemoryStore>, SessionContext, Uuid) {
        let store = Arc::new(MemoryStore::default());
        let session = recruiter_session();
        let mut job = job_fixture("Backend", "Pune", EmploymentType::FullTime);
        job.recruiter_id = store.ensure_recruiter(session.user_id, true);
        let job_id = job.id;
        store.put_job(job);
        (store, session, job_id)
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_as_ratio() {
        let (store, session, job_id) = setup();
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        store.fail_applications_for(ids[2]);

        let outcome = bulk_shortlist(
            store.clone(),
            &session,
            BulkShortlistRequest {
                job_id,
                candidate_ids: ids.clone(),
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.successful, 4);
        assert_eq!(outcome.total, 5);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].candidate_id, ids[2]);
        for (i, id) in ids.iter().enumerate() {
            let apps = store.applications_for(*id);
            if i == 2 {
                assert!(apps.is_empty());
            } else {
                assert_eq!(apps.len(), 1);
                assert_eq!(apps[0].job_id, job_id);
                assert_eq!(apps[0].status, ApplicationStatus::Shortlisted);
            }
        }
    }

    #[tokio::test]
    async fn test_aborted_task_is_counted_as_failure() {
        let (store, session, job_id) = setup();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        store.panic_applications_for(ids[1]);

        let outcome = bulk_shortlist(
            store.clone(),
            &session,
            BulkShortlistRequest {
                job_id,
                candidate_ids: ids.clone(),
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.successful, 2);
        assert_eq!(outcome.successful + outcome.failures.len(), outcome.total);
        assert_eq!(outcome.failures[0].candidate_id, ids[1]);
        assert!(store.applications_for(ids[1]).is_empty());
    }

    #[tokio::test]
    async fn test_existing_application_is_promoted_once() {
        let (store, _session, job_id) = setup();
        let candidate = Uuid::new_v4();
        store
            .insert_application(candidate, job_id, ApplicationStatus::Applied)
            .await
            .unwrap();

        let first = shortlist_one(store.as_ref(), candidate, job_id).await.unwrap();
        let second = shortlist_one(store.as_ref(), candidate, job_id).await.unwrap();
        assert_eq!(first, ShortlistAction::Promoted);
        assert_eq!(second, ShortlistAction::Unchanged);
        assert_eq!(store.application_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_application_created_as_shortlisted() {
        let (store, _session, job_id) = setup();
        let candidate = Uuid::new_v4();
        let action = shortlist_one(store.as_ref(), candidate, job_id).await.unwrap();
        assert_eq!(action, ShortlistAction::Created);
        let app = store.find_application(candidate, job_id).await.unwrap().unwrap();
        assert_eq!(app.status, ApplicationStatus::Shortlisted);
    }

    #[tokio::test]
    async fn test_duplicate_selection_counts_once() {
        let (store, session, job_id) = setup();
        let candidate = Uuid::new_v4();
        let outcome = bulk_shortlist(
            store.clone(),
            &session,
            BulkShortlistRequest {
                job_id,
                candidate_ids: vec![candidate, candidate],
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome.total, 1);
        assert_eq!(store.application_count(), 1);
    }

    #[tokio::test]
    async fn test_other_recruiters_job_is_forbidden() {
        let (store, _owner, job_id) = setup();
        let intruder = recruiter_session();
        store.ensure_recruiter(intruder.user_id, true);
        let result = bulk_shortlist(
            store.clone(),
            &intruder,
            BulkShortlistRequest {
                job_id,
                candidate_ids: vec![Uuid::new_v4()],
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
