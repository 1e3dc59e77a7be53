//! Ranked, paginated search over jobs and candidates.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::filters::{CandidateFilter, JobFilter};
use crate::matching::scoring::{MatchScore, MatchScorer};
use crate::models::{CandidateProfile, Job};
use crate::session::{Role, SessionContext};
use crate::store::JobBoardStore;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    Recency,
    Experience,
    SalaryAsc,
    SalaryDesc,
}

/// 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.page == 0 {
            return Err(AppError::Validation("page numbers start at 1".to_string()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(AppError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub total_pages: usize,
    pub page: u32,
    pub page_size: u32,
}

/// Slices an already filtered and ordered set. Count and page total come
/// from the same set as the items.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total_count = items.len();
    let size = request.page_size.max(1) as usize;
    let total_pages = total_count.div_ceil(size);
    let start = (request.page.max(1) as usize - 1).saturating_mul(size);
    let items = items.into_iter().skip(start).take(size).collect();
    Page {
        items,
        total_count,
        total_pages,
        page: request.page,
        page_size: request.page_size,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredJob {
    pub job: Job,
    #[serde(rename = "match")]
    pub score: MatchScore,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub profile: CandidateProfile,
    #[serde(rename = "match")]
    pub score: Option<MatchScore>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSearchQuery {
    #[serde(default)]
    pub filter: JobFilter,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(flatten)]
    pub page: PageRequest,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateSearchQuery {
    #[serde(default)]
    pub filter: CandidateFilter,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(flatten)]
    pub page: PageRequest,
    /// Job to score candidates against for relevance ordering.
    pub for_job: Option<Uuid>,
}

/// Newest first, then id for a stable order.
fn newest_first(a: (DateTime<Utc>, Uuid), b: (DateTime<Utc>, Uuid)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1))
}

/// Orders `None` after every value regardless of direction.
fn cmp_optional(a: Option<i64>, b: Option<i64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_jobs(jobs: &mut [ScoredJob], order: SortOrder) {
    jobs.sort_by(|a, b| {
        let primary = match order {
            SortOrder::Relevance => b.score.score.cmp(&a.score.score),
            SortOrder::Recency => Ordering::Equal,
            SortOrder::Experience => cmp_optional(
                a.job.experience_min.map(i64::from),
                b.job.experience_min.map(i64::from),
                true,
            ),
            SortOrder::SalaryAsc => cmp_optional(
                a.job.salary_min.or(a.job.salary_max),
                b.job.salary_min.or(b.job.salary_max),
                false,
            ),
            SortOrder::SalaryDesc => cmp_optional(
                a.job.salary_max.or(a.job.salary_min),
                b.job.salary_max.or(b.job.salary_min),
                true,
            ),
        };
        primary.then_with(|| newest_first((a.job.created_at, a.job.id), (b.job.created_at, b.job.id)))
    });
}

pub fn sort_candidates(candidates: &mut [ScoredCandidate], order: SortOrder) {
    candidates.sort_by(|a, b| {
        let primary = match order {
            SortOrder::Relevance => {
                let score = |c: &ScoredCandidate| c.score.as_ref().map_or(0, |s| s.score);
                score(b).cmp(&score(a))
            }
            SortOrder::Recency => Ordering::Equal,
            SortOrder::Experience => cmp_optional(
                a.profile.experience_years.map(i64::from),
                b.profile.experience_years.map(i64::from),
                true,
            ),
            SortOrder::SalaryAsc => cmp_optional(
                a.profile.expected_salary_min,
                b.profile.expected_salary_min,
                false,
            ),
            SortOrder::SalaryDesc => cmp_optional(
                a.profile.expected_salary_min,
                b.profile.expected_salary_min,
                true,
            ),
        };
        primary.then_with(|| {
            newest_first(
                (a.profile.updated_at, a.profile.id),
                (b.profile.updated_at, b.profile.id),
            )
        })
    });
}

/// Ranks `jobs` by fit for `profile`: descending score, newest first on ties.
pub fn recommend_jobs(
    scorer: &dyn MatchScorer,
    profile: Option<&CandidateProfile>,
    jobs: Vec<Job>,
    limit: usize,
) -> Vec<ScoredJob> {
    let mut scored: Vec<ScoredJob> = jobs
        .into_iter()
        .map(|job| ScoredJob {
            score: scorer.score(profile, &job),
            job,
        })
        .collect();
    sort_jobs(&mut scored, SortOrder::Relevance);
    scored.truncate(limit);
    scored
}

/// Public job list. Relevance is measured against the viewer's own profile
/// when the viewer is a candidate who has one.
pub async fn search_jobs(
    store: &dyn JobBoardStore,
    scorer: &dyn MatchScorer,
    viewer: &SessionContext,
    mut query: JobSearchQuery,
) -> Result<Page<ScoredJob>, AppError> {
    query.page.validate()?;
    query.filter.validate()?;
    query.filter.active_only = true;

    let profile = match viewer.role {
        Role::Candidate => store.get_profile_by_user(viewer.user_id).await?,
        _ => None,
    };

    let jobs = store.filter_jobs(&query.filter, Utc::now()).await?;
    let mut scored: Vec<ScoredJob> = jobs
        .into_iter()
        .map(|job| ScoredJob {
            score: scorer.score(profile.as_ref(), &job),
            job,
        })
        .collect();
    sort_jobs(&mut scored, query.sort);

    Ok(paginate(scored, query.page))
}

/// Recruiter candidate search, gated on premium access.
pub async fn search_candidates(
    store: &dyn JobBoardStore,
    scorer: &dyn MatchScorer,
    recruiter: &SessionContext,
    query: CandidateSearchQuery,
) -> Result<Page<ScoredCandidate>, AppError> {
    recruiter.require(Role::Recruiter)?;
    query.page.validate()?;
    query.filter.validate()?;

    if recruiter.role != Role::Admin {
        let profile = store
            .get_recruiter_by_user(recruiter.user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("recruiter profile required".to_string()))?;
        if !profile.has_premium_access {
            return Err(AppError::Forbidden(
                "candidate search requires premium access".to_string(),
            ));
        }
    }

    let target_job = match query.for_job {
        Some(job_id) => Some(
            store
                .get_job(job_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?,
        ),
        None => None,
    };

    let profiles = store.filter_candidates(&query.filter, Utc::now()).await?;
    let mut scored: Vec<ScoredCandidate> = profiles
        .into_iter()
        .map(|profile| ScoredCandidate {
            score: target_job.as_ref().map(|job| scorer.score(Some(&profile), job)),
            profile,
        })
        .collect();
    sort_candidates(&mut scored, query.sort);

    info!(
        "Candidate search by {} matched {} profiles",
        recruiter.user_id,
        scored.len()
    );
    Ok(paginate(scored, query.page))
}
