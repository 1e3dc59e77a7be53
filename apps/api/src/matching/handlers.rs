use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::errors::AppError;
use crate::matching::bulk::{bulk_shortlist, BulkOutcome, BulkShortlistRequest};
use crate::matching::filters::JobFilter;
use crate::matching::search::{
    recommend_jobs, search_candidates, search_jobs, CandidateSearchQuery, JobSearchQuery, Page,
    ScoredCandidate, ScoredJob,
};
use crate::session::{Role, SessionContext};
use crate::state::AppState;

const DEFAULT_RECOMMENDATIONS: usize = 10;
const MAX_RECOMMENDATIONS: usize = 50;

#[derive(Deserialize)]
pub struct RecommendedQuery {
    pub limit: Option<usize>,
}

/// POST /api/v1/jobs/search
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    session: SessionContext,
    Json(query): Json<JobSearchQuery>,
) -> Result<Json<Page<ScoredJob>>, AppError> {
    let page = search_jobs(state.store.as_ref(), state.scorer.as_ref(), &session, query).await?;
    Ok(Json(page))
}

/// GET /api/v1/jobs/recommended
pub async fn handle_recommended_jobs(
    State(state): State<AppState>,
    session: SessionContext,
    Query(params): Query<RecommendedQuery>,
) -> Result<Json<Vec<ScoredJob>>, AppError> {
    session.require(Role::Candidate)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECOMMENDATIONS)
        .clamp(1, MAX_RECOMMENDATIONS);
    let profile = state.store.get_profile_by_user(session.user_id).await?;
    let filter = JobFilter {
        active_only: true,
        ..Default::default()
    };
    let jobs = state.store.filter_jobs(&filter, Utc::now()).await?;
    Ok(Json(recommend_jobs(
        state.scorer.as_ref(),
        profile.as_ref(),
        jobs,
        limit,
    )))
}

/// POST /api/v1/candidates/search
pub async fn handle_search_candidates(
    State(state): State<AppState>,
    session: SessionContext,
    Json(query): Json<CandidateSearchQuery>,
) -> Result<Json<Page<ScoredCandidate>>, AppError> {
    let page =
        search_candidates(state.store.as_ref(), state.scorer.as_ref(), &session, query).await?;
    Ok(Json(page))
}

/// POST /api/v1/candidates/shortlist
pub async fn handle_bulk_shortlist(
    State(state): State<AppState>,
    session: SessionContext,
    Json(req): Json<BulkShortlistRequest>,
) -> Result<Json<BulkOutcome>, AppError> {
    let outcome = bulk_shortlist(Arc::clone(&state.store), &session, req).await?;
    Ok(Json(outcome))
}
