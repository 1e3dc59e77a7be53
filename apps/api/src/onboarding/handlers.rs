use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::cache::{invalidate_quietly, CacheKey};
use crate::errors::AppError;
use crate::onboarding::completion::{dashboard_report, onboarding_report, CompletionReport, ProfileSnapshot};
use crate::onboarding::flow::{
    begin_onboarding, resolve_route, submit_step, OnboardingState, OnboardingStep, RouteArea,
    RouteDecision, StepInput, StepOutcome,
};
use crate::onboarding::{load_profile_view, ProfileView};
use crate::session::SessionContext;
use crate::state::AppState;

#[derive(Serialize)]
pub struct OnboardingStatus {
    pub state: OnboardingState,
    pub onboarding: CompletionReport,
    pub dashboard: CompletionReport,
}

#[derive(Deserialize)]
pub struct NavigationQuery {
    pub area: RouteArea,
    pub step: Option<OnboardingStep>,
}

/// GET /api/v1/onboarding
pub async fn handle_onboarding_status(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<OnboardingStatus>, AppError> {
    let profile = state.store.get_profile_by_user(session.user_id).await?;
    let onboarding = onboarding_report(profile.as_ref());
    let onboarding_state = OnboardingState::of(profile.as_ref());
    let snapshot = ProfileSnapshot::load(state.store.as_ref(), profile).await?;
    Ok(Json(OnboardingStatus {
        state: onboarding_state,
        onboarding,
        dashboard: dashboard_report(&snapshot),
    }))
}

/// POST /api/v1/onboarding/start
pub async fn handle_begin_onboarding(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<StepOutcome>, AppError> {
    let profile = begin_onboarding(state.store.as_ref(), &session).await?;
    invalidate_quietly(state.cache.as_ref(), &[CacheKey::Profile(session.user_id)]).await;
    Ok(Json(StepOutcome::new(profile)))
}

/// POST /api/v1/onboarding/steps
pub async fn handle_submit_step(
    State(state): State<AppState>,
    session: SessionContext,
    Json(input): Json<StepInput>,
) -> Result<Json<StepOutcome>, AppError> {
    let outcome = submit_step(state.store.as_ref(), &session, input).await?;
    invalidate_quietly(state.cache.as_ref(), &[CacheKey::Profile(session.user_id)]).await;
    Ok(Json(outcome))
}

/// GET /api/v1/navigation
pub async fn handle_navigation(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<NavigationQuery>,
) -> Result<Json<RouteDecision>, AppError> {
    let profile = state.store.get_profile_by_user(session.user_id).await?;
    Ok(Json(resolve_route(profile.as_ref(), query.area, query.step)))
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<ProfileView>, AppError> {
    let view = load_profile_view(
        state.store.as_ref(),
        state.cache.as_ref(),
        state.config.profile_cache_ttl_secs,
        session.user_id,
    )
    .await?;
    Ok(Json(view))
}
