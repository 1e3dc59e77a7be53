pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::jobs::handlers as jobs;
use crate::matching::handlers as matching;
use crate::onboarding::handlers as onboarding;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_body_bytes());

    Router::new()
        .route("/health", get(health::health_handler))
        // Onboarding & profile
        .route("/api/v1/onboarding", get(onboarding::handle_onboarding_status))
        .route(
            "/api/v1/onboarding/start",
            post(onboarding::handle_begin_onboarding),
        )
        .route(
            "/api/v1/onboarding/steps",
            post(onboarding::handle_submit_step),
        )
        .route("/api/v1/navigation", get(onboarding::handle_navigation))
        .route("/api/v1/profile", get(onboarding::handle_get_profile))
        // Resume ingestion
        .route(
            "/api/v1/profile/resume",
            post(resume::handle_upload_resume).layer(upload_limit),
        )
        .route(
            "/api/v1/profile/resume/reparse",
            post(resume::handle_reparse_resume),
        )
        .route(
            "/api/v1/profile/resume/link",
            get(resume::handle_resume_link),
        )
        // Jobs
        .route("/api/v1/jobs", post(jobs::handle_create_job))
        .route("/api/v1/jobs/search", post(matching::handle_search_jobs))
        .route(
            "/api/v1/jobs/recommended",
            get(matching::handle_recommended_jobs),
        )
        .route("/api/v1/jobs/:id", delete(jobs::handle_delete_job))
        .route(
            "/api/v1/jobs/:id/duplicate",
            post(jobs::handle_duplicate_job),
        )
        .route("/api/v1/jobs/:id/close", post(jobs::handle_close_job))
        .route("/api/v1/jobs/:id/apply", post(applications::handle_apply))
        .route(
            "/api/v1/jobs/:id/save",
            post(applications::handle_toggle_saved),
        )
        // Applications
        .route(
            "/api/v1/applications",
            get(applications::handle_list_applications),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handle_update_status),
        )
        // Candidate search
        .route(
            "/api/v1/candidates/search",
            post(matching::handle_search_candidates),
        )
        .route(
            "/api/v1/candidates/shortlist",
            post(matching::handle_bulk_shortlist),
        )
        .with_state(state)
}
