use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::applications::{
    apply_to_job, list_my_applications, toggle_saved_job, update_application_status, SavedState,
};
use crate::errors::AppError;
use crate::models::{Application, ApplicationStatus};
use crate::session::SessionContext;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

/// POST /api/v1/jobs/:id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    session: SessionContext,
    Path(job_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let application = apply_to_job(state.store.as_ref(), &session, job_id).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// POST /api/v1/jobs/:id/save
pub async fn handle_toggle_saved(
    State(state): State<AppState>,
    session: SessionContext,
    Path(job_id): Path<Uuid>,
) -> Result<Json<SavedState>, AppError> {
    Ok(Json(toggle_saved_job(state.store.as_ref(), &session, job_id).await?))
}

/// GET /api/v1/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(list_my_applications(state.store.as_ref(), &session).await?))
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<Application>, AppError> {
    let application = update_application_status(state.store.as_ref(), &session, id, req.status).await?;
    Ok(Json(application))
}
