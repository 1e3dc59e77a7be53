use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::{close_job, create_job, delete_job, duplicate_job};
use crate::models::{Job, NewJob};
use crate::session::SessionContext;
use crate::state::AppState;

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    session: SessionContext,
    Json(req): Json<NewJob>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let job = create_job(state.store.as_ref(), &session, req).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// POST /api/v1/jobs/:id/duplicate
pub async fn handle_duplicate_job(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let job = duplicate_job(state.store.as_ref(), &session, id).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// POST /api/v1/jobs/:id/close
pub async fn handle_close_job(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(close_job(state.store.as_ref(), &session, id).await?))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_job(state.store.as_ref(), &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
