use std::time::Duration;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::resume::pipeline::IngestReport;
use crate::resume::upload::{ResumeUpload, UploadContext};
use crate::session::SessionContext;
use crate::state::AppState;
use crate::storage::StorageError;

const RESUME_FIELD: &str = "resume";

#[derive(Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub context: UploadContext,
}

#[derive(Serialize)]
pub struct ResumeLink {
    pub url: String,
    pub expires_in_secs: u64,
}

/// Takes the `resume` field, or the first field carrying a file name.
async fn read_resume_field(multipart: &mut Multipart) -> Result<ResumeUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some(RESUME_FIELD) && field.file_name().is_none() {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;
        return Ok(ResumeUpload {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation("no resume file in request".to_string()))
}

/// POST /api/v1/profile/resume?context=onboarding|profile
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    session: SessionContext,
    Query(params): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>, AppError> {
    let upload = read_resume_field(&mut multipart).await?;
    let policy = params.context.policy(&state.config);
    let report = state.pipeline.ingest(&session, upload, &policy).await?;
    Ok(Json(report))
}

/// POST /api/v1/profile/resume/reparse
pub async fn handle_reparse_resume(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<IngestReport>, AppError> {
    Ok(Json(state.pipeline.reparse(&session).await?))
}

/// GET /api/v1/profile/resume/link
///
/// Time-limited download link for the caller's current resume.
pub async fn handle_resume_link(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<ResumeLink>, AppError> {
    let path = state
        .store
        .get_profile_by_user(session.user_id)
        .await?
        .and_then(|p| p.resume_path)
        .ok_or(AppError::ResumeMissing)?;
    let ttl = state.config.resume_link_ttl_secs;
    let url = state
        .storage
        .signed_url(&path, Duration::from_secs(ttl))
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => AppError::ResumeMissing,
            other => AppError::Storage(other),
        })?;
    Ok(Json(ResumeLink {
        url,
        expires_in_secs: ttl,
    }))
}
