use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{invalidate_quietly, CacheKey, ReadCache};
use crate::errors::AppError;
use crate::models::CandidateProfile;
use crate::onboarding::completion::{dashboard_completion, ProfileSnapshot};
use crate::onboarding::flow::begin_onboarding;
use crate::parser_client::ResumeParser;
use crate::resume::extract::extract_text;
use crate::resume::fanout::{collect_child_entries, fan_out_children, FanOutReport};
use crate::resume::merge::merge_into_profile;
use crate::resume::upload::{validate_resume_file, ResumeFormat, ResumeUpload, UploadPolicy};
use crate::session::{Role, SessionContext};
use crate::storage::{resume_object_path, BlobStorage};
use crate::store::JobBoardStore;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParseOutcome {
    Parsed {
        updated_fields: Vec<&'static str>,
        skills_added: usize,
        children: FanOutReport,
    },
    /// Soft failure: the file and text are kept and the candidate fills the
    /// profile in by hand.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub resume_url: Option<String>,
    pub extracted_chars: usize,
    pub parse: ParseOutcome,
    /// Dashboard checklist percentage once the merged data is saved.
    pub profile_completion: u8,
}

/// Removes the user from the in-flight set when dropped.
struct InFlight<'a> {
    users: &'a Mutex<HashSet<Uuid>>,
    user_id: Uuid,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        users.remove(&self.user_id);
    }
}

/// Upload → extract → parse → merge → fan-out → invalidate.
///
/// Stages run strictly in order. A failing stage stops the run, but what
/// earlier stages wrote stays written.
pub struct ResumePipeline {
    store: Arc<dyn JobBoardStore>,
    storage: Arc<dyn BlobStorage>,
    parser: Arc<dyn ResumeParser>,
    cache: Arc<dyn ReadCache>,
    in_flight: Mutex<HashSet<Uuid>>,
}

impl ResumePipeline {
    pub fn new(
        store: Arc<dyn JobBoardStore>,
        storage: Arc<dyn BlobStorage>,
        parser: Arc<dyn ResumeParser>,
        cache: Arc<dyn ReadCache>,
    ) -> Self {
        Self {
            store,
            storage,
            parser,
            cache,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn claim(&self, user_id: Uuid) -> Result<InFlight<'_>, AppError> {
        let mut users = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !users.insert(user_id) {
            return Err(AppError::Conflict(
                "a resume is already being processed".to_string(),
            ));
        }
        Ok(InFlight {
            users: &self.in_flight,
            user_id,
        })
    }

    /// Full run for a freshly uploaded file.
    pub async fn ingest(
        &self,
        session: &SessionContext,
        upload: ResumeUpload,
        policy: &UploadPolicy,
    ) -> Result<IngestReport, AppError> {
        session.require(Role::Candidate)?;
        let format = validate_resume_file(&upload, policy)?;
        let _guard = self.claim(session.user_id)?;

        let mut profile = begin_onboarding(self.store.as_ref(), session).await?;

        let path = resume_object_path(session.user_id, Uuid::new_v4(), format.extension());
        let url = self
            .storage
            .upload(&path, upload.bytes.clone(), format.content_type(), false)
            .await?;
        info!("Stored resume for user {} at {path}", session.user_id);

        let previous = profile.resume_path.replace(path.clone());
        profile.resume_url = Some(url);
        profile.resume_text = None;
        let profile = self.store.update_profile(&profile).await?;
        invalidate_quietly(self.cache.as_ref(), &[CacheKey::Profile(session.user_id)]).await;

        if let Some(old) = previous.filter(|old| *old != path) {
            if let Err(e) = self.storage.delete(&old).await {
                warn!("Could not delete previous resume {old}: {e}");
            }
        }

        let text = extract_text(format, upload.bytes).await?;
        self.parse_and_merge(session, profile, text).await
    }

    /// Re-runs parsing without a new upload: cached text first, otherwise
    /// the stored file is downloaded and extracted again.
    pub async fn reparse(&self, session: &SessionContext) -> Result<IngestReport, AppError> {
        session.require(Role::Candidate)?;
        let _guard = self.claim(session.user_id)?;

        let profile = self
            .store
            .get_profile_by_user(session.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("no candidate profile".to_string()))?;

        let cached = profile
            .resume_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let text = match cached {
            Some(text) => text,
            None => {
                let path = profile.resume_path.clone().ok_or(AppError::ResumeMissing)?;
                let bytes = self.storage.download(&path).await.map_err(|e| {
                    warn!("Re-download of {path} failed: {e}");
                    AppError::ResumeMissing
                })?;
                let format = ResumeFormat::from_path(&path).unwrap_or(ResumeFormat::Pdf);
                extract_text(format, bytes).await?
            }
        };
        self.parse_and_merge(session, profile, text).await
    }

    async fn parse_and_merge(
        &self,
        session: &SessionContext,
        mut profile: CandidateProfile,
        text: String,
    ) -> Result<IngestReport, AppError> {
        let extracted_chars = text.chars().count();

        // cache the text before the parser call so a failed parse can be retried
        profile.resume_text = Some(text.clone());
        let mut profile = self.store.update_profile(&profile).await?;
        let mut invalidate = vec![CacheKey::Profile(session.user_id)];

        let parse = match self.parser.parse(&text, &session.token).await {
            Err(e) => {
                warn!("Resume parser failed for user {}: {e}", session.user_id);
                ParseOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
            Ok(parsed) => {
                let merge = merge_into_profile(&mut profile, &parsed);
                if !merge.is_empty() {
                    profile = self.store.update_profile(&profile).await?;
                }
                let (entries, skipped) = collect_child_entries(&parsed);
                let mut children = fan_out_children(Arc::clone(&self.store), profile.id, entries).await;
                children.skipped = skipped;
                invalidate.extend(
                    children
                        .touched
                        .iter()
                        .map(|kind| CacheKey::Children(profile.id, *kind)),
                );
                info!(
                    "Merged resume for user {}: {} fields, {} skills, {} child rows",
                    session.user_id,
                    merge.updated_fields.len(),
                    merge.skills_added,
                    children.saved
                );
                ParseOutcome::Parsed {
                    updated_fields: merge.updated_fields,
                    skills_added: merge.skills_added,
                    children,
                }
            }
        };

        invalidate_quietly(self.cache.as_ref(), &invalidate).await;
        let resume_url = profile.resume_url.clone();
        let snapshot = ProfileSnapshot::load(self.store.as_ref(), Some(profile)).await?;
        Ok(IngestReport {
            resume_url,
            extracted_chars,
            parse,
            profile_completion: dashboard_completion(&snapshot),
        })
    }
}
