//! In-memory doubles and fixtures shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cache::{CacheError, CacheKey, ReadCache};
use crate::config::test_config;
use crate::matching::filters::{CandidateFilter, JobFilter};
use crate::models::{
    Application, ApplicationStatus, CandidateProfile, ChildEntry, ChildKind, ChildRow,
    EmploymentType, Job, JobVisibility, RecruiterProfile, SavedJob, WorkMode, WorkStatus,
};
use crate::parser_client::{ParsedResume, ParserError, ResumeParser};
use crate::matching::scoring::OverlapMatchScorer;
use crate::session::{AuthError, AuthService, BearerToken, Identity, Role, SessionContext};
use crate::state::AppState;
use crate::storage::{BlobStorage, StorageError};
use crate::store::{JobBoardStore, StoreError, StoreResult};

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub fn session(role: Role) -> SessionContext {
    SessionContext::new(
        Identity {
            user_id: Uuid::new_v4(),
            role,
        },
        BearerToken::new("test-token"),
    )
}

pub fn candidate_session() -> SessionContext {
    session(Role::Candidate)
}

pub fn recruiter_session() -> SessionContext {
    session(Role::Recruiter)
}

pub fn job_fixture(title: &str, location: &str, employment_type: EmploymentType) -> Job {
    let now = Utc::now();
    Job {
        id: Uuid::new_v4(),
        recruiter_id: Uuid::new_v4(),
        title: title.to_string(),
        company_name: "Acme Corp".to_string(),
        location: Some(location.to_string()),
        employment_type,
        work_mode: WorkMode::Onsite,
        salary_min: Some(1_000_000),
        salary_max: Some(2_000_000),
        experience_min: None,
        experience_max: None,
        education_required: None,
        skills_required: Vec::new(),
        description: String::new(),
        is_active: true,
        num_positions: 1,
        application_deadline: None,
        visibility: JobVisibility::Public,
        role_category: None,
        created_at: now,
        updated_at: now,
    }
}

/// A searchable profile that finished onboarding.
pub fn candidate_fixture(skills: &[&str]) -> CandidateProfile {
    let mut profile = CandidateProfile::new(Uuid::new_v4());
    profile.full_name = Some("Asha Rao".to_string());
    profile.headline = Some("Backend Engineer".to_string());
    profile.location = Some("Pune".to_string());
    profile.experience_years = Some(3);
    profile.expected_salary_min = Some(1_200_000);
    profile.work_status = Some(WorkStatus::Experienced);
    profile.skills = skills.iter().map(|s| s.to_string()).collect();
    profile.onboarding_completed = true;
    profile.onboarding_step = 3;
    profile
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    profiles: Vec<CandidateProfile>,
    children: Vec<ChildRow>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
    saved: Vec<SavedJob>,
    recruiters: Vec<RecruiterProfile>,
    fail_profile_updates: bool,
    fail_child_kinds: HashSet<ChildKind>,
    fail_application_candidates: HashSet<Uuid>,
    panic_application_candidates: HashSet<Uuid>,
}

/// `JobBoardStore` over vectors, evaluating filters with `matches`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock().expect("memory store poisoned");
        f(&mut tables)
    }

    pub fn put_job(&self, job: Job) {
        self.with(|t| t.jobs.push(job));
    }

    pub fn put_profile(&self, profile: CandidateProfile) {
        self.with(|t| t.profiles.push(profile));
    }

    pub fn put_recruiter(&self, recruiter: RecruiterProfile) {
        self.with(|t| t.recruiters.push(recruiter));
    }

    /// Returns the recruiter profile id for `user_id`, creating it if needed.
    pub fn ensure_recruiter(&self, user_id: Uuid, premium: bool) -> Uuid {
        self.with(|t| {
            if let Some(existing) = t.recruiters.iter().find(|r| r.user_id == user_id) {
                return existing.id;
            }
            let recruiter = RecruiterProfile {
                id: Uuid::new_v4(),
                user_id,
                company_name: Some("Acme Corp".to_string()),
                has_premium_access: premium,
                created_at: Utc::now(),
            };
            let id = recruiter.id;
            t.recruiters.push(recruiter);
            id
        })
    }

    pub fn fail_profile_updates(&self, fail: bool) {
        self.with(|t| t.fail_profile_updates = fail);
    }

    pub fn fail_child_inserts(&self, kind: ChildKind) {
        self.with(|t| {
            t.fail_child_kinds.insert(kind);
        });
    }

    pub fn fail_applications_for(&self, candidate_id: Uuid) {
        self.with(|t| {
            t.fail_application_candidates.insert(candidate_id);
        });
    }

    /// Makes `find_application` panic for this candidate, outside the lock.
    pub fn panic_applications_for(&self, candidate_id: Uuid) {
        self.with(|t| {
            t.panic_application_candidates.insert(candidate_id);
        });
    }

    /// Reads the table directly, bypassing injected failures.
    pub fn applications_for(&self, candidate_id: Uuid) -> Vec<Application> {
        self.with(|t| {
            t.applications
                .iter()
                .filter(|a| a.candidate_id == candidate_id)
                .cloned()
                .collect()
        })
    }

    pub fn application_count(&self) -> usize {
        self.with(|t| t.applications.len())
    }

    pub fn children_of(&self, candidate_id: Uuid) -> Vec<ChildRow> {
        self.with(|t| {
            t.children
                .iter()
                .filter(|c| c.candidate_id == candidate_id)
                .cloned()
                .collect()
        })
    }

    pub fn profile_of(&self, user_id: Uuid) -> Option<CandidateProfile> {
        self.with(|t| t.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }
}

fn unavailable(what: &str) -> StoreError {
    StoreError::Unavailable(format!("simulated failure: {what}"))
}

#[async_trait]
impl JobBoardStore for MemoryStore {
    async fn get_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<CandidateProfile>> {
        Ok(self.profile_of(user_id))
    }

    async fn insert_profile(&self, profile: &CandidateProfile) -> StoreResult<CandidateProfile> {
        self.with(|t| {
            t.profiles.push(profile.clone());
            Ok(profile.clone())
        })
    }

    async fn update_profile(&self, profile: &CandidateProfile) -> StoreResult<CandidateProfile> {
        self.with(|t| {
            if t.fail_profile_updates {
                return Err(unavailable("update_profile"));
            }
            let row = t
                .profiles
                .iter_mut()
                .find(|p| p.id == profile.id)
                .ok_or_else(|| StoreError::NotFound(format!("profile {}", profile.id)))?;
            *row = profile.clone();
            row.updated_at = Utc::now();
            Ok(row.clone())
        })
    }

    async fn filter_candidates(
        &self,
        filter: &CandidateFilter,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<CandidateProfile>> {
        Ok(self.with(|t| {
            t.profiles
                .iter()
                .filter(|p| filter.matches(p, now))
                .cloned()
                .collect()
        }))
    }

    async fn insert_child(&self, candidate_id: Uuid, entry: &ChildEntry) -> StoreResult<ChildRow> {
        // yield so concurrent inserts interleave like real I/O
        tokio::task::yield_now().await;
        self.with(|t| {
            if t.fail_child_kinds.contains(&entry.kind()) {
                return Err(unavailable("insert_child"));
            }
            let row = ChildRow {
                id: Uuid::new_v4(),
                candidate_id,
                created_at: Utc::now(),
                entry: entry.clone(),
            };
            t.children.push(row.clone());
            Ok(row)
        })
    }

    async fn list_children(&self, candidate_id: Uuid, kind: ChildKind) -> StoreResult<Vec<ChildRow>> {
        Ok(self
            .children_of(candidate_id)
            .into_iter()
            .filter(|c| c.entry.kind() == kind)
            .collect())
    }

    async fn count_children(&self, candidate_id: Uuid, kind: ChildKind) -> StoreResult<usize> {
        Ok(self.list_children(candidate_id, kind).await?.len())
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(self.with(|t| t.jobs.iter().find(|j| j.id == id).cloned()))
    }

    async fn insert_job(&self, job: &Job) -> StoreResult<Job> {
        self.put_job(job.clone());
        Ok(job.clone())
    }

    async fn update_job(&self, job: &Job) -> StoreResult<Job> {
        self.with(|t| {
            let row = t
                .jobs
                .iter_mut()
                .find(|j| j.id == job.id)
                .ok_or_else(|| StoreError::NotFound(format!("job {}", job.id)))?;
            *row = job.clone();
            row.updated_at = Utc::now();
            Ok(row.clone())
        })
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.with(|t| {
            let before = t.jobs.len();
            t.jobs.retain(|j| j.id != id);
            t.jobs.len() != before
        }))
    }

    async fn filter_jobs(&self, filter: &JobFilter, now: DateTime<Utc>) -> StoreResult<Vec<Job>> {
        Ok(self.with(|t| t.jobs.iter().filter(|j| filter.matches(j, now)).cloned().collect()))
    }

    async fn find_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> StoreResult<Option<Application>> {
        if self.with(|t| t.panic_application_candidates.contains(&candidate_id)) {
            panic!("simulated panic: find_application");
        }
        self.with(|t| {
            if t.fail_application_candidates.contains(&candidate_id) {
                return Err(unavailable("find_application"));
            }
            Ok(t.applications
                .iter()
                .find(|a| a.candidate_id == candidate_id && a.job_id == job_id)
                .cloned())
        })
    }

    async fn get_application(&self, id: Uuid) -> StoreResult<Option<Application>> {
        Ok(self.with(|t| t.applications.iter().find(|a| a.id == id).cloned()))
    }

    async fn insert_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application> {
        self.with(|t| {
            if t.fail_application_candidates.contains(&candidate_id) {
                return Err(unavailable("insert_application"));
            }
            let now = Utc::now();
            let app = Application {
                id: Uuid::new_v4(),
                candidate_id,
                job_id,
                status,
                created_at: now,
                updated_at: now,
            };
            t.applications.push(app.clone());
            Ok(app)
        })
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Application> {
        self.with(|t| {
            let app = t
                .applications
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("application {id}")))?;
            app.status = status;
            app.updated_at = Utc::now();
            Ok(app.clone())
        })
    }

    async fn list_candidate_applications(&self, candidate_id: Uuid) -> StoreResult<Vec<Application>> {
        Ok(self.with(|t| {
            t.applications
                .iter()
                .filter(|a| a.candidate_id == candidate_id)
                .cloned()
                .collect()
        }))
    }

    async fn find_saved_job(&self, candidate_id: Uuid, job_id: Uuid) -> StoreResult<Option<SavedJob>> {
        Ok(self.with(|t| {
            t.saved
                .iter()
                .find(|s| s.candidate_id == candidate_id && s.job_id == job_id)
                .cloned()
        }))
    }

    async fn insert_saved_job(&self, candidate_id: Uuid, job_id: Uuid) -> StoreResult<SavedJob> {
        let saved = SavedJob {
            candidate_id,
            job_id,
            created_at: Utc::now(),
        };
        self.with(|t| t.saved.push(saved.clone()));
        Ok(saved)
    }

    async fn delete_saved_job(&self, candidate_id: Uuid, job_id: Uuid) -> StoreResult<bool> {
        Ok(self.with(|t| {
            let before = t.saved.len();
            t.saved
                .retain(|s| !(s.candidate_id == candidate_id && s.job_id == job_id));
            t.saved.len() != before
        }))
    }

    async fn get_recruiter_by_user(&self, user_id: Uuid) -> StoreResult<Option<RecruiterProfile>> {
        Ok(self.with(|t| t.recruiters.iter().find(|r| r.user_id == user_id).cloned()))
    }
}

// ─── MemoryStorage ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, Bytes>>,
    deleted: Mutex<Vec<String>>,
    fail_uploads: Mutex<bool>,
    fail_deletes: Mutex<bool>,
}

impl MemoryStorage {
    pub fn fail_uploads(&self) {
        *self.fail_uploads.lock().expect("poisoned") = true;
    }

    pub fn fail_deletes(&self) {
        *self.fail_deletes.lock().expect("poisoned") = true;
    }

    pub fn put(&self, path: &str, bytes: &[u8]) {
        self.blobs
            .lock()
            .expect("poisoned")
            .insert(path.to_string(), Bytes::copy_from_slice(bytes));
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.lock().expect("poisoned").contains_key(path)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("poisoned").clone()
    }
}

#[async_trait]
impl BlobStorage for MemoryStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        _content_type: &str,
        overwrite: bool,
    ) -> Result<String, StorageError> {
        if *self.fail_uploads.lock().expect("poisoned") {
            return Err(StorageError::Backend("simulated upload failure".to_string()));
        }
        let mut blobs = self.blobs.lock().expect("poisoned");
        if !overwrite && blobs.contains_key(path) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        blobs.insert(path.to_string(), bytes);
        Ok(format!("memory://{path}"))
    }

    async fn download(&self, path: &str) -> Result<Bytes, StorageError> {
        self.blobs
            .lock()
            .expect("poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        if *self.fail_deletes.lock().expect("poisoned") {
            return Err(StorageError::Backend("simulated delete failure".to_string()));
        }
        self.blobs.lock().expect("poisoned").remove(path);
        self.deleted.lock().expect("poisoned").push(path.to_string());
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StorageError> {
        if !self.contains(path) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(format!("memory://{path}?expires_in={}", ttl.as_secs()))
    }
}

// ─── MemoryCache ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    invalidated: Mutex<Vec<String>>,
}

impl MemoryCache {
    pub fn invalidated(&self) -> Vec<String> {
        self.invalidated.lock().expect("poisoned").clone()
    }
}

#[async_trait]
impl ReadCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        Ok(self.entries.lock().expect("poisoned").get(&key.to_string()).cloned())
    }

    async fn put(&self, key: &CacheKey, value: &str, _ttl_secs: u64) -> Result<(), CacheError> {
        self.entries
            .lock()
            .expect("poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn invalidate(&self, keys: &[CacheKey]) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().expect("poisoned");
        let mut invalidated = self.invalidated.lock().expect("poisoned");
        for key in keys {
            entries.remove(&key.to_string());
            invalidated.push(key.to_string());
        }
        Ok(())
    }
}

// ─── StubParser ──────────────────────────────────────────────────────────────

/// Returns a canned oracle response and records what it was sent.
pub struct StubParser {
    response: Result<ParsedResume, String>,
    calls: AtomicUsize,
    last_text: Mutex<Option<String>>,
}

impl StubParser {
    pub fn returning(parsed: ParsedResume) -> Self {
        Self {
            response: Ok(parsed),
            calls: AtomicUsize::new(0),
            last_text: Mutex::new(None),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_text: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_text(&self) -> Option<String> {
        self.last_text.lock().expect("poisoned").clone()
    }
}

#[async_trait]
impl ResumeParser for StubParser {
    async fn parse(&self, resume_text: &str, _token: &BearerToken) -> Result<ParsedResume, ParserError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_text.lock().expect("poisoned") = Some(resume_text.to_string());
        match &self.response {
            Ok(parsed) => Ok(parsed.clone()),
            Err(message) => Err(ParserError::Rejected(message.clone())),
        }
    }
}

// ─── StaticAuth & AppState ───────────────────────────────────────────────────

/// Accepts exactly one token and resolves it to a fixed identity.
pub struct StaticAuth {
    pub token: String,
    pub identity: Identity,
}

#[async_trait]
impl AuthService for StaticAuth {
    async fn current_user(&self, token: &BearerToken) -> Result<Identity, AuthError> {
        if token.as_str() == self.token {
            Ok(self.identity.clone())
        } else {
            Err(AuthError::Rejected)
        }
    }
}

/// State over fresh in-memory doubles; `test-token` is a candidate.
pub fn test_state() -> AppState {
    AppState::new(
        test_config(),
        Arc::new(MemoryStore::default()),
        Arc::new(MemoryStorage::default()),
        Arc::new(MemoryCache::default()),
        Arc::new(StubParser::failing("no parser in tests")),
        Arc::new(StaticAuth {
            token: "test-token".to_string(),
            identity: Identity {
                user_id: Uuid::new_v4(),
                role: Role::Candidate,
            },
        }),
        Arc::new(OverlapMatchScorer),
    )
}
