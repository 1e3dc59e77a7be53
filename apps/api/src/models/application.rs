use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Application status. Declaration order is the pipeline order shown to
/// recruiters; `Ord` follows it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    InReview,
    Shortlisted,
    Interview,
    Hired,
    Rejected,
}

/// Links one candidate to one job. At most one per pair is intended, but the
/// store does not enforce it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SavedJob {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecruiterProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: Option<String>,
    /// Gates candidate search.
    pub has_premium_access: bool,
    pub created_at: DateTime<Utc>,
}
