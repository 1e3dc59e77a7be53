use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::profile::EducationLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Temporary,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
            EmploymentType::Temporary => "temporary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum WorkMode {
    Onsite,
    Remote,
    Hybrid,
}

impl WorkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkMode::Onsite => "onsite",
            WorkMode::Remote => "remote",
            WorkMode::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum JobVisibility {
    #[default]
    Public,
    Unlisted,
}

/// A posting owned by one recruiter profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub recruiter_id: Uuid,
    pub title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub employment_type: EmploymentType,
    pub work_mode: WorkMode,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub experience_min: Option<i32>,
    pub experience_max: Option<i32>,
    pub education_required: Option<EducationLevel>,
    pub skills_required: Vec<String>,
    pub description: String,
    pub is_active: bool,
    pub num_positions: i32,
    pub application_deadline: Option<NaiveDate>,
    pub visibility: JobVisibility,
    pub role_category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Whether the posting still accepts applications on `today`.
    pub fn accepts_applications(&self, today: NaiveDate) -> bool {
        self.is_active
            && self
                .application_deadline
                .map(|deadline| today <= deadline)
                .unwrap_or(true)
    }
}

/// Recruiter-supplied fields for a new or edited posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub employment_type: EmploymentType,
    pub work_mode: WorkMode,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub experience_min: Option<i32>,
    pub experience_max: Option<i32>,
    pub education_required: Option<EducationLevel>,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_positions")]
    pub num_positions: i32,
    pub application_deadline: Option<NaiveDate>,
    #[serde(default)]
    pub visibility: JobVisibility,
    pub role_category: Option<String>,
}

fn default_positions() -> i32 {
    1
}

impl NewJob {
    pub fn into_job(self, recruiter_id: Uuid) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            recruiter_id,
            title: self.title.trim().to_string(),
            company_name: self.company_name.trim().to_string(),
            location: self.location,
            employment_type: self.employment_type,
            work_mode: self.work_mode,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            experience_min: self.experience_min,
            experience_max: self.experience_max,
            education_required: self.education_required,
            skills_required: self.skills_required,
            description: self.description,
            is_active: true,
            num_positions: self.num_positions,
            application_deadline: self.application_deadline,
            visibility: self.visibility,
            role_category: self.role_category,
            created_at: now,
            updated_at: now,
        }
    }
}
