use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::job::EmploymentType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum EducationLevel {
    HighSchool,
    Diploma,
    Bachelors,
    Masters,
    Doctorate,
}

impl EducationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::HighSchool => "high_school",
            EducationLevel::Diploma => "diploma",
            EducationLevel::Bachelors => "bachelors",
            EducationLevel::Masters => "masters",
            EducationLevel::Doctorate => "doctorate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum WorkStatus {
    Experienced,
    Fresher,
}

/// One row per candidate user. Mutated incrementally by onboarding steps,
/// profile edits and resume merges; never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub pincode: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub expected_salary_min: Option<i64>,
    pub expected_salary_max: Option<i64>,
    pub experience_years: Option<i32>,
    pub education_level: Option<EducationLevel>,
    pub summary: Option<String>,
    pub resume_url: Option<String>,
    pub resume_path: Option<String>,
    /// Extracted text of the current resume, kept so a re-parse can skip
    /// download and extraction.
    #[serde(skip_serializing)]
    pub resume_text: Option<String>,
    pub skills: Vec<String>,
    pub preferred_job_type: Option<EmploymentType>,
    pub onboarding_completed: bool,
    pub onboarding_step: i16,
    pub work_status: Option<WorkStatus>,
    pub profile_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CandidateProfile {
    /// A freshly created row: nothing filled, onboarding at step 1.
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            full_name: None,
            email: None,
            mobile: None,
            pincode: None,
            headline: None,
            location: None,
            expected_salary_min: None,
            expected_salary_max: None,
            experience_years: None,
            education_level: None,
            summary: None,
            resume_url: None,
            resume_path: None,
            resume_text: None,
            skills: Vec::new(),
            preferred_job_type: None,
            onboarding_completed: false,
            onboarding_step: 1,
            work_status: None,
            profile_photo_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum AccomplishmentKind {
    Certification,
    Award,
    Publication,
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub field_of_study: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub grade: Option<String>,
    /// Advisory only; several rows may carry it.
    #[serde(default)]
    pub is_highest: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmploymentEntry {
    #[serde(alias = "company")]
    pub company_name: String,
    #[serde(alias = "title", alias = "role")]
    pub designation: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Advisory only; several rows may carry it.
    #[serde(default)]
    pub is_current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InternshipEntry {
    #[serde(alias = "company")]
    pub company_name: String,
    pub role: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(alias = "name")]
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    #[serde(alias = "name")]
    pub language: String,
    pub proficiency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccomplishmentEntry {
    pub kind: AccomplishmentKind,
    #[serde(alias = "name")]
    pub title: String,
    pub issuer: Option<String>,
    pub issued_on: Option<NaiveDate>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamEntry {
    pub exam_name: String,
    pub score: Option<String>,
    pub year: Option<i32>,
}

/// Payload of one row in a candidate child collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection", rename_all = "snake_case")]
pub enum ChildEntry {
    Education(EducationEntry),
    Employment(EmploymentEntry),
    Internship(InternshipEntry),
    Project(ProjectEntry),
    Language(LanguageEntry),
    Accomplishment(AccomplishmentEntry),
    Exam(ExamEntry),
}

impl ChildEntry {
    pub fn kind(&self) -> ChildKind {
        match self {
            ChildEntry::Education(_) => ChildKind::Education,
            ChildEntry::Employment(_) => ChildKind::Employment,
            ChildEntry::Internship(_) => ChildKind::Internship,
            ChildEntry::Project(_) => ChildKind::Project,
            ChildEntry::Language(_) => ChildKind::Language,
            ChildEntry::Accomplishment(_) => ChildKind::Accomplishment,
            ChildEntry::Exam(_) => ChildKind::Exam,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    Education,
    Employment,
    Internship,
    Project,
    Language,
    Accomplishment,
    Exam,
}

impl ChildKind {
    pub const ALL: [ChildKind; 7] = [
        ChildKind::Education,
        ChildKind::Employment,
        ChildKind::Internship,
        ChildKind::Project,
        ChildKind::Language,
        ChildKind::Accomplishment,
        ChildKind::Exam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChildKind::Education => "education",
            ChildKind::Employment => "employment",
            ChildKind::Internship => "internship",
            ChildKind::Project => "project",
            ChildKind::Language => "language",
            ChildKind::Accomplishment => "accomplishment",
            ChildKind::Exam => "exam",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ChildKind::Education => "candidate_education",
            ChildKind::Employment => "candidate_employment",
            ChildKind::Internship => "candidate_internships",
            ChildKind::Project => "candidate_projects",
            ChildKind::Language => "candidate_languages",
            ChildKind::Accomplishment => "candidate_accomplishments",
            ChildKind::Exam => "candidate_exams",
        }
    }
}

/// A stored child row, exclusively owned by one candidate profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: ChildEntry,
}
