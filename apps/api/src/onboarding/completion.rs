use serde::Serialize;

use crate::models::{CandidateProfile, ChildKind};
use crate::store::{JobBoardStore, StoreResult};

/// A profile plus the child-collection counts the dashboard checklist needs.
#[derive(Debug, Clone, Default)]
pub struct ProfileSnapshot {
    pub profile: Option<CandidateProfile>,
    pub education_count: usize,
    pub language_count: usize,
}

impl ProfileSnapshot {
    pub async fn load(store: &dyn JobBoardStore, profile: Option<CandidateProfile>) -> StoreResult<Self> {
        let Some(profile) = profile else {
            return Ok(Self::default());
        };
        let education_count = store.count_children(profile.id, ChildKind::Education).await?;
        let language_count = store.count_children(profile.id, ChildKind::Language).await?;
        Ok(Self {
            profile: Some(profile),
            education_count,
            language_count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionStatus {
    pub section: &'static str,
    pub filled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub percentage: u8,
    pub sections: Vec<SectionStatus>,
    pub missing: Vec<&'static str>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn percentage(filled: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (100.0 * filled as f64 / total as f64).round() as u8
}

fn report(sections: Vec<SectionStatus>) -> CompletionReport {
    let filled = sections.iter().filter(|s| s.filled).count();
    let missing = sections.iter().filter(|s| !s.filled).map(|s| s.section).collect();
    CompletionReport {
        percentage: percentage(filled, sections.len()),
        sections,
        missing,
    }
}

/// Fields gathered by the three onboarding steps.
fn onboarding_checklist(p: &CandidateProfile) -> Vec<SectionStatus> {
    [
        ("full_name", present(&p.full_name)),
        ("mobile", present(&p.mobile)),
        ("location", present(&p.location)),
        ("work_status", p.work_status.is_some()),
        ("headline", present(&p.headline)),
        ("education_level", p.education_level.is_some()),
        ("expected_salary", p.expected_salary_min.is_some() || p.expected_salary_max.is_some()),
        ("skills", !p.skills.is_empty()),
        ("resume", present(&p.resume_url)),
    ]
    .into_iter()
    .map(|(section, filled)| SectionStatus { section, filled })
    .collect()
}

/// Sections shown on the candidate dashboard.
fn dashboard_checklist(snapshot: &ProfileSnapshot, p: &CandidateProfile) -> Vec<SectionStatus> {
    let basic_details = present(&p.full_name) && present(&p.email) && present(&p.mobile) && present(&p.location);
    [
        ("basic_details", basic_details),
        ("headline", present(&p.headline)),
        ("summary", present(&p.summary)),
        ("skills", !p.skills.is_empty()),
        ("education", snapshot.education_count > 0),
        ("languages", snapshot.language_count > 0),
        ("resume", present(&p.resume_url)),
        ("photo", present(&p.profile_photo_url)),
        ("preferred_job_type", p.preferred_job_type.is_some()),
    ]
    .into_iter()
    .map(|(section, filled)| SectionStatus { section, filled })
    .collect()
}

pub fn onboarding_report(profile: Option<&CandidateProfile>) -> CompletionReport {
    match profile {
        Some(p) => report(onboarding_checklist(p)),
        None => CompletionReport {
            percentage: 0,
            sections: Vec::new(),
            missing: Vec::new(),
        },
    }
}

pub fn dashboard_report(snapshot: &ProfileSnapshot) -> CompletionReport {
    match &snapshot.profile {
        Some(p) => report(dashboard_checklist(snapshot, p)),
        None => CompletionReport {
            percentage: 0,
            sections: Vec::new(),
            missing: Vec::new(),
        },
    }
}

pub fn onboarding_completion(profile: Option<&CandidateProfile>) -> u8 {
    onboarding_report(profile).percentage
}

pub fn dashboard_completion(snapshot: &ProfileSnapshot) -> u8 {
    dashboard_report(snapshot).percentage
}
