use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::{CandidateProfile, EducationLevel, EmploymentType, WorkStatus};
use crate::onboarding::completion::onboarding_completion;
use crate::onboarding::validation::{
    require_text, validate_email, validate_experience, validate_mobile, validate_pincode,
    validate_salary_range,
};
use crate::session::{Role, SessionContext};
use crate::store::JobBoardStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Basics,
    Career,
    Resume,
}

impl OnboardingStep {
    pub fn number(self) -> i16 {
        match self {
            OnboardingStep::Basics => 1,
            OnboardingStep::Career => 2,
            OnboardingStep::Resume => 3,
        }
    }

    /// Out-of-range stored values clamp to the nearest step.
    pub fn from_number(n: i16) -> Self {
        match n {
            i16::MIN..=1 => OnboardingStep::Basics,
            2 => OnboardingStep::Career,
            _ => OnboardingStep::Resume,
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            OnboardingStep::Basics => Some(OnboardingStep::Career),
            OnboardingStep::Career => Some(OnboardingStep::Resume),
            OnboardingStep::Resume => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum OnboardingState {
    NoProfile,
    Step(OnboardingStep),
    Complete,
}

impl OnboardingState {
    pub fn of(profile: Option<&CandidateProfile>) -> Self {
        match profile {
            None => OnboardingState::NoProfile,
            Some(p) if p.onboarding_completed => OnboardingState::Complete,
            Some(p) => OnboardingState::Step(OnboardingStep::from_number(p.onboarding_step)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteArea {
    Onboarding,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "step", rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    RedirectToDashboard,
    RedirectToOnboarding(OnboardingStep),
}

/// Navigation gate. Completion is forward-only: once complete, onboarding
/// routes always redirect to the dashboard, even if required fields were
/// later cleared.
pub fn resolve_route(
    profile: Option<&CandidateProfile>,
    area: RouteArea,
    requested: Option<OnboardingStep>,
) -> RouteDecision {
    match (OnboardingState::of(profile), area) {
        (OnboardingState::Complete, RouteArea::Onboarding) => RouteDecision::RedirectToDashboard,
        (OnboardingState::Complete, RouteArea::Dashboard) => RouteDecision::Allow,
        (OnboardingState::NoProfile, RouteArea::Dashboard) => {
            RouteDecision::RedirectToOnboarding(OnboardingStep::Basics)
        }
        (OnboardingState::NoProfile, RouteArea::Onboarding) => match requested {
            Some(step) if step > OnboardingStep::Basics => {
                RouteDecision::RedirectToOnboarding(OnboardingStep::Basics)
            }
            _ => RouteDecision::Allow,
        },
        (OnboardingState::Step(current), RouteArea::Dashboard) => {
            RouteDecision::RedirectToOnboarding(current)
        }
        (OnboardingState::Step(current), RouteArea::Onboarding) => match requested {
            Some(step) if step > current => RouteDecision::RedirectToOnboarding(current),
            _ => RouteDecision::Allow,
        },
    }
}

/// Creates the profile row on the first authenticated visit. Idempotent.
pub async fn begin_onboarding(
    store: &dyn JobBoardStore,
    session: &SessionContext,
) -> Result<CandidateProfile, AppError> {
    session.require(Role::Candidate)?;
    if let Some(existing) = store.get_profile_by_user(session.user_id).await? {
        return Ok(existing);
    }
    let profile = store
        .insert_profile(&CandidateProfile::new(session.user_id))
        .await?;
    info!("Created candidate profile {} for user {}", profile.id, session.user_id);
    Ok(profile)
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasicsInput {
    pub full_name: String,
    pub email: Option<String>,
    pub mobile: String,
    pub pincode: Option<String>,
    pub location: String,
    pub work_status: Option<WorkStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CareerInput {
    pub headline: String,
    pub experience_years: Option<i32>,
    pub education_level: Option<EducationLevel>,
    pub expected_salary_min: Option<i64>,
    pub expected_salary_max: Option<i64>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub preferred_job_type: Option<EmploymentType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumeInput {
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepInput {
    Basics(BasicsInput),
    Career(CareerInput),
    Resume(ResumeInput),
}

impl StepInput {
    pub fn step(&self) -> OnboardingStep {
        match self {
            StepInput::Basics(_) => OnboardingStep::Basics,
            StepInput::Career(_) => OnboardingStep::Career,
            StepInput::Resume(_) => OnboardingStep::Resume,
        }
    }

    /// Validates the step's required fields and writes them onto `draft`.
    fn apply(self, draft: &mut CandidateProfile) -> Result<(), AppError> {
        match self {
            StepInput::Basics(input) => {
                let work_status = input
                    .work_status
                    .ok_or_else(|| AppError::Validation("work_status is required".to_string()))?;
                draft.full_name = Some(require_text("full_name", &input.full_name)?);
                draft.mobile = Some(validate_mobile(&input.mobile)?);
                draft.location = Some(require_text("location", &input.location)?);
                if let Some(email) = input.email.filter(|e| !e.trim().is_empty()) {
                    draft.email = Some(validate_email(&email)?);
                }
                if let Some(pincode) = input.pincode.filter(|p| !p.trim().is_empty()) {
                    draft.pincode = Some(validate_pincode(&pincode)?);
                }
                draft.work_status = Some(work_status);
            }
            StepInput::Career(input) => {
                let headline = require_text("headline", &input.headline)?;
                let skills: Vec<String> = input
                    .skills
                    .iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if skills.is_empty() {
                    return Err(AppError::Validation("add at least one skill".to_string()));
                }
                validate_salary_range(input.expected_salary_min, input.expected_salary_max)?;
                match (input.experience_years, draft.work_status) {
                    (Some(years), _) => validate_experience(years)?,
                    (None, Some(WorkStatus::Experienced)) => {
                        return Err(AppError::Validation(
                            "experience_years is required for experienced candidates".to_string(),
                        ))
                    }
                    (None, _) => {}
                }
                draft.headline = Some(headline);
                draft.skills = skills;
                let fresher_default = (draft.work_status == Some(WorkStatus::Fresher)).then_some(0);
                draft.experience_years = input
                    .experience_years
                    .or(draft.experience_years)
                    .or(fresher_default);
                draft.education_level = input.education_level.or(draft.education_level);
                draft.expected_salary_min = input.expected_salary_min;
                draft.expected_salary_max = input.expected_salary_max;
                draft.preferred_job_type = input.preferred_job_type.or(draft.preferred_job_type);
            }
            StepInput::Resume(input) => {
                if draft.resume_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                    return Err(AppError::Validation(
                        "upload a resume before finishing onboarding".to_string(),
                    ));
                }
                if let Some(summary) = input.summary.filter(|s| !s.trim().is_empty()) {
                    draft.summary = Some(summary.trim().to_string());
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub state: OnboardingState,
    /// Onboarding checklist percentage after the save.
    pub completion: u8,
    pub profile: CandidateProfile,
}

impl StepOutcome {
    pub fn new(profile: CandidateProfile) -> Self {
        Self {
            state: OnboardingState::of(Some(&profile)),
            completion: onboarding_completion(Some(&profile)),
            profile,
        }
    }
}

/// Validates and saves one onboarding step.
///
/// The step advance is applied to a copy and only becomes visible once the
/// save succeeds; on a failed save the stored step is untouched and the
/// caller can retry. Re-submitting an earlier step edits its data without
/// moving the step back.
pub async fn submit_step(
    store: &dyn JobBoardStore,
    session: &SessionContext,
    input: StepInput,
) -> Result<StepOutcome, AppError> {
    session.require(Role::Candidate)?;
    let profile = store
        .get_profile_by_user(session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("no profile yet; start onboarding first".to_string()))?;

    let current = match OnboardingState::of(Some(&profile)) {
        OnboardingState::Step(step) => step,
        _ => return Ok(StepOutcome::new(profile)),
    };
    let submitted = input.step();
    if submitted > current {
        return Err(AppError::Validation(format!(
            "complete step {} before step {}",
            current.number(),
            submitted.number()
        )));
    }

    let mut draft = profile.clone();
    input.apply(&mut draft)?;
    if submitted == current {
        match current.next() {
            Some(next) => draft.onboarding_step = next.number(),
            None => draft.onboarding_completed = true,
        }
    }

    let outcome = StepOutcome::new(store.update_profile(&draft).await?);
    info!(
        "Onboarding step {} saved for user {}: now {:?} at {}%",
        submitted.number(),
        session.user_id,
        outcome.state,
        outcome.completion
    );
    Ok(outcome)
}
