//! Faceted filters for the public job list and recruiter candidate search.
//!
//! Every facet is optional; an absent facet (or an empty list) places no
//! constraint. Present facets combine with AND. Each filter can evaluate a
//! row in memory (`matches`) or append the same predicate to a PostgreSQL
//! query (`push_predicates`); the two must stay in step.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::errors::AppError;
use crate::models::{CandidateProfile, EducationLevel, EmploymentType, Job, JobVisibility, WorkMode};

/// Experience slider ceiling; a max at or above it means "and above".
pub const EXPERIENCE_CEILING: i64 = 30;
/// Salary slider ceiling; a max at or above it means "and above".
pub const SALARY_CEILING: i64 = 10_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl NumericRange {
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }

    /// Effective bounds: min defaults to 0, max is open at the ceiling.
    pub fn bounds(&self, ceiling: i64) -> (i64, Option<i64>) {
        let min = self.min.unwrap_or(0);
        let max = self.max.filter(|m| *m < ceiling);
        (min, max)
    }

    pub fn contains(&self, value: i64, ceiling: i64) -> bool {
        let (min, max) = self.bounds(ceiling);
        value >= min && max.map_or(true, |m| value <= m)
    }

    pub fn validate(&self, facet: &str) -> Result<(), AppError> {
        if self.min.is_some_and(|m| m < 0) || self.max.is_some_and(|m| m < 0) {
            return Err(AppError::Validation(format!("{facet} range cannot be negative")));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(AppError::Validation(format!(
                    "{facet} range minimum {min} exceeds maximum {max}"
                )));
            }
        }
        Ok(())
    }

    fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>, column: &str, ceiling: i64) {
        let (min, max) = self.bounds(ceiling);
        qb.push(format!(" AND {column} >= ")).push_bind(min);
        if let Some(max) = max {
            qb.push(format!(" AND {column} <= ")).push_bind(max);
        }
    }
}

/// Recency window; a single choice, not cumulative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Freshness {
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
}

impl Freshness {
    pub fn days(&self) -> i64 {
        match self {
            Freshness::Last7Days => 7,
            Freshness::Last30Days => 30,
            Freshness::Last90Days => 90,
        }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFilter {
    pub keyword: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub employment_types: Vec<EmploymentType>,
    #[serde(default)]
    pub work_modes: Vec<WorkMode>,
    #[serde(default)]
    pub education_levels: Vec<EducationLevel>,
    pub experience: Option<NumericRange>,
    pub salary: Option<NumericRange>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub freshness: Option<Freshness>,
    /// Restrict to active, publicly visible postings. Set by the engine for
    /// the public list, never by callers.
    #[serde(skip)]
    pub active_only: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateFilter {
    pub keyword: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub employment_types: Vec<EmploymentType>,
    #[serde(default)]
    pub education_levels: Vec<EducationLevel>,
    pub experience: Option<NumericRange>,
    pub salary: Option<NumericRange>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub freshness: Option<Freshness>,
}

/// Lowercased, trimmed needle; `None` when the facet is blank.
fn needle(facet: &Option<String>) -> Option<String> {
    facet
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

fn has_all_skills(stored: &[String], wanted: &[String]) -> bool {
    wanted.iter().all(|w| stored.iter().any(|s| s == w))
}

/// Escapes LIKE metacharacters and wraps the needle for substring matching.
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl JobFilter {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(range) = &self.experience {
            range.validate("experience")?;
        }
        if let Some(range) = &self.salary {
            range.validate("salary")?;
        }
        Ok(())
    }

    /// Years of experience a posting asks for; no requirement counts as 0.
    fn job_experience(job: &Job) -> i64 {
        job.experience_min.unwrap_or(0) as i64
    }

    fn job_salary(job: &Job) -> Option<i64> {
        job.salary_min.or(job.salary_max)
    }

    pub fn matches(&self, job: &Job, now: DateTime<Utc>) -> bool {
        if self.active_only && !(job.is_active && job.visibility == JobVisibility::Public) {
            return false;
        }
        if let Some(kw) = needle(&self.keyword) {
            let hit = job.title.to_lowercase().contains(&kw)
                || job.company_name.to_lowercase().contains(&kw)
                || job.skills_required.iter().any(|s| s.to_lowercase().contains(&kw));
            if !hit {
                return false;
            }
        }
        if let Some(loc) = needle(&self.location) {
            if !contains_ci(job.location.as_deref(), &loc) {
                return false;
            }
        }
        if !self.employment_types.is_empty() && !self.employment_types.contains(&job.employment_type)
        {
            return false;
        }
        if !self.work_modes.is_empty() && !self.work_modes.contains(&job.work_mode) {
            return false;
        }
        if !self.education_levels.is_empty() {
            match job.education_required {
                Some(level) if self.education_levels.contains(&level) => {}
                _ => return false,
            }
        }
        if let Some(range) = &self.experience {
            if !range.contains(Self::job_experience(job), EXPERIENCE_CEILING) {
                return false;
            }
        }
        if let Some(range) = &self.salary {
            match Self::job_salary(job) {
                Some(salary) if range.contains(salary, SALARY_CEILING) => {}
                _ => return false,
            }
        }
        if !has_all_skills(&job.skills_required, &self.skills) {
            return false;
        }
        if let Some(freshness) = self.freshness {
            if job.created_at < freshness.cutoff(now) {
                return false;
            }
        }
        true
    }

    /// Appends ` AND ...` clauses to a query that already has a WHERE.
    pub fn push_predicates(&self, qb: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
        if self.active_only {
            qb.push(" AND is_active AND visibility = 'public'");
        }
        if let Some(kw) = needle(&self.keyword) {
            let pattern = like_pattern(&kw);
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR company_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR EXISTS (SELECT 1 FROM unnest(skills_required) AS s WHERE s ILIKE ")
                .push_bind(pattern)
                .push("))");
        }
        if let Some(loc) = needle(&self.location) {
            qb.push(" AND location ILIKE ").push_bind(like_pattern(&loc));
        }
        if !self.employment_types.is_empty() {
            let values: Vec<String> = self
                .employment_types
                .iter()
                .map(|t| t.as_str().to_string())
                .collect();
            qb.push(" AND employment_type = ANY(").push_bind(values).push(")");
        }
        if !self.work_modes.is_empty() {
            let values: Vec<String> = self.work_modes.iter().map(|m| m.as_str().to_string()).collect();
            qb.push(" AND work_mode = ANY(").push_bind(values).push(")");
        }
        if !self.education_levels.is_empty() {
            let values: Vec<String> = self
                .education_levels
                .iter()
                .map(|l| l.as_str().to_string())
                .collect();
            qb.push(" AND education_required = ANY(").push_bind(values).push(")");
        }
        if let Some(range) = &self.experience {
            range.push_sql(qb, "COALESCE(experience_min, 0)", EXPERIENCE_CEILING);
        }
        if let Some(range) = &self.salary {
            range.push_sql(qb, "COALESCE(salary_min, salary_max)", SALARY_CEILING);
        }
        if !self.skills.is_empty() {
            qb.push(" AND skills_required @> ").push_bind(self.skills.clone());
        }
        if let Some(freshness) = self.freshness {
            qb.push(" AND created_at >= ").push_bind(freshness.cutoff(now));
        }
    }
}

impl CandidateFilter {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(range) = &self.experience {
            range.validate("experience")?;
        }
        if let Some(range) = &self.salary {
            range.validate("salary")?;
        }
        Ok(())
    }

    /// Only candidates who finished onboarding are searchable.
    pub fn matches(&self, profile: &CandidateProfile, now: DateTime<Utc>) -> bool {
        if !profile.onboarding_completed {
            return false;
        }
        if let Some(kw) = needle(&self.keyword) {
            let hit = contains_ci(profile.headline.as_deref(), &kw)
                || contains_ci(profile.full_name.as_deref(), &kw)
                || profile.skills.iter().any(|s| s.to_lowercase().contains(&kw));
            if !hit {
                return false;
            }
        }
        if let Some(loc) = needle(&self.location) {
            if !contains_ci(profile.location.as_deref(), &loc) {
                return false;
            }
        }
        if !self.employment_types.is_empty() {
            match profile.preferred_job_type {
                Some(t) if self.employment_types.contains(&t) => {}
                _ => return false,
            }
        }
        if !self.education_levels.is_empty() {
            match profile.education_level {
                Some(level) if self.education_levels.contains(&level) => {}
                _ => return false,
            }
        }
        if let Some(range) = &self.experience {
            let years = profile.experience_years.unwrap_or(0) as i64;
            if !range.contains(years, EXPERIENCE_CEILING) {
                return false;
            }
        }
        if let Some(range) = &self.salary {
            match profile.expected_salary_min {
                Some(salary) if range.contains(salary, SALARY_CEILING) => {}
                _ => return false,
            }
        }
        if !has_all_skills(&profile.skills, &self.skills) {
            return false;
        }
        if let Some(freshness) = self.freshness {
            if profile.updated_at < freshness.cutoff(now) {
                return false;
            }
        }
        true
    }

    pub fn push_predicates(&self, qb: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
        qb.push(" AND onboarding_completed");
        if let Some(kw) = needle(&self.keyword) {
            let pattern = like_pattern(&kw);
            qb.push(" AND (headline ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR EXISTS (SELECT 1 FROM unnest(skills) AS s WHERE s ILIKE ")
                .push_bind(pattern)
                .push("))");
        }
        if let Some(loc) = needle(&self.location) {
            qb.push(" AND location ILIKE ").push_bind(like_pattern(&loc));
        }
        if !self.employment_types.is_empty() {
            let values: Vec<String> = self
                .employment_types
                .iter()
                .map(|t| t.as_str().to_string())
                .collect();
            qb.push(" AND preferred_job_type = ANY(").push_bind(values).push(")");
        }
        if !self.education_levels.is_empty() {
            let values: Vec<String> = self
                .education_levels
                .iter()
                .map(|l| l.as_str().to_string())
                .collect();
            qb.push(" AND education_level = ANY(").push_bind(values).push(")");
        }
        if let Some(range) = &self.experience {
            range.push_sql(qb, "COALESCE(experience_years, 0)", EXPERIENCE_CEILING);
        }
        if let Some(range) = &self.salary {
            range.push_sql(qb, "expected_salary_min", SALARY_CEILING);
        }
        if !self.skills.is_empty() {
            qb.push(" AND skills @> ").push_bind(self.skills.clone());
        }
        if let Some(freshness) = self.freshness {
            qb.push(" AND updated_at >= ").push_bind(freshness.cutoff(now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{candidate_fixture, job_fixture};

    fn five_jobs() -> Vec<Job> {
        vec![
            job_fixture("Backend Engineer", "Pune", EmploymentType::FullTime),
            job_fixture("Data Engineer", "Pune", EmploymentType::FullTime),
            job_fixture("SRE", "Pune, MH", EmploymentType::FullTime),
            job_fixture("Contract Dev", "Pune", EmploymentType::Contract),
            job_fixture("Frontend Engineer", "Mumbai", EmploymentType::FullTime),
        ]
    }

    #[test]
    fn test_location_and_type_facets_compose_with_and() {
        let jobs = five_jobs();
        let filter = JobFilter {
            location: Some("Pune".to_string()),
            employment_types: vec![EmploymentType::FullTime],
            ..Default::default()
        };
        let now = Utc::now();
        let hits: Vec<_> = jobs.iter().filter(|j| filter.matches(j, now)).collect();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|j| j.employment_type == EmploymentType::FullTime));
    }

    #[test]
    fn test_facet_application_order_does_not_matter() {
        let jobs = five_jobs();
        let now = Utc::now();
        let by_location = JobFilter {
            location: Some("pune".to_string()),
            ..Default::default()
        };
        let by_type = JobFilter {
            employment_types: vec![EmploymentType::FullTime],
            ..Default::default()
        };
        let location_first: Vec<_> = jobs
            .iter()
            .filter(|j| by_location.matches(j, now))
            .filter(|j| by_type.matches(j, now))
            .map(|j| j.id)
            .collect();
        let type_first: Vec<_> = jobs
            .iter()
            .filter(|j| by_type.matches(j, now))
            .filter(|j| by_location.matches(j, now))
            .map(|j| j.id)
            .collect();
        assert_eq!(location_first, type_first);
        assert_eq!(location_first.len(), 3);
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let now = Utc::now();
        assert!(five_jobs().iter().all(|j| JobFilter::default().matches(j, now)));
    }

    #[test]
    fn test_keyword_is_case_insensitive_over_title_company_and_skills() {
        let mut job = job_fixture("Platform Engineer", "Pune", EmploymentType::FullTime);
        job.skills_required = vec!["Kubernetes".to_string()];
        let now = Utc::now();
        for kw in ["platform", "ACME", "kuber"] {
            let filter = JobFilter {
                keyword: Some(kw.to_string()),
                ..Default::default()
            };
            assert!(filter.matches(&job, now), "keyword {kw} should match");
        }
        let miss = JobFilter {
            keyword: Some("golang".to_string()),
            ..Default::default()
        };
        assert!(!miss.matches(&job, now));
    }

    #[test]
    fn test_skills_facet_requires_every_token_case_sensitive() {
        let mut job = job_fixture("Engineer", "Pune", EmploymentType::FullTime);
        job.skills_required = vec!["Rust".to_string(), "SQL".to_string(), "Go".to_string()];
        let now = Utc::now();
        let both = JobFilter {
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            ..Default::default()
        };
        assert!(both.matches(&job, now));
        let lower = JobFilter {
            skills: vec!["rust".to_string()],
            ..Default::default()
        };
        assert!(!lower.matches(&job, now));
    }

    #[test]
    fn test_experience_max_at_ceiling_is_open_ended() {
        let range = NumericRange::new(Some(5), Some(EXPERIENCE_CEILING));
        assert!(range.contains(45, EXPERIENCE_CEILING));
        assert!(!range.contains(4, EXPERIENCE_CEILING));
        let bounded = NumericRange::new(None, Some(3));
        assert!(bounded.contains(0, EXPERIENCE_CEILING));
        assert!(!bounded.contains(4, EXPERIENCE_CEILING));
    }

    #[test]
    fn test_salary_facet_excludes_undisclosed_salary() {
        let mut job = job_fixture("Engineer", "Pune", EmploymentType::FullTime);
        job.salary_min = None;
        job.salary_max = None;
        let filter = JobFilter {
            salary: Some(NumericRange::new(Some(0), None)),
            ..Default::default()
        };
        assert!(!filter.matches(&job, Utc::now()));
    }

    #[test]
    fn test_freshness_window_on_profiles() {
        let now = Utc::now();
        let mut profile = candidate_fixture(&["Rust"]);
        profile.updated_at = now - Duration::days(20);
        let week = CandidateFilter {
            freshness: Some(Freshness::Last7Days),
            ..Default::default()
        };
        let month = CandidateFilter {
            freshness: Some(Freshness::Last30Days),
            ..Default::default()
        };
        assert!(!week.matches(&profile, now));
        assert!(month.matches(&profile, now));
    }

    #[test]
    fn test_incomplete_onboarding_is_not_searchable() {
        let mut profile = candidate_fixture(&["Rust"]);
        profile.onboarding_completed = false;
        assert!(!CandidateFilter::default().matches(&profile, Utc::now()));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let filter = JobFilter {
            salary: Some(NumericRange::new(Some(900), Some(100))),
            ..Default::default()
        };
        assert!(matches!(filter.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_push_predicates_binds_every_facet() {
        let filter = JobFilter {
            keyword: Some("rust".to_string()),
            location: Some("Pune".to_string()),
            employment_types: vec![EmploymentType::FullTime],
            experience: Some(NumericRange::new(Some(2), Some(5))),
            skills: vec!["Rust".to_string()],
            active_only: true,
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM jobs WHERE TRUE");
        filter.push_predicates(&mut qb, Utc::now());
        let sql = qb.sql();
        assert!(sql.contains("is_active AND visibility = 'public'"));
        assert!(sql.contains("title ILIKE $1"));
        assert!(sql.contains("location ILIKE $4"));
        assert!(sql.contains("employment_type = ANY($5)"));
        assert!(sql.contains("COALESCE(experience_min, 0) >= $6"));
        assert!(sql.contains("COALESCE(experience_min, 0) <= $7"));
        assert!(sql.contains("skills_required @> $8"));
    }
}
