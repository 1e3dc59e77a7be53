//! Match scoring: pluggable, trait-based scorer that measures a candidate
//! profile against a job posting.
//!
//! Default: `OverlapMatchScorer` (pure-Rust, deterministic, fully testable).
//! `AppState` holds an `Arc<dyn MatchScorer>`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{CandidateProfile, Job};

/// Scores strictly above this are presented as a good match.
pub const GOOD_MATCH_THRESHOLD: u32 = 50;

const SKILL_POINTS: u32 = 10;
const EXPERIENCE_POINTS: u32 = 20;
const LOCATION_POINTS: u32 = 15;
const SALARY_POINTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchClass {
    Good,
    Partial,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub score: u32,
    pub class: MatchClass,
    /// Job skills the candidate already lists, in the job's spelling.
    pub matched_skills: Vec<String>,
}

impl MatchScore {
    pub fn zero() -> Self {
        Self::from_parts(0, Vec::new())
    }

    fn from_parts(score: u32, matched_skills: Vec<String>) -> Self {
        let class = if score > GOOD_MATCH_THRESHOLD {
            MatchClass::Good
        } else if score > 0 {
            MatchClass::Partial
        } else {
            MatchClass::None
        };
        Self {
            score,
            class,
            matched_skills,
        }
    }

    pub fn is_good_match(&self) -> bool {
        self.score > GOOD_MATCH_THRESHOLD
    }
}

/// Implement this to swap scoring backends without touching callers.
pub trait MatchScorer: Send + Sync {
    /// Non-negative fit of `profile` for `job`; zero without a profile.
    fn score(&self, profile: Option<&CandidateProfile>, job: &Job) -> MatchScore;
}

/// Additive overlap scorer.
///
/// * 10 per job skill the candidate lists (case-insensitive)
/// * 20 when the candidate's years fall inside the job's experience range
/// * 15 when either location contains the other (case-insensitive)
/// * 10 when the expected salary is at or under the job's ceiling
pub struct OverlapMatchScorer;

impl MatchScorer for OverlapMatchScorer {
    fn score(&self, profile: Option<&CandidateProfile>, job: &Job) -> MatchScore {
        let Some(profile) = profile else {
            return MatchScore::zero();
        };

        let candidate_skills: HashSet<String> = profile
            .skills
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        let matched_skills: Vec<String> = job
            .skills_required
            .iter()
            .filter(|s| candidate_skills.contains(&s.trim().to_lowercase()))
            .cloned()
            .collect();

        let mut score = matched_skills.len() as u32 * SKILL_POINTS;

        if let Some(years) = profile.experience_years {
            let min = job.experience_min.unwrap_or(0);
            if years >= min && job.experience_max.map_or(true, |max| years <= max) {
                score += EXPERIENCE_POINTS;
            }
        }

        if let (Some(theirs), Some(ours)) = (job.location.as_deref(), profile.location.as_deref()) {
            let (theirs, ours) = (theirs.trim().to_lowercase(), ours.trim().to_lowercase());
            if !theirs.is_empty() && !ours.is_empty() && (theirs.contains(&ours) || ours.contains(&theirs))
            {
                score += LOCATION_POINTS;
            }
        }

        if let (Some(expected), Some(ceiling)) = (profile.expected_salary_min, job.salary_max) {
            if expected <= ceiling {
                score += SALARY_POINTS;
            }
        }

        MatchScore::from_parts(score, matched_skills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmploymentType;
    use crate::testing::{candidate_fixture, job_fixture};

    fn rust_job() -> Job {
        let mut job = job_fixture("Backend Engineer", "Pune", EmploymentType::FullTime);
        job.skills_required = vec!["Rust".to_string(), "SQL".to_string(), "Kafka".to_string()];
        job.experience_min = Some(2);
        job.experience_max = Some(6);
        job.salary_max = Some(2_500_000);
        job
    }

    #[test]
    fn test_no_profile_scores_zero() {
        let score = OverlapMatchScorer.score(None, &rust_job());
        assert_eq!(score.score, 0);
        assert_eq!(score.class, MatchClass::None);
    }

    #[test]
    fn test_empty_profile_scores_zero() {
        let mut profile = candidate_fixture(&[]);
        profile.location = None;
        profile.experience_years = None;
        profile.expected_salary_min = None;
        assert_eq!(OverlapMatchScorer.score(Some(&profile), &rust_job()).score, 0);
    }

    #[test]
    fn test_score_is_monotonic_in_skill_overlap() {
        let job = rust_job();
        let mut previous = 0;
        for skills in [vec![], vec!["rust"], vec!["rust", "sql"], vec!["rust", "sql", "kafka"]] {
            let profile = candidate_fixture(&skills);
            let score = OverlapMatchScorer.score(Some(&profile), &job).score;
            assert!(score >= previous, "{score} < {previous} for {skills:?}");
            previous = score;
        }
    }

    #[test]
    fn test_matched_skills_use_job_spelling() {
        let profile = candidate_fixture(&["rust", "kafka"]);
        let score = OverlapMatchScorer.score(Some(&profile), &rust_job());
        assert_eq!(score.matched_skills, vec!["Rust".to_string(), "Kafka".to_string()]);
    }

    #[test]
    fn test_full_fit_is_a_good_match() {
        let mut profile = candidate_fixture(&["Rust", "SQL", "Kafka"]);
        profile.experience_years = Some(4);
        profile.location = Some("pune".to_string());
        profile.expected_salary_min = Some(1_800_000);
        let score = OverlapMatchScorer.score(Some(&profile), &rust_job());
        assert_eq!(score.score, 30 + 20 + 15 + 10);
        assert!(score.is_good_match());
        assert_eq!(score.class, MatchClass::Good);
    }

    #[test]
    fn test_threshold_itself_is_not_good() {
        let score = MatchScore::from_parts(GOOD_MATCH_THRESHOLD, vec![]);
        assert!(!score.is_good_match());
        assert_eq!(score.class, MatchClass::Partial);
    }

    #[test]
    fn test_experience_outside_range_earns_nothing() {
        let mut profile = candidate_fixture(&[]);
        profile.location = None;
        profile.expected_salary_min = None;
        profile.experience_years = Some(10);
        assert_eq!(OverlapMatchScorer.score(Some(&profile), &rust_job()).score, 0);
    }
}
