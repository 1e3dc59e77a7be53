//! Non-destructive merge of parser output into a candidate profile.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::CandidateProfile;
use crate::onboarding::validation::{validate_email, validate_mobile};
use crate::parser_client::ParsedResume;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub updated_fields: Vec<&'static str>,
    pub skills_added: usize,
}

impl MergeSummary {
    pub fn is_empty(&self) -> bool {
        self.updated_fields.is_empty() && self.skills_added == 0
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Overwrites `field` only with a non-empty incoming value. Returns whether
/// the stored value changed.
fn coalesce(field: &mut Option<String>, incoming: Option<String>) -> bool {
    match incoming {
        Some(value) if field.as_deref() != Some(value.as_str()) => {
            *field = Some(value);
            true
        }
        _ => false,
    }
}

/// Case-insensitive union; existing entries keep their order and spelling.
pub fn merge_skills(existing: &mut Vec<String>, incoming: &[String]) -> usize {
    let mut seen: HashSet<String> = existing.iter().map(|s| s.trim().to_lowercase()).collect();
    let before = existing.len();
    for skill in incoming {
        let skill = skill.trim();
        if !skill.is_empty() && seen.insert(skill.to_lowercase()) {
            existing.push(skill.to_string());
        }
    }
    existing.len() - before
}

/// Applies every field the parser recovered. Absent or blank values never
/// clear what the candidate entered.
pub fn merge_into_profile(profile: &mut CandidateProfile, parsed: &ParsedResume) -> MergeSummary {
    let mut summary = MergeSummary::default();
    let mut track = |name: &'static str, changed: bool| {
        if changed {
            summary.updated_fields.push(name);
        }
    };

    track("full_name", coalesce(&mut profile.full_name, non_blank(&parsed.full_name)));
    track(
        "email",
        coalesce(
            &mut profile.email,
            non_blank(&parsed.email).and_then(|e| validate_email(&e).ok()),
        ),
    );
    track(
        "mobile",
        coalesce(
            &mut profile.mobile,
            non_blank(&parsed.mobile).and_then(|m| validate_mobile(&m).ok()),
        ),
    );
    track("headline", coalesce(&mut profile.headline, non_blank(&parsed.headline)));
    track("location", coalesce(&mut profile.location, non_blank(&parsed.location)));
    track("summary", coalesce(&mut profile.summary, non_blank(&parsed.summary)));
    if let Some(years) = parsed.experience_years {
        let changed = profile.experience_years != Some(years);
        profile.experience_years = Some(years);
        track("experience_years", changed);
    }

    summary.skills_added = merge_skills(&mut profile.skills, &parsed.skills);
    summary
}
