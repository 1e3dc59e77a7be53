//! Additive fan-out of parsed resume sections into child rows.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    AccomplishmentEntry, ChildEntry, ChildKind, EducationEntry, EmploymentEntry, InternshipEntry,
    LanguageEntry, ProjectEntry,
};
use crate::parser_client::ParsedResume;
use crate::store::JobBoardStore;

const DATE_FIELDS: [&str; 3] = ["start_date", "end_date", "issued_on"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    pub attempted: usize,
    pub saved: usize,
    pub failed: usize,
    /// Parser elements too malformed to become a row.
    pub skipped: usize,
    /// Collections that received at least one insert attempt.
    pub touched: BTreeSet<ChildKind>,
}

/// Decodes one parser element, dropping nulls. Unparseable dates are
/// discarded rather than losing the whole element.
fn decode_element<T: DeserializeOwned>(value: &Value) -> Option<T> {
    let mut object = value.as_object()?.clone();
    object.retain(|_, v| !v.is_null());
    if let Ok(entry) = serde_json::from_value(Value::Object(object.clone())) {
        return Some(entry);
    }
    for field in DATE_FIELDS {
        object.remove(field);
    }
    serde_json::from_value(Value::Object(object)).ok()
}

fn decode_language(value: &Value) -> Option<LanguageEntry> {
    match value {
        Value::String(name) if !name.trim().is_empty() => Some(LanguageEntry {
            language: name.trim().to_string(),
            proficiency: None,
        }),
        other => decode_element(other),
    }
}

/// Certifications arrive without a kind.
fn decode_accomplishment(value: &Value) -> Option<AccomplishmentEntry> {
    let mut value = value.clone();
    if let Some(object) = value.as_object_mut() {
        if object.get("kind").map_or(true, Value::is_null) {
            object.insert("kind".to_string(), Value::String("certification".to_string()));
        }
    }
    decode_element(&value)
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Every usable element of every array section, plus a count of skipped ones.
pub fn collect_child_entries(parsed: &ParsedResume) -> (Vec<ChildEntry>, usize) {
    let mut entries = Vec::new();
    let mut skipped = 0;
    let mut keep = |entry: Option<ChildEntry>| match entry {
        Some(e) => entries.push(e),
        None => skipped += 1,
    };

    for v in &parsed.education {
        keep(
            decode_element::<EducationEntry>(v)
                .filter(|e| e.degree.is_some() || e.institution.is_some())
                .map(ChildEntry::Education),
        );
    }
    for v in &parsed.employment {
        keep(
            decode_element::<EmploymentEntry>(v)
                .filter(|e| !blank(&e.company_name))
                .map(ChildEntry::Employment),
        );
    }
    for v in &parsed.internships {
        keep(
            decode_element::<InternshipEntry>(v)
                .filter(|e| !blank(&e.company_name))
                .map(ChildEntry::Internship),
        );
    }
    for v in &parsed.projects {
        keep(
            decode_element::<ProjectEntry>(v)
                .filter(|e| !blank(&e.title))
                .map(ChildEntry::Project),
        );
    }
    for v in &parsed.languages {
        keep(
            decode_language(v)
                .filter(|e| !blank(&e.language))
                .map(ChildEntry::Language),
        );
    }
    for v in &parsed.accomplishments {
        keep(
            decode_accomplishment(v)
                .filter(|e| !blank(&e.title))
                .map(ChildEntry::Accomplishment),
        );
    }
    (entries, skipped)
}

/// Inserts each entry as a new row, concurrently. One failed insert never
/// blocks or undoes the others; the call returns after all have settled.
pub async fn fan_out_children(
    store: Arc<dyn JobBoardStore>,
    candidate_id: Uuid,
    entries: Vec<ChildEntry>,
) -> FanOutReport {
    let mut report = FanOutReport {
        attempted: entries.len(),
        ..Default::default()
    };

    let mut tasks = JoinSet::new();
    for entry in entries {
        report.touched.insert(entry.kind());
        let store = Arc::clone(&store);
        tasks.spawn(async move {
            let kind = entry.kind();
            (kind, store.insert_child(candidate_id, &entry).await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(_))) => report.saved += 1,
            Ok((kind, Err(e))) => {
                warn!("Saving {} entry for candidate {candidate_id} failed: {e}", kind.as_str());
                report.failed += 1;
            }
            Err(e) => {
                warn!("Child save task for candidate {candidate_id} aborted: {e}");
                report.failed += 1;
            }
        }
    }

    info!(
        "Fan-out for candidate {candidate_id}: {}/{} saved",
        report.saved, report.attempted
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccomplishmentKind;
    use crate::testing::MemoryStore;
    use serde_json::json;

    fn parsed() -> ParsedResume {
        serde_json::from_value(json!({
            "education": [{ "degree": "B.E.", "institution": "COEP", "start_year": 2014 }, {}],
            "work_history": [
                { "company": "Acme", "title": "Engineer", "start_date": "Jan 2020" },
                { "company_name": "Globex", "start_date": "2018-06-01", "end_date": null },
                "freelance"
            ],
            "projects": [{ "name": "hireboard", "technologies": ["Rust"] }],
            "languages": ["English", { "language": "Marathi", "proficiency": "native" }],
            "certifications": [{ "title": "CKA", "issuer": "CNCF" }]
        }))
        .unwrap()
    }

    #[test]
    fn test_collects_usable_elements_and_counts_the_rest() {
        let (entries, skipped) = collect_child_entries(&parsed());
        assert_eq!(entries.len(), 7);
        assert_eq!(skipped, 2);

        let acme = entries
            .iter()
            .find_map(|e| match e {
                ChildEntry::Employment(job) if job.company_name == "Acme" => Some(job.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(acme.designation.as_deref(), Some("Engineer"));
        assert!(acme.start_date.is_none());

        assert!(entries.iter().any(|e| matches!(
            e,
            ChildEntry::Accomplishment(a) if a.kind == AccomplishmentKind::Certification
        )));
        assert!(entries.iter().any(|e| matches!(
            e,
            ChildEntry::Language(l) if l.language == "English" && l.proficiency.is_none()
        )));
    }

    #[tokio::test]
    async fn test_one_failed_insert_does_not_block_the_rest() {
        let store = Arc::new(MemoryStore::default());
        store.fail_child_inserts(ChildKind::Project);
        let candidate_id = Uuid::new_v4();
        let (entries, _) = collect_child_entries(&parsed());

        let report = fan_out_children(store.clone(), candidate_id, entries).await;
        assert_eq!(report.attempted, 7);
        assert_eq!(report.failed, 1);
        assert_eq!(report.saved, 6);
        assert!(report.touched.contains(&ChildKind::Project));

        let rows = store.children_of(candidate_id);
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.entry.kind() != ChildKind::Project));
    }

    #[tokio::test]
    async fn test_fan_out_is_additive() {
        let store = Arc::new(MemoryStore::default());
        let candidate_id = Uuid::new_v4();
        for _ in 0..2 {
            let (entries, _) = collect_child_entries(&parsed());
            fan_out_children(store.clone(), candidate_id, entries).await;
        }
        assert_eq!(store.children_of(candidate_id).len(), 14);
    }
}
