//! Profile completion state machine: completion checklists, onboarding
//! routing and step-by-step profile saves.

pub mod completion;
pub mod flow;
pub mod handlers;
pub mod validation;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::{read_through, CacheKey, ReadCache};
use crate::models::{CandidateProfile, ChildKind, ChildRow};
use crate::onboarding::completion::{dashboard_report, CompletionReport, ProfileSnapshot};
use crate::store::{JobBoardStore, StoreResult};

/// Everything the dashboard renders for one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub profile: Option<CandidateProfile>,
    pub children: BTreeMap<&'static str, Vec<ChildRow>>,
    pub completion: CompletionReport,
}

/// Loads a candidate's profile and child collections through the read cache.
pub async fn load_profile_view(
    store: &dyn JobBoardStore,
    cache: &dyn ReadCache,
    ttl_secs: u64,
    user_id: uuid::Uuid,
) -> StoreResult<ProfileView> {
    let profile: Option<CandidateProfile> =
        read_through(cache, CacheKey::Profile(user_id), ttl_secs, || {
            store.get_profile_by_user(user_id)
        })
        .await?;

    let mut children = BTreeMap::new();
    if let Some(p) = &profile {
        for kind in ChildKind::ALL {
            let rows: Vec<ChildRow> =
                read_through(cache, CacheKey::Children(p.id, kind), ttl_secs, || {
                    store.list_children(p.id, kind)
                })
                .await?;
            children.insert(kind.as_str(), rows);
        }
    }

    let count = |kind: ChildKind| children.get(kind.as_str()).map_or(0, Vec::len);
    let snapshot = ProfileSnapshot {
        education_count: count(ChildKind::Education),
        language_count: count(ChildKind::Language),
        profile,
    };
    let completion = dashboard_report(&snapshot);
    Ok(ProfileView {
        profile: snapshot.profile,
        children,
        completion,
    })
}
