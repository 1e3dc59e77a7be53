use std::sync::Arc;

use crate::cache::ReadCache;
use crate::config::Config;
use crate::matching::scoring::MatchScorer;
use crate::parser_client::ResumeParser;
use crate::resume::pipeline::ResumePipeline;
use crate::session::AuthService;
use crate::storage::BlobStorage;
use crate::store::JobBoardStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every collaborator sits behind a trait object so tests can swap in the
/// in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobBoardStore>,
    pub storage: Arc<dyn BlobStorage>,
    pub cache: Arc<dyn ReadCache>,
    pub auth: Arc<dyn AuthService>,
    /// Pluggable match scorer. Default: `OverlapMatchScorer`.
    pub scorer: Arc<dyn MatchScorer>,
    pub pipeline: Arc<ResumePipeline>,
    pub config: Config,
}

impl AppState {
    /// Wires the resume pipeline to the same collaborators the handlers use.
    /// The parser is only reachable through the pipeline.
    pub fn new(
        config: Config,
        store: Arc<dyn JobBoardStore>,
        storage: Arc<dyn BlobStorage>,
        cache: Arc<dyn ReadCache>,
        parser: Arc<dyn ResumeParser>,
        auth: Arc<dyn AuthService>,
        scorer: Arc<dyn MatchScorer>,
    ) -> Self {
        let pipeline = Arc::new(ResumePipeline::new(
            Arc::clone(&store),
            Arc::clone(&storage),
            parser,
            Arc::clone(&cache),
        ));
        Self {
            store,
            storage,
            cache,
            auth,
            scorer,
            pipeline,
            config,
        }
    }
}
