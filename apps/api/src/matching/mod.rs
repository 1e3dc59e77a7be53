//! Job and candidate discovery: facet filters, match scoring, ranked
//! search with pagination, recommendations and bulk shortlisting.

pub mod bulk;
pub mod filters;
pub mod handlers;
pub mod scoring;
pub mod search;
