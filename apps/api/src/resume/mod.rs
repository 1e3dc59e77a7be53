//! Resume ingestion: validate, store, extract, parse, merge, fan out.

pub mod extract;
pub mod fanout;
pub mod handlers;
pub mod merge;
pub mod pipeline;
pub mod upload;
