// The Pain Hunter - API Core
//
// Scrapes a product page, asks a model for the recurring complaints and
// emotional hooks in it, and optionally persists the result.
//
// Infrastructure (extractors, model client, dependency wiring) lives in
// kernel/; the pipeline and its data model live in domains/analysis/.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
