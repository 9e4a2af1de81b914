//! Analysis domain: turn a product page into complaints and hooks.

pub mod insights;
pub mod models;
pub mod pipeline;
pub mod sanitize;
pub mod store;

pub use insights::{InsightExtractor, InsightStrategy, MockInsights, ModelInsights};
pub use models::{
    AnalysisRecord, AnalysisRequest, AnalysisResponse, InsightItem, InsightReport,
    NewAnalysisRecord,
};
pub use pipeline::{AnalysisOutcome, LookupError, PersistOutcome, Pipeline, PipelineError};
pub use sanitize::{parse_report, sanitize_response, ParseError};
pub use store::{BaseResultStore, StoreError};
