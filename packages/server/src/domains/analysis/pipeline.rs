//! Scrape → analyze → persist pipeline.
//!
//! ```text
//! Extracting ──none──▶ ExtractionFailed (400)
//!     │ text
//!     ▼
//! Analyzing  (never fails; degraded reports carry `error`)
//!     │ report
//!     ▼
//! Persisting ──▶ Stored(id) | Skipped | Failed   (never changes the outcome)
//!     │
//!     ▼
//! Completed { analysis_id, report }
//! ```
//!
//! Each stage runs as its own task so a panic inside an adapter surfaces as
//! [`PipelineError::Unclassified`] instead of tearing down the caller.
//! Nothing is retried.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use super::insights::InsightExtractor;
use super::models::{AnalysisRecord, AnalysisRequest, InsightReport, NewAnalysisRecord};
use super::store::{BaseResultStore, StoreError};
use crate::kernel::{BaseContentExtractor, ServerDeps};

pub const EXTRACTION_FAILED_MESSAGE: &str = "Failed to scrape content from URL";

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad or unreachable URL, navigation timeout, or a page with no text
    #[error("Failed to scrape content from URL")]
    ExtractionFailed,

    /// Anything the stages didn't handle themselves
    #[error("{0}")]
    Unclassified(String),
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Database not configured")]
    StoreUnavailable,

    #[error("Analysis not found")]
    NotFound,

    #[error("{0}")]
    Unclassified(String),
}

/// What happened to the finished analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    Stored(i64),
    /// No store configured
    Skipped,
    Failed(String),
}

impl PersistOutcome {
    pub fn analysis_id(&self) -> Option<i64> {
        match self {
            PersistOutcome::Stored(id) => Some(*id),
            PersistOutcome::Skipped | PersistOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: InsightReport,
    pub persist: PersistOutcome,
}

impl AnalysisOutcome {
    pub fn analysis_id(&self) -> Option<i64> {
        self.persist.analysis_id()
    }
}

#[derive(Clone)]
pub struct Pipeline {
    extractor: Arc<dyn BaseContentExtractor>,
    insights: Arc<InsightExtractor>,
    store: Option<Arc<dyn BaseResultStore>>,
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn BaseContentExtractor>,
        insights: Arc<InsightExtractor>,
        store: Option<Arc<dyn BaseResultStore>>,
    ) -> Self {
        Self {
            extractor,
            insights,
            store,
        }
    }

    pub fn from_deps(deps: &ServerDeps) -> Self {
        Self::new(
            deps.content_extractor.clone(),
            deps.insights.clone(),
            deps.result_store.clone(),
        )
    }

    /// Drop the store so nothing is persisted.
    pub fn without_store(mut self) -> Self {
        self.store = None;
        self
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Run one request through every stage.
    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, PipelineError> {
        info!(url = %request.url, platform = %request.platform, "Scraping URL");

        let extractor = self.extractor.clone();
        let url = request.url.clone();
        let raw_text = run_stage("extract", async move { extractor.extract(&url).await })
            .await?
            .ok_or(PipelineError::ExtractionFailed)?;

        info!(
            url = %request.url,
            chars = raw_text.chars().count(),
            strategy = self.insights.strategy_name(),
            "Analyzing content"
        );

        let insights = self.insights.clone();
        let text = Arc::new(raw_text);
        let analyze_text = text.clone();
        let report = run_stage("analyze", async move { insights.analyze(&analyze_text).await }).await?;

        if let Some(error) = &report.error {
            warn!(url = %request.url, error = %error, "Analysis degraded");
        }

        let persist = self.persist(request, &text, &report).await;

        info!(url = %request.url, persist = ?persist, "Analysis complete");

        Ok(AnalysisOutcome { report, persist })
    }

    /// Best-effort save. Failures are logged and reported, never raised.
    pub async fn persist(
        &self,
        request: &AnalysisRequest,
        raw_text: &str,
        report: &InsightReport,
    ) -> PersistOutcome {
        let Some(store) = self.store.clone() else {
            return PersistOutcome::Skipped;
        };

        let record = NewAnalysisRecord::new(request, raw_text, report.clone());
        let result = run_stage("persist", async move { store.save(&record).await }).await;

        match result {
            Ok(Ok(id)) => PersistOutcome::Stored(id),
            Ok(Err(e)) => {
                error!(url = %request.url, error = %e, "Database error, continuing without analysis id");
                PersistOutcome::Failed(e.to_string())
            }
            Err(e) => {
                error!(url = %request.url, error = %e, "Persist stage crashed, continuing without analysis id");
                PersistOutcome::Failed(e.to_string())
            }
        }
    }

    /// Fetch a previously stored analysis.
    pub async fn lookup(&self, analysis_id: i64) -> Result<AnalysisRecord, LookupError> {
        let store = self.store.as_ref().ok_or(LookupError::StoreUnavailable)?;

        store.get(analysis_id).await.map_err(|e| match e {
            StoreError::NotFound(_) => LookupError::NotFound,
            other => {
                error!(analysis_id, error = %other, "Result lookup failed");
                LookupError::Unclassified(other.to_string())
            }
        })
    }
}

/// Run a stage on its own task, turning a panic into `Unclassified`.
async fn run_stage<F, T>(stage: &'static str, future: F) -> Result<T, PipelineError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(future).await.map_err(|e| {
        let message = if e.is_panic() {
            panic_message(e.into_panic())
        } else {
            e.to_string()
        };
        error!(stage, error = %message, "Pipeline stage failed unexpectedly");
        PipelineError::Unclassified(message)
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "stage panicked".to_string()
    }
}
