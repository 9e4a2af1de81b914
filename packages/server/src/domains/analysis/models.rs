//! Analysis data model: requests, insight reports and persisted records.

use chrono::{DateTime, Utc};
use openai_client::truncate_chars;
use serde::{Deserialize, Deserializer, Serialize};

/// Characters of scraped text forwarded to the model.
pub const MAX_MODEL_INPUT_CHARS: usize = 100_000;

/// Characters of scraped text kept in the result store.
pub const MAX_STORED_TEXT_CHARS: usize = 10_000;

pub const DEFAULT_PLATFORM: &str = "amazon";

fn default_platform() -> String {
    DEFAULT_PLATFORM.to_string()
}

/// Body of `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub url: String,
    #[serde(default = "default_platform")]
    pub platform: String,
}

impl AnalysisRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            platform: default_platform(),
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }
}

/// One complaint or hook.
///
/// `frequency` is nominally "high", "medium" or "low" but models don't
/// always comply, so it is kept as the model wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightItem {
    pub insight: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub frequency: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggested_copy: String,
}

/// Models emit `null` for fields they have nothing to say about.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl InsightItem {
    pub fn new(
        insight: impl Into<String>,
        frequency: impl Into<String>,
        suggested_copy: impl Into<String>,
    ) -> Self {
        Self {
            insight: insight.into(),
            frequency: frequency.into(),
            suggested_copy: suggested_copy.into(),
        }
    }
}

/// Complaints and hooks extracted from one page.
///
/// A report with `error` set is a degraded result: the lists are empty and
/// the message says why analysis failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub complaints: Vec<InsightItem>,
    pub hooks: Vec<InsightItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InsightReport {
    pub fn new(complaints: Vec<InsightItem>, hooks: Vec<InsightItem>) -> Self {
        Self {
            complaints,
            hooks,
            error: None,
        }
    }

    /// Empty report carrying the reason analysis failed.
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            complaints: Vec::new(),
            hooks: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// A record about to be persisted; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysisRecord {
    pub url: String,
    pub platform: String,
    pub raw_text: String,
    pub analysis: InsightReport,
}

impl NewAnalysisRecord {
    /// Keeps only the first [`MAX_STORED_TEXT_CHARS`] characters of `raw_text`.
    pub fn new(request: &AnalysisRequest, raw_text: &str, analysis: InsightReport) -> Self {
        Self {
            url: request.url.clone(),
            platform: request.platform.clone(),
            raw_text: truncate_chars(raw_text, MAX_STORED_TEXT_CHARS).to_string(),
            analysis,
        }
    }
}

/// A persisted analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub url: String,
    pub platform: String,
    pub raw_text: String,
    pub analysis: InsightReport,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn from_new(id: i64, record: NewAnalysisRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            url: record.url,
            platform: record.platform,
            raw_text: record.raw_text,
            analysis: record.analysis,
            created_at,
        }
    }
}

/// Response envelope shared by `/analyze`, `/results/{id}` and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: String,
    pub analysis_id: Option<i64>,
    pub data: InsightReport,
}

impl AnalysisResponse {
    pub fn success(analysis_id: Option<i64>, data: InsightReport) -> Self {
        Self {
            status: "success".to_string(),
            analysis_id,
            data,
        }
    }
}
