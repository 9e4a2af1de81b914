//! Supabase (PostgREST) result store.
//!
//! Talks to `{project}/rest/v1/analysis_results` over HTTP. The table is
//! expected to exist with a generated `id` column.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{BaseResultStore, StoreError, ANALYSIS_TABLE};
use crate::domains::analysis::models::{AnalysisRecord, InsightReport, NewAnalysisRecord};

pub struct SupabaseStore {
    client: reqwest::Client,
    table_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    url: &'a str,
    platform: &'a str,
    raw_text: &'a str,
    analysis_json: &'a InsightReport,
}

#[derive(Deserialize)]
struct InsertedRow {
    id: i64,
}

#[derive(Deserialize)]
struct SelectedRow {
    id: i64,
    url: String,
    #[serde(default)]
    platform: String,
    #[serde(default)]
    raw_text: String,
    analysis_json: InsightReport,
    #[serde(default)]
    created_at: Option<String>,
}

/// `timestamptz` columns come back with an offset, `timestamp` columns
/// without one; the latter are taken as UTC. Anything unreadable falls
/// back to now rather than failing the lookup.
fn parse_created_at(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return Utc::now();
    };

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return at.with_timezone(&Utc);
    }

    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => naive.and_utc(),
        Err(e) => {
            warn!(created_at = %raw, error = %e, "Unreadable created_at, using current time");
            Utc::now()
        }
    }
}

impl SupabaseStore {
    pub fn new(project_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Backend(Box::new(e)))?;

        Ok(Self {
            client,
            table_url: format!(
                "{}/rest/v1/{}",
                project_url.trim_end_matches('/'),
                ANALYSIS_TABLE
            ),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn rows<T: for<'de> Deserialize<'de>>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .request(builder)
            .send()
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::backend(format!("Supabase HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Corrupt(format!("Unexpected Supabase response: {}", e)))
    }
}

#[async_trait]
impl BaseResultStore for SupabaseStore {
    async fn save(&self, record: &NewAnalysisRecord) -> Result<i64, StoreError> {
        let row = InsertRow {
            url: &record.url,
            platform: &record.platform,
            raw_text: &record.raw_text,
            analysis_json: &record.analysis,
        };

        let inserted: Vec<InsertedRow> = self
            .rows(
                self.client
                    .post(&self.table_url)
                    .header("Prefer", "return=representation")
                    .json(&row),
            )
            .await?;

        let id = inserted
            .first()
            .map(|row| row.id)
            .ok_or_else(|| StoreError::Corrupt("insert returned no rows".into()))?;

        debug!(id, "Analysis stored in Supabase");
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<AnalysisRecord, StoreError> {
        let rows: Vec<SelectedRow> = self
            .rows(
                self.client
                    .get(&self.table_url)
                    .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())]),
            )
            .await?;

        let row = rows.into_iter().next().ok_or(StoreError::NotFound(id))?;

        Ok(AnalysisRecord {
            id: row.id,
            url: row.url,
            platform: row.platform,
            raw_text: row.raw_text,
            analysis: row.analysis_json,
            created_at: parse_created_at(row.created_at.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::analysis::models::{AnalysisRequest, InsightItem};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn report() -> InsightReport {
        InsightReport::new(vec![InsightItem::new("Too small", "high", "Roomy")], vec![])
    }

    #[tokio::test]
    async fn test_save_returns_generated_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/analysis_results"))
            .and(header("apikey", "service-key"))
            .and(header("prefer", "return=representation"))
            .and(body_partial_json(json!({
                "url": "https://example.com/dp/X",
                "platform": "amazon",
                "analysis_json": {"complaints": [{"insight": "Too small"}]}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 17}])))
            .expect(1)
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "service-key").unwrap();
        let record = NewAnalysisRecord::new(
            &AnalysisRequest::new("https://example.com/dp/X"),
            "text",
            report(),
        );

        assert_eq!(store.save(&record).await.unwrap(), 17);
    }

    #[tokio::test]
    async fn test_get_decodes_row() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/analysis_results"))
            .and(query_param("id", "eq.17"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 17,
                "url": "https://example.com/dp/X",
                "platform": "amazon",
                "raw_text": "text",
                "analysis_json": {"complaints": [{"insight": "Too small", "frequency": "high", "suggested_copy": "Roomy"}], "hooks": []},
                "created_at": "2025-01-01T12:00:00.123456+00:00"
            }])))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "service-key").unwrap();
        let record = store.get(17).await.unwrap();

        assert_eq!(record.id, 17);
        assert_eq!(record.analysis, report());
        assert_eq!(record.created_at.to_rfc3339(), "2025-01-01T12:00:00.123456+00:00");
    }

    #[tokio::test]
    async fn test_get_accepts_timestamp_without_zone() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/analysis_results"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 4,
                "url": "https://example.com/dp/X",
                "analysis_json": {"complaints": [], "hooks": []},
                "created_at": "2025-01-01T12:00:00.5"
            }])))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "service-key").unwrap();
        let record = store.get(4).await.unwrap();

        assert_eq!(record.id, 4);
        assert_eq!(record.created_at.to_rfc3339(), "2025-01-01T12:00:00.500+00:00");
    }

    #[test]
    fn test_unreadable_created_at_falls_back_to_now() {
        let before = Utc::now();
        assert!(parse_created_at(Some("yesterday-ish")) >= before);
        assert!(parse_created_at(None) >= before);
    }

    #[tokio::test]
    async fn test_empty_select_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/analysis_results"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "service-key").unwrap();
        assert!(matches!(store.get(5).await, Err(StoreError::NotFound(5))));
    }

    #[tokio::test]
    async fn test_http_error_is_backend_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/analysis_results"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "bad").unwrap();
        let record =
            NewAnalysisRecord::new(&AnalysisRequest::new("https://example.com"), "t", report());

        let err = store.save(&record).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(err.to_string().contains("Invalid API key"));
    }
}
