//! Test harness for driving the HTTP API in-process.
//!
//! Requests go straight into the axum router via `tower::ServiceExt::oneshot`,
//! so no port is bound. The default harness wires mock extractors and the
//! mock insight strategy over an in-memory SQLite store.

use anyhow::{Context, Result};
use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::Router;
use pain_hunter_core::domains::analysis::store::{BaseResultStore, SqliteStore};
use pain_hunter_core::kernel::TestDependencies;
use pain_hunter_core::server::build_app;
use serde_json::Value;
use std::sync::Arc;
use test_context::AsyncTestContext;
use tower::ServiceExt;

pub struct TestHarness {
    pub app: Router,
    pub store: Option<Arc<dyn BaseResultStore>>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        // In-memory database goes away with the pool
    }
}

impl TestHarness {
    /// Mock dependencies over a fresh in-memory SQLite store.
    pub async fn new() -> Result<Self> {
        init_tracing();

        let store: Arc<dyn BaseResultStore> = Arc::new(
            SqliteStore::in_memory()
                .await
                .context("Failed to create SQLite store")?,
        );

        Ok(Self::with_deps(TestDependencies::new().store(store)))
    }

    /// Harness over caller-supplied dependencies.
    pub fn with_deps(test_deps: TestDependencies) -> Self {
        init_tracing();

        let store = test_deps.store.clone();
        Self {
            app: build_app(test_deps.into_deps()),
            store,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().method(Method::GET).uri(uri).body(Body::empty()))
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
        )
        .await
    }

    async fn send(&self, request: axum::http::Result<Request<Body>>) -> (StatusCode, Value) {
        let request = request.expect("Failed to build request");
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, body)
    }
}

/// Respect RUST_LOG in tests: `RUST_LOG=debug cargo test -- --nocapture`
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
