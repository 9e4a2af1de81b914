//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::analysis::Pipeline;
use crate::kernel::ServerDeps;
use crate::server::routes::{analyze_handler, get_result_handler, root_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(deps: &ServerDeps) -> Self {
        Self {
            pipeline: Arc::new(Pipeline::from_deps(deps)),
        }
    }
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps) -> Router {
    let state = AppState::new(&deps);

    // CORS configuration - any origin, the API carries no credentials
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/", get(root_handler))
        .route("/analyze", post(analyze_handler))
        .route("/results/{analysis_id}", get(get_result_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
