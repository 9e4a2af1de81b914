use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub status: String,
    pub message: String,
}

/// Liveness check at `/`
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok".to_string(),
        message: "The Pain Hunter is ready to hunt.".to_string(),
    })
}
