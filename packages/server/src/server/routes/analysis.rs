use axum::{
    extract::{Path, State},
    Json,
};

use crate::domains::analysis::{AnalysisRequest, AnalysisResponse};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// POST /analyze - scrape, analyze and (if configured) persist one URL
pub async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let outcome = state.pipeline.run(&request).await?;

    Ok(Json(AnalysisResponse::success(
        outcome.analysis_id(),
        outcome.report,
    )))
}

/// GET /results/{analysis_id} - a previously stored analysis
pub async fn get_result_handler(
    State(state): State<AppState>,
    Path(analysis_id): Path<i64>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let record = state.pipeline.lookup(analysis_id).await?;

    Ok(Json(AnalysisResponse::success(
        Some(record.id),
        record.analysis,
    )))
}
