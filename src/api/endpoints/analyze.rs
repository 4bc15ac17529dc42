//! Drift analysis endpoint.
//!
//! `POST /api/analyze` runs the engine on the posted batch. The engine
//! work happens on the blocking pool under the configured deadline.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{AnalyzeRequest, ApiContext};
use crate::intelligence::analyze_async;
use crate::intelligence::reference::validate_guideline;
use crate::models::DriftAnalysisResult;

pub async fn run(
    State(ctx): State<ApiContext>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<DriftAnalysisResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let AnalyzeRequest {
        events,
        guideline_id,
        guideline,
        baseline,
    } = request;

    // A malformed inline guideline is the caller's input; only an unknown id is a 404.
    let guideline = match (guideline, guideline_id) {
        (Some(inline), _) => {
            validate_guideline(&inline).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            inline
        }
        (None, Some(id)) => ctx.catalog.resolve(&id)?.clone(),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either guideline_id or guideline is required".into(),
            ))
        }
    };

    tracing::debug!(
        guideline = %guideline.id,
        events = events.len(),
        baseline = baseline.is_some(),
        "Analysis requested"
    );

    let result = analyze_async(
        ctx.engine.clone(),
        events,
        guideline,
        baseline,
        ctx.deadline,
    )
    .await?;

    Ok(Json(result))
}
