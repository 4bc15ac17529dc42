//! Guideline catalog endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::CanonicalPathway;

#[derive(Serialize)]
pub struct GuidelineSummary {
    pub id: String,
    pub name: String,
    pub canonical_pathway: CanonicalPathway,
}

/// `GET /api/guidelines`: reference guidelines the engine can resolve by id.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<GuidelineSummary>>, ApiError> {
    let guidelines = ctx
        .catalog
        .list()
        .iter()
        .map(|g| GuidelineSummary {
            id: g.id.clone(),
            name: g.name.clone(),
            canonical_pathway: g.canonical_pathway.clone(),
        })
        .collect();

    Ok(Json(guidelines))
}
