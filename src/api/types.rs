//! Shared types for the API layer.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::intelligence::{DefaultDriftEngine, GuidelineCatalog};
use crate::models::{ClinicalEvent, GuidelineReference, PriorScores};

// ═══════════════════════════════════════════════════════════
// API context: shared state for the analysis router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub engine: Arc<DefaultDriftEngine>,
    pub catalog: Arc<GuidelineCatalog>,
    /// Per-request analysis deadline. `None` waits indefinitely.
    pub deadline: Option<Duration>,
}

impl ApiContext {
    pub fn new(
        engine: DefaultDriftEngine,
        catalog: GuidelineCatalog,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            catalog: Arc::new(catalog),
            deadline,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Request bodies
// ═══════════════════════════════════════════════════════════

/// `POST /api/analyze` body. The guideline is named by id from the catalog
/// or supplied inline; an inline guideline wins when both are present.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub events: Vec<ClinicalEvent>,
    #[serde(default, alias = "guidelineId")]
    pub guideline_id: Option<String>,
    #[serde(default)]
    pub guideline: Option<GuidelineReference>,
    #[serde(default)]
    pub baseline: Option<PriorScores>,
}
