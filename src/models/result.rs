use serde::{Deserialize, Serialize};

use super::enums::{DriftMagnitude, DriftType, RecommendationType, RiskLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelineObsolescenceRisk {
    pub risk_detected: bool,
    pub trend_duration: String,
    pub confidence_level: String,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeDriftSignal {
    pub summary: String,
    pub affected_departments: Vec<String>,
    pub risk_level: RiskLevel,
    pub recommendation_type: RecommendationType,
}

/// The engine's only output. Field names and nesting are the JSON contract
/// consumed by the dashboard and must stay as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftAnalysisResult {
    pub dominant_pathways: Vec<String>,
    pub alternative_pathways: Vec<String>,
    pub guideline_alignment_score: f64,
    pub alignment_trend: String,
    pub drift_detected: bool,
    pub drift_type: DriftType,
    pub drift_magnitude: DriftMagnitude,
    pub time_horizon: String,
    pub outcome_shift_detected: bool,
    pub guideline_obsolescence_risk: GuidelineObsolescenceRisk,
    pub decision_entropy_score: f64,
    pub entropy_trend: String,
    pub explainability_trace: Vec<String>,
    pub practice_drift_signal: PracticeDriftSignal,
}
