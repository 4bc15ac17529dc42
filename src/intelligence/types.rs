use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::models::{
    Category, ClinicalEvent, DriftAnalysisResult, GuidelineReference, Outcome, PriorScores,
};

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// One category-qualified, normalised label. Ordering is (category, label),
/// which is exactly the canonical sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Token {
    pub category: Category,
    pub label: String,
}

impl Token {
    pub fn new(category: Category, label: impl Into<String>) -> Self {
        Self {
            category,
            label: label.into(),
        }
    }

    /// `category:label`, the stable key used for hashing and identifiers.
    pub fn key(&self) -> String {
        format!("{}:{}", self.category.as_str(), self.label)
    }
}

// ---------------------------------------------------------------------------
// Pathway clusters
// ---------------------------------------------------------------------------

/// A cluster of events sharing a similar decision sequence.
#[derive(Debug, Clone, Serialize)]
pub struct Pathway {
    /// UUID v5 of the representative canonical sequence.
    pub id: Uuid,
    /// Tokens of the seeding event; later members are compared against these.
    pub tokens: BTreeSet<Token>,
    /// `Symptoms(...) → Test → Medication → Procedure → Outcome`
    pub display: String,
    pub support: usize,
    pub event_ids: Vec<String>,
    /// Input position of the seeding event (ranking tie-break).
    pub first_index: usize,
}

/// Ranked clusters: the first `dominant_count` entries are dominant.
#[derive(Debug, Clone, Serialize)]
pub struct PathwayClusters {
    pub ranked: Vec<Pathway>,
    pub dominant_count: usize,
    pub alternative_display_cap: usize,
}

impl PathwayClusters {
    pub fn dominant(&self) -> &[Pathway] {
        &self.ranked[..self.dominant_count]
    }

    /// All non-dominant clusters, uncapped.
    pub fn alternatives(&self) -> &[Pathway] {
        &self.ranked[self.dominant_count..]
    }

    pub fn dominant_display(&self) -> Vec<String> {
        self.dominant().iter().map(|p| p.display.clone()).collect()
    }

    /// Alternative pathways truncated to the display cap.
    pub fn alternative_display(&self) -> Vec<String> {
        self.alternatives()
            .iter()
            .take(self.alternative_display_cap)
            .map(|p| p.display.clone())
            .collect()
    }

    pub fn total_support(&self) -> usize {
        self.ranked.iter().map(|p| p.support).sum()
    }

    pub fn alternative_support(&self) -> usize {
        self.alternatives().iter().map(|p| p.support).sum()
    }
}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Per-window view of the batch: the same events, a later cutoff.
#[derive(Debug, Clone, Serialize)]
pub struct WindowedDistribution {
    pub window_days: u32,
    pub cutoff: DateTime<Utc>,
    pub event_count: usize,
    /// Pathway display form → support, in rank order.
    pub pathway_frequencies: Vec<(String, usize)>,
    pub outcome_frequencies: BTreeMap<Outcome, usize>,
    pub mean_alignment: f64,
    pub entropy: f64,
}

impl WindowedDistribution {
    pub fn point(&self) -> WindowPoint {
        WindowPoint {
            window_days: self.window_days,
            alignment: self.mean_alignment,
            entropy: self.entropy,
        }
    }
}

/// The two figures the drift detector reads from a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowPoint {
    pub window_days: u32,
    pub alignment: f64,
    pub entropy: f64,
}

// ---------------------------------------------------------------------------
// Warnings & outcome
// ---------------------------------------------------------------------------

/// Non-fatal conditions. The result is still produced, with degenerate
/// fields where the data cannot support more.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnalysisWarning {
    /// The whole batch is too small for meaningful clustering.
    InsufficientData { event_count: usize },
    /// A lookback window holds too few events for a stable estimate.
    SparseWindow { window_days: u32, event_count: usize },
}

/// Full working detail of one run, for in-process callers.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub result: DriftAnalysisResult,
    pub warnings: Vec<AnalysisWarning>,
    pub pathways: PathwayClusters,
    /// Longest window first.
    pub windows: Vec<WindowedDistribution>,
    /// Similarity of every ranked pathway to the guideline, in rank order.
    pub pathway_alignment: Vec<(Uuid, f64)>,
    /// Latest event timestamp; windows trail back from here.
    pub reference_time: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AnalysisError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Guideline could not be resolved: {0}")]
    GuidelineResolution(String),

    #[error("Reference data load failed ({0}): {1}")]
    ReferenceDataLoad(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    ReferenceDataParse(String, String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Analysis exceeded the {0} ms deadline")]
    DeadlineExceeded(u128),

    #[error("Analysis task failed: {0}")]
    TaskFailed(String),
}

// ---------------------------------------------------------------------------
// DriftEngine trait
// ---------------------------------------------------------------------------

/// The drift analysis engine. Implementations hold configuration only;
/// every call is independent.
pub trait DriftEngine {
    /// Analyse an event batch against a reference guideline.
    fn analyze(
        &self,
        events: &[ClinicalEvent],
        guideline: &GuidelineReference,
        baseline: Option<&PriorScores>,
    ) -> Result<DriftAnalysisResult, AnalysisError>;

    /// Same as `analyze`, keeping warnings, clusters and windows.
    fn analyze_detailed(
        &self,
        events: &[ClinicalEvent],
        guideline: &GuidelineReference,
        baseline: Option<&PriorScores>,
    ) -> Result<AnalysisOutcome, AnalysisError>;
}
