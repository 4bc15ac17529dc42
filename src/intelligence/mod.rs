//! Clinical pathway drift analysis.
//!
//! Pathway clustering → decision entropy + guideline alignment → temporal
//! drift over trailing windows → outcome co-movement → obsolescence risk →
//! explainability trace and governance signal. Stateless: every call is a
//! pure function of its inputs and the engine configuration.

pub mod alignment;
pub mod engine;
pub mod entropy;
pub mod governance;
pub mod helpers;
pub mod messages;
pub mod obsolescence;
pub mod outcomes;
pub mod pathway;
pub mod reference;
pub mod temporal;
pub mod types;

pub use engine::{analyze_async, DefaultDriftEngine};
pub use reference::GuidelineCatalog;
pub use temporal::{detect_drift, DriftAssessment};
pub use types::{
    AnalysisError, AnalysisOutcome, AnalysisWarning, DriftEngine, Pathway, PathwayClusters,
    WindowPoint, WindowedDistribution,
};
