pub mod baseline;
pub mod enums;
pub mod event;
pub mod guideline;
pub mod result;

pub use baseline::{PriorScores, TrendPoint};
pub use enums::*;
pub use event::ClinicalEvent;
pub use guideline::{CanonicalPathway, GuidelineReference};
pub use result::{DriftAnalysisResult, GuidelineObsolescenceRisk, PracticeDriftSignal};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
