use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Category, Outcome};

/// One recorded clinical decision episode, as supplied by the caller.
/// The engine only ever reads events.
///
/// Deserialization accepts the dashboard's camelCase spellings too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "patientId")]
    pub patient_id: String,
    pub department: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub procedures: Vec<String>,
    pub outcome: Outcome,
    #[serde(alias = "guidelineFollowed", default)]
    pub guideline_followed: String,
}

impl ClinicalEvent {
    /// Labels recorded for a pipeline stage. `Outcome` has no label set.
    pub fn labels(&self, category: Category) -> &[String] {
        match category {
            Category::Symptom => &self.symptoms,
            Category::Test => &self.tests,
            Category::Medication => &self.medications,
            Category::Procedure => &self.procedures,
            Category::Outcome => &[],
        }
    }

    /// Total number of non-blank labels across all stages.
    pub fn label_count(&self) -> usize {
        [&self.symptoms, &self.tests, &self.medications, &self.procedures]
            .iter()
            .flat_map(|set| set.iter())
            .filter(|l| !l.trim().is_empty())
            .count()
    }
}
