use serde::{Deserialize, Serialize};

use super::enums::Category;

/// Label sets of the guideline's canonical pathway, one per pipeline stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalPathway {
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub procedures: Vec<String>,
}

impl CanonicalPathway {
    pub fn labels(&self, category: Category) -> &[String] {
        match category {
            Category::Symptom => &self.symptoms,
            Category::Test => &self.tests,
            Category::Medication => &self.medications,
            Category::Procedure => &self.procedures,
            Category::Outcome => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        [&self.symptoms, &self.tests, &self.medications, &self.procedures]
            .iter()
            .all(|set| set.iter().all(|l| l.trim().is_empty()))
    }
}

/// A named reference guideline the observed pathways are compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelineReference {
    pub id: String,
    pub name: String,
    pub canonical_pathway: CanonicalPathway,
    /// Free-text clinical context (not used in scoring).
    #[serde(default)]
    pub context: String,
}
