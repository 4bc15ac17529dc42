use std::path::Path;

use crate::models::{CanonicalPathway, GuidelineReference};

use super::types::AnalysisError;

pub const GUIDELINES_FILE: &str = "guidelines.json";

/// Reference guidelines available to the engine (loaded from guidelines.json).
#[derive(Debug, Clone)]
pub struct GuidelineCatalog {
    guidelines: Vec<GuidelineReference>,
}

impl GuidelineCatalog {
    /// Load the catalog from the bundled JSON file. Every entry is validated.
    pub fn load(resources_dir: &Path) -> Result<Self, AnalysisError> {
        let path = resources_dir.join(GUIDELINES_FILE);

        let json = std::fs::read_to_string(&path).map_err(|e| {
            AnalysisError::ReferenceDataLoad(path.display().to_string(), e.to_string())
        })?;
        let guidelines: Vec<GuidelineReference> = serde_json::from_str(&json)
            .map_err(|e| AnalysisError::ReferenceDataParse(GUIDELINES_FILE.into(), e.to_string()))?;

        let catalog = Self::from_guidelines(guidelines)?;
        tracing::info!(
            path = %path.display(),
            guidelines = catalog.guidelines.len(),
            "Guideline catalog loaded"
        );
        Ok(catalog)
    }

    /// Build a catalog from in-memory guidelines. Duplicate ids are rejected.
    pub fn from_guidelines(guidelines: Vec<GuidelineReference>) -> Result<Self, AnalysisError> {
        let mut seen = std::collections::HashSet::new();
        for guideline in &guidelines {
            validate_guideline(guideline)?;
            if !seen.insert(guideline.id.as_str()) {
                return Err(AnalysisError::GuidelineResolution(format!(
                    "duplicate guideline id '{}'",
                    guideline.id
                )));
            }
        }
        Ok(Self { guidelines })
    }

    /// Create a catalog for tests (no file I/O).
    pub fn load_test() -> Self {
        Self {
            guidelines: vec![GuidelineReference {
                id: "NSCLC-v2025".into(),
                name: "NSCLC Guideline 2025".into(),
                canonical_pathway: CanonicalPathway {
                    symptoms: vec!["Persistent cough".into()],
                    tests: vec!["CT Scan".into()],
                    medications: vec!["Cisplatin".into(), "Gemcitabine".into()],
                    procedures: vec!["Biopsy".into()],
                },
                context: "Cisplatin/Gemcitabine as primary first-line.".into(),
            }],
        }
    }

    pub fn resolve(&self, id: &str) -> Result<&GuidelineReference, AnalysisError> {
        let id = id.trim();
        self.guidelines
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| AnalysisError::GuidelineResolution(format!("unknown guideline '{id}'")))
    }

    pub fn list(&self) -> &[GuidelineReference] {
        &self.guidelines
    }
}

/// A usable guideline has an id, a name and at least one canonical label.
pub fn validate_guideline(guideline: &GuidelineReference) -> Result<(), AnalysisError> {
    if guideline.id.trim().is_empty() {
        return Err(AnalysisError::GuidelineResolution(
            "guideline id is blank".into(),
        ));
    }
    if guideline.name.trim().is_empty() {
        return Err(AnalysisError::GuidelineResolution(format!(
            "guideline '{}' has a blank name",
            guideline.id
        )));
    }
    if guideline.canonical_pathway.is_empty() {
        return Err(AnalysisError::GuidelineResolution(format!(
            "guideline '{}' has an empty canonical pathway",
            guideline.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bundled_catalog_loads() {
        let catalog = GuidelineCatalog::load(&crate::config::default_resources_dir()).unwrap();
        let nsclc = catalog.resolve("NSCLC-v2025").unwrap();
        assert_eq!(nsclc.canonical_pathway.medications, vec!["Cisplatin", "Gemcitabine"]);
        assert!(catalog.list().len() >= 2);
    }

    #[test]
    fn unknown_id_is_a_resolution_failure() {
        let catalog = GuidelineCatalog::load_test();
        assert!(matches!(
            catalog.resolve("COPD-v2024"),
            Err(AnalysisError::GuidelineResolution(_))
        ));
        assert!(catalog.resolve(" NSCLC-v2025 ").is_ok());
    }

    #[test]
    fn missing_file_is_a_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            GuidelineCatalog::load(dir.path()),
            Err(AnalysisError::ReferenceDataLoad(_, _))
        ));
    }

    #[test]
    fn malformed_file_is_a_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join(GUIDELINES_FILE)).unwrap();
        write!(file, "[{{\"id\": 1}}]").unwrap();
        assert!(matches!(
            GuidelineCatalog::load(dir.path()),
            Err(AnalysisError::ReferenceDataParse(_, _))
        ));
    }

    #[test]
    fn empty_pathway_rejected() {
        let mut guideline = GuidelineCatalog::load_test().list()[0].clone();
        guideline.canonical_pathway = CanonicalPathway::default();
        assert!(matches!(
            validate_guideline(&guideline),
            Err(AnalysisError::GuidelineResolution(_))
        ));
    }

    #[test]
    fn blank_name_rejected() {
        let mut guideline = GuidelineCatalog::load_test().list()[0].clone();
        guideline.name = "  ".into();
        assert!(validate_guideline(&guideline).is_err());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let g = GuidelineCatalog::load_test().list()[0].clone();
        assert!(GuidelineCatalog::from_guidelines(vec![g.clone(), g]).is_err());
    }
}
