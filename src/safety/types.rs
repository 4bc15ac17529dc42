use serde::{Deserialize, Serialize};

/// Classification of unsafe wording detected in generated text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ViolationCategory {
    /// Asserts that one observation produced another ("causes", "due to").
    CausalClaim,
    /// Directs a clinical action ("must update", "should switch").
    PrescriptiveLanguage,
    /// Labels practice as wrong ("non-compliance", "incorrect").
    ComplianceLabel,
}

/// A specific span that tripped the guard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LanguageViolation {
    pub category: ViolationCategory,
    /// The specific text span that triggered the violation.
    pub matched_text: String,
    /// Byte offset where the violation starts.
    pub offset: usize,
    /// Length of the matched span in bytes.
    pub length: usize,
    /// Human-readable explanation for the audit log.
    pub reason: String,
}

/// What the guard decided for one sentence.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Passed(String),
    Replaced {
        text: String,
        violations: Vec<LanguageViolation>,
    },
}

impl GuardOutcome {
    pub fn into_text(self) -> String {
        match self {
            Self::Passed(text) | Self::Replaced { text, .. } => text,
        }
    }

    pub fn was_replaced(&self) -> bool {
        matches!(self, Self::Replaced { .. })
    }
}
