use std::sync::LazyLock;

use regex::Regex;

use super::types::{GuardOutcome, LanguageViolation, ViolationCategory};

/// A compiled pattern with its violation metadata.
struct LanguagePattern {
    regex: Regex,
    category: ViolationCategory,
    description: &'static str,
}

/// Causal assertions. Co-movement is reported, attribution never is.
static CAUSAL_PATTERNS: LazyLock<Vec<LanguagePattern>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)\bcaus(?:e|es|ed|ing|al|ally|ation|ative)\b",
            ViolationCategory::CausalClaim,
            "Causal verb or adjective: 'causes/caused/causal'",
        ),
        pattern(
            r"(?i)\bbecause\b",
            ViolationCategory::CausalClaim,
            "Causal connective: 'because'",
        ),
        pattern(
            r"(?i)\bdue\s+to\b",
            ViolationCategory::CausalClaim,
            "Causal connective: 'due to'",
        ),
        pattern(
            r"(?i)\bresult(?:s|ed|ing)?\s+in\b",
            ViolationCategory::CausalClaim,
            "Causal consequence: 'results in'",
        ),
        pattern(
            r"(?i)\b(?:leads?|leading|led)\s+to\b",
            ViolationCategory::CausalClaim,
            "Causal consequence: 'leads to'",
        ),
        pattern(
            r"(?i)\b(?:driven|triggered|produced)\s+by\b",
            ViolationCategory::CausalClaim,
            "Causal agent: 'driven by/triggered by'",
        ),
        pattern(
            r"(?i)\battribut(?:able|ed)\s+to\b",
            ViolationCategory::CausalClaim,
            "Attribution: 'attributable to'",
        ),
        pattern(
            r"(?i)\bresponsible\s+for\b",
            ViolationCategory::CausalClaim,
            "Attribution: 'responsible for'",
        ),
        pattern(
            r"(?i)\bthanks\s+to\b",
            ViolationCategory::CausalClaim,
            "Attribution: 'thanks to'",
        ),
    ]
});

/// Directive wording. Signals are observational; decisions stay with the
/// governance committee.
static PRESCRIPTIVE_PATTERNS: LazyLock<Vec<LanguagePattern>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)\bmust\b",
            ViolationCategory::PrescriptiveLanguage,
            "Imperative: 'must'",
        ),
        pattern(
            r"(?i)\bshould\b",
            ViolationCategory::PrescriptiveLanguage,
            "Imperative: 'should'",
        ),
        pattern(
            r"(?i)\b(?:need|needs|needed|required)\s+to\b",
            ViolationCategory::PrescriptiveLanguage,
            "Imperative: 'needs to/required to'",
        ),
        pattern(
            r"(?i)\b(?:we|I)\s+(?:recommend|advise|suggest)\b",
            ViolationCategory::PrescriptiveLanguage,
            "Direct recommendation: 'we recommend'",
        ),
        pattern(
            r"(?i)\b(?:switch|stop|start)\s+(?:to|using|prescribing)\b",
            ViolationCategory::PrescriptiveLanguage,
            "Treatment directive: 'switch to/stop using'",
        ),
    ]
});

/// Compliance labels. Divergence is described, never judged.
static COMPLIANCE_PATTERNS: LazyLock<Vec<LanguagePattern>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)\bnon[- ]?complian(?:ce|t)\b",
            ViolationCategory::ComplianceLabel,
            "Compliance label: 'non-compliance'",
        ),
        pattern(
            r"(?i)\bincorrect(?:ly)?\b",
            ViolationCategory::ComplianceLabel,
            "Compliance label: 'incorrect'",
        ),
        pattern(
            r"(?i)\berrors?\b",
            ViolationCategory::ComplianceLabel,
            "Compliance label: 'error'",
        ),
        pattern(
            r"(?i)\bviolat(?:e|es|ed|ion|ions)\b",
            ViolationCategory::ComplianceLabel,
            "Compliance label: 'violation'",
        ),
        pattern(
            r"(?i)\bmistakes?\b",
            ViolationCategory::ComplianceLabel,
            "Compliance label: 'mistake'",
        ),
    ]
});

fn pattern(
    regex_str: &str,
    category: ViolationCategory,
    description: &'static str,
) -> LanguagePattern {
    LanguagePattern {
        regex: Regex::new(regex_str).expect("Invalid language guard pattern"),
        category,
        description,
    }
}

/// Scan generated text for causal, prescriptive and compliance wording.
pub fn scan_language(text: &str) -> Vec<LanguageViolation> {
    let mut violations = Vec::new();

    for patterns in [&*CAUSAL_PATTERNS, &*PRESCRIPTIVE_PATTERNS, &*COMPLIANCE_PATTERNS] {
        for lp in patterns {
            for mat in lp.regex.find_iter(text) {
                violations.push(LanguageViolation {
                    category: lp.category,
                    matched_text: mat.as_str().to_string(),
                    offset: mat.start(),
                    length: mat.len(),
                    reason: lp.description.to_string(),
                });
            }
        }
    }

    deduplicate_violations(&mut violations);

    violations
}

/// Remove overlapping violations, keeping the longer match.
fn deduplicate_violations(violations: &mut Vec<LanguageViolation>) {
    violations.sort_by_key(|v| (v.offset, std::cmp::Reverse(v.length)));
    let mut kept: Vec<LanguageViolation> = Vec::with_capacity(violations.len());
    for v in violations.drain(..) {
        let contained = kept.last().is_some_and(|k| {
            v.offset >= k.offset && v.offset + v.length <= k.offset + k.length
        });
        if !contained {
            kept.push(v);
        }
    }
    *violations = kept;
}

/// Pass `text` through unchanged when clean, otherwise substitute `fallback`.
/// The fallback is a fixed template sentence and is trusted.
pub fn guard_text(text: String, fallback: &str) -> GuardOutcome {
    let violations = scan_language(&text);
    if violations.is_empty() {
        return GuardOutcome::Passed(text);
    }

    for v in &violations {
        tracing::warn!(
            category = ?v.category,
            matched = %v.matched_text,
            offset = v.offset,
            reason = %v.reason,
            "Generated text withheld by language guard"
        );
    }

    GuardOutcome::Replaced {
        text: fallback.to_string(),
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn causal_verbs_detected() {
        for text in [
            "The new regimen causes better outcomes.",
            "Outcomes improved because of the switch.",
            "Improvement was due to targeted therapy.",
            "Drift results in fewer negative outcomes.",
            "The change led to improvement.",
            "The shift was driven by immunotherapy.",
            "A causal link exists.",
        ] {
            let violations = scan_language(text);
            assert!(
                violations.iter().any(|v| v.category == ViolationCategory::CausalClaim),
                "expected causal violation in: {text}"
            );
        }
    }

    #[test]
    fn because_is_not_double_counted_as_cause() {
        let violations = scan_language("because");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].matched_text, "because");
    }

    #[test]
    fn prescriptive_language_detected() {
        let violations = scan_language("The committee must update the guideline.");
        assert!(violations
            .iter()
            .any(|v| v.category == ViolationCategory::PrescriptiveLanguage));
        assert!(!scan_language("Clinicians should switch to the new agent.").is_empty());
    }

    #[test]
    fn compliance_labels_detected() {
        let violations = scan_language("Observed non-compliance in Oncology.");
        assert!(violations
            .iter()
            .any(|v| v.category == ViolationCategory::ComplianceLabel));
        assert!(!scan_language("Prescribing error observed.").is_empty());
    }

    #[test]
    fn observational_language_passes() {
        for text in [
            "Observed pattern: outcome distribution shifted in the same period as pathway divergence.",
            "Trend indicates the guideline may require review.",
            "Sustained divergence from NSCLC-v2025 observed in Oncology.",
            "Co-movement only; no attribution is made.",
        ] {
            assert!(scan_language(text).is_empty(), "unexpected violation in: {text}");
        }
    }

    #[test]
    fn guard_replaces_offending_text() {
        let outcome = guard_text("Drift causes improvement.".into(), "Fallback.");
        assert!(outcome.was_replaced());
        assert_eq!(outcome.into_text(), "Fallback.");
    }

    #[test]
    fn guard_passes_clean_text() {
        let outcome = guard_text("Observed pattern.".into(), "Fallback.");
        assert_eq!(outcome, GuardOutcome::Passed("Observed pattern.".into()));
    }

    #[test]
    fn overlapping_matches_deduplicated() {
        let violations = scan_language("error errors");
        assert_eq!(violations.len(), 2);
        assert!(violations[0].offset < violations[1].offset);
    }
}
