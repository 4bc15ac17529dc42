//! Guideline obsolescence: practice moves away from the guideline while
//! outcomes hold or improve.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::models::{ConfidenceLevel, DriftMagnitude, OutcomeDirection, TrendDirection};

use super::alignment::AlignmentTrend;
use super::helpers::format_calendar_duration;
use super::messages::MessageTemplates;
use super::outcomes::OutcomeShift;
use super::temporal::DriftAssessment;

/// Duration reported when alignment is not declining.
pub const NOT_OBSERVED: &str = "Not observed";

/// Outcome movement (share) that counts as full outcome-signal strength.
const FULL_OUTCOME_MOVE: f64 = 0.30;

/// Relative alignment decline (percent) that counts as full strength.
const FULL_ALIGNMENT_DECLINE_PCT: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObsolescenceAssessment {
    pub risk_detected: bool,
    /// Declining alignment with a worsening outcome shift: the pattern that
    /// would otherwise qualify is held back.
    pub suppressed_by_worsening: bool,
    pub strong_signals: usize,
    pub confidence: ConfidenceLevel,
    pub confidence_pct: u8,
    pub trend_duration: String,
    pub interpretation: String,
}

impl ObsolescenceAssessment {
    /// `High (88%)`
    pub fn confidence_label(&self) -> String {
        MessageTemplates::confidence(self.confidence, self.confidence_pct)
    }
}

fn confidence_band(level: ConfidenceLevel) -> (f64, f64) {
    match level {
        ConfidenceLevel::Low => (25.0, 49.0),
        ConfidenceLevel::Medium => (50.0, 74.0),
        ConfidenceLevel::High => (75.0, 95.0),
    }
}

/// Fuse alignment, drift and outcome evidence into a risk verdict.
pub fn assess_obsolescence(
    alignment: &AlignmentTrend,
    drift: &DriftAssessment,
    outcomes: &OutcomeShift,
    guideline_name: &str,
    config: &EngineConfig,
) -> ObsolescenceAssessment {
    let alignment_decreasing = alignment.direction == TrendDirection::Decreasing;
    let drift_material = drift.magnitude >= DriftMagnitude::Medium;
    let improving_shift =
        outcomes.shift_detected && outcomes.direction == OutcomeDirection::Improving;
    let worsening_shift =
        outcomes.shift_detected && outcomes.direction == OutcomeDirection::Worsening;

    let risk_detected = alignment_decreasing
        && drift_material
        && outcomes.shift_detected
        && outcomes.direction != OutcomeDirection::Worsening;
    let suppressed_by_worsening = alignment_decreasing && drift_material && worsening_shift;

    let alignment_strong =
        alignment_decreasing && alignment.percent >= config.strong_alignment_decline_pct;
    let strong_signals = [alignment_strong, drift_material, improving_shift]
        .iter()
        .filter(|&&s| s)
        .count();

    let confidence = match strong_signals {
        0 | 1 => ConfidenceLevel::Low,
        2 => ConfidenceLevel::Medium,
        _ => ConfidenceLevel::High,
    };

    let strengths = [
        if alignment_decreasing {
            (alignment.percent / FULL_ALIGNMENT_DECLINE_PCT).min(1.0)
        } else {
            0.0
        },
        f64::from(drift.magnitude.rank()) / 4.0,
        if improving_shift {
            (outcomes.max_move / FULL_OUTCOME_MOVE).min(1.0)
        } else {
            0.0
        },
    ];
    let mean_strength = strengths.iter().sum::<f64>() / strengths.len() as f64;
    let (lo, hi) = confidence_band(confidence);
    let confidence_pct = (lo + ((hi - lo) * mean_strength).round()).clamp(lo, hi) as u8;

    let trend_duration = match drift.run_start_days {
        Some(days) if alignment_decreasing && drift.declining_run >= 1 => {
            format_calendar_duration(i64::from(days))
        }
        _ => NOT_OBSERVED.to_string(),
    };

    let interpretation = if risk_detected {
        MessageTemplates::interpretation_risk(guideline_name)
    } else if suppressed_by_worsening {
        MessageTemplates::interpretation_suppressed(guideline_name)
    } else if alignment_decreasing || drift.drift_detected {
        MessageTemplates::interpretation_partial(guideline_name)
    } else {
        MessageTemplates::interpretation_none(guideline_name)
    };

    ObsolescenceAssessment {
        risk_detected,
        suppressed_by_worsening,
        strong_signals,
        confidence,
        confidence_pct,
        trend_duration,
        interpretation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::intelligence::alignment::describe_alignment_trend;
    use crate::intelligence::temporal::detect_drift;
    use crate::intelligence::types::WindowPoint;

    fn sustained_drift() -> DriftAssessment {
        let points = [
            WindowPoint { window_days: 90, alignment: 0.95, entropy: 0.12 },
            WindowPoint { window_days: 60, alignment: 0.90, entropy: 0.18 },
            WindowPoint { window_days: 30, alignment: 0.82, entropy: 0.31 },
        ];
        detect_drift(&points, &EngineConfig::default())
    }

    fn shift(detected: bool, direction: OutcomeDirection, max_move: f64) -> OutcomeShift {
        OutcomeShift {
            shift_detected: detected,
            direction,
            co_movement: detected,
            dominant_before: None,
            dominant_after: None,
            shares_before: BTreeMap::new(),
            shares_after: BTreeMap::new(),
            max_move,
        }
    }

    #[test]
    fn risk_when_all_conditions_hold() {
        let config = EngineConfig::default();
        let alignment = describe_alignment_trend(0.82, 0.95, config.alignment_tolerance);
        let outcomes = shift(true, OutcomeDirection::Improving, 0.40);
        let risk = assess_obsolescence(&alignment, &sustained_drift(), &outcomes, "NSCLC", &config);

        assert!(risk.risk_detected);
        assert_eq!(risk.strong_signals, 3);
        assert_eq!(risk.confidence, ConfidenceLevel::High);
        assert!((75..=95).contains(&risk.confidence_pct));
        assert_eq!(risk.trend_duration, "3 Months");
        assert!(risk.interpretation.contains("may require review"));
        assert!(risk.confidence_label().starts_with("High ("));
    }

    #[test]
    fn worsening_outcomes_suppress_risk() {
        let config = EngineConfig::default();
        let alignment = describe_alignment_trend(0.82, 0.95, config.alignment_tolerance);
        let outcomes = shift(true, OutcomeDirection::Worsening, 0.40);
        let risk = assess_obsolescence(&alignment, &sustained_drift(), &outcomes, "NSCLC", &config);

        assert!(!risk.risk_detected);
        assert!(risk.suppressed_by_worsening);
        assert_eq!(risk.confidence, ConfidenceLevel::Medium);
        assert!(risk.interpretation.contains("does not indicate"));
    }

    #[test]
    fn no_outcome_shift_means_no_risk() {
        let config = EngineConfig::default();
        let alignment = describe_alignment_trend(0.82, 0.95, config.alignment_tolerance);
        let outcomes = shift(false, OutcomeDirection::Neutral, 0.05);
        let risk = assess_obsolescence(&alignment, &sustained_drift(), &outcomes, "NSCLC", &config);
        assert!(!risk.risk_detected);
        assert!(!risk.suppressed_by_worsening);
    }

    #[test]
    fn stable_practice_reports_not_observed() {
        let config = EngineConfig::default();
        let alignment = describe_alignment_trend(0.95, 0.95, config.alignment_tolerance);
        let points = [
            WindowPoint { window_days: 90, alignment: 0.95, entropy: 0.1 },
            WindowPoint { window_days: 30, alignment: 0.95, entropy: 0.1 },
        ];
        let drift = detect_drift(&points, &config);
        let outcomes = shift(false, OutcomeDirection::Neutral, 0.0);
        let risk = assess_obsolescence(&alignment, &drift, &outcomes, "NSCLC", &config);

        assert!(!risk.risk_detected);
        assert_eq!(risk.trend_duration, NOT_OBSERVED);
        assert_eq!(risk.confidence, ConfidenceLevel::Low);
        assert_eq!(risk.confidence_pct, 25);
        assert_eq!(risk.confidence_label(), "Low (25%)");
    }

    #[test]
    fn confidence_is_deterministic() {
        let config = EngineConfig::default();
        let alignment = describe_alignment_trend(0.82, 0.95, config.alignment_tolerance);
        let outcomes = shift(true, OutcomeDirection::Improving, 0.25);
        let a = assess_obsolescence(&alignment, &sustained_drift(), &outcomes, "NSCLC", &config);
        let b = assess_obsolescence(&alignment, &sustained_drift(), &outcomes, "NSCLC", &config);
        assert_eq!(a, b);
    }
}
