//! Explainability trace and governance signal.
//!
//! Every generated sentence passes the language guard before it leaves the
//! engine; a rejected sentence is replaced by a fixed neutral fallback.

use std::collections::BTreeSet;

use crate::models::{
    ClinicalEvent, ConfidenceLevel, DriftMagnitude, DriftType, Outcome, PracticeDriftSignal,
    RecommendationType, RiskLevel, TrendDirection,
};
use crate::safety::guard_text;

use super::alignment::AlignmentTrend;
use super::entropy::EntropyTrend;
use super::helpers::join_natural;
use super::messages::{MessageTemplates, FALLBACK_SUMMARY, FALLBACK_TRACE_LINE};
use super::obsolescence::ObsolescenceAssessment;
use super::outcomes::OutcomeShift;
use super::temporal::DriftAssessment;
use super::types::{AnalysisWarning, PathwayClusters};

// ═══════════════════════════════════════════════════════════
// Severity tables
// ═══════════════════════════════════════════════════════════

pub fn magnitude_severity(magnitude: DriftMagnitude) -> RiskLevel {
    match magnitude {
        DriftMagnitude::None => RiskLevel::Observational,
        DriftMagnitude::Low => RiskLevel::Low,
        DriftMagnitude::Medium | DriftMagnitude::MediumHigh => RiskLevel::Medium,
        DriftMagnitude::High => RiskLevel::High,
    }
}

/// Obsolescence confidence only counts when risk is detected.
pub fn confidence_severity(risk_detected: bool, confidence: ConfidenceLevel) -> RiskLevel {
    if !risk_detected {
        return RiskLevel::Observational;
    }
    match confidence {
        ConfidenceLevel::Low => RiskLevel::Low,
        ConfidenceLevel::Medium => RiskLevel::Medium,
        ConfidenceLevel::High => RiskLevel::High,
    }
}

pub fn outcome_severity(shift_detected: bool) -> RiskLevel {
    if shift_detected {
        RiskLevel::Low
    } else {
        RiskLevel::Observational
    }
}

pub fn recommendation_for(level: RiskLevel) -> RecommendationType {
    match level {
        RiskLevel::Observational | RiskLevel::Low => RecommendationType::ReviewDiscussionOnly,
        RiskLevel::Medium => RecommendationType::PathwayUpdateRequired,
        RiskLevel::High => RecommendationType::UrgentReview,
    }
}

/// Sorted, distinct, non-blank department names.
pub fn affected_departments(events: &[ClinicalEvent]) -> Vec<String> {
    events
        .iter()
        .map(|e| e.department.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Composition
// ═══════════════════════════════════════════════════════════

/// Everything the composer reads, borrowed from the engine's working state.
pub struct GovernanceInput<'a> {
    pub events: &'a [ClinicalEvent],
    pub guideline_name: &'a str,
    pub clusters: &'a PathwayClusters,
    pub entropy: &'a EntropyTrend,
    pub entropy_reference: f64,
    pub entropy_current: f64,
    pub distinct_transitions: usize,
    pub alignment: &'a AlignmentTrend,
    pub alignment_reference: f64,
    pub alignment_current: f64,
    pub drift: &'a DriftAssessment,
    pub outcomes: &'a OutcomeShift,
    pub obsolescence: &'a ObsolescenceAssessment,
    pub warnings: &'a [AnalysisWarning],
}

fn guarded(line: String) -> String {
    guard_text(line, FALLBACK_TRACE_LINE).into_text()
}

/// Ordered explainability trace: pathways, entropy, alignment, temporal
/// drift, outcomes, obsolescence, then warnings. Never empty.
pub fn build_trace(input: &GovernanceInput<'_>) -> Vec<String> {
    let mut trace = Vec::new();
    let clusters = input.clusters;

    if !clusters.alternatives().is_empty() {
        trace.push(MessageTemplates::trace_pathways(
            clusters.alternatives().len(),
            clusters.alternative_support(),
            clusters.total_support(),
        ));
    }

    if input.entropy.direction != TrendDirection::Stable {
        trace.push(MessageTemplates::trace_entropy(
            input.entropy.direction,
            input.entropy_reference,
            input.entropy_current,
            input.distinct_transitions,
        ));
    }

    if input.alignment.direction != TrendDirection::Stable {
        trace.push(MessageTemplates::trace_alignment(
            input.alignment_reference,
            input.alignment_current,
            &input.alignment.descriptor,
        ));
    }

    let series: Vec<(u32, f64)> = input
        .drift
        .points
        .iter()
        .map(|p| (p.window_days, p.alignment))
        .collect();
    match input.drift.drift_type {
        DriftType::SustainedProtocolDivergence => trace.push(MessageTemplates::trace_sustained(
            &MessageTemplates::window_series(&series),
            input.drift.magnitude,
        )),
        DriftType::TransientOutlier => {
            let recent = &series[series.len().saturating_sub(2)..];
            trace.push(MessageTemplates::trace_transient(
                &MessageTemplates::window_series(recent),
            ));
        }
        DriftType::NoSignificantDrift => {}
    }

    if input.outcomes.shift_detected {
        let o = input.outcomes;
        trace.push(MessageTemplates::trace_outcomes(
            o.co_movement,
            o.share_before(Outcome::Positive),
            o.share_after(Outcome::Positive),
            o.share_before(Outcome::Negative),
            o.share_after(Outcome::Negative),
        ));
    }

    if input.obsolescence.risk_detected {
        trace.push(MessageTemplates::trace_obsolescence(
            input.drift.magnitude,
            &input.obsolescence.confidence_label(),
        ));
    } else if input.obsolescence.suppressed_by_worsening {
        trace.push(MessageTemplates::trace_obsolescence_suppressed());
    }

    for warning in input.warnings {
        trace.push(match warning {
            AnalysisWarning::InsufficientData { event_count } => {
                MessageTemplates::trace_insufficient_data(*event_count)
            }
            AnalysisWarning::SparseWindow {
                window_days,
                event_count,
            } => MessageTemplates::trace_sparse_window(*window_days, *event_count),
        });
    }

    if trace.is_empty() {
        trace.push(MessageTemplates::trace_nothing_notable());
    }

    trace.into_iter().map(guarded).collect()
}

pub fn build_signal(input: &GovernanceInput<'_>) -> PracticeDriftSignal {
    let risk_level = [
        magnitude_severity(input.drift.magnitude),
        confidence_severity(
            input.obsolescence.risk_detected,
            input.obsolescence.confidence,
        ),
        outcome_severity(input.outcomes.shift_detected),
    ]
    .into_iter()
    .max()
    .unwrap_or(RiskLevel::Observational);

    let affected_departments = affected_departments(input.events);

    let summary = guard_text(
        MessageTemplates::summary(
            input.drift.drift_type,
            input.guideline_name,
            &join_natural(&affected_departments),
            &input.alignment.descriptor,
        ),
        FALLBACK_SUMMARY,
    )
    .into_text();

    PracticeDriftSignal {
        summary,
        affected_departments,
        risk_level,
        recommendation_type: recommendation_for(risk_level),
    }
}
