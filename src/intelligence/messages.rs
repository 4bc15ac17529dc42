use crate::models::{ConfidenceLevel, DriftMagnitude, DriftType, TrendDirection};

/// Message template builder for observational, non-prescriptive framing.
/// Co-movement is described, never attributed. Divergence is described,
/// never judged. Review is offered, never directed.
pub struct MessageTemplates;

/// Substituted for any generated trace line the language guard rejects.
pub const FALLBACK_TRACE_LINE: &str =
    "Observation withheld: generated wording did not pass the language guard.";

/// Substituted for a rejected governance summary.
pub const FALLBACK_SUMMARY: &str =
    "Practice pattern summary withheld: generated wording did not pass the language guard.";

/// Substituted for a rejected obsolescence interpretation.
pub const FALLBACK_INTERPRETATION: &str =
    "Interpretation withheld: generated wording did not pass the language guard.";

impl MessageTemplates {
    // ── Trend descriptors ──────────────────────────────────────────────────

    /// `Decreasing (12% drop)`, `Increasing (4% gain)` or `Stable`.
    pub fn alignment_trend(direction: TrendDirection, percent: f64) -> String {
        match direction {
            TrendDirection::Decreasing => format!("Decreasing ({:.0}% drop)", percent),
            TrendDirection::Increasing => format!("Increasing ({:.0}% gain)", percent),
            TrendDirection::Stable => "Stable".into(),
        }
    }

    /// `Increasing (0.09 shift)`, `Decreasing (0.09 shift)` or `Stable`.
    pub fn entropy_trend(direction: TrendDirection, shift: f64) -> String {
        match direction {
            TrendDirection::Increasing => format!("Increasing ({:.2} shift)", shift),
            TrendDirection::Decreasing => format!("Decreasing ({:.2} shift)", shift),
            TrendDirection::Stable => "Stable".into(),
        }
    }

    pub fn time_horizon(days: u32) -> String {
        format!("{} Days", days)
    }

    /// `High (88%)`
    pub fn confidence(level: ConfidenceLevel, percent: u8) -> String {
        format!("{} ({}%)", level.as_str(), percent)
    }

    // ── Explainability trace ───────────────────────────────────────────────

    pub fn trace_pathways(alternative_count: usize, alternative_support: usize, total: usize) -> String {
        format!(
            "Pathway variation: {} alternative pathway{} covering {} of {} events outside the dominant set.",
            alternative_count,
            if alternative_count == 1 { "" } else { "s" },
            alternative_support,
            total,
        )
    }

    pub fn trace_entropy(
        direction: TrendDirection,
        reference: f64,
        current: f64,
        distinct_transitions: usize,
    ) -> String {
        let movement = match direction {
            TrendDirection::Increasing => "rose",
            TrendDirection::Decreasing => "fell",
            TrendDirection::Stable => "held",
        };
        format!(
            "Decision entropy {} from {:.2} to {:.2}; {} distinct stage transitions observed.",
            movement, reference, current, distinct_transitions,
        )
    }

    pub fn trace_alignment(reference: f64, current: f64, descriptor: &str) -> String {
        format!(
            "Guideline alignment moved from {:.2} to {:.2} ({}).",
            reference, current, descriptor,
        )
    }

    /// `90d 0.95, 60d 0.90, 30d 0.82`
    pub fn window_series(points: &[(u32, f64)]) -> String {
        points
            .iter()
            .map(|(days, alignment)| format!("{}d {:.2}", days, alignment))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn trace_sustained(series: &str, magnitude: DriftMagnitude) -> String {
        format!(
            "Alignment declined across consecutive lookback windows ({}); drift magnitude {}.",
            series,
            magnitude.as_str(),
        )
    }

    pub fn trace_transient(series: &str) -> String {
        format!(
            "Only the most recent lookback window shows an alignment decline ({}); treated as a transient outlier.",
            series,
        )
    }

    pub fn trace_outcomes(
        co_movement: bool,
        positive_before: f64,
        positive_after: f64,
        negative_before: f64,
        negative_after: f64,
    ) -> String {
        let lead = if co_movement {
            "Outcome distribution shifted in the same period as pathway divergence"
        } else {
            "Outcome distribution shifted across lookback windows"
        };
        format!(
            "{}: positive {:.0}% to {:.0}%, negative {:.0}% to {:.0}%. Co-movement only; no attribution is made.",
            lead,
            positive_before * 100.0,
            positive_after * 100.0,
            negative_before * 100.0,
            negative_after * 100.0,
        )
    }

    pub fn trace_obsolescence(magnitude: DriftMagnitude, confidence: &str) -> String {
        format!(
            "Declining alignment, {} drift and improving outcomes observed together; obsolescence confidence {}.",
            magnitude.as_str(),
            confidence,
        )
    }

    pub fn trace_obsolescence_suppressed() -> String {
        "Alignment declined while outcomes shifted toward worse results; this pattern is not read as guideline obsolescence.".into()
    }

    pub fn trace_insufficient_data(event_count: usize) -> String {
        format!(
            "Insufficient data: {} event{} in the batch; pathway and trend figures are indicative only.",
            event_count,
            if event_count == 1 { "" } else { "s" },
        )
    }

    pub fn trace_sparse_window(window_days: u32, event_count: usize) -> String {
        format!(
            "Sparse window: the {}-day window holds {} event{}.",
            window_days,
            event_count,
            if event_count == 1 { "" } else { "s" },
        )
    }

    pub fn trace_nothing_notable() -> String {
        "No notable change observed in pathway variation, entropy, alignment or outcomes.".into()
    }

    // ── Obsolescence interpretation ────────────────────────────────────────

    pub fn interpretation_risk(guideline: &str) -> String {
        format!(
            "Observed practice diverges from {} while outcomes shift toward improvement over the same period. \
             Trend indicates the guideline may require review.",
            guideline,
        )
    }

    pub fn interpretation_suppressed(guideline: &str) -> String {
        format!(
            "Observed practice diverges from {} while outcomes shift toward worse results. \
             This pattern does not indicate guideline obsolescence.",
            guideline,
        )
    }

    pub fn interpretation_partial(guideline: &str) -> String {
        format!(
            "Some divergence from {} is observed, but the combined signals do not indicate obsolescence at this time.",
            guideline,
        )
    }

    pub fn interpretation_none(guideline: &str) -> String {
        format!(
            "Observed practice remains consistent with {}; no obsolescence signal.",
            guideline,
        )
    }

    // ── Governance ─────────────────────────────────────────────────────────

    pub fn summary(drift_type: DriftType, guideline: &str, departments: &str, trend: &str) -> String {
        format!(
            "{} relative to {} observed in {}. Alignment trend: {}.",
            drift_type.as_str(),
            guideline,
            departments,
            trend,
        )
    }
}
