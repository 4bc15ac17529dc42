//! Trailing lookback windows and the drift persistence filter.
//!
//! Windows trail back from the reference instant (latest event in the batch)
//! and are nested: the 90-day window contains the 60-day window, which
//! contains the 30-day window. Walking them longest → shortest reads as
//! "whole quarter, then progressively more recent practice".

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::models::{ClinicalEvent, DriftMagnitude, DriftType, Outcome};

use super::alignment::score_alignment;
use super::entropy::decision_entropy;
use super::helpers::relative_change_pct;
use super::messages::MessageTemplates;
use super::pathway::build_pathways;
use super::types::{Token, WindowPoint, WindowedDistribution};

/// Latest event timestamp; `None` for an empty batch.
pub fn reference_instant(events: &[&ClinicalEvent]) -> Option<DateTime<Utc>> {
    events.iter().map(|e| e.timestamp).max()
}

/// Build one distribution per configured window, longest first.
/// Each window re-runs clustering, alignment and entropy on its subset.
pub fn build_windows(
    events: &[&ClinicalEvent],
    guideline: &BTreeSet<Token>,
    reference: DateTime<Utc>,
    config: &EngineConfig,
) -> Vec<WindowedDistribution> {
    config
        .windows_longest_first()
        .into_iter()
        .map(|days| {
            let cutoff = reference
                .checked_sub_signed(Duration::days(i64::from(days)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            let subset: Vec<&ClinicalEvent> = events
                .iter()
                .copied()
                .filter(|e| e.timestamp >= cutoff)
                .collect();

            let mut outcome_frequencies: BTreeMap<Outcome, usize> =
                Outcome::ALL.iter().map(|&o| (o, 0)).collect();
            for e in &subset {
                *outcome_frequencies.entry(e.outcome).or_insert(0) += 1;
            }

            let (pathway_frequencies, mean_alignment, entropy) = if subset.is_empty() {
                (Vec::new(), 0.0, 0.0)
            } else {
                let clusters = build_pathways(&subset, config);
                let alignment = score_alignment(&clusters, guideline, &config.weights);
                let frequencies = clusters
                    .ranked
                    .iter()
                    .map(|p| (p.display.clone(), p.support))
                    .collect();
                (frequencies, alignment.headline, decision_entropy(&clusters))
            };

            tracing::debug!(
                window_days = days,
                events = subset.len(),
                alignment = mean_alignment,
                entropy,
                "Window computed"
            );

            WindowedDistribution {
                window_days: days,
                cutoff,
                event_count: subset.len(),
                pathway_frequencies,
                outcome_frequencies,
                mean_alignment,
                entropy,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Drift detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftAssessment {
    pub drift_detected: bool,
    pub drift_type: DriftType,
    pub magnitude: DriftMagnitude,
    pub time_horizon: String,
    /// Absolute alignment decline over the declining run.
    pub decline_abs: f64,
    /// Relative alignment decline over the declining run, in percent.
    pub decline_pct: f64,
    /// Number of consecutive declining steps ending at the shortest window.
    pub declining_run: usize,
    /// Length of the window where the declining run starts.
    pub run_start_days: Option<u32>,
    pub entropy_rising: bool,
    /// The series as read, longest window first.
    pub points: Vec<WindowPoint>,
}

fn magnitude_for(decline_pct: f64) -> DriftMagnitude {
    if decline_pct < 10.0 {
        DriftMagnitude::Low
    } else if decline_pct < 20.0 {
        DriftMagnitude::Medium
    } else if decline_pct <= 30.0 {
        DriftMagnitude::MediumHigh
    } else {
        DriftMagnitude::High
    }
}

/// Classify a window series. Points may arrive in any order; they are read
/// longest window first.
///
/// Sustained divergence needs a trailing run of at least
/// `sustained_min_steps` declining steps and a total decline of at least
/// `drift_decline_threshold`. A shorter trailing run is a transient outlier
/// and never sets `drift_detected`.
pub fn detect_drift(points: &[WindowPoint], config: &EngineConfig) -> DriftAssessment {
    let mut points = points.to_vec();
    points.sort_by(|a, b| b.window_days.cmp(&a.window_days));

    let Some((first, last)) = points.first().copied().zip(points.last().copied()) else {
        return DriftAssessment {
            drift_detected: false,
            drift_type: DriftType::NoSignificantDrift,
            magnitude: DriftMagnitude::None,
            time_horizon: MessageTemplates::time_horizon(0),
            decline_abs: 0.0,
            decline_pct: 0.0,
            declining_run: 0,
            run_start_days: None,
            entropy_rising: false,
            points,
        };
    };

    let declining_run = points
        .windows(2)
        .rev()
        .take_while(|w| w[0].alignment - w[1].alignment > config.alignment_tolerance)
        .count();
    let run_start = points[points.len() - 1 - declining_run];

    let decline_abs = (run_start.alignment - last.alignment).max(0.0);
    let decline_pct = (-relative_change_pct(last.alignment, run_start.alignment)).max(0.0);
    let entropy_rising = last.entropy - first.entropy > config.entropy_tolerance;

    let sustained = declining_run >= config.sustained_min_steps
        && decline_abs >= config.drift_decline_threshold;
    let transient = !sustained && declining_run >= 1 && declining_run < config.sustained_min_steps;

    let (drift_type, magnitude, horizon_days) = if sustained {
        let base = magnitude_for(decline_pct);
        let magnitude = if entropy_rising { base.escalate() } else { base };
        (DriftType::SustainedProtocolDivergence, magnitude, first.window_days)
    } else if transient {
        (DriftType::TransientOutlier, DriftMagnitude::None, last.window_days)
    } else {
        (DriftType::NoSignificantDrift, DriftMagnitude::None, first.window_days)
    };

    DriftAssessment {
        drift_detected: sustained,
        drift_type,
        magnitude,
        time_horizon: MessageTemplates::time_horizon(horizon_days),
        decline_abs,
        decline_pct,
        declining_run,
        run_start_days: (declining_run > 0).then_some(run_start.window_days),
        entropy_rising,
        points,
    }
}
