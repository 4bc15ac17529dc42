//! Outcome co-movement: did the outcome mix move over the same period as
//! the practice pattern? Simultaneity only; nothing here attributes one to
//! the other.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::models::{Outcome, OutcomeDirection};

use super::types::WindowedDistribution;

/// Net movement (Δpositive − Δnegative) inside this band reads as neutral.
const DIRECTION_BAND: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeShift {
    pub shift_detected: bool,
    pub direction: OutcomeDirection,
    /// Shift observed together with detected drift.
    pub co_movement: bool,
    pub dominant_before: Option<Outcome>,
    pub dominant_after: Option<Outcome>,
    pub shares_before: BTreeMap<Outcome, f64>,
    pub shares_after: BTreeMap<Outcome, f64>,
    /// Largest absolute share movement of any outcome.
    pub max_move: f64,
}

impl OutcomeShift {
    pub fn share_before(&self, outcome: Outcome) -> f64 {
        self.shares_before.get(&outcome).copied().unwrap_or(0.0)
    }

    pub fn share_after(&self, outcome: Outcome) -> f64 {
        self.shares_after.get(&outcome).copied().unwrap_or(0.0)
    }
}

/// Outcome shares of a frequency table. Empty table ⇒ all zero.
pub fn outcome_shares(frequencies: &BTreeMap<Outcome, usize>) -> BTreeMap<Outcome, f64> {
    let total: usize = frequencies.values().sum();
    Outcome::ALL
        .iter()
        .map(|&o| {
            let count = frequencies.get(&o).copied().unwrap_or(0);
            let share = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            };
            (o, share)
        })
        .collect()
}

/// Most frequent outcome; ties resolve positive, then stable, then negative.
pub fn dominant_outcome(frequencies: &BTreeMap<Outcome, usize>) -> Option<Outcome> {
    Outcome::ALL
        .iter()
        .copied()
        .map(|o| (o, frequencies.get(&o).copied().unwrap_or(0)))
        .filter(|&(_, count)| count > 0)
        .min_by(|(a, ca), (b, cb)| cb.cmp(ca).then(a.tie_priority().cmp(&b.tie_priority())))
        .map(|(o, _)| o)
}

/// Compare the earliest (longest) window's outcome mix with the latest
/// (shortest) window's.
pub fn analyze_outcomes(
    windows: &[WindowedDistribution],
    drift_detected: bool,
    config: &EngineConfig,
) -> OutcomeShift {
    let longest = windows.iter().max_by_key(|w| w.window_days);
    let shortest = windows.iter().min_by_key(|w| w.window_days);

    let (before, after) = match (longest, shortest) {
        (Some(l), Some(s)) if l.window_days != s.window_days => {
            (&l.outcome_frequencies, &s.outcome_frequencies)
        }
        _ => {
            return OutcomeShift {
                shift_detected: false,
                direction: OutcomeDirection::Neutral,
                co_movement: false,
                dominant_before: None,
                dominant_after: None,
                shares_before: BTreeMap::new(),
                shares_after: BTreeMap::new(),
                max_move: 0.0,
            }
        }
    };

    let shares_before = outcome_shares(before);
    let shares_after = outcome_shares(after);
    let dominant_before = dominant_outcome(before);
    let dominant_after = dominant_outcome(after);

    let delta = |o: Outcome| shares_after[&o] - shares_before[&o];
    let max_move = Outcome::ALL
        .iter()
        .map(|&o| delta(o).abs())
        .fold(0.0_f64, f64::max);

    let shift_detected =
        dominant_before != dominant_after || max_move > config.outcome_shift_threshold;

    let net = delta(Outcome::Positive) - delta(Outcome::Negative);
    let direction = if net > DIRECTION_BAND {
        OutcomeDirection::Improving
    } else if net < -DIRECTION_BAND {
        OutcomeDirection::Worsening
    } else {
        OutcomeDirection::Neutral
    };

    tracing::debug!(
        shift = shift_detected,
        direction = direction.as_str(),
        max_move,
        "Outcome co-movement analysed"
    );

    OutcomeShift {
        shift_detected,
        direction,
        co_movement: shift_detected && drift_detected,
        dominant_before,
        dominant_after,
        shares_before,
        shares_after,
        max_move,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn window(days: u32, positive: usize, stable: usize, negative: usize) -> WindowedDistribution {
        WindowedDistribution {
            window_days: days,
            cutoff: Utc::now(),
            event_count: positive + stable + negative,
            pathway_frequencies: vec![],
            outcome_frequencies: [
                (Outcome::Positive, positive),
                (Outcome::Stable, stable),
                (Outcome::Negative, negative),
            ]
            .into(),
            mean_alignment: 0.0,
            entropy: 0.0,
        }
    }

    #[test]
    fn dominant_tie_prefers_positive_then_stable() {
        let freq: BTreeMap<Outcome, usize> =
            [(Outcome::Negative, 2), (Outcome::Stable, 2), (Outcome::Positive, 1)].into();
        assert_eq!(dominant_outcome(&freq), Some(Outcome::Stable));

        let freq: BTreeMap<Outcome, usize> =
            [(Outcome::Negative, 2), (Outcome::Positive, 2)].into();
        assert_eq!(dominant_outcome(&freq), Some(Outcome::Positive));

        assert_eq!(dominant_outcome(&BTreeMap::new()), None);
    }

    #[test]
    fn improving_shift_with_drift_is_co_movement() {
        let windows = [window(90, 4, 14, 2), window(60, 5, 9, 2), window(30, 6, 3, 1)];
        let shift = analyze_outcomes(&windows, true, &EngineConfig::default());

        assert!(shift.shift_detected);
        assert_eq!(shift.dominant_before, Some(Outcome::Stable));
        assert_eq!(shift.dominant_after, Some(Outcome::Positive));
        assert_eq!(shift.direction, OutcomeDirection::Improving);
        assert!(shift.co_movement);
        assert!((shift.share_after(Outcome::Positive) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn shift_without_drift_is_not_co_movement() {
        let windows = [window(90, 4, 14, 2), window(30, 6, 3, 1)];
        let shift = analyze_outcomes(&windows, false, &EngineConfig::default());
        assert!(shift.shift_detected);
        assert!(!shift.co_movement);
    }

    #[test]
    fn worsening_shift() {
        let windows = [window(90, 6, 10, 4), window(30, 0, 4, 6)];
        let shift = analyze_outcomes(&windows, true, &EngineConfig::default());
        assert!(shift.shift_detected);
        assert_eq!(shift.direction, OutcomeDirection::Worsening);
    }

    #[test]
    fn small_movement_is_not_a_shift() {
        let windows = [window(90, 5, 10, 5), window(30, 1, 2, 1)];
        let shift = analyze_outcomes(&windows, true, &EngineConfig::default());
        assert!(!shift.shift_detected);
        assert_eq!(shift.direction, OutcomeDirection::Neutral);
        assert!(shift.max_move < 0.15);
    }

    #[test]
    fn single_window_reports_no_shift() {
        let shift = analyze_outcomes(&[window(90, 1, 0, 0)], true, &EngineConfig::default());
        assert!(!shift.shift_detected);
        assert!(shift.shares_before.is_empty());
    }
}
