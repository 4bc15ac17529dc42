//! Decision entropy: how unpredictable the observed decision paths are.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Category, ClinicalEvent, TrendDirection};

use super::helpers::normalize_label;
use super::messages::MessageTemplates;
use super::types::PathwayClusters;

/// Shannon entropy in bits over a frequency distribution.
/// A distribution with a single non-empty bucket is exactly 0.
pub fn shannon_entropy<I>(counts: I) -> f64
where
    I: IntoIterator<Item = usize>,
{
    let counts: Vec<usize> = counts.into_iter().filter(|&c| c > 0).collect();
    if counts.len() <= 1 {
        return 0.0;
    }

    let total: usize = counts.iter().sum();
    let h: f64 = counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum();
    h.max(0.0)
}

/// Entropy of cluster membership: each cluster's support fraction is p(x).
pub fn decision_entropy(clusters: &PathwayClusters) -> f64 {
    shannon_entropy(clusters.ranked.iter().map(|p| p.support))
}

// ---------------------------------------------------------------------------
// First-order transition model
// ---------------------------------------------------------------------------

/// First-order model over stage states. A state is one stage's label set
/// (e.g. `medication:cisplatin+gemcitabine`); empty stages are skipped, so
/// each event contributes a chain ending in its outcome state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransitionModel {
    transitions: BTreeMap<String, BTreeMap<String, usize>>,
    total: usize,
}

impl TransitionModel {
    pub fn from_events(events: &[&ClinicalEvent]) -> Self {
        let mut model = Self::default();

        for event in events {
            let states = stage_states(event);
            for pair in states.windows(2) {
                *model
                    .transitions
                    .entry(pair[0].clone())
                    .or_default()
                    .entry(pair[1].clone())
                    .or_insert(0) += 1;
                model.total += 1;
            }
        }

        model
    }

    /// Estimated P(to | from); 0 for an unseen source state.
    pub fn probability(&self, from: &str, to: &str) -> f64 {
        let Some(row) = self.transitions.get(from) else {
            return 0.0;
        };
        let row_total: usize = row.values().sum();
        if row_total == 0 {
            return 0.0;
        }
        *row.get(to).unwrap_or(&0) as f64 / row_total as f64
    }

    /// Conditional entropy H(next | current), weighted by how often each
    /// source state is left.
    pub fn conditional_entropy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.transitions
            .values()
            .map(|row| {
                let row_total: usize = row.values().sum();
                let weight = row_total as f64 / self.total as f64;
                weight * shannon_entropy(row.values().copied())
            })
            .sum()
    }

    pub fn distinct_transitions(&self) -> usize {
        self.transitions.values().map(|row| row.len()).sum()
    }

    pub fn total_transitions(&self) -> usize {
        self.total
    }
}

fn stage_states(event: &ClinicalEvent) -> Vec<String> {
    let mut states: Vec<String> = [
        Category::Symptom,
        Category::Test,
        Category::Medication,
        Category::Procedure,
    ]
    .into_iter()
    .filter_map(|category| {
        let mut labels: Vec<String> = event
            .labels(category)
            .iter()
            .map(|l| normalize_label(l))
            .filter(|l| !l.is_empty())
            .collect();
        if labels.is_empty() {
            return None;
        }
        labels.sort();
        labels.dedup();
        Some(format!("{}:{}", category.as_str(), labels.join("+")))
    })
    .collect();

    states.push(format!("outcome:{}", event.outcome.as_str()));
    states
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntropyTrend {
    pub delta: f64,
    pub direction: TrendDirection,
    pub descriptor: String,
}

/// Compare an entropy score with its reference. Movements inside
/// `tolerance` are stable.
pub fn describe_entropy_trend(current: f64, reference: f64, tolerance: f64) -> EntropyTrend {
    let delta = current - reference;
    let direction = if delta > tolerance {
        TrendDirection::Increasing
    } else if delta < -tolerance {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    EntropyTrend {
        delta,
        direction,
        descriptor: MessageTemplates::entropy_trend(direction, delta.abs()),
    }
}
