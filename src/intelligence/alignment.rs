//! Guideline alignment: weighted token overlap between observed pathways and
//! the guideline's canonical pathway.

use std::collections::BTreeSet;

use serde::Serialize;
use uuid::Uuid;

use crate::config::CategoryWeights;
use crate::models::{Category, GuidelineReference, TrendDirection};

use super::helpers::{normalize_label, relative_change_pct};
use super::messages::MessageTemplates;
use super::types::{PathwayClusters, Token};

fn category_weight(category: Category, weights: &CategoryWeights) -> f64 {
    match category {
        Category::Symptom => weights.symptom,
        Category::Test => weights.test,
        Category::Medication => weights.medication,
        Category::Procedure => weights.procedure,
        Category::Outcome => 0.0,
    }
}

/// Token set of the guideline's canonical pathway (no outcome token).
pub fn guideline_tokens(guideline: &GuidelineReference) -> BTreeSet<Token> {
    [
        Category::Symptom,
        Category::Test,
        Category::Medication,
        Category::Procedure,
    ]
    .into_iter()
    .flat_map(|category| {
        guideline
            .canonical_pathway
            .labels(category)
            .iter()
            .map(|l| normalize_label(l))
            .filter(|l| !l.is_empty())
            .map(move |l| Token::new(category, l))
    })
    .collect()
}

/// Weighted Jaccard: Σw(A ∩ B) / Σw(A ∪ B). Outcome tokens carry no weight.
/// Returns 0 when the weighted union is empty.
pub fn weighted_similarity(
    a: &BTreeSet<Token>,
    b: &BTreeSet<Token>,
    weights: &CategoryWeights,
) -> f64 {
    let weigh = |t: &Token| category_weight(t.category, weights);

    let union: f64 = a.union(b).map(weigh).sum();
    if union <= 0.0 {
        return 0.0;
    }
    let shared: f64 = a.intersection(b).map(weigh).sum();
    (shared / union).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignmentScore {
    /// Support-weighted mean similarity of the dominant pathways.
    pub headline: f64,
    /// Similarity of every ranked pathway, in rank order.
    pub per_pathway: Vec<(Uuid, f64)>,
}

pub fn score_alignment(
    clusters: &PathwayClusters,
    guideline: &BTreeSet<Token>,
    weights: &CategoryWeights,
) -> AlignmentScore {
    let per_pathway: Vec<(Uuid, f64)> = clusters
        .ranked
        .iter()
        .map(|p| (p.id, weighted_similarity(&p.tokens, guideline, weights)))
        .collect();

    let (weighted, support) = clusters
        .dominant()
        .iter()
        .zip(&per_pathway)
        .fold((0.0, 0usize), |(sum, n), (p, (_, sim))| {
            (sum + sim * p.support as f64, n + p.support)
        });

    let headline = if support == 0 {
        0.0
    } else {
        weighted / support as f64
    };

    AlignmentScore {
        headline,
        per_pathway,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentTrend {
    pub delta: f64,
    /// Magnitude of the relative change, in percent of the reference.
    pub percent: f64,
    pub direction: TrendDirection,
    pub descriptor: String,
}

/// Compare an alignment score with its reference. Absolute movements inside
/// `tolerance` are stable; the reported percentage is relative.
pub fn describe_alignment_trend(current: f64, reference: f64, tolerance: f64) -> AlignmentTrend {
    let delta = current - reference;
    let percent = relative_change_pct(current, reference).abs();
    let direction = if delta < -tolerance {
        TrendDirection::Decreasing
    } else if delta > tolerance {
        TrendDirection::Increasing
    } else {
        TrendDirection::Stable
    };

    AlignmentTrend {
        delta,
        percent,
        direction,
        descriptor: MessageTemplates::alignment_trend(direction, percent),
    }
}
