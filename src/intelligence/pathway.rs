//! Pathway construction and greedy clustering.
//!
//! Each event becomes a canonical token sequence (symptoms → tests →
//! medications → procedures → outcome, labels sorted inside a stage).
//! Events are clustered in input order: an event joins the first cluster
//! whose representative is at least `similarity_threshold` similar, else it
//! seeds a new cluster. Cluster assignment is therefore fully determined by
//! input order.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::models::{Category, ClinicalEvent};

use super::helpers::{display_label, jaccard, normalize_label};
use super::types::{Pathway, PathwayClusters, Token};

/// Namespace for pathway identifiers (UUID v5 over the canonical key).
const PATHWAY_NAMESPACE: Uuid = Uuid::from_u128(0x6c0d_3a1e_42f5_4b8e_9d1c_7f3a_52e0_b614);

const LABEL_STAGES: [Category; 4] = [
    Category::Symptom,
    Category::Test,
    Category::Medication,
    Category::Procedure,
];

/// Canonical token set of one event, outcome included.
pub fn canonical_tokens(event: &ClinicalEvent) -> BTreeSet<Token> {
    let mut tokens: BTreeSet<Token> = LABEL_STAGES
        .iter()
        .flat_map(|&category| {
            event
                .labels(category)
                .iter()
                .map(|l| normalize_label(l))
                .filter(|l| !l.is_empty())
                .map(move |l| Token::new(category, l))
        })
        .collect();
    tokens.insert(Token::new(Category::Outcome, event.outcome.as_str()));
    tokens
}

/// Canonical sequence as a single string, e.g.
/// `symptom:cough|test:ct scan|medication:cisplatin|outcome:stable`.
pub fn canonical_key(tokens: &BTreeSet<Token>) -> String {
    tokens.iter().map(Token::key).collect::<Vec<_>>().join("|")
}

/// Human-readable pathway: `Symptoms(a, b) → t1/t2 → m1 → p1 → Outcome`.
/// Empty stages are skipped; labels keep the event's spelling, sorted by
/// their normalised form and deduplicated.
pub fn render_pathway(event: &ClinicalEvent) -> String {
    let mut parts = Vec::with_capacity(5);

    for category in LABEL_STAGES {
        let labels: BTreeMap<String, String> = event
            .labels(category)
            .iter()
            .filter(|l| !l.trim().is_empty())
            .fold(BTreeMap::new(), |mut acc, l| {
                acc.entry(normalize_label(l)).or_insert_with(|| display_label(l));
                acc
            });
        if labels.is_empty() {
            continue;
        }
        let shown: Vec<String> = labels.into_values().collect();
        match category {
            Category::Symptom => parts.push(format!("Symptoms({})", shown.join(", "))),
            _ => parts.push(shown.join("/")),
        }
    }

    parts.push(event.outcome.display_label().to_string());
    parts.join(" → ")
}

/// Cluster events into ranked pathways.
///
/// Ranking: support descending, ties broken by first appearance. The top
/// `dominant_top_k` are dominant; a non-empty batch always has at least one.
pub fn build_pathways(events: &[&ClinicalEvent], config: &EngineConfig) -> PathwayClusters {
    let mut clusters: Vec<Pathway> = Vec::new();

    for (index, event) in events.iter().enumerate() {
        let tokens = canonical_tokens(event);

        let joined = clusters
            .iter_mut()
            .find(|c| jaccard(&c.tokens, &tokens) >= config.similarity_threshold);

        match joined {
            Some(cluster) => {
                cluster.support += 1;
                cluster.event_ids.push(event.id.clone());
            }
            None => {
                let id = Uuid::new_v5(&PATHWAY_NAMESPACE, canonical_key(&tokens).as_bytes());
                clusters.push(Pathway {
                    id,
                    tokens,
                    display: render_pathway(event),
                    support: 1,
                    event_ids: vec![event.id.clone()],
                    first_index: index,
                });
            }
        }
    }

    clusters.sort_by(|a, b| {
        b.support
            .cmp(&a.support)
            .then(a.first_index.cmp(&b.first_index))
    });

    let dominant_count = clusters.len().min(config.dominant_top_k);

    tracing::debug!(
        events = events.len(),
        clusters = clusters.len(),
        dominant = dominant_count,
        "Pathway clustering complete"
    );

    PathwayClusters {
        ranked: clusters,
        dominant_count,
        alternative_display_cap: config.alternative_display_cap,
    }
}
