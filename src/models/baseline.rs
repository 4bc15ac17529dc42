use serde::{Deserialize, Serialize};

/// One point of a caller-held historical series (e.g. one per month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    pub alignment: f64,
    pub entropy: f64,
}

/// Prior scores the current run is compared against.
///
/// Explicit `alignment` / `entropy` win over the history; otherwise the most
/// recent history point is used.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriorScores {
    #[serde(default)]
    pub alignment: Option<f64>,
    #[serde(default)]
    pub entropy: Option<f64>,
    #[serde(default)]
    pub history: Vec<TrendPoint>,
}

impl PriorScores {
    pub fn prior_alignment(&self) -> Option<f64> {
        self.alignment
            .or_else(|| self.history.last().map(|p| p.alignment))
            .filter(|v| v.is_finite())
    }

    pub fn prior_entropy(&self) -> Option<f64> {
        self.entropy
            .or_else(|| self.history.last().map(|p| p.entropy))
            .filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<TrendPoint> {
        vec![
            TrendPoint { period: "2025-12".into(), alignment: 0.90, entropy: 0.18 },
            TrendPoint { period: "2026-01".into(), alignment: 0.88, entropy: 0.22 },
        ]
    }

    #[test]
    fn explicit_prior_wins_over_history() {
        let prior = PriorScores {
            alignment: Some(0.95),
            entropy: None,
            history: history(),
        };
        assert_eq!(prior.prior_alignment(), Some(0.95));
        assert_eq!(prior.prior_entropy(), Some(0.22));
    }

    #[test]
    fn empty_baseline_has_no_priors() {
        let prior = PriorScores::default();
        assert!(prior.prior_alignment().is_none());
        assert!(prior.prior_entropy().is_none());
    }

    #[test]
    fn non_finite_prior_ignored() {
        let prior = PriorScores {
            alignment: Some(f64::NAN),
            ..PriorScores::default()
        };
        assert!(prior.prior_alignment().is_none());
    }

    #[test]
    fn bundled_baseline_uses_latest_month() {
        let path = crate::config::default_resources_dir().join("sample_baseline.json");
        let raw = std::fs::read_to_string(path).unwrap();
        let prior: PriorScores = serde_json::from_str(&raw).unwrap();
        assert_eq!(prior.history.len(), 5);
        assert_eq!(prior.prior_alignment(), Some(0.82));
        assert_eq!(prior.prior_entropy(), Some(0.31));
    }
}
