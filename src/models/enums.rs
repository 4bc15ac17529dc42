use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde form.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Outcome {
    Positive => "positive",
    Negative => "negative",
    Stable => "stable",
});

// Declaration order is the canonical stage order.
str_enum!(Category {
    Symptom => "symptom",
    Test => "test",
    Medication => "medication",
    Procedure => "procedure",
    Outcome => "outcome",
});

str_enum!(TrendDirection {
    Increasing => "increasing",
    Decreasing => "decreasing",
    Stable => "stable",
});

str_enum!(DriftType {
    SustainedProtocolDivergence => "Sustained Protocol Divergence",
    TransientOutlier => "Transient Outlier",
    NoSignificantDrift => "No Significant Drift",
});

// Declaration order is severity order.
str_enum!(DriftMagnitude {
    None => "None",
    Low => "Low",
    Medium => "Medium",
    MediumHigh => "Medium-High",
    High => "High",
});

str_enum!(OutcomeDirection {
    Improving => "improving",
    Worsening => "worsening",
    Neutral => "neutral",
});

str_enum!(ConfidenceLevel {
    Low => "Low",
    Medium => "Medium",
    High => "High",
});

// Declaration order is severity order.
str_enum!(RiskLevel {
    Observational => "observational",
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(RecommendationType {
    ReviewDiscussionOnly => "review_discussion_only",
    PathwayUpdateRequired => "pathway_update_required",
    UrgentReview => "urgent_review",
});

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Positive, Outcome::Stable, Outcome::Negative];

    /// Capitalised form used in rendered pathways.
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Stable => "Stable",
        }
    }

    /// Tie-break order when two outcomes have equal counts (lower wins).
    pub fn tie_priority(&self) -> u8 {
        match self {
            Self::Positive => 0,
            Self::Stable => 1,
            Self::Negative => 2,
        }
    }
}

impl DriftMagnitude {
    pub fn rank(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::MediumHigh => 3,
            Self::High => 4,
        }
    }

    /// One tier up, saturating at `High`. `None` stays `None`.
    pub fn escalate(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Low => Self::Medium,
            Self::Medium => Self::MediumHigh,
            Self::MediumHigh | Self::High => Self::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn outcome_round_trip() {
        for outcome in Outcome::ALL {
            assert_eq!(Outcome::from_str(outcome.as_str()).unwrap(), outcome);
        }
    }

    #[test]
    fn unknown_value_is_rejected() {
        let err = RiskLevel::from_str("critical").unwrap_err();
        assert!(err.to_string().contains("RiskLevel"));
    }

    #[test]
    fn serde_uses_display_strings() {
        assert_eq!(
            serde_json::to_string(&DriftMagnitude::MediumHigh).unwrap(),
            "\"Medium-High\""
        );
        assert_eq!(
            serde_json::to_string(&DriftType::TransientOutlier).unwrap(),
            "\"Transient Outlier\""
        );
        let parsed: Outcome = serde_json::from_str("\"negative\"").unwrap();
        assert_eq!(parsed, Outcome::Negative);
    }

    #[test]
    fn severity_orders_follow_declaration() {
        assert!(RiskLevel::Observational < RiskLevel::Low);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(DriftMagnitude::Medium < DriftMagnitude::MediumHigh);
        assert!(Category::Symptom < Category::Outcome);
    }

    #[test]
    fn magnitude_escalation_saturates() {
        assert_eq!(DriftMagnitude::Medium.escalate(), DriftMagnitude::MediumHigh);
        assert_eq!(DriftMagnitude::High.escalate(), DriftMagnitude::High);
        assert_eq!(DriftMagnitude::None.escalate(), DriftMagnitude::None);
        assert_eq!(DriftMagnitude::MediumHigh.rank(), 3);
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(DriftType::NoSignificantDrift.to_string(), "No Significant Drift");
        assert_eq!(Outcome::Positive.display_label(), "Positive");
    }
}
