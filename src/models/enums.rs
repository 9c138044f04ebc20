use crate::error::InsightError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InsightError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InsightError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(TimeOfDay {
    Morning => "morning",
    Evening => "evening",
});

str_enum!(FlareState {
    Stable => "stable",
    EarlyFlare => "early_flare",
    ActiveFlare => "active_flare",
    PeakFlare => "peak_flare",
    ResolvingFlare => "resolving_flare",
});

// Variant order is the Ord order: confidence tiers only ever compare upward.
str_enum!(BaselineConfidence {
    Early => "early",
    Provisional => "provisional",
    Mature => "mature",
});

str_enum!(ConfidenceTier {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(ReactionPattern {
    OftenWorse => "often_worse",
    OftenBetter => "often_better",
    Mixed => "mixed",
    NoPattern => "no_pattern",
    InsufficientData => "insufficient_data",
});

str_enum!(TrendDirection {
    Improving => "improving",
    Worsening => "worsening",
    Stable => "stable",
});

str_enum!(CorrelationKind {
    Treatment => "treatment",
    TriggerAbsent => "trigger_absent",
    Sleep => "sleep",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trip_as_str() {
        assert_eq!(FlareState::from_str("peak_flare").unwrap(), FlareState::PeakFlare);
        assert_eq!(FlareState::PeakFlare.as_str(), "peak_flare");
        assert_eq!(
            ReactionPattern::from_str("insufficient_data").unwrap(),
            ReactionPattern::InsufficientData
        );
    }

    #[test]
    fn unknown_value_rejected() {
        assert!(TimeOfDay::from_str("midnight").is_err());
    }

    #[test]
    fn tiers_order_upward() {
        assert!(ConfidenceTier::Low < ConfidenceTier::Medium);
        assert!(ConfidenceTier::Medium < ConfidenceTier::High);
        assert!(BaselineConfidence::Early < BaselineConfidence::Provisional);
        assert!(BaselineConfidence::Provisional < BaselineConfidence::Mature);
    }
}
