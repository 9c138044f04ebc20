pub mod check_in;
pub mod enums;
pub mod trigger;

pub use check_in::{CheckIn, RawCheckIn, SymptomEntry, DEFAULT_SYMPTOM_SEVERITY};
pub use enums::{
    BaselineConfidence, ConfidenceTier, CorrelationKind, FlareState, ReactionPattern, TimeOfDay,
    TrendDirection,
};
pub use trigger::TriggerToken;
