use thiserror::Error;

/// Errors raised at the input-validation boundary only.
///
/// The analytic functions themselves never fail: missing optional fields
/// resolve to documented fallbacks, and insufficient data degrades to an
/// explicit value state (`insufficient_data`, locked, empty episode list).
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Unparseable timestamp: {value}")]
    InvalidTimestamp { value: String },

    #[error("Rating out of range for {field}: {value}")]
    RatingOutOfRange { field: &'static str, value: i64 },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
