use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InsightError;

use super::enums::TimeOfDay;

/// Severity assumed when a symptom entry arrives without one.
pub const DEFAULT_SYMPTOM_SEVERITY: u8 = 2;

/// One symptom noted during a check-in. Severity is 1 (mild) to 3 (severe).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomEntry {
    pub name: String,
    pub severity: Option<u8>,
}

impl SymptomEntry {
    pub fn effective_severity(&self) -> u8 {
        self.severity.unwrap_or(DEFAULT_SYMPTOM_SEVERITY)
    }
}

/// A single logged check-in.
///
/// Timestamps are local wall-clock with no offset; every analyzer buckets
/// by the recorded local calendar date, never a UTC-normalized one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: Uuid,
    pub recorded_at: NaiveDateTime,
    /// 1 = worst, 5 = best.
    pub skin_feeling: u8,
    /// 0 = clear, 4 = severe. Alternate severity axis, often unlogged.
    pub skin_intensity: Option<u8>,
    /// 1–5.
    pub mood: Option<u8>,
    /// 1–5.
    pub sleep_score: Option<u8>,
    /// 0–10.
    pub pain_score: Option<u8>,
    pub symptoms: Vec<SymptomEntry>,
    /// Raw trigger tokens as logged; parse with `TriggerToken::parse`.
    pub triggers: Vec<String>,
    pub treatments: Vec<String>,
    pub notes: Option<String>,
    pub time_of_day: TimeOfDay,
}

impl CheckIn {
    /// Local calendar date of the check-in.
    pub fn local_date(&self) -> NaiveDate {
        self.recorded_at.date()
    }

    /// Severity on the 0–4 intensity axis. Falls back to the inverse of
    /// skin feeling when intensity was not logged.
    pub fn intensity(&self) -> f64 {
        match self.skin_intensity {
            Some(i) => f64::from(i),
            None => f64::from(5 - self.skin_feeling.min(5)),
        }
    }

    /// Summed effective symptom severity for this check-in.
    pub fn symptom_load(&self) -> f64 {
        self.symptoms
            .iter()
            .map(|s| f64::from(s.effective_severity()))
            .sum()
    }
}

/// Check-in exactly as the persistence/sync layer delivers it: timestamp
/// still an ISO-like local string, ranges unchecked. Converting into
/// `CheckIn` is the only fallible surface of the crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCheckIn {
    pub id: Uuid,
    pub timestamp: String,
    pub skin_feeling: u8,
    pub skin_intensity: Option<u8>,
    pub mood: Option<u8>,
    pub sleep_score: Option<u8>,
    pub pain_score: Option<u8>,
    #[serde(default)]
    pub symptoms: Vec<SymptomEntry>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub treatments: Vec<String>,
    pub notes: Option<String>,
    pub time_of_day: TimeOfDay,
}

impl TryFrom<RawCheckIn> for CheckIn {
    type Error = InsightError;

    fn try_from(raw: RawCheckIn) -> Result<Self, Self::Error> {
        let recorded_at = parse_local_timestamp(&raw.timestamp)?;

        check_range("skin_feeling", raw.skin_feeling, 1, 5)?;
        if let Some(i) = raw.skin_intensity {
            check_range("skin_intensity", i, 0, 4)?;
        }
        if let Some(m) = raw.mood {
            check_range("mood", m, 1, 5)?;
        }
        if let Some(s) = raw.sleep_score {
            check_range("sleep_score", s, 1, 5)?;
        }
        if let Some(p) = raw.pain_score {
            check_range("pain_score", p, 0, 10)?;
        }
        for symptom in &raw.symptoms {
            if let Some(sev) = symptom.severity {
                check_range("symptom severity", sev, 1, 3)?;
            }
        }

        Ok(CheckIn {
            id: raw.id,
            recorded_at,
            skin_feeling: raw.skin_feeling,
            skin_intensity: raw.skin_intensity,
            mood: raw.mood,
            sleep_score: raw.sleep_score,
            pain_score: raw.pain_score,
            symptoms: raw.symptoms,
            triggers: raw.triggers,
            treatments: raw.treatments,
            notes: raw.notes,
            time_of_day: raw.time_of_day,
        })
    }
}

/// Parses an ISO-like timestamp under local wall-clock semantics.
/// A trailing `Z` is stripped, not converted: the clock reading stands
/// as recorded so date bucketing never shifts across timezone changes.
fn parse_local_timestamp(value: &str) -> Result<NaiveDateTime, InsightError> {
    let trimmed = value.trim().trim_end_matches('Z');

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    Err(InsightError::InvalidTimestamp {
        value: value.to_string(),
    })
}

fn check_range(field: &'static str, value: u8, min: u8, max: u8) -> Result<(), InsightError> {
    if value < min || value > max {
        return Err(InsightError::RatingOutOfRange {
            field,
            value: i64::from(value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(timestamp: &str) -> RawCheckIn {
        RawCheckIn {
            id: Uuid::new_v4(),
            timestamp: timestamp.into(),
            skin_feeling: 3,
            skin_intensity: None,
            mood: None,
            sleep_score: None,
            pain_score: None,
            symptoms: vec![],
            triggers: vec![],
            treatments: vec![],
            notes: None,
            time_of_day: TimeOfDay::Morning,
        }
    }

    #[test]
    fn parses_common_timestamp_shapes() {
        for ts in [
            "2024-03-05T08:30:00",
            "2024-03-05T08:30:00.123",
            "2024-03-05 08:30:00",
            "2024-03-05",
        ] {
            let check_in = CheckIn::try_from(raw(ts)).unwrap();
            assert_eq!(
                check_in.local_date(),
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
            );
        }
    }

    #[test]
    fn trailing_z_keeps_wall_clock() {
        // 23:30Z must stay on the recorded date, not roll into the next day.
        let check_in = CheckIn::try_from(raw("2024-03-05T23:30:00Z")).unwrap();
        assert_eq!(
            check_in.local_date(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn garbage_timestamp_rejected() {
        assert!(matches!(
            CheckIn::try_from(raw("last tuesday")),
            Err(InsightError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn out_of_range_rating_rejected() {
        let mut bad = raw("2024-03-05T08:30:00");
        bad.skin_feeling = 6;
        assert!(matches!(
            CheckIn::try_from(bad),
            Err(InsightError::RatingOutOfRange { field: "skin_feeling", .. })
        ));
    }

    #[test]
    fn intensity_falls_back_to_inverted_feeling() {
        let mut r = raw("2024-03-05T08:30:00");
        r.skin_feeling = 2;
        let check_in = CheckIn::try_from(r).unwrap();
        assert_eq!(check_in.intensity(), 3.0);

        let mut r = raw("2024-03-05T08:30:00");
        r.skin_intensity = Some(4);
        let check_in = CheckIn::try_from(r).unwrap();
        assert_eq!(check_in.intensity(), 4.0);
    }

    #[test]
    fn missing_symptom_severity_defaults_to_two() {
        let entry = SymptomEntry { name: "itching".into(), severity: None };
        assert_eq!(entry.effective_severity(), DEFAULT_SYMPTOM_SEVERITY);
    }
}
