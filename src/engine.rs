//! Top-level assembly: one call computes every derived entity the UI and
//! the coach context builder consume. Recomputation is wholesale and
//! idempotent; nothing here holds state between calls.

use serde::{Deserialize, Serialize};

use crate::aggregate::distinct_log_days;
use crate::flare::{analyze_flares, FlareAnalysis};
use crate::improvements::{analyze_what_helped, WhatHelped};
use crate::models::CheckIn;
use crate::reactions::{analyze_reactions, FoodAnalysis};
use crate::summary::{symptom_overview, SymptomSummary};

/// Complete analysis of a check-in history — single response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub flares: FlareAnalysis,
    pub reactions: Vec<FoodAnalysis>,
    pub what_helped: WhatHelped,
    pub symptoms: Vec<SymptomSummary>,
    pub check_in_count: usize,
    pub distinct_log_days: usize,
}

impl InsightReport {
    /// Machine-readable form for IPC or prompt-side tooling.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Runs every analyzer over the same snapshot of the check-in store.
pub fn build_insight_report(check_ins: &[CheckIn]) -> InsightReport {
    InsightReport {
        flares: analyze_flares(check_ins),
        reactions: analyze_reactions(check_ins),
        what_helped: analyze_what_helped(check_ins),
        symptoms: symptom_overview(check_ins),
        check_in_count: check_ins.len(),
        distinct_log_days: distinct_log_days(check_ins),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BaselineConfidence, FlareState, TimeOfDay};
    use chrono::{Duration, NaiveDate};
    use uuid::Uuid;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 2).unwrap() + Duration::days(i64::from(n) - 1)
    }

    fn check_in(date: NaiveDate, feeling: u8) -> CheckIn {
        CheckIn {
            id: Uuid::new_v4(),
            recorded_at: date.and_hms_opt(9, 30, 0).unwrap(),
            skin_feeling: feeling,
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
    fn empty_store_yields_empty_but_valid_report() {
        let report = build_insight_report(&[]);
        assert_eq!(report.flares.current_state, FlareState::Stable);
        assert_eq!(report.flares.baseline_confidence, BaselineConfidence::Early);
        assert!(report.reactions.is_empty());
        assert!(matches!(report.what_helped, WhatHelped::Locked { days_logged: 0, .. }));
        assert!(report.symptoms.is_empty());
        assert_eq!(report.check_in_count, 0);
    }

    #[test]
    fn report_is_deterministic() {
        let entries: Vec<CheckIn> = (1..=40)
            .map(|n| check_in(day(n), if n % 7 == 0 { 2 } else { 4 }))
            .collect();
        assert_eq!(build_insight_report(&entries), build_insight_report(&entries));
    }

    #[test]
    fn input_slice_left_untouched() {
        let entries: Vec<CheckIn> = (1..=10).rev().map(|n| check_in(day(n), 3)).collect();
        let before = entries.clone();
        let _ = build_insight_report(&entries);
        assert_eq!(entries, before);
    }

    #[test]
    fn json_form_round_trips() {
        let entries: Vec<CheckIn> = (1..=10).map(|n| check_in(day(n), 3)).collect();
        let report = build_insight_report(&entries);
        let json = report.to_json();
        let parsed: InsightReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
