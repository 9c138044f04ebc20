//! Human-readable summary support for the coach context builder.
//!
//! The external chat layer appends a plain-text block of the user's own
//! data to its system prompt; this module renders every derived entity as
//! one summary line and computes the per-symptom overview (frequency,
//! average severity, trend direction) that block needs.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::engine::InsightReport;
use crate::models::{CheckIn, TrendDirection};
use crate::improvements::WhatHelped;

/// Days of history considered "recent" when computing trend direction.
const TREND_WINDOW_DAYS: i64 = 14;

/// Average-severity shift required to call a trend.
const TREND_DELTA: f64 = 0.3;

/// Per-symptom rollup across the whole history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomSummary {
    pub name: String,
    /// Check-ins mentioning the symptom.
    pub occurrences: usize,
    pub avg_severity: f64,
    pub trend: TrendDirection,
}

/// Frequency, severity and trend per distinct symptom name
/// (case-insensitive), most frequent first.
pub fn symptom_overview(check_ins: &[CheckIn]) -> Vec<SymptomSummary> {
    let Some(anchor) = check_ins.iter().map(|c| c.local_date()).max() else {
        return Vec::new();
    };
    let recent_cutoff = anchor - Duration::days(TREND_WINDOW_DAYS);

    // key -> (label, severities, recent severities, earlier severities)
    let mut groups: BTreeMap<String, (String, Vec<f64>, Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for check_in in check_ins {
        for symptom in &check_in.symptoms {
            let key = symptom.name.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            let severity = f64::from(symptom.effective_severity());
            let entry = groups
                .entry(key)
                .or_insert_with(|| (symptom.name.trim().to_string(), vec![], vec![], vec![]));
            entry.1.push(severity);
            if check_in.local_date() > recent_cutoff {
                entry.2.push(severity);
            } else {
                entry.3.push(severity);
            }
        }
    }

    let mut summaries: Vec<SymptomSummary> = groups
        .into_values()
        .map(|(name, all, recent, earlier)| {
            let avg_severity = mean(&all).unwrap_or(0.0);
            let trend = match (mean(&recent), mean(&earlier)) {
                (Some(r), Some(e)) if r - e >= TREND_DELTA => TrendDirection::Worsening,
                (Some(r), Some(e)) if e - r >= TREND_DELTA => TrendDirection::Improving,
                _ => TrendDirection::Stable,
            };
            SymptomSummary {
                name,
                occurrences: all.len(),
                avg_severity,
                trend,
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.occurrences.cmp(&a.occurrences).then_with(|| a.name.cmp(&b.name)));
    summaries
}

/// Renders the full report as plain summary lines, one per derived fact.
pub fn coach_context_lines(report: &InsightReport) -> Vec<String> {
    let mut lines = Vec::new();

    let flares = &report.flares;
    lines.push(format!(
        "Flare status: {} (baseline burden {:.1}, {} baseline, {} episode(s) on record).",
        flares.current_state.as_str(),
        flares.baseline_burden,
        flares.baseline_confidence.as_str(),
        flares.episodes.len(),
    ));
    if let Some(days) = flares.current_flare_days {
        lines.push(format!("Current flare has lasted {days} day(s)."));
    }

    for reaction in &report.reactions {
        lines.push(format!(
            "{}: logged {}x; {} worse / {} better / {} neutral after exposure; pattern {} ({} confidence).",
            reaction.name,
            reaction.count,
            reaction.days_worse_after,
            reaction.days_better_after,
            reaction.days_neutral_after,
            reaction.pattern.as_str(),
            reaction.confidence.as_str(),
        ));
    }

    match &report.what_helped {
        WhatHelped::Locked { days_logged, days_required } => {
            lines.push(format!(
                "Improvement analysis locked: {days_logged}/{days_required} days logged."
            ));
        }
        WhatHelped::NoPattern { weeks_analyzed } => {
            lines.push(format!(
                "No significant improvement periods across {weeks_analyzed} week(s)."
            ));
        }
        WhatHelped::Findings { periods, correlations, confidence, .. } => {
            lines.push(format!(
                "{} improvement period(s) detected ({} confidence).",
                periods.len(),
                confidence.as_str(),
            ));
            for correlation in correlations {
                lines.push(format!(
                    "{} ({}): {:.0}% of improvement weeks vs {:.0}% of baseline weeks ({:.1}x).",
                    correlation.label,
                    correlation.kind.as_str(),
                    correlation.improvement_usage * 100.0,
                    correlation.baseline_usage * 100.0,
                    correlation.correlation_ratio,
                ));
            }
        }
    }

    for symptom in &report.symptoms {
        lines.push(format!(
            "{}: {} report(s), average severity {:.1}, trend {}.",
            symptom.name,
            symptom.occurrences,
            symptom.avg_severity,
            symptom.trend.as_str(),
        ));
    }

    lines
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::build_insight_report;
    use crate::models::{SymptomEntry, TimeOfDay};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap() + Duration::days(i64::from(n) - 1)
    }

    fn check_in_with_symptom(date: NaiveDate, symptom: &str, severity: u8) -> CheckIn {
        CheckIn {
            id: Uuid::new_v4(),
            recorded_at: date.and_hms_opt(8, 0, 0).unwrap(),
            skin_feeling: 3,
            skin_intensity: None,
            mood: None,
            sleep_score: None,
            pain_score: None,
            symptoms: vec![SymptomEntry { name: symptom.into(), severity: Some(severity) }],
            triggers: vec![],
            treatments: vec![],
            notes: None,
            time_of_day: TimeOfDay::Morning,
        }
    }

    #[test]
    fn empty_history_gives_empty_overview() {
        assert!(symptom_overview(&[]).is_empty());
    }

    #[test]
    fn symptoms_grouped_case_insensitively_and_sorted() {
        let entries = vec![
            check_in_with_symptom(day(1), "Itching", 2),
            check_in_with_symptom(day(2), "itching", 2),
            check_in_with_symptom(day(3), "oozing", 3),
        ];
        let overview = symptom_overview(&entries);
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].name, "Itching");
        assert_eq!(overview[0].occurrences, 2);
        assert_eq!(overview[1].occurrences, 1);
    }

    #[test]
    fn easing_severity_reads_as_improving() {
        // Severe early, mild in the last two weeks.
        let mut entries: Vec<CheckIn> =
            (1..=20).map(|n| check_in_with_symptom(day(n), "itching", 3)).collect();
        entries.extend((21..=30).map(|n| check_in_with_symptom(day(n), "itching", 1)));

        let overview = symptom_overview(&entries);
        assert_eq!(overview[0].trend, TrendDirection::Improving);
    }

    #[test]
    fn short_history_trend_is_stable() {
        let entries = vec![check_in_with_symptom(day(1), "itching", 3)];
        assert_eq!(symptom_overview(&entries)[0].trend, TrendDirection::Stable);
    }

    #[test]
    fn context_lines_cover_every_section() {
        let entries: Vec<CheckIn> =
            (1..=10).map(|n| check_in_with_symptom(day(n), "itching", 2)).collect();
        let report = build_insight_report(&entries);
        let lines = coach_context_lines(&report);

        assert!(lines.iter().any(|l| l.starts_with("Flare status:")));
        assert!(lines.iter().any(|l| l.contains("days logged")));
        assert!(lines.iter().any(|l| l.contains("average severity")));
    }

    #[test]
    fn empty_report_still_renders() {
        let report = build_insight_report(&[]);
        let lines = coach_context_lines(&report);
        assert!(lines.iter().any(|l| l.contains("stable")));
    }
}
