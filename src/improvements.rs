//! Weekly improvement correlator ("what helped"): finds calendar weeks
//! where the skin meaningfully improved versus two weeks prior, then
//! reports the treatments, absent triggers, and sleep changes that
//! co-occurred with those improvements.
//!
//! The whole feature stays locked until enough distinct days are logged;
//! locked and no-pattern are value states the UI renders distinctly.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::aggregate::distinct_log_days;
use crate::models::{CheckIn, ConfidenceTier, CorrelationKind, TriggerToken};

/// Distinct logged days required before the analysis unlocks.
const REQUIRED_LOG_DAYS: usize = 30;

/// Non-empty calendar weeks required before improvement detection runs.
const MIN_WEEKS: usize = 3;

/// Week-over-two-weeks skin feeling gain that flags an improvement.
const SKIN_IMPROVEMENT_DELTA: f64 = 0.5;

/// Week-over-two-weeks symptom severity drop that flags an improvement.
const SYMPTOM_IMPROVEMENT_DELTA: f64 = 0.3;

/// Usage-rate ratio a factor must clear to be reported.
const HELPFUL_RATIO: f64 = 1.3;

/// Minimum usage rate in the favored partition.
const USAGE_FLOOR: f64 = 0.3;

/// Minimum sleep-score gain reported as a sleep factor.
const SLEEP_DELTA: f64 = 0.5;

/// Floor applied to ratio denominators so a factor never seen in the
/// other partition still yields a finite, sortable ratio.
const RATE_FLOOR: f64 = 0.1;

// ─── Derived types ───────────────────────────────────────────────────────────

/// One calendar week of check-ins (weeks start Sunday). Weeks with zero
/// check-ins are never constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub week_start: NaiveDate,
    pub avg_skin_feeling: f64,
    pub avg_symptom_severity: f64,
    pub avg_sleep: Option<f64>,
    pub treatments: BTreeSet<String>,
    pub triggers: BTreeSet<String>,
    pub check_in_count: usize,
}

/// The transition weeks over which an improvement unfolded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementPeriod {
    pub start_week: NaiveDate,
    pub end_week: NaiveDate,
    pub skin_delta: f64,
    pub symptom_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub id: String,
    pub label: String,
    pub kind: CorrelationKind,
    pub correlation_ratio: f64,
    /// Usage rate in improvement weeks (average score for sleep).
    pub improvement_usage: f64,
    /// Usage rate in baseline weeks (average score for sleep).
    pub baseline_usage: f64,
    pub confidence: ConfidenceTier,
}

/// Terminal states of the analysis. Locked and no-pattern are results,
/// not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WhatHelped {
    Locked {
        days_logged: usize,
        days_required: usize,
    },
    NoPattern {
        weeks_analyzed: usize,
    },
    Findings {
        weeks_analyzed: usize,
        periods: Vec<ImprovementPeriod>,
        correlations: Vec<CorrelationResult>,
        confidence: ConfidenceTier,
    },
}

// ─── Analysis ────────────────────────────────────────────────────────────────

/// Full "what helped" analysis over a check-in history.
pub fn analyze_what_helped(check_ins: &[CheckIn]) -> WhatHelped {
    let days_logged = distinct_log_days(check_ins);
    if days_logged < REQUIRED_LOG_DAYS {
        tracing::debug!(days_logged, days_required = REQUIRED_LOG_DAYS, "what-helped locked");
        return WhatHelped::Locked {
            days_logged,
            days_required: REQUIRED_LOG_DAYS,
        };
    }

    let weeks = weekly_summaries(check_ins);
    if weeks.len() < MIN_WEEKS {
        return WhatHelped::NoPattern { weeks_analyzed: weeks.len() };
    }

    let periods = detect_improvement_periods(&weeks);
    if periods.is_empty() {
        return WhatHelped::NoPattern { weeks_analyzed: weeks.len() };
    }

    let confidence = confidence_for(periods.len());
    let correlations = correlate(&weeks, &periods, confidence);

    WhatHelped::Findings {
        weeks_analyzed: weeks.len(),
        periods,
        correlations,
        confidence,
    }
}

/// Sunday on or before the given date.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Buckets check-ins into calendar weeks, oldest first. Only weeks that
/// contain at least one check-in appear.
pub fn weekly_summaries(check_ins: &[CheckIn]) -> Vec<WeekSummary> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&CheckIn>> = BTreeMap::new();
    for check_in in check_ins {
        buckets
            .entry(week_start(check_in.local_date()))
            .or_default()
            .push(check_in);
    }

    buckets
        .into_iter()
        .map(|(start, entries)| {
            let n = entries.len() as f64;
            let avg_skin_feeling =
                entries.iter().map(|c| f64::from(c.skin_feeling)).sum::<f64>() / n;

            let severities: Vec<f64> = entries
                .iter()
                .flat_map(|c| c.symptoms.iter())
                .map(|s| f64::from(s.effective_severity()))
                .collect();
            let avg_symptom_severity = if severities.is_empty() {
                0.0
            } else {
                severities.iter().sum::<f64>() / severities.len() as f64
            };

            let sleep: Vec<f64> = entries
                .iter()
                .filter_map(|c| c.sleep_score.map(f64::from))
                .collect();
            let avg_sleep = if sleep.is_empty() {
                None
            } else {
                Some(sleep.iter().sum::<f64>() / sleep.len() as f64)
            };

            let treatments = entries
                .iter()
                .flat_map(|c| c.treatments.iter())
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();

            let triggers = entries
                .iter()
                .flat_map(|c| c.triggers.iter())
                .map(|raw| TriggerToken::parse(raw))
                .filter(|t| !t.is_diary_entry())
                .map(|t| t.name().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();

            WeekSummary {
                week_start: start,
                avg_skin_feeling,
                avg_symptom_severity,
                avg_sleep,
                treatments,
                triggers,
                check_in_count: entries.len(),
            }
        })
        .collect()
}

/// Compares each week to the one two positions earlier; a sufficient skin
/// gain or symptom drop flags the transition as an improvement period.
fn detect_improvement_periods(weeks: &[WeekSummary]) -> Vec<ImprovementPeriod> {
    let mut periods = Vec::new();
    for i in 2..weeks.len() {
        let skin_delta = weeks[i].avg_skin_feeling - weeks[i - 2].avg_skin_feeling;
        let symptom_delta = weeks[i].avg_symptom_severity - weeks[i - 2].avg_symptom_severity;
        if skin_delta >= SKIN_IMPROVEMENT_DELTA || symptom_delta <= -SYMPTOM_IMPROVEMENT_DELTA {
            periods.push(ImprovementPeriod {
                start_week: weeks[i - 1].week_start,
                end_week: weeks[i].week_start,
                skin_delta,
                symptom_delta,
            });
        }
    }
    periods
}

fn confidence_for(period_count: usize) -> ConfidenceTier {
    match period_count {
        0 | 1 => ConfidenceTier::Low,
        2 => ConfidenceTier::Medium,
        _ => ConfidenceTier::High,
    }
}

fn correlate(
    weeks: &[WeekSummary],
    periods: &[ImprovementPeriod],
    confidence: ConfidenceTier,
) -> Vec<CorrelationResult> {
    let improvement_starts: BTreeSet<NaiveDate> = periods
        .iter()
        .flat_map(|p| [p.start_week, p.end_week])
        .collect();

    let (improvement, baseline): (Vec<&WeekSummary>, Vec<&WeekSummary>) = weeks
        .iter()
        .partition(|w| improvement_starts.contains(&w.week_start));

    let mut results = Vec::new();

    // Treatments used more during improvement weeks.
    let all_treatments = union_of(weeks.iter().map(|w| &w.treatments));
    for name in all_treatments {
        let improvement_usage = usage_rate(&improvement, |w| w.treatments.contains(&name));
        let baseline_usage = usage_rate(&baseline, |w| w.treatments.contains(&name));
        let ratio = improvement_usage / baseline_usage.max(RATE_FLOOR);
        if improvement_usage > USAGE_FLOOR && ratio > HELPFUL_RATIO {
            results.push(CorrelationResult {
                id: format!("treatment:{name}"),
                label: name,
                kind: CorrelationKind::Treatment,
                correlation_ratio: ratio,
                improvement_usage,
                baseline_usage,
                confidence,
            });
        }
    }

    // Triggers notably absent during improvement weeks.
    let all_triggers = union_of(weeks.iter().map(|w| &w.triggers));
    for name in all_triggers {
        let improvement_usage = usage_rate(&improvement, |w| w.triggers.contains(&name));
        let baseline_usage = usage_rate(&baseline, |w| w.triggers.contains(&name));
        let ratio = baseline_usage / improvement_usage.max(RATE_FLOOR);
        if baseline_usage > USAGE_FLOOR && ratio > HELPFUL_RATIO {
            results.push(CorrelationResult {
                id: format!("trigger_absent:{name}"),
                label: name,
                kind: CorrelationKind::TriggerAbsent,
                correlation_ratio: ratio,
                improvement_usage,
                baseline_usage,
                confidence,
            });
        }
    }

    // Better sleep during improvement weeks.
    let improvement_sleep = average_sleep(&improvement);
    let baseline_sleep = average_sleep(&baseline);
    if let (Some(imp), Some(base)) = (improvement_sleep, baseline_sleep) {
        if imp - base >= SLEEP_DELTA {
            results.push(CorrelationResult {
                id: "sleep".into(),
                label: "better sleep".into(),
                kind: CorrelationKind::Sleep,
                correlation_ratio: imp / base.max(RATE_FLOOR),
                improvement_usage: imp,
                baseline_usage: base,
                confidence,
            });
        }
    }

    results.sort_by(|a, b| {
        b.correlation_ratio
            .partial_cmp(&a.correlation_ratio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    results
}

fn union_of<'a>(sets: impl Iterator<Item = &'a BTreeSet<String>>) -> Vec<String> {
    sets.flat_map(|s| s.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn usage_rate(weeks: &[&WeekSummary], used: impl Fn(&WeekSummary) -> bool) -> f64 {
    if weeks.is_empty() {
        return 0.0;
    }
    weeks.iter().filter(|w| used(w)).count() as f64 / weeks.len() as f64
}

fn average_sleep(weeks: &[&WeekSummary]) -> Option<f64> {
    let scores: Vec<f64> = weeks.iter().filter_map(|w| w.avg_sleep).collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}
