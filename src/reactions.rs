//! Food/product reaction analyzer: for each food or product diary token,
//! classifies post-exposure skin outcomes against the person's own local
//! baseline and aggregates them into a pattern with a confidence tier.
//!
//! Insufficient data is a first-class result, never an error, and always
//! ranks last for display.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::aggregate::{daily_intensity, local_baseline, merge_exposure_runs};
use crate::models::{CheckIn, ConfidenceTier, ReactionPattern, TriggerToken};

/// Distinct log-days required before any pattern is claimed.
const MIN_LOG_DAYS: usize = 3;

/// Outcomes are read over days +1..=+REACTION_WINDOW_DAYS after exposure.
const REACTION_WINDOW_DAYS: i64 = 3;

/// Half-width of the per-exposure local baseline window.
const BASELINE_HALF_WINDOW_DAYS: i64 = 7;

/// Symmetric intensity delta separating worse/better from neutral.
const OUTCOME_DELTA: f64 = 0.5;

/// Share of analyzable exposures one outcome needs to dominate.
const PATTERN_DOMINANCE: f64 = 0.6;

/// Combined worse+better share that reads as a mixed signal.
const MIXED_COVERAGE: f64 = 0.5;

/// Exposures that survived baseline/outcome computation, below which the
/// result stays insufficient regardless of log count.
const MIN_ANALYZABLE_EXPOSURES: usize = 2;

/// Consistency needed before confidence rises past low.
const CONSISTENCY_BAR: f64 = 0.6;

/// Log-day counts gating medium and high confidence.
const MEDIUM_CONFIDENCE_LOG_DAYS: usize = MIN_LOG_DAYS;
const HIGH_CONFIDENCE_LOG_DAYS: usize = 8;

/// Aggregated reaction picture for one food/product token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodAnalysis {
    pub name: String,
    /// Distinct days this token was logged.
    pub count: usize,
    pub days_worse_after: usize,
    pub days_better_after: usize,
    pub days_neutral_after: usize,
    /// Exposure events that had both an outcome and a local baseline.
    pub analyzable_exposures: usize,
    pub pattern: ReactionPattern,
    /// Share of the dominant outcome among analyzable exposures.
    pub consistency: f64,
    pub confidence: ConfidenceTier,
}

enum Outcome {
    Worse,
    Better,
    Neutral,
}

/// Analyzes every distinct food/product token in the history and returns
/// the results ranked for display (strongest signal first,
/// insufficient-data entries last).
pub fn analyze_reactions(check_ins: &[CheckIn]) -> Vec<FoodAnalysis> {
    let by_date = daily_intensity(check_ins);

    let mut log_days: BTreeMap<String, BTreeSet<NaiveDate>> = BTreeMap::new();
    for check_in in check_ins {
        for raw in &check_in.triggers {
            match TriggerToken::parse(raw) {
                TriggerToken::Food { name } | TriggerToken::Product { name, .. } => {
                    if !name.is_empty() {
                        log_days.entry(name).or_default().insert(check_in.local_date());
                    }
                }
                TriggerToken::Generic { .. } => {}
            }
        }
    }

    let mut results: Vec<FoodAnalysis> = log_days
        .into_iter()
        .map(|(name, dates)| analyze_one(name, &dates, &by_date))
        .collect();
    rank_for_display(&mut results);
    results
}

fn analyze_one(
    name: String,
    dates: &BTreeSet<NaiveDate>,
    by_date: &BTreeMap<NaiveDate, f64>,
) -> FoodAnalysis {
    let count = dates.len();
    if count < MIN_LOG_DAYS {
        return FoodAnalysis {
            name,
            count,
            days_worse_after: 0,
            days_better_after: 0,
            days_neutral_after: 0,
            analyzable_exposures: 0,
            pattern: ReactionPattern::InsufficientData,
            consistency: 0.0,
            confidence: ConfidenceTier::Low,
        };
    }

    // Baseline days must be clean of this food: exclude its log days and
    // every date inside their forward reaction windows.
    let mut contaminated: BTreeSet<NaiveDate> = BTreeSet::new();
    for &date in dates {
        for offset in 0..=REACTION_WINDOW_DAYS {
            contaminated.insert(date + Duration::days(offset));
        }
    }

    let mut worse = 0usize;
    let mut better = 0usize;
    let mut neutral = 0usize;
    for exposure in merge_exposure_runs(dates, REACTION_WINDOW_DAYS) {
        match classify_exposure(exposure, by_date, &contaminated) {
            Some(Outcome::Worse) => worse += 1,
            Some(Outcome::Better) => better += 1,
            Some(Outcome::Neutral) => neutral += 1,
            None => {
                tracing::debug!(food = %name, date = %exposure, "exposure skipped: no outcome or baseline");
            }
        }
    }

    let analyzable = worse + better + neutral;
    if analyzable < MIN_ANALYZABLE_EXPOSURES {
        return FoodAnalysis {
            name,
            count,
            days_worse_after: worse,
            days_better_after: better,
            days_neutral_after: neutral,
            analyzable_exposures: analyzable,
            pattern: ReactionPattern::InsufficientData,
            consistency: 0.0,
            confidence: ConfidenceTier::Low,
        };
    }

    let total = analyzable as f64;
    let worse_ratio = worse as f64 / total;
    let better_ratio = better as f64 / total;
    let neutral_ratio = neutral as f64 / total;

    let pattern = if worse_ratio >= PATTERN_DOMINANCE {
        ReactionPattern::OftenWorse
    } else if better_ratio >= PATTERN_DOMINANCE {
        ReactionPattern::OftenBetter
    } else if worse_ratio + better_ratio >= MIXED_COVERAGE {
        ReactionPattern::Mixed
    } else {
        ReactionPattern::NoPattern
    };

    let consistency = worse_ratio.max(better_ratio).max(neutral_ratio);
    let confidence = confidence_for(count, consistency);

    FoodAnalysis {
        name,
        count,
        days_worse_after: worse,
        days_better_after: better,
        days_neutral_after: neutral,
        analyzable_exposures: analyzable,
        pattern,
        consistency,
        confidence,
    }
}

/// Post-exposure intensity minus the food-free local baseline, mapped to
/// an outcome. `None` when either side cannot be established — that
/// exposure is dropped, never counted as neutral.
fn classify_exposure(
    exposure: NaiveDate,
    by_date: &BTreeMap<NaiveDate, f64>,
    contaminated: &BTreeSet<NaiveDate>,
) -> Option<Outcome> {
    let mut sum = 0.0;
    let mut n = 0u32;
    for offset in 1..=REACTION_WINDOW_DAYS {
        if let Some(value) = by_date.get(&(exposure + Duration::days(offset))) {
            sum += value;
            n += 1;
        }
    }
    if n == 0 {
        return None;
    }
    let post_exposure = sum / f64::from(n);

    let baseline = local_baseline(by_date, exposure, BASELINE_HALF_WINDOW_DAYS, |d| {
        contaminated.contains(&d)
    })?;

    let delta = post_exposure - baseline;
    if delta >= OUTCOME_DELTA {
        Some(Outcome::Worse)
    } else if delta <= -OUTCOME_DELTA {
        Some(Outcome::Better)
    } else {
        Some(Outcome::Neutral)
    }
}

/// Confidence never exceeds what the sample size justifies, and never
/// rises past low while outcomes stay inconsistent.
fn confidence_for(count: usize, consistency: f64) -> ConfidenceTier {
    if consistency < CONSISTENCY_BAR {
        ConfidenceTier::Low
    } else if count >= HIGH_CONFIDENCE_LOG_DAYS {
        ConfidenceTier::High
    } else if count >= MEDIUM_CONFIDENCE_LOG_DAYS {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

fn display_score(analysis: &FoodAnalysis) -> f64 {
    let weight = match analysis.pattern {
        ReactionPattern::OftenWorse => 3.0,
        ReactionPattern::OftenBetter => 2.5,
        ReactionPattern::Mixed => 1.5,
        ReactionPattern::NoPattern => 0.5,
        ReactionPattern::InsufficientData => 0.0,
    };
    weight * analysis.consistency * ((analysis.count + 1) as f64).ln()
}

fn rank_for_display(results: &mut [FoodAnalysis]) {
    results.sort_by(|a, b| {
        let a_insufficient = a.pattern == ReactionPattern::InsufficientData;
        let b_insufficient = b.pattern == ReactionPattern::InsufficientData;
        a_insufficient
            .cmp(&b_insufficient)
            .then_with(|| {
                display_score(b)
                    .partial_cmp(&display_score(a))
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeOfDay;
    use uuid::Uuid;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap() + Duration::days(i64::from(n) - 1)
    }

    fn check_in(date: NaiveDate, intensity: u8, triggers: &[&str]) -> CheckIn {
        CheckIn {
            id: Uuid::new_v4(),
            recorded_at: date.and_hms_opt(9, 0, 0).unwrap(),
            skin_feeling: 3,
            skin_intensity: Some(intensity),
            mood: None,
            sleep_score: None,
            pain_score: None,
            symptoms: vec![],
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            treatments: vec![],
            notes: None,
            time_of_day: TimeOfDay::Morning,
        }
    }

    /// 28 quiet days (intensity 1), food on days 8/12/16, spikes on the
    /// three days after each exposure.
    fn spiking_history(food: &str) -> Vec<CheckIn> {
        let exposure_days = [8u32, 12, 16];
        let spike_days: Vec<u32> = exposure_days
            .iter()
            .flat_map(|&d| [d + 1, d + 2, d + 3])
            .collect();
        let token = format!("food:{food}");
        (1..=28)
            .map(|n| {
                let intensity = if spike_days.contains(&n) { 3 } else { 1 };
                if exposure_days.contains(&n) {
                    check_in(day(n), intensity, &[token.as_str()])
                } else {
                    check_in(day(n), intensity, &[])
                }
            })
            .collect()
    }

    #[test]
    fn two_log_days_is_insufficient() {
        let entries = vec![
            check_in(day(1), 3, &["food:dairy"]),
            check_in(day(8), 3, &["food:dairy"]),
            check_in(day(9), 1, &[]),
        ];
        let results = analyze_reactions(&entries);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].pattern, ReactionPattern::InsufficientData);
        assert_eq!(results[0].count, 2);
        assert_eq!(results[0].analyzable_exposures, 0);
    }

    #[test]
    fn three_worse_exposures_make_often_worse() {
        let results = analyze_reactions(&spiking_history("gluten"));
        assert_eq!(results.len(), 1);
        let gluten = &results[0];
        assert_eq!(gluten.name, "gluten");
        assert_eq!(gluten.count, 3);
        assert_eq!(gluten.days_worse_after, 3);
        assert_eq!(gluten.pattern, ReactionPattern::OftenWorse);
        assert!((gluten.consistency - 1.0).abs() < 1e-9);
        assert!(gluten.confidence >= ConfidenceTier::Medium);
    }

    #[test]
    fn consecutive_log_days_collapse_to_one_exposure() {
        // Food on days 8, 9 and 15: the back-to-back pair is one exposure
        // event, so only two events remain — the number of non-adjacent runs.
        let mut entries: Vec<CheckIn> = (1..=20)
            .map(|n| check_in(day(n), 1, &[]))
            .collect();
        entries[7].triggers = vec!["food:eggs".into()];
        entries[8].triggers = vec!["food:eggs".into()];
        entries[14].triggers = vec!["food:eggs".into()];

        let results = analyze_reactions(&entries);
        assert_eq!(results[0].count, 3);
        assert_eq!(results[0].analyzable_exposures, 2);
    }

    #[test]
    fn alternating_outcomes_never_claim_a_direction() {
        // Five well-separated exposures: worse, better, neutral, worse, better.
        let exposure_days = [10u32, 20, 30, 40, 50];
        let post_intensity = [3u8, 0, 1, 3, 0];
        let mut entries = Vec::new();
        for n in 1..=57 {
            let mut intensity = 1u8;
            for (i, &e) in exposure_days.iter().enumerate() {
                if n > e && n <= e + 3 {
                    intensity = post_intensity[i];
                }
            }
            let mut entry = check_in(day(n), intensity, &[]);
            if exposure_days.contains(&n) {
                entry.triggers = vec!["food:tomato".into()];
            }
            entries.push(entry);
        }

        let results = analyze_reactions(&entries);
        let tomato = &results[0];
        assert_eq!(tomato.analyzable_exposures, 5);
        assert!(matches!(
            tomato.pattern,
            ReactionPattern::Mixed | ReactionPattern::NoPattern
        ));
    }

    #[test]
    fn confidence_never_drops_with_more_consistent_data() {
        let short = analyze_reactions(&spiking_history("nickel"));
        // Same shape, but with exposures on 8 distinct, well-separated days.
        let exposure_days: Vec<u32> = (0..8).map(|i| 8 + i * 4).collect();
        let spike_days: Vec<u32> = exposure_days
            .iter()
            .flat_map(|&d| [d + 1, d + 2, d + 3])
            .collect();
        let long: Vec<CheckIn> = (1..=44)
            .map(|n| {
                let intensity = if spike_days.contains(&n) { 3 } else { 1 };
                if exposure_days.contains(&n) {
                    check_in(day(n), intensity, &["food:nickel"])
                } else {
                    check_in(day(n), intensity, &[])
                }
            })
            .collect();
        let extended = analyze_reactions(&long);

        assert!(extended[0].confidence >= short[0].confidence);
        assert_eq!(extended[0].confidence, ConfidenceTier::High);
    }

    #[test]
    fn product_and_food_tokens_tracked_case_insensitively() {
        let mut entries: Vec<CheckIn> = (1..=20).map(|n| check_in(day(n), 1, &[])).collect();
        entries[3].triggers = vec!["product:CeraVe".into()];
        entries[9].triggers = vec!["product:cerave".into()];
        entries[15].triggers = vec!["new_product:CERAVE".into()];

        let results = analyze_reactions(&entries);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "cerave");
        assert_eq!(results[0].count, 3);
    }

    #[test]
    fn generic_triggers_not_analyzed_as_foods() {
        let entries: Vec<CheckIn> = (1..=10)
            .map(|n| check_in(day(n), 1, &["stress"]))
            .collect();
        assert!(analyze_reactions(&entries).is_empty());
    }

    #[test]
    fn insufficient_entries_rank_last() {
        let mut entries = spiking_history("gluten");
        // A second food with only two log days.
        entries[0].triggers = vec!["food:rice".into()];
        entries[27].triggers = vec!["food:rice".into()];

        let results = analyze_reactions(&entries);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "gluten");
        assert_eq!(results[1].pattern, ReactionPattern::InsufficientData);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let entries = spiking_history("gluten");
        assert_eq!(analyze_reactions(&entries), analyze_reactions(&entries));
    }
}
