//! Flare state engine: converts a check-in history into a daily burden
//! score, a personal rolling baseline with confidence tiers, flare
//! episode segmentation, and a current-state classification.
//!
//! All weights and cutoffs are tunable policy, not contracts. The
//! properties that hold regardless of tuning: burden is monotonic in
//! both skin intensity and symptom severity, and baseline confidence
//! only grows as more days are logged.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{BaselineConfidence, CheckIn, FlareState};

/// Burden = INTENSITY_WEIGHT * daily intensity + SYMPTOM_WEIGHT * summed
/// symptom severity (both averaged across same-day check-ins).
const INTENSITY_WEIGHT: f64 = 1.5;
const SYMPTOM_WEIGHT: f64 = 0.5;

/// A day is flaring when its burden exceeds baseline by this much.
const FLARE_DELTA: f64 = 1.5;

/// Baseline is the median burden over this many trailing logged days.
const BASELINE_WINDOW_DAYS: usize = 60;

/// Distinct-day cutoffs for baseline confidence tiers.
const PROVISIONAL_MIN_DAYS: usize = 14;
const MATURE_MIN_DAYS: usize = 30;

/// Flaring days this close together (calendar days) belong to one episode.
const EPISODE_MAX_GAP_DAYS: i64 = 2;

/// Runs shorter than this many logged flaring days are noise, not flares.
const MIN_EPISODE_DAYS: usize = 2;

/// A day within this much of the episode maximum counts as the peak.
const PEAK_EPSILON: f64 = 0.25;

// ─── Derived types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFlareState {
    pub date: NaiveDate,
    pub burden_score: f64,
    pub in_flare_episode: bool,
    pub state: FlareState,
}

/// A contiguous date range during which burden stayed above threshold
/// (bridging gaps of up to `EPISODE_MAX_GAP_DAYS`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlareEpisode {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub peak_burden: f64,
    pub logged_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlareAnalysis {
    pub daily: Vec<DailyFlareState>,
    pub baseline_burden: f64,
    pub baseline_confidence: BaselineConfidence,
    pub flare_threshold: f64,
    pub episodes: Vec<FlareEpisode>,
    pub current_state: FlareState,
    pub in_active_flare: bool,
    /// Days since the current episode started, when the most recent
    /// logged day sits inside one.
    pub current_flare_days: Option<i64>,
}

impl FlareAnalysis {
    /// The stable, no-data result for an empty history. Never an error.
    fn no_data() -> Self {
        Self {
            daily: Vec::new(),
            baseline_burden: 0.0,
            baseline_confidence: BaselineConfidence::Early,
            flare_threshold: FLARE_DELTA,
            episodes: Vec::new(),
            current_state: FlareState::Stable,
            in_active_flare: false,
            current_flare_days: None,
        }
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Full flare analysis over a check-in history. Pure and deterministic;
/// the input slice is never mutated or assumed sorted.
pub fn analyze_flares(check_ins: &[CheckIn]) -> FlareAnalysis {
    let burdens = daily_burden(check_ins);
    if burdens.is_empty() {
        return FlareAnalysis::no_data();
    }

    let baseline_burden = rolling_baseline(&burdens);
    let baseline_confidence = confidence_for(burdens.len());
    let flare_threshold = baseline_burden + FLARE_DELTA;

    let episodes = detect_episodes(&burdens, flare_threshold);
    let daily = classify_days(&burdens, baseline_burden, &episodes);

    let current_state = daily.last().map_or(FlareState::Stable, |d| d.state);
    let in_active_flare = matches!(
        current_state,
        FlareState::ActiveFlare | FlareState::PeakFlare | FlareState::ResolvingFlare
    );

    let last_date = daily.last().map(|d| d.date);
    let current_flare_days = last_date.and_then(|date| {
        episodes
            .iter()
            .find(|e| e.start <= date && date <= e.end)
            .map(|e| (date - e.start).num_days() + 1)
    });

    tracing::debug!(
        days = burdens.len(),
        episodes = episodes.len(),
        state = current_state.as_str(),
        "flare analysis complete"
    );

    FlareAnalysis {
        daily,
        baseline_burden,
        baseline_confidence,
        flare_threshold,
        episodes,
        current_state,
        in_active_flare,
        current_flare_days,
    }
}

/// Weighted burden per local calendar date. Same-day check-ins average
/// before weighting, so logging twice never doubles the score.
fn daily_burden(check_ins: &[CheckIn]) -> BTreeMap<NaiveDate, f64> {
    let mut acc: BTreeMap<NaiveDate, (f64, f64, u32)> = BTreeMap::new();
    for check_in in check_ins {
        let entry = acc.entry(check_in.local_date()).or_insert((0.0, 0.0, 0));
        entry.0 += check_in.intensity();
        entry.1 += check_in.symptom_load();
        entry.2 += 1;
    }
    acc.into_iter()
        .map(|(date, (intensity, symptoms, n))| {
            let n = f64::from(n);
            let burden = INTENSITY_WEIGHT * (intensity / n) + SYMPTOM_WEIGHT * (symptoms / n);
            (date, burden)
        })
        .collect()
}

/// Median burden over the trailing window of logged days. Median rather
/// than mean: a long flare must not drag the personal baseline up with it.
fn rolling_baseline(burdens: &BTreeMap<NaiveDate, f64>) -> f64 {
    let mut recent: Vec<f64> = burdens
        .values()
        .rev()
        .take(BASELINE_WINDOW_DAYS)
        .copied()
        .collect();
    median(&mut recent)
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

fn confidence_for(distinct_days: usize) -> BaselineConfidence {
    if distinct_days >= MATURE_MIN_DAYS {
        BaselineConfidence::Mature
    } else if distinct_days >= PROVISIONAL_MIN_DAYS {
        BaselineConfidence::Provisional
    } else {
        BaselineConfidence::Early
    }
}

fn detect_episodes(burdens: &BTreeMap<NaiveDate, f64>, threshold: f64) -> Vec<FlareEpisode> {
    let flare_days: Vec<(NaiveDate, f64)> = burdens
        .iter()
        .filter(|(_, &b)| b > threshold)
        .map(|(&d, &b)| (d, b))
        .collect();

    let mut episodes = Vec::new();
    let mut run: Vec<(NaiveDate, f64)> = Vec::new();
    for (date, burden) in flare_days {
        if let Some(&(last, _)) = run.last() {
            if (date - last).num_days() > EPISODE_MAX_GAP_DAYS {
                close_run(&mut episodes, &run);
                run.clear();
            }
        }
        run.push((date, burden));
    }
    close_run(&mut episodes, &run);
    episodes
}

fn close_run(episodes: &mut Vec<FlareEpisode>, run: &[(NaiveDate, f64)]) {
    if run.is_empty() {
        return;
    }
    if run.len() < MIN_EPISODE_DAYS {
        tracing::debug!(start = %run[0].0, days = run.len(), "flare run below minimum length, dropped");
        return;
    }
    let peak_burden = run.iter().map(|&(_, b)| b).fold(f64::NEG_INFINITY, f64::max);
    episodes.push(FlareEpisode {
        start: run[0].0,
        end: run[run.len() - 1].0,
        peak_burden,
        logged_days: run.len(),
    });
}

/// Per-day state. Inside an episode the day's position relative to the
/// episode peak decides active/peak/resolving; outside, a rising burden
/// past the half-delta mark arms the early-flare state.
fn classify_days(
    burdens: &BTreeMap<NaiveDate, f64>,
    baseline: f64,
    episodes: &[FlareEpisode],
) -> Vec<DailyFlareState> {
    // First logged date reaching each episode's maximum burden.
    let peak_dates: Vec<NaiveDate> = episodes
        .iter()
        .map(|ep| {
            burdens
                .range(ep.start..=ep.end)
                .find(|(_, &b)| (b - ep.peak_burden).abs() < 1e-9)
                .map(|(&d, _)| d)
                .unwrap_or(ep.start)
        })
        .collect();

    let mut daily = Vec::with_capacity(burdens.len());
    let mut prev_burden: Option<f64> = None;
    for (&date, &burden) in burdens {
        let episode_idx = episodes
            .iter()
            .position(|e| e.start <= date && date <= e.end);

        let state = match episode_idx {
            Some(idx) => {
                let episode = &episodes[idx];
                if burden >= episode.peak_burden - PEAK_EPSILON {
                    FlareState::PeakFlare
                } else if date < peak_dates[idx] {
                    FlareState::ActiveFlare
                } else {
                    FlareState::ResolvingFlare
                }
            }
            None => {
                let rising = prev_burden.is_some_and(|p| burden > p);
                if rising && burden > baseline + FLARE_DELTA / 2.0 {
                    FlareState::EarlyFlare
                } else {
                    FlareState::Stable
                }
            }
        };

        daily.push(DailyFlareState {
            date,
            burden_score: burden,
            in_flare_episode: episode_idx.is_some(),
            state,
        });
        prev_burden = Some(burden);
    }
    daily
}
