//! Shared date-bucketing and windowed-baseline primitives used by the
//! flare engine, the reaction analyzer, and the weekly correlator.
//!
//! Everything here is keyed by the check-in's recorded local calendar
//! date. `BTreeMap`/`BTreeSet` keep iteration order deterministic so
//! repeated analysis of the same slice is bit-identical.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};

use crate::models::CheckIn;

/// Average 0–4 skin intensity per local calendar date. Multiple check-ins
/// on the same date average arithmetically.
pub fn daily_intensity(check_ins: &[CheckIn]) -> BTreeMap<NaiveDate, f64> {
    let mut sums: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for check_in in check_ins {
        let entry = sums.entry(check_in.local_date()).or_insert((0.0, 0));
        entry.0 += check_in.intensity();
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(date, (sum, n))| (date, sum / f64::from(n)))
        .collect()
}

/// Average intensity over `[-half_window, +half_window]` days around
/// `target`, skipping the target date itself and any date for which
/// `exclude` holds.
///
/// Returns `None` when no qualifying day has data — callers must treat
/// that as "no baseline for this exposure" and drop the exposure, never
/// default to zero.
pub fn local_baseline(
    by_date: &BTreeMap<NaiveDate, f64>,
    target: NaiveDate,
    half_window: i64,
    exclude: impl Fn(NaiveDate) -> bool,
) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0u32;
    for offset in -half_window..=half_window {
        if offset == 0 {
            continue;
        }
        let date = target + Duration::days(offset);
        if exclude(date) {
            continue;
        }
        if let Some(value) = by_date.get(&date) {
            sum += value;
            n += 1;
        }
    }
    if n == 0 {
        None
    } else {
        Some(sum / f64::from(n))
    }
}

/// Collapses runs of log dates into exposure events. A date falling
/// inside the forward reaction window of an earlier exposure is consumed
/// by that exposure and does not start a new one, so eating the same food
/// two days running counts as a single event anchored at the first day.
pub fn merge_exposure_runs(dates: &BTreeSet<NaiveDate>, forward_window: i64) -> Vec<NaiveDate> {
    let mut exposures = Vec::new();
    let mut consumed_until: Option<NaiveDate> = None;
    for &date in dates {
        if let Some(limit) = consumed_until {
            if date <= limit {
                continue;
            }
        }
        exposures.push(date);
        consumed_until = Some(date + Duration::days(forward_window));
    }
    exposures
}

/// Count of distinct local dates with at least one check-in.
pub fn distinct_log_days(check_ins: &[CheckIn]) -> usize {
    check_ins
        .iter()
        .map(|c| c.local_date())
        .collect::<BTreeSet<_>>()
        .len()
}
