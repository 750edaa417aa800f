//! Day-by-day repeatability of the IV parameters.

use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::BTreeMap;

use crate::api::{DailyRepeatability, IvRepeatabilityData, RepeatabilityPoint};
use crate::models::{Parameter, RecordSet};
use crate::services::statistics::{mean, sample_std};

pub const DEFAULT_WINDOW_DAYS: usize = 10;

/// The last `window_days` distinct calendar days present in the data, ascending.
pub fn recent_days(records: &RecordSet, window_days: usize) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = records.rows().iter().filter_map(|r| r.date).collect();
    days.sort_unstable();
    days.dedup();
    let skip = days.len().saturating_sub(window_days);
    days.split_off(skip)
}

/// Daily mean of `parameter` over the trailing window.
///
/// Days in the window without a value for the parameter are omitted.
pub fn compute_daily_averages(
    records: &RecordSet,
    parameter: Parameter,
    window_days: usize,
) -> Vec<RepeatabilityPoint> {
    let window = recent_days(records, window_days);
    let Some(first_day) = window.first().copied() else {
        return Vec::new();
    };

    let mut per_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for row in records.rows() {
        if let (Some(date), Some(value)) = (row.date, row.value(parameter)) {
            if date >= first_day {
                per_day.entry(date).or_default().push(value);
            }
        }
    }

    per_day
        .into_iter()
        .filter_map(|(date, values)| {
            let average = mean(&values)?;
            let cv = if average != 0.0 {
                sample_std(&values).map(|sd| sd / average * 100.0)
            } else {
                None
            };
            Some(RepeatabilityPoint {
                date,
                parameter,
                average,
                cv,
                count: values.len(),
            })
        })
        .collect()
}

/// Repeatability points for every parameter, grouped by date.
pub fn compute_iv_repeatability(records: &RecordSet, window_days: usize) -> IvRepeatabilityData {
    let dates = recent_days(records, window_days);
    let mut by_date: IndexMap<NaiveDate, DailyRepeatability> = dates
        .iter()
        .map(|d| {
            (
                *d,
                DailyRepeatability {
                    date: *d,
                    date_short: d.format("%m/%d").to_string(),
                    averages: IndexMap::new(),
                    cv: IndexMap::new(),
                },
            )
        })
        .collect();

    let mut parameters = Vec::new();
    for parameter in Parameter::ALL {
        let points = compute_daily_averages(records, parameter, window_days);
        if points.is_empty() {
            continue;
        }
        parameters.push(parameter);
        for point in points {
            if let Some(day) = by_date.get_mut(&point.date) {
                day.averages.insert(parameter.label().to_string(), point.average);
                if let Some(cv) = point.cv {
                    day.cv.insert(parameter.label().to_string(), cv);
                }
            }
        }
    }

    IvRepeatabilityData {
        parameters,
        dates,
        window_days,
        repeatability_data: by_date.into_values().collect(),
    }
}
