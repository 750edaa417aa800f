//! Device-yield thresholds.
//!
//! The threshold of a parameter is a low percentile (2.5 by default) of all
//! its values. A batch whose average sits below the threshold is flagged.

use indexmap::IndexMap;

use crate::api::{DeviceYieldData, YieldStatus};
use crate::models::{Parameter, RecordSet};
use crate::services::statistics::{mean, percentile};

pub const DEFAULT_YIELD_PERCENTILE: f64 = 2.5;

/// Percentile of `parameter` over the whole record set.
pub fn compute_quantile(records: &RecordSet, parameter: Parameter, percent: f64) -> Option<f64> {
    percentile(&records.values(parameter), percent)
}

/// Average of `parameter` per batch, aligned with [`RecordSet::batches`].
pub fn compute_batch_averages(records: &RecordSet, parameter: Parameter) -> Vec<Option<f64>> {
    let mut per_batch: IndexMap<&str, Vec<f64>> = records
        .batches()
        .into_iter()
        .map(|b| (b, Vec::new()))
        .collect();

    for row in records.rows() {
        if let (Some(values), Some(v)) = (per_batch.get_mut(row.batch_id.as_str()), row.value(parameter)) {
            values.push(v);
        }
    }

    per_batch.values().map(|values| mean(values)).collect()
}

/// At or above the threshold passes.
pub fn classify(batch_average: f64, threshold: f64) -> YieldStatus {
    if batch_average >= threshold {
        YieldStatus::Pass
    } else {
        YieldStatus::YieldConcern
    }
}

/// Thresholds and batch averages for every parameter that has data.
pub fn compute_device_yield(records: &RecordSet, percent: f64) -> DeviceYieldData {
    let batches: Vec<String> = records.batches().into_iter().map(String::from).collect();
    let mut parameters = Vec::new();
    let mut quantiles = IndexMap::new();
    let mut batch_averages = IndexMap::new();

    for parameter in Parameter::ALL {
        let Some(threshold) = compute_quantile(records, parameter, percent) else {
            log::debug!("No values for {}; omitted from device yield", parameter);
            continue;
        };
        parameters.push(parameter);
        quantiles.insert(parameter.label().to_string(), threshold);
        batch_averages.insert(
            parameter.label().to_string(),
            compute_batch_averages(records, parameter),
        );
    }

    DeviceYieldData {
        parameters,
        batches,
        batch_averages,
        quantiles,
        percentile: percent,
    }
}
