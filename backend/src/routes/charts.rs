use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::Parameter;

// =========================================================
// Box plot types
// =========================================================

/// Box-plot summary of one parameter within one batch.
///
/// Invariant: `min <= q1 <= median <= q3 <= max` and `count >= 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotStatistic {
    pub batch: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub mean: f64,
    pub q3: f64,
    pub max: f64,
    pub std: f64,
    pub count: usize,
}

/// Box plots of one parameter, one entry per batch in first-seen order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxPlotData {
    pub parameter: Parameter,
    pub data: Vec<BoxPlotStatistic>,
}

// =========================================================
// Device yield types
// =========================================================

/// Yield thresholds and per-batch averages for every parameter with data.
///
/// `batch_averages[p][i]` belongs to `batches[i]`; it is `null` when that
/// batch has no values for `p`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceYieldData {
    pub parameters: Vec<Parameter>,
    pub batches: Vec<String>,
    pub batch_averages: IndexMap<String, Vec<Option<f64>>>,
    pub quantiles: IndexMap<String, f64>,
    pub percentile: f64,
}

/// Outcome of comparing a batch average against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum YieldStatus {
    Pass,
    YieldConcern,
}

// =========================================================
// IV repeatability types
// =========================================================

/// Daily mean of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatabilityPoint {
    pub date: NaiveDate,
    pub parameter: Parameter,
    pub average: f64,
    /// Coefficient of variation in percent; absent for single values or a zero mean
    pub cv: Option<f64>,
    pub count: usize,
}

/// All parameters' daily values for one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRepeatability {
    pub date: NaiveDate,
    /// `MM/DD` label for chart axes
    pub date_short: String,
    pub averages: IndexMap<String, f64>,
    pub cv: IndexMap<String, f64>,
}

/// Repeatability trend over the trailing window of distinct days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvRepeatabilityData {
    pub parameters: Vec<Parameter>,
    pub dates: Vec<NaiveDate>,
    pub window_days: usize,
    pub repeatability_data: Vec<DailyRepeatability>,
}

/// Route path for the parameter list
pub const PARAMETERS_PATH: &str = "/charts/parameters";
/// Route path for box-plot data
pub const CHART_DATA_PATH: &str = "/charts/data/{parameter}";
/// Route path for device-yield data
pub const DEVICE_YIELD_PATH: &str = "/charts/device-yield";
/// Route path for IV repeatability data
pub const IV_REPEATABILITY_PATH: &str = "/charts/iv-repeatability";
