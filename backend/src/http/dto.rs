//! Data Transfer Objects for the HTTP API.
//!
//! Response bodies of the analysis endpoints are the serializable types
//! re-exported from [`crate::api`]; this module adds request bodies, query
//! parameters and a few small responses owned by the HTTP layer.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    // Analysis
    ProcessResponse, ProcessSummary, ProcessingOptions, SelectionResult,
    // Baseline
    BaselineSummary,
    // Charts
    BoxPlotData, BoxPlotStatistic, DailyRepeatability, DeviceYieldData, IvRepeatabilityData,
    Parameter, RawRow,
};

/// Request body for processing an uploaded dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Rows as parsed from the uploaded spreadsheet
    pub rows: Vec<RawRow>,
    /// Processing options; omitted fields take their defaults
    #[serde(default)]
    pub options: ProcessingOptions,
}

/// Request body for replacing the baseline dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineRequest {
    pub rows: Vec<RawRow>,
}

/// Query parameters for the device-yield endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct YieldQuery {
    /// Threshold percentile (configured default when absent)
    #[serde(default)]
    pub percentile: Option<f64>,
}

/// Query parameters for the IV repeatability endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RepeatabilityQuery {
    /// Number of trailing distinct days (configured default when absent)
    #[serde(default)]
    pub window_days: Option<usize>,
}

/// Chart parameters accepted by `/v1/charts/data/{parameter}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterListResponse {
    pub parameters: Vec<Parameter>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Rows in the current baseline dataset
    pub baseline_rows: usize,
    /// Generation of the latest export snapshot, if any run has completed
    pub export_generation: Option<u64>,
}
