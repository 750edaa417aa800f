//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer. CPU-bound work runs on the blocking thread pool.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{
    BaselineRequest, BaselineSummary, BoxPlotData, DeviceYieldData, HealthResponse,
    IvRepeatabilityData, ParameterListResponse, ProcessRequest, ProcessResponse,
    RepeatabilityQuery, YieldQuery,
};
use super::error::AppError;
use super::state::AppState;
use crate::error::AnalysisError;
use crate::models::Parameter;
use crate::services::{self, BaselineSnapshot, ExportKind};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Header carrying the export snapshot generation of a download.
pub const EXPORT_GENERATION_HEADER: &str = "x-export-generation";

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        baseline_rows: state.baseline.current().records.len(),
        export_generation: state.exports.latest().map(|s| s.generation),
    }))
}

// =============================================================================
// Chart Endpoints
// =============================================================================

/// GET /v1/charts/parameters
pub async fn list_parameters() -> HandlerResult<ParameterListResponse> {
    Ok(Json(ParameterListResponse {
        parameters: Parameter::ALL.to_vec(),
    }))
}

/// GET /v1/charts/data/{parameter}
///
/// Box-plot statistics of one parameter per batch of the baseline dataset.
pub async fn get_box_plot_data(
    State(state): State<AppState>,
    Path(parameter): Path<String>,
) -> HandlerResult<BoxPlotData> {
    let parameter: Parameter = parameter
        .parse()
        .map_err(|_| AnalysisError::UnknownParameter(parameter.clone()))?;
    let baseline = state.baseline.current();

    let data = tokio::task::spawn_blocking(move || {
        services::compute_box_plot_data(&baseline.records, parameter)
    })
    .await?;

    Ok(Json(data))
}

/// GET /v1/charts/device-yield
pub async fn get_device_yield(
    State(state): State<AppState>,
    Query(query): Query<YieldQuery>,
) -> HandlerResult<DeviceYieldData> {
    let percentile = query
        .percentile
        .unwrap_or(state.config.analysis.yield_percentile);
    if !(percentile > 0.0 && percentile < 100.0) {
        return Err(AnalysisError::invalid_field(
            "percentile",
            format!("must be between 0 and 100 (got {})", percentile),
        )
        .into());
    }
    let baseline = state.baseline.current();

    let data = tokio::task::spawn_blocking(move || {
        services::compute_device_yield(&baseline.records, percentile)
    })
    .await?;

    Ok(Json(data))
}

/// GET /v1/charts/iv-repeatability
pub async fn get_iv_repeatability(
    State(state): State<AppState>,
    Query(query): Query<RepeatabilityQuery>,
) -> HandlerResult<IvRepeatabilityData> {
    let window_days = query
        .window_days
        .unwrap_or(state.config.analysis.repeatability_window_days);
    if window_days == 0 {
        return Err(AnalysisError::invalid_field("window_days", "must be at least 1").into());
    }
    let baseline = state.baseline.current();

    let data = tokio::task::spawn_blocking(move || {
        services::compute_iv_repeatability(&baseline.records, window_days)
    })
    .await?;

    Ok(Json(data))
}

// =============================================================================
// Baseline
// =============================================================================

/// PUT /v1/baseline
///
/// Replace the dataset behind the chart endpoints.
pub async fn replace_baseline(
    State(state): State<AppState>,
    Json(request): Json<BaselineRequest>,
) -> HandlerResult<BaselineSummary> {
    let snapshot =
        tokio::task::spawn_blocking(move || BaselineSnapshot::from_raw(&request.rows)).await?;
    let snapshot = state.baseline.replace(snapshot);
    Ok(Json(snapshot.summary()))
}

// =============================================================================
// Analysis
// =============================================================================

/// POST /v1/analysis/process
///
/// Run device selection over the uploaded rows and store the export tables.
pub async fn process_file(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> HandlerResult<ProcessResponse> {
    let settings = state.config.analysis.clone();
    let exports = state.exports.clone();

    let response = tokio::task::spawn_blocking(move || {
        services::process_file(&request.rows, &request.options, &settings, &exports)
    })
    .await??;

    Ok(Json(response))
}

/// GET /v1/analysis/download/{kind}
///
/// Download the Quick Data or Entire Data table of the latest run as CSV.
pub async fn download_export(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Response, AppError> {
    let kind: ExportKind = kind.parse().map_err(AppError::BadRequest)?;
    let snapshot = state.exports.latest().ok_or_else(|| {
        AppError::NotFound("No export data available; process a file first".to_string())
    })?;

    let body = snapshot.table(kind).to_csv()?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.file_name()),
            ),
            (
                HeaderName::from_static(EXPORT_GENERATION_HEADER),
                snapshot.generation.to_string(),
            ),
        ],
        body,
    )
        .into_response())
}
