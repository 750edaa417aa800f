//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;
use crate::routes::{analysis, baseline, charts};

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.server.body_limit_bytes();

    let api_v1 = Router::new()
        // Charts over the baseline dataset
        .route(charts::PARAMETERS_PATH, get(handlers::list_parameters))
        .route(charts::CHART_DATA_PATH, get(handlers::get_box_plot_data))
        .route(charts::DEVICE_YIELD_PATH, get(handlers::get_device_yield))
        .route(charts::IV_REPEATABILITY_PATH, get(handlers::get_iv_repeatability))
        .route(baseline::BASELINE_PATH, put(handlers::replace_baseline))
        // Device selection and exports
        .route(analysis::PROCESS_PATH, post(handlers::process_file))
        .route(analysis::DOWNLOAD_PATH, get(handlers::download_export));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
