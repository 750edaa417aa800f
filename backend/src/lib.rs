//! # PV Dashboard Rust Backend
//!
//! Statistical analysis engine for photovoltaic device test data.
//!
//! The crate validates uploaded IV-curve measurements and serves the
//! analyses behind the dashboard: per-batch box plots, 2.5th-percentile
//! yield thresholds, day-by-day repeatability, and the device selection
//! that keeps an exact number of pixels per device and ranks sheets by
//! uniformity or mean efficiency. The backend exposes a REST API via Axum.
//!
//! ## Architecture
//!
//! - [`models`]: Measurement rows, row validation and grouping
//! - [`services`]: Statistics, chart computations, device selection and exports
//! - [`routes`]: Serializable response types, grouped by endpoint
//! - [`api`]: Re-exports of the public DTOs
//! - [`config`]: TOML configuration with environment overrides
//! - [`error`]: Error types surfaced to callers
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
