//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{BaselineStore, ExportStore};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Configuration resolved at startup
    pub config: Arc<AppConfig>,
    /// Dataset behind the chart endpoints
    pub baseline: BaselineStore,
    /// Export tables of the most recent processing run
    pub exports: ExportStore,
}

impl AppState {
    /// Create a new application state with empty baseline and exports.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            baseline: BaselineStore::new(),
            exports: ExportStore::new(),
        }
    }
}
